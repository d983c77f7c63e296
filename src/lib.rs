//! # febe-client
//!
//! Rust client for the FeBe 88.1 protocol spoken by the Udanax Green
//! hypertext backend.
//!
//! The backend is a separate process reached over any duplex byte stream.
//! This crate supplies:
//!
//! - **Addressing** - tumbler arithmetic and the span types built on it
//! - **Codec** - the textual `~`-terminated wire form
//! - **Protocol** - handshake and opcode-checked command dispatch
//! - **Session** - one typed async method per backend operation
//! - **Dump** - parser for the backend's enfilade diagnostic dump
//!
//! ## Example
//!
//! ```ignore
//! use febe_client::{Session, SpecSet, VSpan, Span};
//!
//! #[tokio::main]
//! async fn main() -> febe_client::Result<()> {
//!     let stream = tokio::net::TcpStream::connect("127.0.0.1:55146").await?;
//!     let mut session = Session::connect(stream).await?;
//!
//!     let doc = session.create_document().await?;
//!     let whole = session.retrieve_vspanset(&doc).await?;
//!     let contents = session.retrieve_contents(&SpecSet::from(whole)).await?;
//!     println!("{contents:?}");
//!
//!     session.quit().await
//! }
//! ```

pub mod addressing;
pub mod codec;
pub mod config;
pub mod dump;
pub mod error;
pub mod protocol;

mod session;
mod shared;

pub use addressing::{
    Address, Offset, Region, Scoped, Span, SpecItem, SpecSet, Tumbler, VSpan, VSpec, FOOTNOTE_TYPE,
    JUMP_TYPE, LINK_TYPES_DOCID, MARGIN_TYPE, NOSPECS, NOWHERE, NOWIDTH, QUOTE_TYPE,
};
pub use codec::Content;
pub use config::SessionConfig;
pub use dump::EnfiladeDump;
pub use error::{FebeError, ProtocolError, Result};
pub use protocol::{Access, CopyMode, LinkEnd};
pub use session::{Endsets, LinkFollow, Session, SessionBuilder};
pub use shared::{collapse_sharedspans, SharedSpan};
