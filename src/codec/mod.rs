//! Codec module - the FeBe textual wire form.
//!
//! - [`WireValue`] and the `encode_*` functions - outbound arguments
//! - [`WireReader`] - inbound typed values over an async buffered stream
//!
//! # Example
//!
//! ```
//! use febe_client::codec::WireValue;
//! use febe_client::Address;
//!
//! let addr: Address = "1.1.0.1".parse().unwrap();
//! let bytes = WireValue::from(addr).to_bytes().unwrap();
//! assert_eq!(&bytes[..], b"0.1.1.0.1~");
//! ```

mod decode;
mod encode;

pub use decode::{parse_number, Content, WireReader, ERROR_MARKER};
pub(crate) use decode::unexpected_byte;
pub use encode::{
    encode_number, encode_span, encode_specset, encode_text, encode_tumbler, encode_vspec,
    WireValue, SPAN_TAG, TERMINATOR, TEXT_TAG, VSPEC_TAG,
};
