//! Protocol module - opcodes, handshake and command dispatch.
//!
//! This module implements the FeBe 88.1 conversation:
//! - Opcode table and argument enumerations
//! - `\nP0~` handshake
//! - Opcode-echo verification on every command

mod connection;
mod opcode;

pub use connection::{Connection, HANDSHAKE_REQUEST, PROTOCOL_TAG};
pub use opcode::{Access, CopyMode, LinkEnd, Opcode};
