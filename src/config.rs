//! Session configuration.
//!
//! Defaults are exposed as constants so callers can reason about them
//! without building a config. A config can also be loaded from JSON; any
//! field left out takes its default.
//!
//! # Example
//!
//! ```
//! use febe_client::config::SessionConfig;
//!
//! let config = SessionConfig::from_json_str(r#"{ "trace_wire": true }"#).unwrap();
//! assert!(config.trace_wire);
//! assert_eq!(config.max_chunk_len, febe_client::config::DEFAULT_MAX_CHUNK_LEN);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default limit for a single `~`/newline-terminated chunk (1 MiB).
pub const DEFAULT_MAX_CHUNK_LEN: usize = 1024 * 1024;

/// Default limit for bytes discarded before the handshake newline (64 KiB).
pub const DEFAULT_MAX_PREAMBLE_LEN: usize = 64 * 1024;

/// Default read buffer capacity.
pub const DEFAULT_READ_BUFFER: usize = 8 * 1024;

/// Tunables for a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Longest chunk accepted from the backend.
    pub max_chunk_len: usize,
    /// Longest handshake preamble discarded before the newline.
    pub max_preamble_len: usize,
    /// Log every outbound command's bytes at trace level.
    pub trace_wire: bool,
    /// Capacity of the buffered reader wrapping the stream.
    pub read_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            max_preamble_len: DEFAULT_MAX_PREAMBLE_LEN,
            trace_wire: false,
            read_buffer: DEFAULT_READ_BUFFER,
        }
    }
}

impl SessionConfig {
    /// Parse a config from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
