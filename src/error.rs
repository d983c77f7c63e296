//! Error types for febe-client.

use thiserror::Error;

/// Main error type for all FeBe operations.
#[derive(Debug, Error)]
pub enum FebeError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (configuration loading, dump export).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend violated the FeBe conversation.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Malformed input: bad tag byte, unparsable number, unencodable text.
    #[error("Malformed input: {0}")]
    Malformed(String),

    /// Address arithmetic outside its domain.
    #[error("Address range error in {op}: {left} vs {right}")]
    Range {
        /// Operation that failed (`sub`, `localize`, `split`).
        op: &'static str,
        /// Left operand in dotted form.
        left: String,
        /// Right operand in dotted form.
        right: String,
    },
}

/// Protocol violations. All of these are fatal to the owning session.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The backend does not speak 88.1.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The response opcode differs from the request opcode.
    #[error("opcode {sent}: backend answered with opcode {received}")]
    OpcodeMismatch {
        /// Opcode written by the client.
        sent: u32,
        /// Opcode echoed by the backend.
        received: String,
    },

    /// The response could not be parsed.
    #[error("opcode {opcode}: unreadable response ({context})")]
    Unreadable {
        /// Opcode whose response was being read.
        opcode: u32,
        /// What was being read.
        context: String,
    },

    /// A chunk exceeded the configured length limit.
    #[error("chunk longer than {limit} bytes while reading {context}")]
    ChunkTooLong {
        /// Configured limit.
        limit: usize,
        /// What was being read.
        context: String,
    },

    /// The backend signalled an error with `?`.
    #[error("backend rejected request while reading {context}")]
    Rejected {
        /// What was being read when `?` arrived.
        context: String,
    },

    /// The stream ended before a terminator.
    #[error("stream closed while reading {context}")]
    Closed {
        /// What was being read.
        context: String,
    },
}

impl FebeError {
    /// True for the protocol error kind.
    pub fn is_protocol(&self) -> bool {
        matches!(self, FebeError::Protocol(_))
    }

    /// True when the backend explicitly rejected the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, FebeError::Protocol(ProtocolError::Rejected { .. }))
    }

    pub(crate) fn range(op: &'static str, left: impl ToString, right: impl ToString) -> Self {
        FebeError::Range {
            op,
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

/// Result type alias using FebeError.
pub type Result<T> = std::result::Result<T, FebeError>;
