//! Transport-layer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("read error: {0}")]
    Read(String),
    #[error("write error: {0}")]
    Write(String),
    /// The line exceeded the configured limit and was discarded.
    #[error("message exceeds {limit} bytes")]
    MessageTooLarge { limit: usize },
    #[error("message is not valid UTF-8")]
    InvalidEncoding,
}

impl TransportError {
    /// Whether the loop can answer the offending line and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MessageTooLarge { .. } | Self::InvalidEncoding)
    }
}
