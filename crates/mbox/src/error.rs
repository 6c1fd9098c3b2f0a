use thiserror::Error;

/// Result type for mailbox operations
pub type Result<T> = std::result::Result<T, MboxError>;

/// Errors raised while splitting or parsing a mailbox
#[derive(Error, Debug)]
pub enum MboxError {
    /// Reading the mailbox failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Block has no recognizable header section
    #[error("Malformed message block #{index}: {reason}")]
    MalformedBlock { index: usize, reason: String },

    /// Block parsed but lacks a required header
    #[error("Message block #{index} has no {header} header")]
    MissingHeader { index: usize, header: &'static str },

    /// Separator pattern does not compile
    #[error("Invalid separator pattern {pattern:?}: {reason}")]
    InvalidSeparator { pattern: String, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MboxError {
    /// Create a malformed block error
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedBlock {
            index,
            reason: reason.into(),
        }
    }

    /// Whether the batch can continue past this error
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedBlock { .. } | Self::MissingHeader { .. }
        )
    }
}
