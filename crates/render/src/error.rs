use archive_protocol::MessageHash;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to write {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No stored body for message {0}")]
    MissingBody(MessageHash),

    #[error("Body of message {hash} unavailable: {reason}")]
    BodyUnavailable { hash: MessageHash, reason: String },
}

impl RenderError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}
