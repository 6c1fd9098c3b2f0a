use archive_protocol::MessageHash;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Record file error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Store at {0} is locked by another process")]
    Locked(PathBuf),

    #[error("Unknown message: {0}")]
    UnknownMessage(MessageHash),

    #[error("Unsupported record schema version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("{0}")]
    Other(String),
}
