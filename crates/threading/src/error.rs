use archive_protocol::MessageHash;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ThreadingError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThreadingError {
    #[error("Message {0} has no thread root")]
    UnresolvedMessage(MessageHash),

    #[error("Message {message} names unknown thread root {root}")]
    UnknownRoot {
        message: MessageHash,
        root: MessageHash,
    },

    #[error("Message {0} is not a thread root")]
    NotARoot(MessageHash),

    #[error("Message {message} is not reachable from its thread root {root}")]
    Detached {
        message: MessageHash,
        root: MessageHash,
    },
}
