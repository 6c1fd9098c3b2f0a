use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdentityError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// No `@`, or an empty local part / domain
    #[error("Malformed address: {0:?}")]
    MalformedAddress(String),
}

impl IdentityError {
    pub fn malformed(raw: impl Into<String>) -> Self {
        Self::MalformedAddress(raw.into())
    }
}
