use crate::error::{RenderError, Result};
use archive_protocol::MessageHash;
use std::collections::{BTreeMap, HashMap};

/// Masked message bodies by content hash.
pub trait BodySource {
    /// The stored body, or [`RenderError::MissingBody`].
    fn body(&self, hash: &MessageHash) -> Result<String>;
}

impl BodySource for HashMap<MessageHash, String> {
    fn body(&self, hash: &MessageHash) -> Result<String> {
        self.get(hash)
            .cloned()
            .ok_or_else(|| RenderError::MissingBody(hash.clone()))
    }
}

impl BodySource for BTreeMap<MessageHash, String> {
    fn body(&self, hash: &MessageHash) -> Result<String> {
        self.get(hash)
            .cloned()
            .ok_or_else(|| RenderError::MissingBody(hash.clone()))
    }
}
