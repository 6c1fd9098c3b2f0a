use crate::error::Result;
use serde::Serialize;

/// A document that could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderFailure {
    pub key: String,
    pub error: String,
}

/// Outcome of one render pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    /// Documents written
    pub documents: usize,

    pub failures: Vec<RenderFailure>,
}

impl RenderReport {
    /// Every document was written
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record(&mut self, key: &str, result: Result<()>) {
        match result {
            Ok(()) => self.documents += 1,
            Err(err) => {
                log::warn!("Failed to render {}: {}", key, err);
                self.failures.push(RenderFailure {
                    key: key.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }
}
