use archive_protocol::MessageRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Counts describing the committed (or staged) record set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of records
    pub messages: usize,

    /// Records carrying a reply reference
    pub replies: usize,

    /// Records without a usable timestamp
    pub undated: usize,

    /// Records whose sender address could not be parsed
    pub unknown_senders: usize,

    /// Records flagged no-parent
    pub no_parent: usize,

    /// Records with a thread root assigned
    pub resolved: usize,

    /// Distinct thread roots
    pub threads: usize,

    /// Distinct participant tokens
    pub participants: usize,
}

impl StoreStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a MessageRecord>) -> Self {
        let mut stats = Self::default();
        let mut roots = HashSet::new();
        let mut participants = HashSet::new();

        for record in records {
            stats.messages += 1;
            if record.reply_to.is_some() {
                stats.replies += 1;
            }
            if record.timestamp.is_none() {
                stats.undated += 1;
            }
            if record.no_parent {
                stats.no_parent += 1;
            }
            match &record.sender_id {
                Some(token) => {
                    participants.insert(token.as_str());
                }
                None => stats.unknown_senders += 1,
            }
            if let Some(root) = &record.thread_root {
                stats.resolved += 1;
                roots.insert(root.clone());
            }
        }

        stats.threads = roots.len();
        stats.participants = participants.len();
        stats
    }

    /// Every record has a thread root
    pub fn is_fully_resolved(&self) -> bool {
        self.resolved == self.messages
    }
}
