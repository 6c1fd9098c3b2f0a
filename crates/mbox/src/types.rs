use archive_protocol::MessageHash;
use serde::{Deserialize, Serialize};

/// One message block cut out of a mailbox, separator line excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// Position in the mailbox (0-indexed)
    pub index: usize,

    /// The separator line that opened this block, if any
    pub separator: Option<String>,

    /// Exact bytes of the block; the content hash is taken over these
    pub bytes: Vec<u8>,
}

impl RawBlock {
    /// Block text, invalid UTF-8 replaced
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.bytes.iter().all(u8::is_ascii_whitespace)
    }
}

/// Header fields and body extracted from one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMessage {
    /// SHA-256 of the raw block
    pub hash: MessageHash,

    /// Normalized Message-ID
    pub message_id: Option<String>,

    /// Normalized In-Reply-To
    pub reply_to: Option<String>,

    /// Raw From header
    pub sender: String,

    /// Raw To header
    pub recipients: Option<String>,

    pub subject: String,

    /// UTC unix seconds
    pub timestamp: Option<i64>,

    /// Date header as found
    pub raw_date: Option<String>,

    pub source_year: i32,

    /// Decoded text body (not yet masked)
    pub body: String,
}

impl ParsedMessage {
    /// No trustworthy timestamp; the message falls back to its source year
    #[must_use]
    pub const fn date_degraded(&self) -> bool {
        self.timestamp.is_none()
    }
}
