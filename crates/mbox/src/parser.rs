use crate::body::extract_text;
use crate::config::MboxConfig;
use crate::dates::derive_date;
use crate::error::{MboxError, Result};
use crate::headers::HeaderMap;
use crate::types::{ParsedMessage, RawBlock};
use archive_protocol::{normalize_reference, MessageHash, NO_SUBJECT};
use sha2::{Digest, Sha256};

/// Turns raw blocks into [`ParsedMessage`]s
pub struct MessageParser {
    config: MboxConfig,
}

impl MessageParser {
    pub fn new(config: MboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MboxConfig {
        &self.config
    }

    /// Parse one block. Malformed blocks are reported, never panicked on.
    pub fn parse(&self, block: &RawBlock) -> Result<ParsedMessage> {
        let text = block.text();
        let (headers, body_offset) = HeaderMap::parse(&text);
        if headers.is_empty() {
            return Err(MboxError::malformed(block.index, "no header fields"));
        }

        let sender = headers
            .get_nonempty("From")
            .ok_or(MboxError::MissingHeader {
                index: block.index,
                header: "From",
            })?
            .to_string();

        let raw_date = headers.get_nonempty("Date").map(str::to_string);
        let derived = derive_date(raw_date.as_deref(), block.separator.as_deref(), &self.config);

        let subject = headers
            .get_nonempty("Subject")
            .map_or_else(|| NO_SUBJECT.to_string(), |s| s.trim().to_string());

        Ok(ParsedMessage {
            hash: content_hash(&block.bytes),
            message_id: headers.get("Message-ID").and_then(normalize_reference),
            reply_to: headers.get("In-Reply-To").and_then(normalize_reference),
            sender,
            recipients: headers.get_nonempty("To").map(str::to_string),
            subject,
            timestamp: derived.timestamp,
            raw_date,
            source_year: derived.source_year,
            body: extract_text(&headers, &text[body_offset..]),
        })
    }
}

/// Lower-case hex SHA-256 of the raw block bytes
pub fn content_hash(bytes: &[u8]) -> MessageHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    MessageHash::new(format!("{:x}", hasher.finalize()))
}
