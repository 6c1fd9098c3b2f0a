//! # Archive Mbox
//!
//! Turns a concatenated mailbox into parsed message metadata.
//!
//! ## Pipeline
//!
//! ```text
//! mailbox bytes
//!     │
//!     ├──> Splitter (separator regex)
//!     │      └─> RawBlock { index, separator, bytes }
//!     │
//!     ├──> Header parser (unfolding, first occurrence wins)
//!     │
//!     ├──> Date heuristic (RFC 2822 → legacy zones → ctime → embedded)
//!     │
//!     └──> Body extraction (multipart, base64, quoted-printable)
//!            └─> ParsedMessage { hash, message_id, reply_to, ... }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use archive_mbox::{split_mailbox, MboxConfig, MessageParser};
//!
//! let mbox = "From 1@xxx\nFrom: a@example.com\nSubject: hi\n\nhello\n";
//! let config = MboxConfig::numbered_separator();
//! let parser = MessageParser::new(config.clone());
//!
//! for block in split_mailbox(mbox.as_bytes(), &config).unwrap() {
//!     let message = parser.parse(&block.unwrap()).unwrap();
//!     assert_eq!(message.subject, "hi");
//! }
//! ```

mod body;
mod config;
pub mod dates;
mod error;
mod headers;
mod parser;
mod splitter;
mod types;

pub use body::extract_text;
pub use config::{MboxConfig, DEFAULT_SEPARATOR};
pub use dates::{derive_date, parse_legacy_date, DerivedDate};
pub use error::{MboxError, Result};
pub use headers::HeaderMap;
pub use parser::{content_hash, MessageParser};
pub use splitter::MboxSplitter;
pub use types::{ParsedMessage, RawBlock};

use std::io::BufRead;

/// Split a mailbox using the configured separator
pub fn split_mailbox<R: BufRead>(reader: R, config: &MboxConfig) -> Result<MboxSplitter<R>> {
    Ok(MboxSplitter::new(reader, config.separator_regex()?))
}
