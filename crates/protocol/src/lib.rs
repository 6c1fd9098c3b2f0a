//! # Archive Protocol
//!
//! Record types shared by every stage of the archive pipeline.
//!
//! A [`MessageRecord`] is created once at ingestion and afterwards only has
//! its `no_parent` flag and `thread_root` touched by the threading stages.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

pub mod reference;

pub use reference::normalize_reference;

/// Bumped whenever the persisted record layout changes.
pub const RECORD_SCHEMA_VERSION: u32 = 1;

/// Subject used when a message carries none.
pub const NO_SUBJECT: &str = "(no subject)";

/// Participant token for senders whose address could not be parsed.
pub const UNKNOWN_PARTICIPANT: &str = "unknown";

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Hex SHA-256 of a raw message block. Canonical primary key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHash(String);

impl MessageHash {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized metadata for one archived message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub hash: MessageHash,

    /// External Message-ID; not guaranteed unique across the archive
    pub message_id: Option<String>,

    /// In-Reply-To reference
    pub reply_to: Option<String>,

    /// Raw From header
    pub sender: String,

    /// Identity token derived from `sender`
    #[serde(default)]
    pub sender_id: Option<String>,

    #[serde(default)]
    pub recipients: Option<String>,

    pub subject: String,

    /// UTC unix seconds; absent when the Date header could not be trusted
    pub timestamp: Option<i64>,

    pub raw_date: Option<String>,

    pub source_year: i32,

    #[serde(default)]
    pub no_parent: bool,

    #[serde(default)]
    pub thread_root: Option<MessageHash>,
}

impl MessageRecord {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    /// Month bucket when the timestamp is known, otherwise the source year.
    pub fn bucket(&self) -> DateBucket {
        match self.datetime() {
            Some(dt) => DateBucket::month(dt.year(), dt.month()),
            None => DateBucket::unknown(self.source_year),
        }
    }

    /// True when resolution must start a thread here.
    pub fn is_seed_root(&self) -> bool {
        self.reply_to.is_none() || self.no_parent
    }

    pub fn participant(&self) -> &str {
        self.sender_id.as_deref().unwrap_or(UNKNOWN_PARTICIPANT)
    }

    /// Sibling order: timestamped messages first by time, then by hash.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        match (self.timestamp, other.timestamp) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.hash.cmp(&other.hash)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.hash.cmp(&other.hash),
        }
    }
}

/// Year plus optional month. `month == None` is the "unknown month" bucket
/// for messages without a usable timestamp and sorts after the known months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateBucket {
    pub year: i32,
    pub month: Option<u32>,
}

impl DateBucket {
    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }

    pub fn unknown(year: i32) -> Self {
        Self { year, month: None }
    }

    /// `"03"` style path segment, or `"unknown"`.
    pub fn month_segment(&self) -> String {
        match self.month {
            Some(month) => format!("{month:02}"),
            None => "unknown".to_string(),
        }
    }

    pub fn month_name(&self) -> &'static str {
        match self.month {
            Some(month) if (1..=12).contains(&month) => MONTH_NAMES[month as usize - 1],
            _ => "(unknown month)",
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.month_name(), self.year)
    }
}

impl Ord for DateBucket {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year.cmp(&other.year).then_with(|| match (self.month, other.month) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    }
}

impl PartialOrd for DateBucket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
