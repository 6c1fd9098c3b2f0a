use crate::error::{MboxError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default separator: classic mbox `From ` envelope line.
pub const DEFAULT_SEPARATOR: &str = r"^From \S+";

/// Configuration for mailbox ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MboxConfig {
    /// Regex matched against each line; a match starts a new message block
    pub separator: String,

    /// Source year used when neither the Date header nor the separator line
    /// mention a plausible year
    pub fallback_year: i32,

    /// Parsed dates before this year are treated as unparseable
    pub min_year: Option<i32>,

    /// Parsed dates after this year are treated as unparseable
    pub max_year: Option<i32>,

    /// Fixed correction added to every derived timestamp
    pub timestamp_correction_secs: i64,

    /// Mask addresses inside message bodies before they are stored
    pub mask_bodies: bool,
}

impl Default for MboxConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            fallback_year: 1970,
            min_year: None,
            max_year: None,
            timestamp_correction_secs: 0,
            mask_bodies: true,
        }
    }
}

impl MboxConfig {
    /// Config for archives whose separator is a numbered `From NNN@xxx` line.
    pub fn numbered_separator() -> Self {
        Self {
            separator: r"^From \d+@xxx".to_string(),
            ..Default::default()
        }
    }

    /// Compile the separator pattern
    pub fn separator_regex(&self) -> Result<Regex> {
        Regex::new(&self.separator).map_err(|err| MboxError::InvalidSeparator {
            pattern: self.separator.clone(),
            reason: err.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.separator_regex()?;
        if let (Some(min), Some(max)) = (self.min_year, self.max_year) {
            if min > max {
                return Err(MboxError::InvalidConfig(format!(
                    "min_year ({min}) must not exceed max_year ({max})"
                )));
            }
        }
        Ok(())
    }

    /// Whether a parsed year is inside the plausibility window
    pub fn year_is_plausible(&self, year: i32) -> bool {
        self.min_year.map_or(true, |min| year >= min) && self.max_year.map_or(true, |max| year <= max)
    }
}
