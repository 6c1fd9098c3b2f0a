//! Best-effort recovery of timestamps from legacy Date headers.
//!
//! Old archives carry dates in every shape mail software ever produced:
//! RFC 822 with US zone names, ctime order, two-digit years, mangled relay
//! text around the real date. The heuristic below tries a fixed ladder of
//! interpretations and gives up with `None` rather than guessing further.

use crate::config::MboxConfig;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

const ZONE_OFFSETS: &[(&str, &str)] = &[
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("PPE", "-0700"),
    ("GMT", "+0000"),
    ("UTC", "+0000"),
    ("UT", "+0000"),
    ("Z", "+0000"),
];

const ZONED_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%a, %d %b %y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%d %b %y %H:%M:%S %z",
    "%d %b %y %H:%M %z",
    "%a %b %d %H:%M:%S %Y %z",
    "%a %b %d %H:%M:%S %z %Y",
    "%b %d %H:%M:%S %Y %z",
    "%b %d %H:%M:%S %z %Y",
    "%Y-%m-%d %H:%M:%S %z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%d %b %y %H:%M:%S",
    "%a %b %d %H:%M:%S %Y",
    "%b %d %H:%M:%S %Y",
    "%Y-%m-%d %H:%M:%S",
];

static COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").expect("comment regex"));

static ZONE_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(EST|EDT|CST|CDT|MST|MDT|PST|PDT|PPE|GMT|UTC|UT|Z)\b").expect("zone regex")
});

static NUMERIC_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+-]\d{4}\b").expect("offset regex"));

static LEADING_WEEKDAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{3,9},?\s+").expect("weekday regex"));

static TRAILING_ALPHA_ZONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+[A-Za-z]{1,5}$").expect("trailing zone regex"));

static EMBEDDED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\d{1,2}\s+[A-Za-z]{3}\s+\d{2,4}\s+\d{1,2}:\d{2}(?::\d{2})?(?:\s+(?:[+-]\d{4}|[A-Za-z]{1,4}\b))?",
    )
    .expect("embedded date regex")
});

static FOUR_DIGIT_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year regex"));

/// Timestamp and fallback year derived for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedDate {
    /// UTC unix seconds, correction applied
    pub timestamp: Option<i64>,
    pub source_year: i32,
}

/// Parse a legacy Date header. `None` when no interpretation fits.
pub fn parse_legacy_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return None;
    }

    attempt(&cleaned)
        .or_else(|| {
            EMBEDDED_DATE
                .find(&cleaned)
                .and_then(|m| attempt(m.as_str()))
        })
        .or_else(|| attempt(&cleaned.to_uppercase()))
}

/// Derive the canonical timestamp and source year for a message.
///
/// A parsed date outside the configured year window is discarded. The source
/// year then comes from the first plausible year in the Date header, else the
/// separator line, else `fallback_year`.
pub fn derive_date(
    raw_date: Option<&str>,
    separator: Option<&str>,
    config: &MboxConfig,
) -> DerivedDate {
    if let Some(parsed) = raw_date.and_then(parse_legacy_date) {
        let year = parsed.year();
        if config.year_is_plausible(year) {
            return DerivedDate {
                timestamp: Some(parsed.timestamp() + config.timestamp_correction_secs),
                source_year: year,
            };
        }
        log::debug!("Discarding implausible date {raw_date:?} (year {year})");
    }

    let source_year = raw_date
        .and_then(|raw| plausible_year(raw, config))
        .or_else(|| separator.and_then(|line| plausible_year(line, config)))
        .unwrap_or(config.fallback_year);

    DerivedDate {
        timestamp: None,
        source_year,
    }
}

fn plausible_year(text: &str, config: &MboxConfig) -> Option<i32> {
    FOUR_DIGIT_YEAR
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<i32>().ok())
        .find(|year| config.year_is_plausible(*year))
}

fn clean(raw: &str) -> String {
    let without_comments = COMMENTS.replace_all(raw, " ");
    without_comments
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', ','])
        .to_string()
}

fn attempt(text: &str) -> Option<DateTime<FixedOffset>> {
    let numeric = numeric_zone(text);
    let without_weekday = LEADING_WEEKDAY.replace(&numeric, "").into_owned();

    for candidate in [text, numeric.as_str(), without_weekday.as_str()] {
        if let Ok(dt) = DateTime::parse_from_rfc2822(candidate) {
            return Some(dt);
        }
    }

    for candidate in [numeric.as_str(), without_weekday.as_str()] {
        for format in ZONED_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(candidate, format) {
                return Some(dt);
            }
        }
    }

    // Zone-less (or unknown zone) forms are read as UTC.
    let zoneless = TRAILING_ALPHA_ZONE.replace(&without_weekday, "").into_owned();
    let with_weekday_zoneless = TRAILING_ALPHA_ZONE.replace(&numeric, "").into_owned();
    for candidate in [
        numeric.as_str(),
        without_weekday.as_str(),
        zoneless.as_str(),
        with_weekday_zoneless.as_str(),
    ] {
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(candidate, format) {
                return Some(naive.and_utc().fixed_offset());
            }
        }
    }

    None
}

/// Swap zone abbreviations for numeric offsets. When a numeric offset is
/// already present the abbreviation is redundant and dropped instead.
fn numeric_zone(text: &str) -> String {
    let has_offset = NUMERIC_OFFSET.is_match(text);
    let replaced = ZONE_WORD.replace_all(text, |caps: &regex::Captures<'_>| {
        if has_offset {
            return String::new();
        }
        let word = &caps[1];
        ZONE_OFFSETS
            .iter()
            .find(|(name, _)| *name == word)
            .map(|(_, offset)| (*offset).to_string())
            .unwrap_or_default()
    });
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> Option<i64> {
        parse_legacy_date(raw).map(|dt| dt.timestamp())
    }

    #[test]
    fn parses_rfc2822() {
        assert_eq!(ts("Tue, 1 Jul 2003 10:52:37 +0200"), Some(1_057_049_557));
    }

    #[test]
    fn parses_us_zone_names() {
        assert_eq!(ts("Mon, 15 Jan 1996 14:03:00 EST"), Some(821_732_580));
        assert_eq!(ts("15 Jan 96 14:03 PST"), Some(821_743_380));
    }

    #[test]
    fn drops_comments_and_redundant_zone_names() {
        assert_eq!(ts("Fri, 5 Apr 1996 10:00:00 -0500 (EST)"), Some(828_716_400));
        assert_eq!(ts("Fri, 5 Apr 1996 10:00:00 -0500 EST"), Some(828_716_400));
    }

    #[test]
    fn parses_ctime_order() {
        assert_eq!(ts("Thu Feb 1 09:00:00 EST 1996"), Some(823_183_200));
        assert_eq!(ts("Thu Feb  1 09:00:00 1996"), Some(823_165_200));
    }

    #[test]
    fn tolerates_wrong_weekday() {
        // 5 Apr 1996 was a Friday.
        assert_eq!(ts("Mon, 5 Apr 1996 10:00:00 -0500"), Some(828_716_400));
    }

    #[test]
    fn finds_date_embedded_in_relay_noise() {
        assert_eq!(
            ts("from mail.example.com by relay with SMTPSun, 12 Mar 1995 10:11:12 -0500 for karn"),
            Some(795_021_072)
        );
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(ts("sometime last week"), None);
        assert_eq!(ts(""), None);
    }

    #[test]
    fn derive_applies_correction_and_year() {
        let config = MboxConfig {
            timestamp_correction_secs: 3600,
            ..Default::default()
        };
        let derived = derive_date(Some("Tue, 1 Jul 2003 10:52:37 +0200"), None, &config);
        assert_eq!(derived.timestamp, Some(1_057_049_557 + 3600));
        assert_eq!(derived.source_year, 2003);
    }

    #[test]
    fn derive_discards_implausible_year() {
        let config = MboxConfig {
            min_year: Some(1992),
            max_year: Some(1998),
            ..Default::default()
        };
        let derived = derive_date(
            Some("Wed, 6 Jan 1999 10:00:00 +0000"),
            Some("From 17@xxx Sat Jan  6 10:00:00 1996"),
            &config,
        );
        assert_eq!(derived.timestamp, None);
        assert_eq!(derived.source_year, 1996);
    }

    #[test]
    fn derive_falls_back_to_raw_year_then_default() {
        let config = MboxConfig::default();
        let from_raw = derive_date(Some("sometime in 1994"), None, &config);
        assert_eq!(from_raw, DerivedDate { timestamp: None, source_year: 1994 });

        let fallback = derive_date(None, None, &config);
        assert_eq!(fallback.source_year, config.fallback_year);
    }
}
