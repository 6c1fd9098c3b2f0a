use crate::paths::{author_url, message_url, month_url};
use archive_identity::mask_address_with;
use archive_protocol::{MessageHash, MessageRecord};
use archive_threading::{Thread, ThreadNode};
use std::collections::BTreeMap;

pub(crate) const NOT_AVAILABLE: &str = "_N/A_";
pub(crate) const UNKNOWN_DATE: &str = "(Unknown Date)";
pub(crate) const UNKNOWN_SENDER: &str = "(unknown sender)";

/// `@` as rendered in link text; keeps addresses away from naive scrapers
pub(crate) const LINK_AT: &str = "<span>@</span>";

pub(crate) fn escape_chevrons(text: &str) -> String {
    text.replace('<', "\\<").replace('>', "\\>")
}

/// Escaped header value, or `_N/A_` when absent or blank
pub(crate) fn field(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => escape_chevrons(text),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Masked sender with `@` replaced by `at`
pub(crate) fn sender(record: &MessageRecord, at: &str) -> String {
    match mask_address_with(&record.sender, at) {
        Ok(masked) => masked.trim().to_string(),
        Err(_) => UNKNOWN_SENDER.to_string(),
    }
}

pub(crate) fn iso_date(record: &MessageRecord) -> String {
    record
        .datetime()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

pub(crate) fn utc_datetime(record: &MessageRecord) -> String {
    record
        .datetime()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// One list line: date, raw date, subject (linked unless current), sender.
fn thread_item(record: &MessageRecord, depth: usize, link: bool) -> String {
    let subject = escape_chevrons(&record.subject);
    let subject = if link {
        format!("[{}]({})", subject, message_url(record))
    } else {
        subject
    };
    format!(
        "{}+ {} ({}) - {} - _{}_\n",
        "  ".repeat(depth),
        iso_date(record),
        field(record.raw_date.as_deref()),
        subject,
        escape_chevrons(&sender(record, "@"))
    )
}

/// Nested list for a subtree. `current` is rendered without a link.
pub(crate) fn thread_tree(node: &ThreadNode, current: Option<&MessageHash>, depth: usize) -> String {
    let mut md = String::new();
    let mut pending = vec![(node, depth)];
    while let Some((node, mut depth)) = pending.pop() {
        if node.message.no_parent {
            md.push_str(&format!("{}+ _Unknown thread root_\n", "  ".repeat(depth)));
            depth += 1;
        }
        md.push_str(&thread_item(&node.message, depth, current != Some(node.hash())));
        pending.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
    md
}

/// Subject heading plus the full tree, as used by listings.
pub(crate) fn thread_section(thread: &Thread) -> String {
    format!(
        "### {}\n{}",
        escape_chevrons(&thread.root_message().subject),
        thread_tree(&thread.root, None, 0)
    )
}

/// "Return to" links for every month and participant the thread touches.
pub(crate) fn return_links(thread: &Thread) -> String {
    let mut md = String::new();
    for bucket in thread.date_buckets() {
        md.push_str(&format!(
            "+ Return to [{}]({})\n",
            bucket.label(),
            month_url(bucket)
        ));
    }
    md.push('\n');

    let mut authors: BTreeMap<&str, String> = BTreeMap::new();
    for message in thread.messages() {
        authors
            .entry(message.participant())
            .or_insert_with(|| sender(message, LINK_AT));
    }
    for (token, display) in &authors {
        md.push_str(&format!(
            "+ Return to \"[{}]({})\"\n",
            display,
            author_url(token)
        ));
    }
    md
}
