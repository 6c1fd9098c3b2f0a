use crate::bodies::BodySource;
use crate::error::Result;
use crate::markdown::{
    escape_chevrons, field, iso_date, return_links, sender, thread_section, thread_tree,
    utc_datetime, LINK_AT,
};
use crate::paths::{
    author_key, author_url, message_key, month_key, month_url, year_key, year_url,
    AUTHOR_INDEX_KEY,
};
use crate::report::RenderReport;
use crate::sink::DocumentSink;
use archive_protocol::{DateBucket, MessageRecord};
use archive_threading::Thread;
use std::collections::{BTreeMap, BTreeSet};

/// Posts and threads for one participant token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorSummary<'a> {
    pub token: &'a str,
    pub display: String,
    pub posts: usize,
    pub threads: Vec<&'a Thread>,
}

/// Group participants across the forest. Threads keep forest order.
pub fn collect_authors(threads: &[Thread]) -> BTreeMap<&str, AuthorSummary<'_>> {
    let mut authors: BTreeMap<&str, AuthorSummary<'_>> = BTreeMap::new();
    for thread in threads {
        let mut seen = BTreeSet::new();
        for message in thread.messages() {
            let token = message.participant();
            let author = authors.entry(token).or_insert_with(|| AuthorSummary {
                token,
                display: sender(message, LINK_AT),
                posts: 0,
                threads: Vec::new(),
            });
            author.posts += 1;
            if seen.insert(token) {
                author.threads.push(thread);
            }
        }
    }
    authors
}

/// Authors by descending post count, ties by token
pub fn rank_authors<'a, 'b>(authors: &'b BTreeMap<&'a str, AuthorSummary<'a>>) -> Vec<&'b AuthorSummary<'a>> {
    let mut ranked: Vec<_> = authors.values().collect();
    ranked.sort_by(|a, b| b.posts.cmp(&a.posts).then_with(|| a.token.cmp(b.token)));
    ranked
}

/// Walks built threads and emits the archive's Markdown documents.
///
/// Per-document failures are collected in the [`RenderReport`]; rendering
/// carries on with the remaining documents.
pub struct ArchiveRenderer<'a> {
    bodies: &'a dyn BodySource,
}

impl<'a> ArchiveRenderer<'a> {
    pub fn new(bodies: &'a dyn BodySource) -> Self {
        Self { bodies }
    }

    pub fn render(&self, threads: &[Thread], sink: &mut dyn DocumentSink) -> RenderReport {
        let mut report = RenderReport::default();

        // Listed under every month any of its messages falls in
        let mut months: BTreeMap<DateBucket, Vec<&Thread>> = BTreeMap::new();
        for thread in threads {
            for bucket in thread.date_buckets() {
                months.entry(bucket).or_default().push(thread);
            }
        }

        for (&bucket, listed) in &months {
            let key = month_key(bucket);
            report.record(&key, sink.write(&key, &month_page(bucket, listed)));
        }

        for thread in threads {
            for message in thread.messages() {
                let key = message_key(message);
                let result = self
                    .message_page(thread, message)
                    .and_then(|page| sink.write(&key, &page));
                report.record(&key, result);
            }
        }

        let authors = collect_authors(threads);
        for author in authors.values() {
            let key = author_key(author.token);
            report.record(&key, sink.write(&key, &author_page(author)));
        }
        report.record(
            AUTHOR_INDEX_KEY,
            sink.write(AUTHOR_INDEX_KEY, &author_index(&rank_authors(&authors))),
        );

        let mut years: BTreeMap<i32, Vec<DateBucket>> = BTreeMap::new();
        for &bucket in months.keys() {
            years.entry(bucket.year).or_default().push(bucket);
        }
        for (&year, buckets) in &years {
            let key = year_key(year);
            report.record(&key, sink.write(&key, &year_page(year, buckets)));
        }

        log::info!(
            "Rendered {} documents for {} threads across {} months ({} failures)",
            report.documents,
            threads.len(),
            months.len(),
            report.failures.len()
        );
        report
    }

    fn message_page(&self, thread: &Thread, message: &MessageRecord) -> Result<String> {
        let body = self.bodies.body(&message.hash)?;
        let date = iso_date(message);
        let subject = escape_chevrons(&message.subject);

        let mut md = String::new();
        md.push_str("---\nlayout: default\ntitle: >\n");
        md.push_str(&format!("    {} - {}\n---\n\n", date, subject));
        md.push_str(&format!("# {} - {}\n\n", date, subject));

        md.push_str("## Header Data\n\n");
        md.push_str(&format!(
            "From: {}<br>\n",
            escape_chevrons(&sender(message, "@"))
        ));
        md.push_str(&format!("Message Hash: {}<br>\n", message.hash));
        md.push_str(&format!(
            "Message ID: {}<br>\n",
            field(message.message_id.as_deref())
        ));
        md.push_str(&format!(
            "Reply To: {}<br>\n",
            field(message.reply_to.as_deref())
        ));
        md.push_str(&format!("UTC Datetime: {}<br>\n", utc_datetime(message)));
        md.push_str(&format!(
            "Raw Date: {}<br>\n\n",
            field(message.raw_date.as_deref())
        ));

        md.push_str("## Raw message\n\n```\n{% raw %}");
        md.push_str(&body);
        md.push_str("{% endraw %}\n```\n\n");

        md.push_str("## Thread\n\n");
        md.push_str(&return_links(thread));
        md.push('\n');
        md.push_str(&thread_tree(&thread.root, Some(&message.hash), 0));
        Ok(md)
    }
}

fn month_page(bucket: DateBucket, threads: &[&Thread]) -> String {
    let label = bucket.label();
    let mut md = String::new();
    md.push_str(&format!(
        "---\nlayout: default\ntitle: {}\npermalink: {}\n---\n\n",
        label,
        month_url(bucket)
    ));
    md.push_str(&format!("# {}\n\n", label));
    md.push_str(
        "_Dates are calculated as the UTC date. The \"raw date\" from the email dump is \
         included in brackets. The date may be inconsistent with the raw date because of \
         the time difference with UTC time._\n\n",
    );
    md.push_str("_Ordering by UTC time ensures true chronological ordering._\n\n");
    md.push_str("## Threads\n\n");
    for thread in threads {
        md.push_str(&thread_section(thread));
        md.push('\n');
    }
    md
}

fn author_page(author: &AuthorSummary<'_>) -> String {
    let noun = if author.posts == 1 { "post" } else { "posts" };
    let mut md = String::new();
    md.push_str(&format!(
        "---\nlayout: default\nsender_id: {}\npost_count: {}\npermalink: {}\n---\n\n",
        author.token,
        author.posts,
        author_url(author.token)
    ));
    md.push_str(&format!("# {} ({} {})\n\n", author.display, author.posts, noun));
    md.push_str(
        "_Many list participants used several addresses over their time on the list, \
         so this page may not contain every thread they took part in._\n\n",
    );
    md.push_str("## Threads\n\n");
    for thread in &author.threads {
        md.push_str(&thread_section(thread));
        md.push('\n');
    }
    md
}

fn author_index(ranked: &[&AuthorSummary<'_>]) -> String {
    let mut md = String::new();
    md.push_str(
        "---\nlayout: default\npermalink: /authors/\ntitle: Authors by Number of Posts\n---\n\n",
    );
    md.push_str("# Authors by Number of Posts (Highest First)\n\n");
    for author in ranked {
        md.push_str(&format!(
            "+ [{}]({}) - _{} posts_\n",
            author.display,
            author_url(author.token),
            author.posts
        ));
    }
    md
}

fn year_page(year: i32, buckets: &[DateBucket]) -> String {
    let mut md = String::new();
    md.push_str(&format!(
        "---\nlayout: default\ntitle: {}\npermalink: {}\n---\n\n",
        year,
        year_url(year)
    ));
    md.push_str(&format!("# {}\n\n", year));
    md.push_str("Select one of the months below to view a list of threads:\n\n");
    for &bucket in buckets {
        md.push_str(&format!(
            "+ [{}]({})\n",
            bucket.month_name(),
            month_url(bucket)
        ));
    }
    md
}
