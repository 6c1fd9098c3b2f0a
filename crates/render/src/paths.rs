//! Document keys and the site URLs that link to them.

use archive_protocol::{DateBucket, MessageRecord};

pub const AUTHOR_INDEX_KEY: &str = "authors/index.md";

pub fn month_key(bucket: DateBucket) -> String {
    format!("threads/{}/{}.md", bucket.year, bucket.month_segment())
}

pub fn message_key(record: &MessageRecord) -> String {
    let bucket = record.bucket();
    format!(
        "archive/{}/{}/{}.md",
        bucket.year,
        bucket.month_segment(),
        record.hash
    )
}

pub fn author_key(token: &str) -> String {
    format!("authors/{token}.md")
}

pub fn year_key(year: i32) -> String {
    format!("years/{year}.md")
}

pub fn month_url(bucket: DateBucket) -> String {
    format!("/archive/{}/{}/", bucket.year, bucket.month_segment())
}

pub fn message_url(record: &MessageRecord) -> String {
    let bucket = record.bucket();
    format!(
        "/archive/{}/{}/{}",
        bucket.year,
        bucket.month_segment(),
        record.hash
    )
}

pub fn author_url(token: &str) -> String {
    format!("/authors/{token}/")
}

pub fn year_url(year: i32) -> String {
    format!("/archive/{year}/")
}
