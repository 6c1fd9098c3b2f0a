//! # Archive Render
//!
//! Turns reconstructed threads into a Markdown page tree for a static site
//! generator (Jekyll front matter on every page).
//!
//! ## Documents
//!
//! ```text
//! threads/{year}/{MM|unknown}.md          month listing, one nested list per thread
//! archive/{year}/{MM|unknown}/{hash}.md   message page with header data, body and thread
//! authors/{token}.md                      every thread a participant posted in
//! authors/index.md                        participants by descending post count
//! years/{year}.md                         months of the year
//! ```
//!
//! Sender addresses only ever appear masked. Header values have `<` and `>`
//! escaped and render as `_N/A_` when missing.

mod bodies;
mod error;
mod markdown;
pub mod paths;
mod renderer;
mod report;
mod sink;

pub use bodies::BodySource;
pub use error::{RenderError, Result};
pub use renderer::{collect_authors, rank_authors, ArchiveRenderer, AuthorSummary};
pub use report::{RenderFailure, RenderReport};
pub use sink::{DocumentSink, FsSink, MemorySink};
