//! Stages of a full archive pass. Each mutating stage ends in a store commit.

mod ingest;
mod render;
mod resolve;

pub use ingest::{ingest_mailbox, IngestStats};
pub use render::{build_threads, render_store, StoreBodies};
pub use resolve::{resolve_store, ResolveStats};
