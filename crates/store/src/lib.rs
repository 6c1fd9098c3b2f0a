//! # Archive Store
//!
//! The single source of truth for message metadata.
//!
//! ## Layout
//!
//! ```text
//! <store dir>/
//!     ├── messages.json     schema version + records in hash order
//!     ├── bodies/<hash>.txt masked message bodies
//!     └── store.lock        exclusive advisory lock
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use archive_store::MessageStore;
//!
//! fn main() -> archive_store::Result<()> {
//!     let mut store = MessageStore::open(".list-archive")?;
//!     store.clear_resolution();
//!     store.commit()?;
//!     println!("{} records", store.len());
//!     Ok(())
//! }
//! ```

mod error;
mod lock;
mod persist;
mod stats;
mod store;

pub use error::{Result, StoreError};
pub use stats::StoreStats;
pub use store::{MessageStore, NewMessage, PutOutcome};
