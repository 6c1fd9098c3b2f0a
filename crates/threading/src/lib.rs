//! # Archive Threading
//!
//! Reconstructs reply threads from unreliable header metadata.
//!
//! ## Architecture
//!
//! ```text
//! MessageRecord[]
//!     │
//!     ├──> Orphan Classifier
//!     │      ├─ dangling references   (no such message id)
//!     │      └─ ambiguous references  (id carried by several messages)
//!     │         => no_parent = true
//!     │
//!     ├──> Thread Resolver (petgraph)
//!     │      ├─ seed: no reference or no_parent
//!     │      ├─ propagate roots level by level along trusted replies
//!     │      └─ on stagnation: root cycle members (tarjan SCC), resume
//!     │
//!     └──> Tree Builder
//!            ├─ children = replies to the node's message id
//!            └─ ordered by timestamp, undated last, ties by hash
//! ```
//!
//! Every stage sorts its input by hash first, so insertion order never
//! changes the outcome.
//!
//! ## Example
//!
//! ```
//! use archive_protocol::{MessageHash, MessageRecord};
//! use archive_threading::reconstruct;
//!
//! let message = |hash: &str, reply_to: Option<&str>| MessageRecord {
//!     hash: MessageHash::new(hash),
//!     message_id: Some(format!("<{hash}@example.org>")),
//!     reply_to: reply_to.map(|id| format!("<{id}@example.org>")),
//!     sender: "someone@example.org".to_string(),
//!     sender_id: None,
//!     recipients: None,
//!     subject: "hello".to_string(),
//!     timestamp: None,
//!     raw_date: None,
//!     source_year: 1996,
//!     no_parent: false,
//!     thread_root: None,
//! };
//!
//! let mut records = vec![message("a", None), message("b", Some("a"))];
//! let pass = reconstruct(&mut records).unwrap();
//! assert_eq!(pass.threads.len(), 1);
//! assert_eq!(pass.threads[0].len(), 2);
//! ```

mod classifier;
mod error;
mod graph;
mod pass;
mod resolver;
mod tree;

pub use classifier::{classify_orphans, Classification};
pub use error::{Result, ThreadingError};
pub use graph::{ReplyGraph, ReplyNode};
pub use pass::{reconstruct, Reconstruction};
pub use resolver::{Resolution, ThreadResolver};
pub use tree::{Thread, ThreadNode, TreeBuilder};
