use crate::classifier::{classify_orphans, Classification};
use crate::error::Result;
use crate::resolver::{Resolution, ThreadResolver};
use crate::tree::{Thread, TreeBuilder};
use archive_protocol::MessageRecord;

/// Outcome of one full in-memory pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    pub classification: Classification,
    pub resolution: Resolution,
    pub threads: Vec<Thread>,
}

/// Clear previous results, then classify, resolve and build in order.
///
/// `records` ends up carrying the new `no_parent` flags and thread roots.
pub fn reconstruct(records: &mut [MessageRecord]) -> Result<Reconstruction> {
    for record in records.iter_mut() {
        record.no_parent = false;
        record.thread_root = None;
    }

    let classification = classify_orphans(records);
    classification.apply_to(records);

    let resolution = ThreadResolver::new().resolve(records);
    resolution.apply_to(records);

    let threads = TreeBuilder::new(records)?.build()?;
    Ok(Reconstruction {
        classification,
        resolution,
        threads,
    })
}
