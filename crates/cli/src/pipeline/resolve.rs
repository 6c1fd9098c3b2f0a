use anyhow::{Context, Result};
use archive_store::MessageStore;
use archive_threading::{classify_orphans, ThreadResolver};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    pub messages: usize,
    pub dangling: usize,
    pub ambiguous: usize,

    /// Roots created by breaking reference cycles
    pub forced_roots: usize,

    pub threads: usize,
    pub iterations: usize,
}

/// Full re-resolution: clear, classify and commit, then resolve and commit.
pub fn resolve_store(store: &mut MessageStore) -> Result<ResolveStats> {
    store.clear_resolution();

    let records = store.iterate_all();
    let classification = classify_orphans(&records);
    for hash in classification.flagged() {
        store.mark_no_parent(hash)?;
    }
    store
        .commit()
        .context("Failed to commit orphan classification")?;

    let records = store.iterate_all();
    let resolution = ThreadResolver::new().resolve(&records);
    for hash in &resolution.forced_roots {
        store.mark_no_parent(hash)?;
    }
    for (hash, root) in &resolution.thread_roots {
        store.set_thread_root(hash, root)?;
    }
    store
        .commit()
        .context("Failed to commit thread roots")?;

    Ok(ResolveStats {
        messages: records.len(),
        dangling: classification.dangling.len(),
        ambiguous: classification.ambiguous.len(),
        forced_roots: resolution.forced_roots.len(),
        threads: resolution.thread_count(),
        iterations: resolution.iterations,
    })
}
