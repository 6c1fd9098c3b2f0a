use anyhow::{Context, Result};
use archive_protocol::MessageHash;
use archive_render::{ArchiveRenderer, BodySource, FsSink, RenderError, RenderReport};
use archive_store::MessageStore;
use archive_threading::{Thread, TreeBuilder};
use std::path::Path;

/// Serves rendered bodies straight from the store's body files
pub struct StoreBodies<'a> {
    store: &'a MessageStore,
}

impl<'a> StoreBodies<'a> {
    pub fn new(store: &'a MessageStore) -> Self {
        Self { store }
    }
}

impl BodySource for StoreBodies<'_> {
    fn body(&self, hash: &MessageHash) -> archive_render::Result<String> {
        match self.store.read_body(hash) {
            Ok(Some(body)) => Ok(body),
            Ok(None) => Err(RenderError::MissingBody(hash.clone())),
            Err(err) => Err(RenderError::BodyUnavailable {
                hash: hash.clone(),
                reason: err.to_string(),
            }),
        }
    }
}

/// Trees for every committed thread
pub fn build_threads(store: &MessageStore) -> Result<Vec<Thread>> {
    let records = store.iterate_all();
    let threads = TreeBuilder::new(&records)
        .context("Store is not fully resolved; run `resolve` first")?
        .build()
        .context("Failed to build thread trees")?;
    Ok(threads)
}

pub fn render_store(store: &MessageStore, out: &Path) -> Result<RenderReport> {
    let threads = build_threads(store)?;
    let bodies = StoreBodies::new(store);
    let mut sink = FsSink::new(out);
    Ok(ArchiveRenderer::new(&bodies).render(&threads, &mut sink))
}
