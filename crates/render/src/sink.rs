use crate::error::{RenderError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Destination for rendered documents. Keys are `/`-separated relative paths
/// such as `threads/1996/03.md`.
pub trait DocumentSink {
    fn write(&mut self, key: &str, contents: &str) -> Result<()>;
}

/// Writes each document under a root directory, creating parents as needed.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

impl DocumentSink for FsSink {
    fn write(&mut self, key: &str, contents: &str) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| RenderError::io(parent, err))?;
        }
        fs::write(&path, contents).map_err(|err| RenderError::io(&path, err))
    }
}

/// Keeps documents in memory, keyed and ordered by path.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    documents: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.documents.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn into_documents(self) -> BTreeMap<String, String> {
        self.documents
    }
}

impl DocumentSink for MemorySink {
    fn write(&mut self, key: &str, contents: &str) -> Result<()> {
        self.documents.insert(key.to_string(), contents.to_string());
        Ok(())
    }
}
