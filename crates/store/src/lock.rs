use crate::{Result, StoreError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE_NAME: &str = "store.lock";

/// Exclusive advisory lock held for the lifetime of an open store.
pub(crate) struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

pub(crate) fn lock_path_for_dir(dir: &Path) -> PathBuf {
    dir.join(LOCK_FILE_NAME)
}

/// Take the store lock without waiting. A lock held elsewhere surfaces as
/// [`StoreError::Locked`].
pub(crate) fn acquire_store_lock(dir: &Path) -> Result<StoreLock> {
    let path = lock_path_for_dir(dir);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&path)
        .map_err(|err| StoreError::Other(format!("open store lock {}: {err}", path.display())))?;

    match file.try_lock_exclusive() {
        Ok(()) => {
            log::debug!("Acquired store lock {}", path.display());
            Ok(StoreLock { file, path })
        }
        Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
            Err(StoreError::Locked(dir.to_path_buf()))
        }
        Err(err) => Err(StoreError::Other(format!(
            "acquire store lock {}: {err}",
            path.display()
        ))),
    }
}
