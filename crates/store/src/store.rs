use crate::lock::{acquire_store_lock, StoreLock};
use crate::persist::{
    bodies_dir, body_path, read_records, records_path, write_atomic, write_records,
};
use crate::stats::StoreStats;
use crate::{Result, StoreError};
use archive_protocol::{MessageHash, MessageRecord};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Fields supplied at ingestion. Resolution fields start unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub hash: MessageHash,
    pub message_id: Option<String>,
    pub reply_to: Option<String>,
    pub sender: String,
    pub sender_id: Option<String>,
    pub recipients: Option<String>,
    pub subject: String,
    pub timestamp: Option<i64>,
    pub raw_date: Option<String>,
    pub source_year: i32,
}

impl From<NewMessage> for MessageRecord {
    fn from(msg: NewMessage) -> Self {
        Self {
            hash: msg.hash,
            message_id: msg.message_id,
            reply_to: msg.reply_to,
            sender: msg.sender,
            sender_id: msg.sender_id,
            recipients: msg.recipients,
            subject: msg.subject,
            timestamp: msg.timestamp,
            raw_date: msg.raw_date,
            source_year: msg.source_year,
            no_parent: false,
            thread_root: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    Duplicate,
}

/// Append-only message records keyed by content hash.
///
/// All mutations are staged in memory; [`commit`](Self::commit) makes them
/// durable in one atomic replace. Dropping the store without committing
/// discards the staged changes. The store directory stays locked while the
/// value lives.
pub struct MessageStore {
    dir: PathBuf,
    records: BTreeMap<MessageHash, MessageRecord>,
    dirty: bool,
    lock: StoreLock,
}

impl MessageStore {
    /// Open (creating if needed) the store in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let lock = acquire_store_lock(&dir)?;
        let records = read_records(&dir)?;
        log::info!(
            "Opened message store {} ({} records)",
            dir.display(),
            records.len()
        );
        Ok(Self {
            dir,
            records,
            dirty: false,
            lock,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Insert a record. Re-inserting a known hash is a silent no-op.
    pub fn put(&mut self, msg: NewMessage) -> PutOutcome {
        if self.records.contains_key(&msg.hash) {
            log::debug!("Duplicate message {}", msg.hash.short());
            return PutOutcome::Duplicate;
        }
        let record = MessageRecord::from(msg);
        self.records.insert(record.hash.clone(), record);
        self.dirty = true;
        PutOutcome::Inserted
    }

    /// Store a message body next to the records. Bodies are content-addressed
    /// by the message hash, so an existing file is left untouched.
    pub fn put_body(&self, hash: &MessageHash, body: &str) -> Result<()> {
        let path = body_path(&self.dir, hash);
        if path.exists() {
            return Ok(());
        }
        write_atomic(&path, body.as_bytes())
    }

    pub fn read_body(&self, hash: &MessageHash) -> Result<Option<String>> {
        let path = body_path(&self.dir, hash);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn mark_no_parent(&mut self, hash: &MessageHash) -> Result<()> {
        let record = self
            .records
            .get_mut(hash)
            .ok_or_else(|| StoreError::UnknownMessage(hash.clone()))?;
        if !record.no_parent {
            record.no_parent = true;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn set_thread_root(&mut self, hash: &MessageHash, root: &MessageHash) -> Result<()> {
        if !self.records.contains_key(root) {
            return Err(StoreError::UnknownMessage(root.clone()));
        }
        let record = self
            .records
            .get_mut(hash)
            .ok_or_else(|| StoreError::UnknownMessage(hash.clone()))?;
        if record.thread_root.as_ref() != Some(root) {
            record.thread_root = Some(root.clone());
            self.dirty = true;
        }
        Ok(())
    }

    /// Forget every classification and resolution result ahead of a full pass.
    pub fn clear_resolution(&mut self) {
        for record in self.records.values_mut() {
            if record.no_parent || record.thread_root.is_some() {
                record.no_parent = false;
                record.thread_root = None;
                self.dirty = true;
            }
        }
    }

    pub fn get(&self, hash: &MessageHash) -> Option<&MessageRecord> {
        self.records.get(hash)
    }

    pub fn contains(&self, hash: &MessageHash) -> bool {
        self.records.contains_key(hash)
    }

    /// Records in hash order
    pub fn iter(&self) -> impl Iterator<Item = &MessageRecord> {
        self.records.values()
    }

    /// Owned snapshot of every record, in hash order
    pub fn iterate_all(&self) -> Vec<MessageRecord> {
        self.records.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Staged changes not yet committed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats::from_records(self.records.values())
    }

    /// Make every staged change durable.
    pub fn commit(&mut self) -> Result<()> {
        if !self.dirty && records_path(&self.dir).exists() {
            return Ok(());
        }
        write_records(&self.dir, &self.records)?;
        self.dirty = false;
        log::debug!("Committed {} records to {}", self.records.len(), self.dir.display());
        Ok(())
    }

    /// Release the store. Uncommitted changes are discarded.
    pub fn close(self) {
        if self.dirty {
            log::warn!(
                "Closing message store {} with uncommitted changes; they are discarded",
                self.dir.display()
            );
        }
        log::debug!("Releasing {}", self.lock.path().display());
    }

    /// Delete every record and body, committed immediately.
    pub fn reset(&mut self) -> Result<()> {
        let bodies = bodies_dir(&self.dir);
        if bodies.exists() {
            fs::remove_dir_all(&bodies)?;
        }
        self.records.clear();
        self.dirty = true;
        self.commit()?;
        log::info!("Reset message store {}", self.dir.display());
        Ok(())
    }
}
