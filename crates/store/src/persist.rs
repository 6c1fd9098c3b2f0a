use crate::{Result, StoreError};
use archive_protocol::{MessageHash, MessageRecord, RECORD_SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const RECORDS_FILE_NAME: &str = "messages.json";
const BODIES_DIR_NAME: &str = "bodies";

#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecords {
    schema_version: u32,
    committed_at_unix_ms: u64,
    records: Vec<MessageRecord>,
}

#[derive(Serialize)]
struct PersistedRecordsRef<'a> {
    schema_version: u32,
    committed_at_unix_ms: u64,
    records: Vec<&'a MessageRecord>,
}

pub(crate) fn records_path(dir: &Path) -> PathBuf {
    dir.join(RECORDS_FILE_NAME)
}

pub(crate) fn bodies_dir(dir: &Path) -> PathBuf {
    dir.join(BODIES_DIR_NAME)
}

pub(crate) fn body_path(dir: &Path, hash: &MessageHash) -> PathBuf {
    bodies_dir(dir).join(format!("{}.txt", hash.as_str()))
}

/// Write the full record set. The temporary sibling is renamed over the
/// previous file, so readers see either the old or the new set, never a mix.
pub(crate) fn write_records(
    dir: &Path,
    records: &BTreeMap<MessageHash, MessageRecord>,
) -> Result<()> {
    let path = records_path(dir);
    let persisted = PersistedRecordsRef {
        schema_version: RECORD_SCHEMA_VERSION,
        committed_at_unix_ms: unix_now_ms(),
        records: records.values().collect(),
    };

    let bytes = serde_json::to_vec_pretty(&persisted)?;
    write_atomic(&path, &bytes)
}

pub(crate) fn read_records(dir: &Path) -> Result<BTreeMap<MessageHash, MessageRecord>> {
    let path = records_path(dir);
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let bytes = fs::read(&path)?;
    let persisted: PersistedRecords = serde_json::from_slice(&bytes)?;
    if persisted.schema_version != RECORD_SCHEMA_VERSION {
        return Err(StoreError::SchemaVersion {
            found: persisted.schema_version,
            expected: RECORD_SCHEMA_VERSION,
        });
    }

    Ok(persisted
        .records
        .into_iter()
        .map(|record| (record.hash.clone(), record))
        .collect())
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
