//! Append-only JSONL result store.
//!
//! One `ResultRecord` per line. Lines are in completion order, not index
//! order; readers key records by `index` and sort when they need order.
//! When an index appears more than once the last line wins.
//!
//! Precondition: appends (dispatch) and `rewrite_all` (rescore) never run
//! against the same store at the same time. The binaries enforce this with
//! a `StoreLock`; library callers must do the same.

use rustc_hash::{FxHashMap, FxHashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{MalformedRecord, StoreError};
use crate::lock::StoreLock;
use crate::models::ResultRecord;

/// How a writer treats existing store contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Keep existing records and append after them
    Append,
    /// Discard existing records first
    Truncate,
}

/// Everything readable from a store, plus the lines that were not.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<ResultRecord>,
    pub malformed: Vec<MalformedRecord>,
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the exclusive store lock (see module docs)
    pub fn lock(&self) -> Result<StoreLock, StoreError> {
        StoreLock::try_acquire(&self.path)
    }

    /// Read every record in file order. A missing store is empty.
    ///
    /// Lines that are not valid UTF-8 or not a valid record are skipped and
    /// reported in `malformed`; they never abort the load.
    pub fn load_all(&self) -> Result<LoadedRecords, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedRecords::default());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let mut loaded = LoadedRecords::default();
        for (i, raw) in bytes.split(|&b| b == b'\n').enumerate() {
            let line_no = i + 1;
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line.trim(),
                Err(e) => {
                    loaded.malformed.push(MalformedRecord {
                        line: line_no,
                        reason: format!("invalid UTF-8: {}", e),
                    });
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<ResultRecord>(line) {
                Ok(record) => loaded.records.push(record),
                Err(e) => loaded.malformed.push(MalformedRecord {
                    line: line_no,
                    reason: e.to_string(),
                }),
            }
        }

        for bad in &loaded.malformed {
            tracing::warn!(store = %self.path.display(), "skipping malformed record at {}", bad);
        }
        Ok(loaded)
    }

    /// Indices that already have a record, built once before dispatch.
    pub fn completed_indices(&self) -> Result<FxHashSet<usize>, StoreError> {
        let loaded = self.load_all()?;
        Ok(loaded.records.iter().map(|r| r.index).collect())
    }

    /// Replace the whole store with `records`, in the given order.
    ///
    /// Writes a sibling temp file and renames it into place, so an
    /// interrupted rewrite leaves the previous contents intact.
    pub fn rewrite_all(&self, records: &[ResultRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let tmp_path = temp_path(&self.path);
        let file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);

        for record in records {
            let line = encode_line(record)?;
            writer
                .write_all(line.as_bytes())
                .map_err(|e| StoreError::io(&tmp_path, e))?;
        }

        let file = writer
            .into_inner()
            .map_err(|e| StoreError::io(&tmp_path, e.into_error()))?;
        file.sync_all().map_err(|e| StoreError::io(&tmp_path, e))?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }

    /// Open the store for concurrent appends.
    pub async fn writer(&self, mode: WriteMode) -> Result<StoreWriter, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Append => options.append(true),
            WriteMode::Truncate => options.write(true).truncate(true),
        };
        let file = options
            .open(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        Ok(StoreWriter {
            file: Mutex::new(file),
            path: self.path.clone(),
        })
    }
}

/// Shared append handle. Each record goes out as one complete line under
/// the mutex and is flushed before the next producer writes.
pub struct StoreWriter {
    file: Mutex<tokio::fs::File>,
    path: PathBuf,
}

impl StoreWriter {
    pub async fn append(&self, record: &ResultRecord) -> Result<(), StoreError> {
        let line = encode_line(record)?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.flush().await.map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

/// Collapse duplicate indices (last occurrence wins) and sort by index.
pub fn latest_by_index(records: Vec<ResultRecord>) -> Vec<ResultRecord> {
    let mut by_index: FxHashMap<usize, ResultRecord> = FxHashMap::default();
    for record in records {
        by_index.insert(record.index, record);
    }
    let mut latest: Vec<ResultRecord> = by_index.into_values().collect();
    latest.sort_by_key(|r| r.index);
    latest
}

fn encode_line(record: &ResultRecord) -> Result<String, StoreError> {
    let mut line = serde_json::to_string(record).map_err(|source| StoreError::Encode {
        index: record.index,
        source,
    })?;
    line.push('\n');
    Ok(line)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, SearchHit};
    use std::sync::Arc;

    fn hit_record(index: usize) -> ResultRecord {
        ResultRecord::from_hit(
            index,
            "Dirty Loops - Next to You",
            SearchHit {
                video_id: Some(format!("vid{}", index)),
                title: Some("Dirty Loops - Next To You".to_string()),
                channel: Some("Dirty Loops".to_string()),
                view_count: Some(42),
            },
        )
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.jsonl"));
        let loaded = store.load_all().unwrap();
        assert!(loaded.records.is_empty());
        assert!(loaded.malformed.is_empty());
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let good = serde_json::to_string(&hit_record(0)).unwrap();
        let contents = format!("{}\nnot json\n\n{{\"index\":1}}\n{}\n", good, good.replace("\"index\":0", "\"index\":2"));
        std::fs::write(&path, contents).unwrap();

        let loaded = ResultStore::new(&path).load_all().unwrap();
        let indices: Vec<usize> = loaded.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(loaded.malformed.len(), 2);
        assert_eq!(loaded.malformed[0].line, 2);
        assert_eq!(loaded.malformed[1].line, 4);
    }

    #[test]
    fn test_load_skips_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let mut bytes = serde_json::to_vec(&hit_record(5)).unwrap();
        bytes.extend_from_slice(b"\n\xff\xfe\n");
        std::fs::write(&path, bytes).unwrap();

        let loaded = ResultStore::new(&path).load_all().unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.malformed.len(), 1);
    }

    #[test]
    fn test_rewrite_all_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.jsonl"));
        store.rewrite_all(&[hit_record(0), hit_record(1), hit_record(2)]).unwrap();
        store.rewrite_all(&[hit_record(7)]).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].index, 7);
        assert!(!temp_path(store.path()).exists());
    }

    #[test]
    fn test_latest_by_index_last_wins() {
        let mut first = hit_record(1);
        first.confidence = Confidence::Low;
        let second = hit_record(1);
        let latest = latest_by_index(vec![hit_record(3), first, hit_record(0), second.clone()]);
        let indices: Vec<usize> = latest.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
        assert_eq!(latest[1], second);
    }

    #[tokio::test]
    async fn test_writer_appends_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("data").join("results.jsonl"));

        let writer = store.writer(WriteMode::Append).await.unwrap();
        writer.append(&hit_record(0)).await.unwrap();
        drop(writer);

        let writer = store.writer(WriteMode::Append).await.unwrap();
        writer.append(&hit_record(1)).await.unwrap();
        drop(writer);
        assert_eq!(store.completed_indices().unwrap().len(), 2);

        let writer = store.writer(WriteMode::Truncate).await.unwrap();
        writer.append(&hit_record(9)).await.unwrap();
        drop(writer);
        let done = store.completed_indices().unwrap();
        assert_eq!(done.len(), 1);
        assert!(done.contains(&9));
    }

    #[tokio::test]
    async fn test_concurrent_appends_stay_whole() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.jsonl"));
        let writer = Arc::new(store.writer(WriteMode::Append).await.unwrap());

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..50 {
            let writer = Arc::clone(&writer);
            tasks.spawn(async move { writer.append(&hit_record(i)).await });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        let loaded = store.load_all().unwrap();
        assert!(loaded.malformed.is_empty());
        assert_eq!(loaded.records.len(), 50);
    }
}
