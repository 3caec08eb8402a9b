use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;
use crate::snapshot::{
    sort_newest_first, sort_oldest_first, within, Snapshot, SnapshotKind, SnapshotStore,
};

/// Next `seq` for a subject log, `None` until the log has been read once.
type SubjectLock = Arc<tokio::sync::Mutex<Option<u64>>>;

/// JSON-lines snapshot store: one file per `(kind, subject)` at
/// `{root}/{kind}/{sha256(subject_id)}.jsonl`, one snapshot per line.
///
/// Each append is written and fsync'ed under a lock scoped to that file, so
/// appends for different subjects proceed in parallel.
pub struct FileSnapshotStore {
    root: PathBuf,
    locks: Mutex<HashMap<PathBuf, SubjectLock>>,
}

impl FileSnapshotStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the log holding `subject_id`'s snapshots of `kind`.
    #[must_use]
    pub fn subject_path(&self, subject_id: &str, kind: SnapshotKind) -> PathBuf {
        let digest = Sha256::digest(subject_id.as_bytes());
        self.root
            .join(kind.as_str())
            .join(format!("{digest:x}.jsonl"))
    }

    fn lock_for(&self, path: &Path) -> SubjectLock {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    async fn read_subject(
        &self,
        subject_id: &str,
        kind: SnapshotKind,
    ) -> Result<Vec<Snapshot>, StoreError> {
        let path = self.subject_path(subject_id, kind);
        let content = read_log(&path).await?;
        Ok(parse_log(&content, &path, subject_id))
    }
}

/// Raw log content; a missing file reads as empty. Invalid UTF-8 from a
/// torn multi-byte write is replaced rather than failing the whole read.
async fn read_log(path: &Path) -> Result<String, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(StoreError::Read {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

/// Parses a subject log, skipping lines that are not valid snapshots (for
/// example a torn final line after a crash) or belong to another subject.
fn parse_log(content: &str, path: &Path, subject_id: &str) -> Vec<Snapshot> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match serde_json::from_str::<Snapshot>(line) {
            Ok(snapshot) if snapshot.subject_id == subject_id => Some(snapshot),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "skipping unreadable snapshot line"
                );
                None
            }
        })
        .collect()
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn append(&self, mut snapshot: Snapshot) -> Result<Snapshot, StoreError> {
        let path = self.subject_path(&snapshot.subject_id, snapshot.kind);
        let write_failed = |source: std::io::Error| StoreError::StoreWriteFailed {
            path: path.display().to_string(),
            source,
        };

        let lock = self.lock_for(&path);
        let mut next_seq = lock.lock().await;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        // A log not yet seen by this lock may end in a fragment left by a
        // crash or a failed write; the new record must start on its own line.
        let (seq, torn_tail) = match *next_seq {
            Some(seq) => (seq, false),
            None => {
                let content = read_log(&path).await?;
                let seq = parse_log(&content, &path, &snapshot.subject_id)
                    .iter()
                    .map(|s| s.seq + 1)
                    .max()
                    .unwrap_or(0);
                (seq, !content.is_empty() && !content.ends_with('\n'))
            }
        };
        snapshot.seq = seq;

        let mut line = Vec::new();
        if torn_tail {
            tracing::warn!(
                path = %path.display(),
                "log ends in a partial line; starting a new one"
            );
            line.push(b'\n');
        }
        serde_json::to_writer(&mut line, &snapshot)?;
        line.push(b'\n');

        let written = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            file.write_all(&line).await?;
            file.sync_data().await
        }
        .await;
        if let Err(e) = written {
            // The file may now hold part of `line`; re-check it next time.
            *next_seq = None;
            return Err(write_failed(e));
        }

        *next_seq = Some(seq + 1);
        tracing::debug!(
            subject_id = %snapshot.subject_id,
            kind = %snapshot.kind,
            seq,
            "snapshot appended"
        );
        Ok(snapshot)
    }

    async fn latest(
        &self,
        subject_id: &str,
        kind: SnapshotKind,
        n: usize,
    ) -> Result<Vec<Snapshot>, StoreError> {
        let mut snapshots = self.read_subject(subject_id, kind).await?;
        sort_newest_first(&mut snapshots);
        snapshots.truncate(n);
        Ok(snapshots)
    }

    async fn history(
        &self,
        subject_id: &str,
        kind: SnapshotKind,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Snapshot>, StoreError> {
        let mut snapshots: Vec<Snapshot> = self
            .read_subject(subject_id, kind)
            .await?
            .into_iter()
            .filter(|s| within(s, since, until))
            .collect();
        sort_oldest_first(&mut snapshots);
        Ok(snapshots)
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
