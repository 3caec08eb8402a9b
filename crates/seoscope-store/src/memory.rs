use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::snapshot::{
    sort_newest_first, sort_oldest_first, within, Snapshot, SnapshotKind, SnapshotStore,
};

/// In-process store for tests and one-shot runs. Nothing is persisted.
#[derive(Default)]
pub struct MemorySnapshotStore {
    logs: Mutex<HashMap<(String, SnapshotKind), Vec<Snapshot>>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn subject_log(&self, subject_id: &str, kind: SnapshotKind) -> Vec<Snapshot> {
        let logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        logs.get(&(subject_id.to_string(), kind))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn append(&self, mut snapshot: Snapshot) -> Result<Snapshot, StoreError> {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        let log = logs
            .entry((snapshot.subject_id.clone(), snapshot.kind))
            .or_default();
        snapshot.seq = log.len() as u64;
        log.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn latest(
        &self,
        subject_id: &str,
        kind: SnapshotKind,
        n: usize,
    ) -> Result<Vec<Snapshot>, StoreError> {
        let mut snapshots = self.subject_log(subject_id, kind);
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
            .subject_log(subject_id, kind)
            .into_iter()
            .filter(|s| within(s, since, until))
            .collect();
        sort_oldest_first(&mut snapshots);
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn append_assigns_seq_and_latest_sees_it() {
        let store = MemorySnapshotStore::new();
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let first = store
            .append(Snapshot::captured_at("s", SnapshotKind::Audit, json!(1), at))
            .await
            .unwrap();
        let second = store
            .append(Snapshot::captured_at("s", SnapshotKind::Audit, json!(2), at))
            .await
            .unwrap();

        assert_eq!((first.seq, second.seq), (0, 1));
        let latest = store.latest("s", SnapshotKind::Audit, 1).await.unwrap();
        assert_eq!(latest, vec![second]);
    }

    #[tokio::test]
    async fn subjects_are_isolated() {
        let store = MemorySnapshotStore::new();
        store
            .append(Snapshot::new("a", SnapshotKind::Position, json!({})))
            .await
            .unwrap();
        assert!(store
            .history("b", SnapshotKind::Position, None, None)
            .await
            .unwrap()
            .is_empty());
    }
}
