use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Payload is a serialized page audit; the tracked metric is
    /// `score.overall`.
    Audit,
    /// Payload is a serialized position report; the tracked metric is
    /// `rank`, with `depth + 1` standing in for "not ranked".
    Position,
}

impl SnapshotKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::Audit => "audit",
            SnapshotKind::Position => "position",
        }
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One immutable measurement of a subject.
///
/// `seq` is the insertion ordinal within `(subject_id, kind)`, assigned by
/// the store on append and used to order snapshots captured at the same
/// instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub subject_id: String,
    pub kind: SnapshotKind,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub seq: u64,
    pub payload: Value,
}

impl Snapshot {
    /// Snapshot captured now.
    #[must_use]
    pub fn new(subject_id: impl Into<String>, kind: SnapshotKind, payload: Value) -> Self {
        Self::captured_at(subject_id, kind, payload, Utc::now())
    }

    #[must_use]
    pub fn captured_at(
        subject_id: impl Into<String>,
        kind: SnapshotKind,
        payload: Value,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            kind,
            captured_at,
            seq: 0,
            payload,
        }
    }
}

/// Subject id of a tracked `(domain, query)` pair. The query is lowercased
/// with whitespace collapsed so trivially different spellings share a
/// history.
#[must_use]
pub fn position_subject(domain: &str, query: &str) -> String {
    let query = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    format!("{}::{query}", domain.trim().to_ascii_lowercase())
}

/// Append-only, subject-keyed snapshot log.
///
/// Appends for different subjects never block each other; reads never
/// mutate.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Durably appends `snapshot` and returns it with its assigned `seq`.
    ///
    /// # Errors
    ///
    /// [`StoreError::StoreWriteFailed`] when the medium is unwritable.
    async fn append(&self, snapshot: Snapshot) -> Result<Snapshot, StoreError>;

    /// The `n` most recent snapshots, newest first; ties on `captured_at`
    /// go to the later insertion.
    async fn latest(
        &self,
        subject_id: &str,
        kind: SnapshotKind,
        n: usize,
    ) -> Result<Vec<Snapshot>, StoreError>;

    /// Snapshots with `since <= captured_at <= until` (open bounds when
    /// `None`), oldest first.
    async fn history(
        &self,
        subject_id: &str,
        kind: SnapshotKind,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Snapshot>, StoreError>;
}

/// Newest-first ordering shared by store implementations.
pub(crate) fn sort_newest_first(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| {
        b.captured_at
            .cmp(&a.captured_at)
            .then_with(|| b.seq.cmp(&a.seq))
    });
}

pub(crate) fn sort_oldest_first(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| {
        a.captured_at
            .cmp(&b.captured_at)
            .then_with(|| a.seq.cmp(&b.seq))
    });
}

pub(crate) fn within(
    snapshot: &Snapshot,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> bool {
    since.is_none_or(|s| snapshot.captured_at >= s) && until.is_none_or(|u| snapshot.captured_at <= u)
}
