//! Change between a subject's two most recent snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use seoscope_core::AppConfig;

use crate::error::StoreError;
use crate::snapshot::{Snapshot, SnapshotKind, SnapshotStore};

/// Regression thresholds. Both are magnitudes: an audit regresses when the
/// overall score falls by at least `score_drop`, a position when the rank
/// number grows by at least `position_drop`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub score_drop: f64,
    pub position_drop: f64,
}

impl Thresholds {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            score_drop: config.score_drop_threshold,
            position_drop: config.position_drop_threshold,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            score_drop: 5.0,
            position_drop: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Improved,
    Worsened,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub subject_id: String,
    pub kind: SnapshotKind,
    pub previous: f64,
    pub current: f64,
    /// `current - previous` in the metric's own units. For positions a
    /// positive change means the page dropped down the results.
    pub change: f64,
    pub direction: Direction,
    pub regression: bool,
    pub previous_at: DateTime<Utc>,
    pub current_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeltaOutcome {
    Delta(Delta),
    /// Fewer than two snapshots exist; not an error.
    NoBaseline,
}

/// Numeric value tracked for a snapshot: the audit's overall score, or the
/// position rank with an unranked result counted as `depth + 1`.
///
/// # Errors
///
/// [`StoreError::InvalidPayload`] when the payload lacks the fields.
#[allow(clippy::cast_precision_loss)]
pub fn metric(snapshot: &Snapshot) -> Result<f64, StoreError> {
    let invalid = |field: &str| StoreError::InvalidPayload {
        subject_id: snapshot.subject_id.clone(),
        field: field.to_string(),
    };
    match snapshot.kind {
        SnapshotKind::Audit => snapshot
            .payload
            .pointer("/score/overall")
            .and_then(Value::as_f64)
            .ok_or_else(|| invalid("score.overall")),
        SnapshotKind::Position => match snapshot.payload.get("rank") {
            Some(Value::Number(rank)) => rank.as_f64().ok_or_else(|| invalid("rank")),
            Some(Value::Null) | None => snapshot
                .payload
                .get("depth")
                .and_then(Value::as_u64)
                .map(|depth| depth as f64 + 1.0)
                .ok_or_else(|| invalid("depth")),
            Some(_) => Err(invalid("rank")),
        },
    }
}

/// Positive when `change` is an improvement for `kind`.
#[must_use]
pub fn improvement(kind: SnapshotKind, change: f64) -> f64 {
    match kind {
        SnapshotKind::Audit => change,
        SnapshotKind::Position => -change,
    }
}

/// Compares the latest snapshot of `subject_id` against the one before it.
/// Read-only.
///
/// # Errors
///
/// Propagates store read failures and [`StoreError::InvalidPayload`].
pub async fn diff(
    store: &dyn SnapshotStore,
    subject_id: &str,
    kind: SnapshotKind,
    thresholds: &Thresholds,
) -> Result<DeltaOutcome, StoreError> {
    let latest = store.latest(subject_id, kind, 2).await?;
    let [current, previous] = latest.as_slice() else {
        return Ok(DeltaOutcome::NoBaseline);
    };

    let current_value = metric(current)?;
    let previous_value = metric(previous)?;
    let change = current_value - previous_value;

    let direction = match improvement(kind, change) {
        x if x > 0.0 => Direction::Improved,
        x if x < 0.0 => Direction::Worsened,
        _ => Direction::Unchanged,
    };
    let regression = match kind {
        SnapshotKind::Audit => change <= -thresholds.score_drop,
        SnapshotKind::Position => change >= thresholds.position_drop,
    };

    if regression {
        tracing::warn!(subject_id, kind = %kind, change, "regression detected");
    }

    Ok(DeltaOutcome::Delta(Delta {
        subject_id: subject_id.to_string(),
        kind,
        previous: previous_value,
        current: current_value,
        change,
        direction,
        regression,
        previous_at: previous.captured_at,
        current_at: current.captured_at,
    }))
}
