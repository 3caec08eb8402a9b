//! Windowed trend summaries across many subjects.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::delta::{improvement, metric};
use crate::error::StoreError;
use crate::snapshot::{SnapshotKind, SnapshotStore};

/// Inclusive capture-time window; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl Window {
    /// The `days` days up to and including `now`.
    #[must_use]
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Self {
        Self {
            since: Some(now - Duration::days(i64::from(days))),
            until: Some(now),
        }
    }
}

/// Trend in terms of improvement: `Up` means the score rose or the page
/// climbed to a better (lower) rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub subject_id: String,
    pub sample_count: usize,
    pub first: Option<f64>,
    pub last: Option<f64>,
    pub trend: Trend,
    /// `|last - first|`.
    pub magnitude: f64,
    /// Why this subject's history could not be read. Such a summary carries
    /// no samples and never counts as a mover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubjectSummary {
    /// Signed improvement from first to last sample.
    #[must_use]
    pub fn improvement(&self, kind: SnapshotKind) -> f64 {
        match (self.first, self.last) {
            (Some(first), Some(last)) => improvement(kind, last - first),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub subject_id: String,
    pub improvement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub kind: SnapshotKind,
    pub window: Window,
    pub summaries: Vec<SubjectSummary>,
    pub best_mover: Option<Mover>,
    pub worst_mover: Option<Mover>,
}

/// Folds every subject's snapshots inside `window` into a summary, in the
/// order of `subject_ids`.
///
/// Subjects with no samples are reported with `sample_count = 0`; only
/// subjects with at least two samples compete for best/worst mover. A
/// subject whose history cannot be read, or holds a payload without its
/// metric, is reported with `error` set instead of failing the report.
pub async fn aggregate(
    store: &dyn SnapshotStore,
    subject_ids: &[String],
    kind: SnapshotKind,
    window: Window,
) -> Report {
    let mut summaries = Vec::with_capacity(subject_ids.len());
    for subject_id in subject_ids {
        match subject_values(store, subject_id, kind, window).await {
            Ok(values) => summaries.push(summarize(subject_id, kind, &values)),
            Err(e) => {
                tracing::warn!(
                    subject_id = %subject_id,
                    error = %e,
                    "subject left out of report"
                );
                summaries.push(SubjectSummary {
                    error: Some(e.to_string()),
                    ..summarize(subject_id, kind, &[])
                });
            }
        }
    }

    let movers: Vec<Mover> = summaries
        .iter()
        .filter(|s| s.sample_count >= 2 && s.error.is_none())
        .map(|s| Mover {
            subject_id: s.subject_id.clone(),
            improvement: s.improvement(kind),
        })
        .collect();
    let best_mover = movers
        .iter()
        .max_by(|a, b| a.improvement.total_cmp(&b.improvement))
        .cloned();
    let worst_mover = movers
        .iter()
        .min_by(|a, b| a.improvement.total_cmp(&b.improvement))
        .cloned();

    Report {
        kind,
        window,
        summaries,
        best_mover,
        worst_mover,
    }
}

async fn subject_values(
    store: &dyn SnapshotStore,
    subject_id: &str,
    kind: SnapshotKind,
    window: Window,
) -> Result<Vec<f64>, StoreError> {
    store
        .history(subject_id, kind, window.since, window.until)
        .await?
        .iter()
        .map(metric)
        .collect()
}

fn summarize(subject_id: &str, kind: SnapshotKind, values: &[f64]) -> SubjectSummary {
    let first = values.first().copied();
    let last = values.last().copied();
    let (trend, magnitude) = match (first, last) {
        (Some(first), Some(last)) if values.len() >= 2 => {
            let gain = improvement(kind, last - first);
            let trend = if gain > 0.0 {
                Trend::Up
            } else if gain < 0.0 {
                Trend::Down
            } else {
                Trend::Flat
            };
            (trend, (last - first).abs())
        }
        _ => (Trend::Flat, 0.0),
    };
    SubjectSummary {
        subject_id: subject_id.to_string(),
        sample_count: values.len(),
        first,
        last,
        trend,
        magnitude,
        error: None,
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
