use chrono::TimeZone;
use serde_json::json;

use super::*;
use crate::memory::MemorySnapshotStore;
use crate::snapshot::Snapshot;

fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, n, 8, 0, 0).unwrap()
}

async fn record_audits(store: &MemorySnapshotStore, subject: &str, points: &[(u32, f64)]) {
    for (d, overall) in points {
        store
            .append(Snapshot::captured_at(
                subject,
                SnapshotKind::Audit,
                json!({"score": {"overall": overall}}),
                day(*d),
            ))
            .await
            .unwrap();
    }
}

fn ids(subjects: &[&str]) -> Vec<String> {
    subjects.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn summaries_cover_trend_magnitude_and_movers() {
    let store = MemorySnapshotStore::new();
    record_audits(&store, "rising", &[(1, 50.0), (3, 55.0), (5, 70.0)]).await;
    record_audits(&store, "falling", &[(2, 80.0), (4, 60.0)]).await;
    record_audits(&store, "steady", &[(2, 40.0), (6, 40.0)]).await;

    let report = aggregate(
        &store,
        &ids(&["rising", "falling", "steady"]),
        SnapshotKind::Audit,
        Window::default(),
    )
    .await;

    let rising = &report.summaries[0];
    assert_eq!(rising.trend, Trend::Up);
    assert_eq!(rising.sample_count, 3);
    assert!((rising.magnitude - 20.0).abs() < 1e-9);
    assert_eq!(rising.first, Some(50.0));
    assert_eq!(rising.last, Some(70.0));

    let falling = &report.summaries[1];
    assert_eq!(falling.trend, Trend::Down);
    assert!((falling.magnitude - 20.0).abs() < 1e-9);

    assert_eq!(report.summaries[2].trend, Trend::Flat);

    assert_eq!(report.best_mover.as_ref().unwrap().subject_id, "rising");
    assert_eq!(report.worst_mover.as_ref().unwrap().subject_id, "falling");
}

#[tokio::test]
async fn window_limits_samples_and_single_sample_is_flat() {
    let store = MemorySnapshotStore::new();
    record_audits(&store, "s", &[(1, 10.0), (10, 90.0)]).await;

    let report = aggregate(
        &store,
        &ids(&["s", "never-seen"]),
        SnapshotKind::Audit,
        Window {
            since: Some(day(5)),
            until: None,
        },
    )
    .await;

    let single = &report.summaries[0];
    assert_eq!(single.sample_count, 1);
    assert_eq!(single.trend, Trend::Flat);
    assert!(single.magnitude.abs() < 1e-9);

    let empty = &report.summaries[1];
    assert_eq!(empty.sample_count, 0);
    assert_eq!(empty.trend, Trend::Flat);
    assert_eq!(empty.first, None);

    assert!(report.best_mover.is_none());
    assert!(report.worst_mover.is_none());
}

#[tokio::test]
async fn positions_trend_up_when_rank_number_falls() {
    let store = MemorySnapshotStore::new();
    for (d, rank) in [(1, json!(9)), (2, json!(null)), (3, json!(2))] {
        store
            .append(Snapshot::captured_at(
                "a.example::rust",
                SnapshotKind::Position,
                json!({"rank": rank, "depth": 20}),
                day(d),
            ))
            .await
            .unwrap();
    }

    let report = aggregate(
        &store,
        &ids(&["a.example::rust"]),
        SnapshotKind::Position,
        Window::default(),
    )
    .await;

    let summary = &report.summaries[0];
    assert_eq!(summary.trend, Trend::Up);
    assert!((summary.magnitude - 7.0).abs() < 1e-9);
    assert!((report.best_mover.as_ref().unwrap().improvement - 7.0).abs() < 1e-9);
}

#[test]
fn last_days_window_spans_back_from_now() {
    let now = day(20);
    let window = Window::last_days(7, now);
    assert_eq!(window.since, Some(day(13)));
    assert_eq!(window.until, Some(now));
}

#[tokio::test]
async fn unreadable_subject_is_reported_inline() {
    let store = MemorySnapshotStore::new();
    record_audits(&store, "good", &[(1, 60.0), (2, 75.0)]).await;
    store
        .append(Snapshot::captured_at(
            "bad",
            SnapshotKind::Audit,
            json!({"url": "https://bad.example/"}),
            day(1),
        ))
        .await
        .unwrap();

    let report = aggregate(
        &store,
        &ids(&["good", "bad"]),
        SnapshotKind::Audit,
        Window::default(),
    )
    .await;

    let good = &report.summaries[0];
    assert_eq!(good.trend, Trend::Up);
    assert_eq!(good.error, None);

    let bad = &report.summaries[1];
    assert_eq!(bad.sample_count, 0);
    assert_eq!(bad.trend, Trend::Flat);
    assert!(bad.error.as_deref().is_some_and(|e| e.contains("score.overall")));

    assert_eq!(report.best_mover.as_ref().unwrap().subject_id, "good");
    assert_eq!(report.worst_mover.as_ref().unwrap().subject_id, "good");
}
