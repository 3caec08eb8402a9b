//! Snapshot log round trips through the file store into deltas and reports.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use seoscope_store::{
    aggregate, diff, position_subject, DeltaOutcome, Direction, FileSnapshotStore, Snapshot,
    SnapshotKind, SnapshotStore, Thresholds, Trend, Window,
};

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, day, 6, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Audit regression across store instances
// ---------------------------------------------------------------------------

#[tokio::test]
async fn audit_drop_is_flagged_after_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let url = "https://a.example/";

    {
        let store = FileSnapshotStore::new(dir.path());
        store
            .append(Snapshot::captured_at(
                url,
                SnapshotKind::Audit,
                json!({"url": url, "score": {"overall": 72.0}}),
                at(1),
            ))
            .await
            .unwrap();
    }

    let store = FileSnapshotStore::new(dir.path());
    let first = diff(&store, url, SnapshotKind::Audit, &Thresholds::default())
        .await
        .unwrap();
    assert_eq!(first, DeltaOutcome::NoBaseline);

    let stored = store
        .append(Snapshot::captured_at(
            url,
            SnapshotKind::Audit,
            json!({"url": url, "score": {"overall": 65.0}}),
            at(8),
        ))
        .await
        .unwrap();
    assert_eq!(stored.seq, 1);

    let thresholds = Thresholds {
        score_drop: 7.0,
        position_drop: 3.0,
    };
    let DeltaOutcome::Delta(delta) = diff(&store, url, SnapshotKind::Audit, &thresholds)
        .await
        .unwrap()
    else {
        panic!("expected a delta once two audits exist");
    };
    assert!((delta.change + 7.0).abs() < 1e-9);
    assert_eq!(delta.direction, Direction::Worsened);
    assert!(delta.regression);
}

// ---------------------------------------------------------------------------
// Position report over a window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn position_report_ranks_movers_by_improvement() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    let climbing = position_subject("a.example", "Best AI Tools");
    let sliding = position_subject("b.example", "best ai tools");

    for (subject, ranks) in [
        (&climbing, [json!(12), json!(6), json!(3)]),
        (&sliding, [json!(2), json!(4), json!(null)]),
    ] {
        for (day, rank) in (1u32..).zip(ranks) {
            store
                .append(Snapshot::captured_at(
                    subject.as_str(),
                    SnapshotKind::Position,
                    json!({"rank": rank, "depth": 10}),
                    at(day),
                ))
                .await
                .unwrap();
        }
    }

    let report = aggregate(
        &store,
        &[climbing.clone(), sliding.clone()],
        SnapshotKind::Position,
        Window {
            since: Some(at(1)),
            until: Some(at(3)),
        },
    )
    .await;

    assert_eq!(climbing, "a.example::best ai tools");
    assert_eq!(report.summaries[0].trend, Trend::Up);
    assert_eq!(report.summaries[0].sample_count, 3);
    assert_eq!(report.summaries[1].trend, Trend::Down);
    assert_eq!(report.summaries[1].last, Some(11.0));
    assert_eq!(report.best_mover.unwrap().subject_id, climbing);
    assert_eq!(report.worst_mover.unwrap().subject_id, sliding);
}
