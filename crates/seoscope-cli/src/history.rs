//! Read-only commands over recorded snapshots: `diff` and `report`.

use chrono::Utc;
use clap::ValueEnum;
use seoscope_core::{load_sites, AppConfig, SitesFile};
use seoscope_store::{
    aggregate, diff, position_subject, DeltaOutcome, Direction, FileSnapshotStore, Report,
    SnapshotKind, Thresholds, Trend, Window,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Audit,
    Position,
}

impl From<KindArg> for SnapshotKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Audit => SnapshotKind::Audit,
            KindArg::Position => SnapshotKind::Position,
        }
    }
}

/// Print the change between the two latest snapshots of `subject`.
///
/// # Errors
///
/// Returns an error if the store cannot be read or a snapshot payload is
/// missing its metric.
pub(crate) async fn run_diff(
    config: &AppConfig,
    subject: &str,
    kind: SnapshotKind,
) -> anyhow::Result<()> {
    let store = FileSnapshotStore::new(config.data_dir.clone());
    let outcome = diff(&store, subject, kind, &Thresholds::from_config(config)).await?;
    println!("{}", format_outcome(subject, kind, &outcome));
    Ok(())
}

/// Print a trend report over the last `days` days.
///
/// With no explicit subjects the report covers the configured sites: their
/// URLs for audits, or every `domain::keyword` pair for positions.
///
/// # Errors
///
/// Returns an error if the sites file is needed but invalid. Subjects whose
/// history cannot be read are shown with their error instead.
pub(crate) async fn run_report(
    config: &AppConfig,
    subjects: Vec<String>,
    kind: SnapshotKind,
    days: u32,
    json: bool,
) -> anyhow::Result<()> {
    let subjects = if subjects.is_empty() {
        subjects_from_sites(&load_sites(&config.sites_path)?, kind)
    } else {
        subjects
    };
    if subjects.is_empty() {
        println!(
            "nothing to report; pass subjects or add sites to {}",
            config.sites_path.display()
        );
        return Ok(());
    }

    let store = FileSnapshotStore::new(config.data_dir.clone());
    let window = Window::last_days(days, Utc::now());
    let report = aggregate(&store, &subjects, kind, window).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, days);
    }
    Ok(())
}

pub(crate) fn subjects_from_sites(sites: &SitesFile, kind: SnapshotKind) -> Vec<String> {
    match kind {
        SnapshotKind::Audit => sites.sites.iter().map(|s| s.url.clone()).collect(),
        SnapshotKind::Position => sites
            .sites
            .iter()
            .flat_map(|site| {
                let domain = site.domain();
                site.keywords
                    .iter()
                    .map(move |keyword| position_subject(&domain, keyword))
            })
            .collect(),
    }
}

pub(crate) fn format_outcome(subject: &str, kind: SnapshotKind, outcome: &DeltaOutcome) -> String {
    let delta = match outcome {
        DeltaOutcome::NoBaseline => return format!("{kind:<9}{subject}  no baseline yet"),
        DeltaOutcome::Delta(delta) => delta,
    };
    let direction = match delta.direction {
        Direction::Improved => "improved",
        Direction::Worsened => "worsened",
        Direction::Unchanged => "unchanged",
    };
    let flag = if delta.regression { "  REGRESSION" } else { "" };
    format!(
        "{kind:<9}{subject}  {:.1} -> {:.1} ({:+.1}, {direction}){flag}",
        delta.previous, delta.current, delta.change
    )
}

fn print_report(report: &Report, days: u32) {
    println!("{} trends over the last {days} days", report.kind);
    println!(
        "{:<50}{:>8}{:>10}{:>10}{:>7}{:>11}",
        "SUBJECT", "SAMPLES", "FIRST", "LAST", "TREND", "MAGNITUDE"
    );
    let fmt_value = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
    for summary in &report.summaries {
        let trend = match summary.trend {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Flat => "flat",
        };
        println!(
            "{:<50}{:>8}{:>10}{:>10}{:>7}{:>11.1}",
            summary.subject_id,
            summary.sample_count,
            fmt_value(summary.first),
            fmt_value(summary.last),
            trend,
            summary.magnitude
        );
        if let Some(error) = &summary.error {
            println!("  ! {error}");
        }
    }
    if let Some(best) = &report.best_mover {
        println!("best mover:  {} ({:+.1})", best.subject_id, best.improvement);
    }
    if let Some(worst) = &report.worst_mover {
        println!("worst mover: {} ({:+.1})", worst.subject_id, worst.improvement);
    }
}
