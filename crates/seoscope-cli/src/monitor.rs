//! Scheduled-style monitoring run across the configured site portfolio.
//!
//! Each site is audited and its keyword positions resolved; every result is
//! appended to the snapshot store before being compared with the previous
//! run. Sites run concurrently up to `max_concurrent_sites`. A failed audit,
//! search or comparison is logged and counted against its site; only a
//! failed snapshot write aborts the run, after the sites that finished have
//! been printed.

use futures::stream::{self, StreamExt};
use seoscope_core::{load_sites, SiteConfig};
use seoscope_store::{
    diff, position_subject, DeltaOutcome, Snapshot, SnapshotKind, SnapshotStore, Thresholds,
};

use crate::audit::record_audit;
use crate::history::format_outcome;
use crate::services::Services;

struct SubjectOutcome {
    subject_id: String,
    kind: SnapshotKind,
    outcome: Result<DeltaOutcome, String>,
}

#[derive(Default)]
struct SiteOutcome {
    name: String,
    subjects: Vec<SubjectOutcome>,
    failures: usize,
}

/// Run one monitoring pass.
///
/// # Errors
///
/// Returns an error if the sites file is invalid, the site filter matches
/// nothing, or a snapshot cannot be written.
pub(crate) async fn run_monitor(
    services: &Services,
    site_filter: Option<&str>,
    depth: usize,
) -> anyhow::Result<()> {
    let sites = load_sites(&services.config.sites_path)?.sites;
    let sites: Vec<SiteConfig> = match site_filter {
        Some(name) => {
            let site = sites
                .into_iter()
                .find(|s| s.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow::anyhow!("site '{name}' not found"))?;
            vec![site]
        }
        None => sites,
    };
    if sites.is_empty() {
        println!(
            "no sites configured in {}",
            services.config.sites_path.display()
        );
        return Ok(());
    }

    tracing::info!(sites = sites.len(), depth, "starting monitor run");

    let results: Vec<anyhow::Result<SiteOutcome>> = stream::iter(sites.iter())
        .map(|site| monitor_site(services, site, depth))
        .buffer_unordered(services.config.max_concurrent_sites)
        .collect()
        .await;

    let mut outcomes = Vec::with_capacity(results.len());
    let mut fatal = None;
    for result in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                tracing::error!(error = %e, "snapshot write failed; aborting monitor run");
                fatal.get_or_insert(e);
            }
        }
    }
    outcomes.sort_by(|a, b| a.name.cmp(&b.name));

    let mut regressions = 0usize;
    let mut failures = 0usize;
    for site in &outcomes {
        println!("{}", site.name);
        for subject in &site.subjects {
            if matches!(&subject.outcome, Ok(DeltaOutcome::Delta(d)) if d.regression) {
                regressions += 1;
            }
            println!("  {}", format_subject(subject));
        }
        if site.failures > 0 {
            println!("  {} check(s) failed; see log", site.failures);
        }
        failures += site.failures;
    }

    if let Some(e) = fatal {
        return Err(e);
    }
    tracing::info!(
        sites = outcomes.len(),
        regressions,
        failures,
        "monitor run complete"
    );
    Ok(())
}

fn format_subject(subject: &SubjectOutcome) -> String {
    match &subject.outcome {
        Ok(outcome) => format_outcome(&subject.subject_id, subject.kind, outcome),
        Err(error) => format!(
            "{:<9}{}  comparison failed: {error}",
            subject.kind, subject.subject_id
        ),
    }
}

async fn monitor_site(
    services: &Services,
    site: &SiteConfig,
    depth: usize,
) -> anyhow::Result<SiteOutcome> {
    let mut outcome = SiteOutcome {
        name: site.name.clone(),
        ..SiteOutcome::default()
    };

    match services.auditor.audit(&site.url).await {
        Ok(audit) => {
            record_audit(services, &audit).await?;
            outcome.record(
                compare(
                    &services.store,
                    &services.thresholds,
                    &audit.url,
                    SnapshotKind::Audit,
                )
                .await,
            );
        }
        Err(e) => {
            tracing::warn!(site = %site.name, url = %site.url, error = %e, "site audit failed");
            outcome.failures += 1;
        }
    }

    let domain = site.domain();
    for keyword in &site.keywords {
        let report = match services.serp.find_position(keyword, &domain, depth).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    site = %site.name,
                    keyword = %keyword,
                    error = %e,
                    "position lookup failed"
                );
                outcome.failures += 1;
                continue;
            }
        };

        let subject_id = position_subject(&report.domain, &report.query);
        services
            .store
            .append(Snapshot::new(
                &subject_id,
                SnapshotKind::Position,
                serde_json::to_value(&report)?,
            ))
            .await?;
        outcome.record(
            compare(
                &services.store,
                &services.thresholds,
                &subject_id,
                SnapshotKind::Position,
            )
            .await,
        );
    }

    Ok(outcome)
}

impl SiteOutcome {
    fn record(&mut self, subject: SubjectOutcome) {
        if subject.outcome.is_err() {
            self.failures += 1;
        }
        self.subjects.push(subject);
    }
}

/// Diff a just-recorded subject. A read or payload error is kept inline so
/// the rest of the site, and the run, carry on.
async fn compare(
    store: &dyn SnapshotStore,
    thresholds: &Thresholds,
    subject_id: &str,
    kind: SnapshotKind,
) -> SubjectOutcome {
    let outcome = diff(store, subject_id, kind, thresholds)
        .await
        .map_err(|e| {
            tracing::warn!(subject_id, kind = %kind, error = %e, "comparison failed");
            e.to_string()
        });
    SubjectOutcome {
        subject_id: subject_id.to_string(),
        kind,
        outcome,
    }
}
