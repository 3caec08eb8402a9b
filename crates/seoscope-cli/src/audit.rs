use seoscope_audit::PageAudit;
use seoscope_core::Category;
use seoscope_store::{Snapshot, SnapshotKind, SnapshotStore};

use crate::services::Services;

/// Audit each URL in turn, printing a summary (or JSON) and recording an
/// audit snapshot keyed by the URL.
///
/// # Errors
///
/// Returns an error if a snapshot cannot be written. A URL that fails to
/// audit is reported and skipped; the command fails at the end if every URL
/// failed.
pub(crate) async fn run_audit(
    services: &Services,
    urls: &[String],
    json: bool,
    save: bool,
) -> anyhow::Result<()> {
    let mut failed = 0usize;

    for url in urls {
        let audit = match services.auditor.audit(url).await {
            Ok(audit) => audit,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "audit failed");
                eprintln!("{url}: {e}");
                failed += 1;
                continue;
            }
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&audit)?);
        } else {
            print_summary(&audit);
        }

        if save {
            record_audit(services, &audit).await?;
        }
    }

    if failed == urls.len() {
        anyhow::bail!("all {failed} audits failed");
    }
    Ok(())
}

/// Append `audit` to the store under its URL.
pub(crate) async fn record_audit(services: &Services, audit: &PageAudit) -> anyhow::Result<()> {
    let payload = serde_json::to_value(audit)?;
    services
        .store
        .append(Snapshot::new(&audit.url, SnapshotKind::Audit, payload))
        .await?;
    Ok(())
}

fn print_summary(audit: &PageAudit) {
    println!("{}  overall {:.1}", audit.url, audit.score.overall);
    if let Some(locale_url) = &audit.locale_url {
        println!("  audited locale page {locale_url}");
    }
    for category in Category::ALL {
        let marker = if audit.score.unavailable.contains(&category) {
            " (unavailable)"
        } else {
            ""
        };
        println!(
            "  {:<20}{:>6.1}{marker}",
            category.as_str(),
            audit.score.category(category)
        );
    }

    let content = &audit.facts.content;
    if !content.top_terms.is_empty() {
        let terms: Vec<String> = content
            .top_terms
            .iter()
            .take(5)
            .map(|t| format!("{} {:.1}%", t.word, t.density))
            .collect();
        println!("  top terms ({}): {}", content.lang, terms.join(", "));
    }

    let items = audit.action_items();
    if items.is_empty() {
        println!("  no action items");
    } else {
        println!("  action items:");
        for item in items {
            println!("    - {item}");
        }
    }
}
