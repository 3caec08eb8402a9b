//! `serp` and `keywords` command handlers.

use crate::services::Services;

/// Print the SERP for `query` with a profile of every ranking page.
///
/// # Errors
///
/// Returns an error if the query is blank or every search backend failed.
pub(crate) async fn run_serp(
    services: &Services,
    query: &str,
    domain: Option<&str>,
    depth: usize,
) -> anyhow::Result<()> {
    let report = services.serp.find_competitors(query, domain, depth).await?;

    match (&report.target_domain, report.target_rank) {
        (Some(target), Some(rank)) => println!("{target} ranks #{rank} for \"{}\"", report.query),
        (Some(target), None) => println!(
            "{target} is not in the top {depth} for \"{}\"",
            report.query
        ),
        (None, _) => {}
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Print keyword ideas for every seed, one per line as `keyword<TAB>source`.
pub(crate) async fn run_keywords(services: &Services, seeds: &[String], modifiers: bool) {
    if modifiers {
        for seed in seeds {
            for keyword in services.expander.expand_with_modifiers(seed).await {
                println!("{keyword}\t{seed}");
            }
        }
        return;
    }

    let ideas = services.expander.keyword_ideas(seeds).await;
    if ideas.is_empty() {
        println!("no keyword ideas for the given seeds");
    }
    for idea in ideas {
        println!("{}\t{}", idea.keyword, idea.source);
    }
}
