//! Site-level files fetched next to the audited page: `robots.txt`,
//! `sitemap.xml`, `llms.txt` and `llms-full.txt`.

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use seoscope_search::fetch_page;

/// Crawler tokens checked for a full `Disallow: /` in `robots.txt`.
/// Matching is by substring, so `anthropic` also covers `anthropic-ai`.
pub const AI_BOTS: [&str; 6] = [
    "gptbot",
    "chatgpt-user",
    "claude-web",
    "anthropic",
    "perplexitybot",
    "cohere-ai",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteFiles {
    pub robots_txt: bool,
    pub blocked_ai_bots: Vec<String>,
    pub sitemap_xml: bool,
    /// Number of `<loc>` entries; `None` when the sitemap is absent or not XML.
    pub sitemap_url_count: Option<usize>,
    pub llms_txt: bool,
    pub llms_full_txt: bool,
}

/// Fetches the four files concurrently from `origin`
/// (`scheme://host[:port]`). Any fetch failure counts as absent.
pub async fn fetch_site_files(client: &Client, origin: &str) -> SiteFiles {
    let robots_url = format!("{origin}/robots.txt");
    let sitemap_url = format!("{origin}/sitemap.xml");
    let llms_url = format!("{origin}/llms.txt");
    let llms_full_url = format!("{origin}/llms-full.txt");
    let (robots, sitemap, llms, llms_full) = tokio::join!(
        fetch_optional(client, &robots_url),
        fetch_optional(client, &sitemap_url),
        fetch_optional(client, &llms_url),
        fetch_optional(client, &llms_full_url),
    );

    SiteFiles {
        robots_txt: robots.is_some(),
        blocked_ai_bots: robots.as_deref().map(blocked_ai_bots).unwrap_or_default(),
        sitemap_xml: sitemap.is_some(),
        sitemap_url_count: sitemap.as_deref().and_then(count_sitemap_locs),
        llms_txt: llms.is_some(),
        llms_full_txt: llms_full.is_some(),
    }
}

async fn fetch_optional(client: &Client, url: &str) -> Option<String> {
    match fetch_page(client, url).await {
        Ok(body) => Some(body),
        Err(reason) => {
            tracing::debug!(url, reason = %reason, "site file not available");
            None
        }
    }
}

/// AI crawler tokens that `robots.txt` shuts out entirely.
///
/// Records are groups of consecutive `User-agent` lines followed by rules;
/// a bot is blocked when a group naming it carries `Disallow: /`.
#[must_use]
pub fn blocked_ai_bots(robots: &str) -> Vec<String> {
    let mut group_agents: Vec<String> = Vec::new();
    let mut in_rules = false;
    let mut fully_disallowed: Vec<String> = Vec::new();

    for raw_line in robots.lines() {
        let line = raw_line.split('#').next().unwrap_or_default().trim();
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let field = field.trim().to_ascii_lowercase();
        let value = value.trim();
        match field.as_str() {
            "user-agent" => {
                if in_rules {
                    group_agents.clear();
                    in_rules = false;
                }
                group_agents.push(value.to_ascii_lowercase());
            }
            "disallow" => {
                in_rules = true;
                if value == "/" {
                    fully_disallowed.extend(group_agents.iter().cloned());
                }
            }
            _ => in_rules = true,
        }
    }

    AI_BOTS
        .iter()
        .filter(|bot| fully_disallowed.iter().any(|agent| agent.contains(*bot)))
        .map(|bot| (*bot).to_string())
        .collect()
}

/// Counts `<loc>` elements in a sitemap or sitemap index.
#[must_use]
pub fn count_sitemap_locs(xml: &str) -> Option<usize> {
    let mut reader = Reader::from_str(xml);
    let mut count = 0;
    let mut saw_element = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                saw_element = true;
                if e.local_name().as_ref() == b"loc" {
                    count += 1;
                }
            }
            Ok(Event::Empty(_)) => saw_element = true,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "sitemap is not well-formed XML");
                return None;
            }
        }
    }
    saw_element.then_some(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_bots_with_full_disallow_are_blocked() {
        let robots = "\
User-agent: GPTBot
User-agent: anthropic-ai
Disallow: /

User-agent: PerplexityBot
Disallow: /private

User-agent: *
Allow: /
";
        assert_eq!(blocked_ai_bots(robots), vec!["gptbot", "anthropic"]);
    }

    #[test]
    fn wildcard_group_does_not_count_as_named_block() {
        assert!(blocked_ai_bots("User-agent: *\nDisallow: /\n").is_empty());
    }

    #[test]
    fn comments_and_new_groups_are_respected() {
        let robots = "\
User-agent: ClaudeBot # comment
Disallow: /admin
User-agent: Claude-Web
Disallow: /   # everything
";
        assert_eq!(blocked_ai_bots(robots), vec!["claude-web"]);
    }

    #[test]
    fn sitemap_locs_are_counted() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/a</loc></url>
  <url><loc>https://example.com/b</loc></url>
</urlset>"#;
        assert_eq!(count_sitemap_locs(xml), Some(3));
    }

    #[test]
    fn non_xml_sitemap_has_no_count() {
        assert_eq!(count_sitemap_locs("not xml at all"), None);
        assert_eq!(count_sitemap_locs("<urlset><url></urlset>"), None);
    }
}
