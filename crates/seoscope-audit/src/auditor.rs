use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use seoscope_core::{Category, ScoreWeights};
use seoscope_search::{fetch_page, html, KeywordExpander};

use crate::error::AuditError;
use crate::facts::PageFacts;
use crate::locale::resolve_locale;
use crate::score::{
    score_keywords, score_machine_readability, score_meta, score_performance,
    score_structured_data, AuditScore,
};
use crate::site_files::fetch_site_files;
use crate::speed::SpeedProvider;

/// Result of auditing one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAudit {
    pub url: String,
    /// The locale page audited in place of a thin root, when one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale_url: Option<String>,
    pub score: AuditScore,
    pub facts: PageFacts,
}

impl PageAudit {
    #[must_use]
    pub fn action_items(&self) -> Vec<String> {
        self.facts.action_items()
    }
}

pub struct PageAuditor {
    client: Client,
    expander: KeywordExpander,
    speed: Arc<dyn SpeedProvider>,
    weights: ScoreWeights,
}

impl PageAuditor {
    #[must_use]
    pub fn new(
        client: Client,
        expander: KeywordExpander,
        speed: Arc<dyn SpeedProvider>,
        weights: ScoreWeights,
    ) -> Self {
        Self {
            client,
            expander,
            speed,
            weights,
        }
    }

    /// Fetches `url`, checks its site files, measures speed, expands the
    /// title into keyword candidates, and scores every category.
    ///
    /// A root without a title or JSON-LD that points at a locale page
    /// (hreflang, meta refresh, JS redirect, or a populated `/en/` or
    /// `/ru/`) has that page's HTML audited instead; `locale_url` names it.
    ///
    /// Missing signals lower the score but never fail the audit; only the
    /// page fetch itself is fatal.
    ///
    /// # Errors
    ///
    /// - [`AuditError::InvalidUrl`] if `url` is not an absolute http(s) URL.
    /// - [`AuditError::FetchFailed`] if the page is unreachable, times out,
    ///   or answers with a non-2xx status.
    pub async fn audit(&self, url: &str) -> Result<PageAudit, AuditError> {
        let parsed = Url::parse(url).map_err(|e| AuditError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AuditError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }

        let page = fetch_page(&self.client, url)
            .await
            .map_err(|reason| AuditError::FetchFailed {
                url: url.to_string(),
                reason,
            })?;

        let (page, locale_url) = match resolve_locale(&self.client, &parsed, &page).await {
            Some(locale) => (locale.body, Some(locale.url)),
            None => (page, None),
        };

        let mut facts = PageFacts::extract(url, &page);
        let origin = parsed.origin().ascii_serialization();
        let title = facts.title.clone();

        let (site, speed, candidates) = tokio::join!(
            fetch_site_files(&self.client, &origin),
            self.speed.measure_speed(url),
            async {
                match title.as_deref() {
                    Some(title) => self.expander.expand(title).await,
                    None => BTreeSet::new(),
                }
            },
        );

        facts.site = site;
        facts.speed_score = match speed {
            Ok(score) => Some(score),
            Err(reason) => {
                tracing::warn!(url, error = %reason, "speed measurement unavailable");
                None
            }
        };

        let body = html::visible_text(&page);
        let mut scores = BTreeMap::new();
        let mut unavailable = Vec::new();

        scores.insert(Category::Meta, score_meta(&facts));
        scores.insert(Category::StructuredData, score_structured_data(&facts));
        scores.insert(
            Category::MachineReadability,
            score_machine_readability(&facts.site),
        );
        match score_performance(facts.speed_score) {
            Some(score) => {
                scores.insert(Category::Performance, score);
            }
            None => unavailable.push(Category::Performance),
        }
        match score_keywords(&candidates, &body) {
            Some(score) => {
                scores.insert(Category::Keywords, score);
            }
            None => unavailable.push(Category::Keywords),
        }
        unavailable.sort();

        let score = AuditScore::combine(&scores, &self.weights, unavailable);
        tracing::info!(
            url,
            overall = score.overall,
            unavailable = score.unavailable.len(),
            "audit complete"
        );

        Ok(PageAudit {
            url: url.to_string(),
            locale_url,
            score,
            facts,
        })
    }
}
