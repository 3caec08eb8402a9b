use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::chain::BackendChain;
use crate::client::fetch_page;
use crate::domain::{host_of, normalize_domain, DomainMatch};
use crate::error::SearchError;
use crate::html;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{BackendKind, CompetitorProfile, SearchResult};

/// Schema types that signal FAQ-style rich results.
const FAQ_TYPES: [&str; 2] = ["FAQPage", "HowTo"];

/// Outcome of [`SerpExtractor::find_competitors`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpReport {
    pub query: String,
    pub target_domain: Option<String>,
    /// Rank of the first result on the target domain, if any.
    pub target_rank: Option<u32>,
    pub source_backend: BackendKind,
    /// One profile per result, in rank order; the target's own page included.
    pub competitors: Vec<CompetitorProfile>,
}

/// Outcome of [`SerpExtractor::find_position`]; persisted as a position
/// snapshot payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionReport {
    pub query: String,
    pub domain: String,
    pub rank: Option<u32>,
    pub depth: usize,
    pub source_backend: BackendKind,
    pub top_urls: Vec<String>,
}

pub struct SerpExtractor {
    chain: BackendChain,
    client: Client,
    max_concurrent_fetches: usize,
    domain_match: DomainMatch,
    retry: RetryPolicy,
}

impl SerpExtractor {
    #[must_use]
    pub fn new(chain: BackendChain, client: Client, max_concurrent_fetches: usize) -> Self {
        Self {
            chain,
            client,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
            domain_match: DomainMatch::default(),
            retry: RetryPolicy::none(),
        }
    }

    #[must_use]
    pub fn with_domain_match(mut self, domain_match: DomainMatch) -> Self {
        self.domain_match = domain_match;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs `phrase` through the chain, locates `target_domain`, and profiles
    /// every result page.
    ///
    /// Competitor pages are fetched concurrently, at most
    /// `max_concurrent_fetches` at a time, and the output keeps rank order.
    /// A page that cannot be fetched yields a degraded profile instead of an
    /// error.
    ///
    /// # Errors
    ///
    /// Propagates [`SearchError::InvalidQuery`] and
    /// [`SearchError::AllBackendsExhausted`] from the chain.
    pub async fn find_competitors(
        &self,
        phrase: &str,
        target_domain: Option<&str>,
        depth: usize,
    ) -> Result<SerpReport, SearchError> {
        let results = self.search(phrase, depth).await?;
        let source_backend = results[0].source_backend;
        let target_rank = target_domain.and_then(|target| self.rank_of(&results, target));

        tracing::info!(
            query = phrase,
            backend = %source_backend,
            results = results.len(),
            target_rank = ?target_rank,
            "resolved SERP"
        );

        let client = &self.client;
        let competitors: Vec<CompetitorProfile> = stream::iter(results.iter())
            .map(|result| profile_result(client, result))
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await;

        Ok(SerpReport {
            query: phrase.trim().to_string(),
            target_domain: target_domain.and_then(normalize_domain),
            target_rank,
            source_backend,
            competitors,
        })
    }

    /// Rank of `domain` for `phrase` within the top `depth` results, without
    /// fetching any result page.
    ///
    /// # Errors
    ///
    /// Same as [`SerpExtractor::find_competitors`].
    pub async fn find_position(
        &self,
        phrase: &str,
        domain: &str,
        depth: usize,
    ) -> Result<PositionReport, SearchError> {
        let results = self.search(phrase, depth).await?;
        let rank = self.rank_of(&results, domain);
        Ok(PositionReport {
            query: phrase.trim().to_string(),
            domain: normalize_domain(domain).unwrap_or_else(|| domain.to_string()),
            rank,
            depth,
            source_backend: results[0].source_backend,
            top_urls: results.into_iter().map(|r| r.url).collect(),
        })
    }

    async fn search(&self, phrase: &str, depth: usize) -> Result<Vec<SearchResult>, SearchError> {
        // The chain never hands back an empty Ok list, so callers may index [0].
        retry_with_backoff(self.retry, || self.chain.query(phrase, depth)).await
    }

    fn rank_of(&self, results: &[SearchResult], target: &str) -> Option<u32> {
        results
            .iter()
            .find(|r| self.domain_match.matches(&r.url, target))
            .map(|r| r.rank)
    }
}

async fn profile_result(client: &Client, result: &SearchResult) -> CompetitorProfile {
    let domain = host_of(&result.url);
    match fetch_page(client, &result.url).await {
        Ok(page) => build_profile(result, domain, &page),
        Err(reason) => {
            tracing::warn!(
                url = %result.url,
                rank = result.rank,
                error = %reason,
                "competitor page fetch failed; keeping degraded profile"
            );
            CompetitorProfile::degraded(result, domain, reason.to_string())
        }
    }
}

pub(crate) fn build_profile(
    result: &SearchResult,
    domain: Option<String>,
    page: &str,
) -> CompetitorProfile {
    let h1s = html::extract_tag_texts(page, "h1");
    let jsonld = html::extract_jsonld(page);
    let schema_types = jsonld.types();
    CompetitorProfile {
        rank: result.rank,
        url: result.url.clone(),
        title: result.title.clone(),
        domain,
        page_title: html::extract_title(page),
        meta_description: html::extract_meta(page, "description"),
        h1: h1s.first().cloned(),
        h1_count: Some(h1s.len()),
        word_count: Some(html::word_count(&html::visible_text(page))),
        has_schema: Some(!jsonld.blocks.is_empty()),
        has_faq: Some(jsonld.has_any_type(&FAQ_TYPES)),
        schema_types: Some(schema_types),
        has_og_image: Some(html::extract_meta(page, "og:image").is_some()),
        fetch_error: None,
    }
}
