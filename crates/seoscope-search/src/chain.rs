use reqwest::Client;
use seoscope_core::AppConfig;

use crate::backend::{CustomSearchBackend, ScrapeBackend, SearchBackend, SearxngBackend};
use crate::error::{BackendAttempt, FailureReason, SearchError};
use crate::types::SearchResult;

/// Ordered search tiers tried one after another until one yields a
/// well-formed, non-empty result list.
///
/// Tiers are never run concurrently and never retried here; a failing tier
/// is logged and the next one is tried.
pub struct BackendChain {
    backends: Vec<Box<dyn SearchBackend>>,
}

impl BackendChain {
    #[must_use]
    pub fn new(backends: Vec<Box<dyn SearchBackend>>) -> Self {
        Self { backends }
    }

    /// SearXNG, then Custom Search, then scrape, all sharing `client`.
    #[must_use]
    pub fn from_config(config: &AppConfig, client: &Client) -> Self {
        Self::new(vec![
            Box::new(SearxngBackend::new(
                client.clone(),
                config.searxng_url.clone(),
            )),
            Box::new(CustomSearchBackend::new(
                client.clone(),
                &config.cse_base_url,
                config.cse_api_key.clone(),
                config.cse_cx.clone(),
                &config.search_lang,
            )),
            Box::new(ScrapeBackend::new(
                client.clone(),
                &config.scrape_base_url,
                &config.search_lang,
            )),
        ])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Returns the first valid result list, truncated to `max_results`.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidQuery`] for a blank phrase or `max_results == 0`.
    /// - [`SearchError::AllBackendsExhausted`] listing every tier and its
    ///   failure when no tier produced a valid list.
    pub async fn query(
        &self,
        phrase: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Err(SearchError::InvalidQuery(
                "query phrase is empty".to_string(),
            ));
        }
        if max_results == 0 {
            return Err(SearchError::InvalidQuery(
                "max_results must be at least 1".to_string(),
            ));
        }

        let mut attempts = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let kind = backend.kind();
            let outcome = match backend.search(phrase, max_results).await {
                Ok(mut results) => {
                    results.truncate(max_results);
                    validate(&results).map(|()| results)
                }
                Err(SearchError::BackendUnavailable { reason, .. }) => Err(reason),
                Err(other) => Err(FailureReason::Request(other.to_string())),
            };

            match outcome {
                Ok(results) => {
                    tracing::debug!(
                        backend = %kind,
                        query = phrase,
                        count = results.len(),
                        "search backend returned results"
                    );
                    return Ok(results);
                }
                Err(reason) => {
                    tracing::warn!(
                        backend = %kind,
                        query = phrase,
                        error = %reason,
                        "search backend failed; trying next tier"
                    );
                    attempts.push(BackendAttempt {
                        backend: kind,
                        reason,
                    });
                }
            }
        }

        Err(SearchError::AllBackendsExhausted {
            query: phrase.to_string(),
            attempts,
        })
    }
}

/// A result list is accepted only when it is non-empty, its ranks are
/// exactly `1..=k` in order, and every URL is non-blank.
fn validate(results: &[SearchResult]) -> Result<(), FailureReason> {
    if results.is_empty() {
        return Err(FailureReason::Empty);
    }
    for (expected, result) in (1u32..).zip(results) {
        if result.rank != expected {
            return Err(FailureReason::Malformed(format!(
                "expected rank {expected}, got {}",
                result.rank
            )));
        }
        if result.url.trim().is_empty() {
            return Err(FailureReason::Malformed(format!(
                "result at rank {expected} has no URL"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "chain_test.rs"]
mod tests;
