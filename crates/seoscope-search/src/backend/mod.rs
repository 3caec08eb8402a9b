//! Search backend tiers.
//!
//! Each tier turns a query phrase into an ordered list of organic results or
//! a [`SearchError::BackendUnavailable`] explaining why it could not.

mod custom_search;
mod scrape;
mod searxng;

pub use custom_search::CustomSearchBackend;
pub use scrape::ScrapeBackend;
pub use searxng::SearxngBackend;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::{FailureReason, SearchError};
use crate::types::{BackendKind, SearchResult};

#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Returns at most `max_results` results ranked `1..=k`.
    async fn search(&self, phrase: &str, max_results: usize)
        -> Result<Vec<SearchResult>, SearchError>;
}

/// Raw result before ranking: `(url, title, snippet)`.
pub(crate) type RawHit = (String, String, String);

/// Drops hits with a blank URL, keeps the first occurrence of each URL,
/// truncates to `max_results`, and assigns ranks `1..=k` in input order.
pub(crate) fn rank_hits(
    hits: impl IntoIterator<Item = RawHit>,
    max_results: usize,
    kind: BackendKind,
) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|(url, _, _)| !url.trim().is_empty())
        .filter(|(url, _, _)| seen.insert(url.trim().to_string()))
        .take(max_results)
        .zip(1u32..)
        .map(|((url, title, snippet), rank)| SearchResult {
            rank,
            url: url.trim().to_string(),
            title: title.trim().to_string(),
            snippet: snippet.trim().to_string(),
            source_backend: kind,
        })
        .collect()
}

/// Fails with [`FailureReason::Empty`] when a tier produced nothing.
pub(crate) fn non_empty(
    results: Vec<SearchResult>,
    kind: BackendKind,
) -> Result<Vec<SearchResult>, SearchError> {
    if results.is_empty() {
        Err(SearchError::unavailable(kind, FailureReason::Empty))
    } else {
        Ok(results)
    }
}

/// Maps a transport error onto this tier.
pub(crate) fn transport(kind: BackendKind, err: &reqwest::Error) -> SearchError {
    SearchError::unavailable(kind, FailureReason::from_reqwest(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str) -> RawHit {
        (url.to_string(), format!("title {url}"), String::new())
    }

    #[test]
    fn rank_hits_dedupes_skips_blank_and_truncates() {
        let ranked = rank_hits(
            vec![
                hit("https://a.example"),
                hit(" "),
                hit("https://a.example"),
                hit("https://b.example"),
                hit("https://c.example"),
            ],
            2,
            BackendKind::Searxng,
        );
        let urls: Vec<&str> = ranked.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
        let ranks: Vec<u32> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
        assert!(ranked
            .iter()
            .all(|r| r.source_backend == BackendKind::Searxng));
    }

    #[test]
    fn empty_result_list_is_unavailable() {
        let err = non_empty(Vec::new(), BackendKind::Scrape).unwrap_err();
        assert!(matches!(
            err,
            SearchError::BackendUnavailable {
                backend: BackendKind::Scrape,
                reason: FailureReason::Empty
            }
        ));
    }
}
