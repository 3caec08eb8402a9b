use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{non_empty, rank_hits, transport, SearchBackend};
use crate::error::{FailureReason, SearchError};
use crate::types::{BackendKind, SearchResult};

/// Self-hosted SearXNG instance exposing the Tavily-compatible
/// `POST /search` endpoint.
pub struct SearxngBackend {
    client: Client,
    base_url: Option<String>,
}

#[derive(Serialize)]
struct SearxngRequest<'a> {
    query: &'a str,
    max_results: usize,
    engines: &'a str,
}

#[derive(Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngItem>,
}

#[derive(Deserialize)]
struct SearxngItem {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl SearxngBackend {
    /// `base_url = None` leaves the tier permanently not-configured.
    #[must_use]
    pub fn new(client: Client, base_url: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }
}

#[async_trait]
impl SearchBackend for SearxngBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Searxng
    }

    async fn search(
        &self,
        phrase: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let kind = self.kind();
        let Some(base_url) = self.base_url.as_deref() else {
            return Err(SearchError::unavailable(
                kind,
                FailureReason::NotConfigured("no SearXNG base URL".to_string()),
            ));
        };

        let response = self
            .client
            .post(format!("{base_url}/search"))
            .json(&SearxngRequest {
                query: phrase,
                max_results,
                engines: "google",
            })
            .send()
            .await
            .map_err(|e| transport(kind, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::unavailable(
                kind,
                FailureReason::from_status(status.as_u16()),
            ));
        }

        let body = response.text().await.map_err(|e| transport(kind, &e))?;
        let parsed: SearxngResponse = serde_json::from_str(&body).map_err(|e| {
            SearchError::unavailable(kind, FailureReason::Malformed(e.to_string()))
        })?;

        let hits = parsed
            .results
            .into_iter()
            .map(|item| (item.url, item.title, item.content));
        non_empty(rank_hits(hits, max_results, kind), kind)
    }
}
