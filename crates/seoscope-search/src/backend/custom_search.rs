use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{non_empty, rank_hits, RawHit, SearchBackend};
use crate::error::{FailureReason, SearchError};
use crate::types::{BackendKind, SearchResult};

/// The API serves at most this many items per request.
const PAGE_SIZE: usize = 10;

/// Google Custom Search JSON API.
///
/// Pages through `start = 1, 11, 21, ..` until `max_results` items are
/// collected. A 429/403 mid-way (daily quota) stops paging and keeps what was
/// already collected; on the first page it fails the tier.
pub struct CustomSearchBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    cx: Option<String>,
    lang: String,
}

#[derive(Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Deserialize)]
struct CseItem {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

impl CustomSearchBackend {
    #[must_use]
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: Option<String>,
        cx: Option<String>,
        lang: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            cx,
            lang: lang.to_string(),
        }
    }

    async fn fetch_page(
        &self,
        key: &str,
        cx: &str,
        phrase: &str,
        num: usize,
        start: usize,
    ) -> Result<Vec<CseItem>, FailureReason> {
        let num = num.to_string();
        let start = start.to_string();
        let response = self
            .client
            .get(format!("{}/customsearch/v1", self.base_url))
            .query(&[
                ("key", key),
                ("cx", cx),
                ("q", phrase),
                ("hl", self.lang.as_str()),
                ("num", num.as_str()),
                ("start", start.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FailureReason::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::from_status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FailureReason::from_reqwest(&e))?;
        let parsed: CseResponse =
            serde_json::from_str(&body).map_err(|e| FailureReason::Malformed(e.to_string()))?;
        Ok(parsed.items)
    }
}

#[async_trait]
impl SearchBackend for CustomSearchBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::CustomSearch
    }

    async fn search(
        &self,
        phrase: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let kind = self.kind();
        let (Some(key), Some(cx)) = (self.api_key.as_deref(), self.cx.as_deref()) else {
            return Err(SearchError::unavailable(
                kind,
                FailureReason::NotConfigured("API key and cx are required".to_string()),
            ));
        };

        let mut hits: Vec<RawHit> = Vec::new();
        let mut start = 1;
        while hits.len() < max_results {
            let num = PAGE_SIZE.min(max_results - hits.len());
            match self.fetch_page(key, cx, phrase, num, start).await {
                Ok(items) => {
                    let received = items.len();
                    hits.extend(
                        items
                            .into_iter()
                            .map(|item| (item.link, item.title, item.snippet)),
                    );
                    if received < num {
                        break;
                    }
                }
                Err(reason) if hits.is_empty() => {
                    return Err(SearchError::unavailable(kind, reason));
                }
                Err(reason) => {
                    tracing::debug!(
                        backend = %kind,
                        start,
                        reason = %reason,
                        "custom search paging stopped early"
                    );
                    break;
                }
            }
            start += PAGE_SIZE;
        }

        non_empty(rank_hits(hits, max_results, kind), kind)
    }
}

