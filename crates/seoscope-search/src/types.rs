use serde::{Deserialize, Serialize};

/// Identifies which tier of the backend chain produced a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Searxng,
    CustomSearch,
    Scrape,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Searxng => "searxng",
            BackendKind::CustomSearch => "custom_search",
            BackendKind::Scrape => "scrape",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One organic result. `rank` is 1-based and unique within a result list;
/// it is assigned by the backend and never re-ranked downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub rank: u32,
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub source_backend: BackendKind,
}

/// Lightweight SEO signals of a competing result page.
///
/// `rank`, `url` and `title` always come from the [`SearchResult`]. Every
/// other field is `None` when the page could not be fetched, in which case
/// `fetch_error` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorProfile {
    pub rank: u32,
    pub url: String,
    pub title: String,
    pub domain: Option<String>,
    pub page_title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    pub h1_count: Option<usize>,
    pub word_count: Option<usize>,
    pub has_schema: Option<bool>,
    pub schema_types: Option<Vec<String>>,
    pub has_faq: Option<bool>,
    pub has_og_image: Option<bool>,
    pub fetch_error: Option<String>,
}

impl CompetitorProfile {
    /// Profile carrying only the search-result fields, marked as degraded.
    #[must_use]
    pub fn degraded(result: &SearchResult, domain: Option<String>, error: String) -> Self {
        Self {
            rank: result.rank,
            url: result.url.clone(),
            title: result.title.clone(),
            domain,
            page_title: None,
            meta_description: None,
            h1: None,
            h1_count: None,
            word_count: None,
            has_schema: None,
            schema_types: None,
            has_faq: None,
            has_og_image: None,
            fetch_error: Some(error),
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.fetch_error.is_some()
    }
}
