//! Search-side intelligence for seoscope.
//!
//! Runs queries through a prioritized chain of search backends (self-hosted
//! SearXNG, Google Custom Search, direct scrape), resolves where a target
//! domain ranks, profiles competing pages, and expands seed phrases through
//! an autocomplete source.

pub mod autocomplete;
pub mod backend;
pub mod chain;
pub mod client;
pub mod domain;
pub mod error;
pub mod html;
pub mod retry;
pub mod serp;
pub mod types;

pub use autocomplete::{AutocompleteClient, KeywordExpander, KeywordIdea, SuggestionSource};
pub use backend::{CustomSearchBackend, ScrapeBackend, SearchBackend, SearxngBackend};
pub use chain::BackendChain;
pub use client::{build_http_client, fetch_page};
pub use domain::DomainMatch;
pub use error::{BackendAttempt, FailureReason, SearchError};
pub use retry::RetryPolicy;
pub use serp::{PositionReport, SerpExtractor, SerpReport};
pub use types::{BackendKind, CompetitorProfile, SearchResult};
