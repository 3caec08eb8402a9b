use std::path::PathBuf;

use crate::weights::ScoreWeights;

#[derive(Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    pub sites_path: PathBuf,
    /// `None` disables the self-hosted meta-search tier.
    pub searxng_url: Option<String>,
    pub cse_api_key: Option<String>,
    pub cse_cx: Option<String>,
    pub cse_base_url: String,
    pub scrape_base_url: String,
    pub autocomplete_url: String,
    pub pagespeed_url: String,
    pub pagespeed_api_key: Option<String>,
    pub search_lang: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent_fetches: usize,
    pub max_concurrent_sites: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub score_weights: ScoreWeights,
    /// Overall-score drop (in points) at or beyond which an audit delta is a regression.
    pub score_drop_threshold: f64,
    /// Rank worsening (in positions) at or beyond which a position delta is a regression.
    pub position_drop_threshold: f64,
    pub match_subdomains: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("data_dir", &self.data_dir)
            .field("log_level", &self.log_level)
            .field("sites_path", &self.sites_path)
            .field("searxng_url", &self.searxng_url)
            .field(
                "cse_api_key",
                &self.cse_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("cse_cx", &self.cse_cx)
            .field("cse_base_url", &self.cse_base_url)
            .field("scrape_base_url", &self.scrape_base_url)
            .field("autocomplete_url", &self.autocomplete_url)
            .field("pagespeed_url", &self.pagespeed_url)
            .field(
                "pagespeed_api_key",
                &self.pagespeed_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("search_lang", &self.search_lang)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .field("max_concurrent_sites", &self.max_concurrent_sites)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("score_weights", &self.score_weights)
            .field("score_drop_threshold", &self.score_drop_threshold)
            .field("position_drop_threshold", &self.position_drop_threshold)
            .field("match_subdomains", &self.match_subdomains)
            .finish()
    }
}
