//! Wires the library crates together from one [`AppConfig`].

use std::sync::Arc;

use seoscope_audit::{NoSpeedProvider, PageAuditor, PageSpeedClient, SpeedProvider};
use seoscope_core::AppConfig;
use seoscope_search::{
    build_http_client, AutocompleteClient, BackendChain, DomainMatch, KeywordExpander,
    RetryPolicy, SerpExtractor, SuggestionSource,
};
use seoscope_store::{FileSnapshotStore, Thresholds};

pub(crate) struct Services {
    pub config: AppConfig,
    pub auditor: PageAuditor,
    pub serp: SerpExtractor,
    pub expander: KeywordExpander,
    pub store: FileSnapshotStore,
    pub thresholds: Thresholds,
}

impl Services {
    /// Builds every collaborator on a single shared HTTP client so the
    /// configured timeout and user agent apply to all outbound requests.
    pub(crate) fn build(config: AppConfig, skip_speed: bool) -> anyhow::Result<Self> {
        let client = build_http_client(config.request_timeout_secs, &config.user_agent)
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

        let suggestions: Arc<dyn SuggestionSource> = Arc::new(AutocompleteClient::new(
            client.clone(),
            &config.autocomplete_url,
            &config.search_lang,
        ));
        let expander = KeywordExpander::new(suggestions);

        let speed: Arc<dyn SpeedProvider> = if skip_speed {
            Arc::new(NoSpeedProvider)
        } else {
            Arc::new(PageSpeedClient::new(
                client.clone(),
                &config.pagespeed_url,
                config.pagespeed_api_key.clone(),
            ))
        };

        let chain = BackendChain::from_config(&config, &client);
        if chain.is_empty() {
            tracing::warn!("no search backend is configured; SERP lookups will fail");
        }
        let serp = SerpExtractor::new(chain, client.clone(), config.max_concurrent_fetches)
            .with_domain_match(DomainMatch::from_flag(config.match_subdomains))
            .with_retry(RetryPolicy::from_config(&config));

        let auditor = PageAuditor::new(
            client,
            expander.clone(),
            speed,
            config.score_weights.clone(),
        );

        Ok(Self {
            store: FileSnapshotStore::new(config.data_dir.clone()),
            thresholds: Thresholds::from_config(&config),
            auditor,
            serp,
            expander,
            config,
        })
    }
}
