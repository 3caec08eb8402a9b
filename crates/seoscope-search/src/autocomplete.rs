use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FailureReason;

/// Question and comparison suffixes used by
/// [`KeywordExpander::expand_with_modifiers`].
pub const MODIFIERS: [&str; 6] = ["how", "why", "what", "vs", "best", "for"];

/// Something that turns a phrase into raw keyword suggestions.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(&self, phrase: &str) -> Result<Vec<String>, FailureReason>;
}

/// Autocomplete endpoint answering `GET /complete/search?client=firefox`
/// with `[query, [suggestion, ...]]`.
pub struct AutocompleteClient {
    client: Client,
    base_url: String,
    lang: String,
}

impl AutocompleteClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str, lang: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            lang: lang.to_string(),
        }
    }
}

#[async_trait]
impl SuggestionSource for AutocompleteClient {
    async fn suggest(&self, phrase: &str) -> Result<Vec<String>, FailureReason> {
        let response = self
            .client
            .get(format!("{}/complete/search", self.base_url))
            .query(&[
                ("client", "firefox"),
                ("q", phrase),
                ("hl", self.lang.as_str()),
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
        parse_suggestions(&body)
    }
}

fn parse_suggestions(body: &str) -> Result<Vec<String>, FailureReason> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FailureReason::Malformed(e.to_string()))?;
    let suggestions = value
        .get(1)
        .and_then(Value::as_array)
        .ok_or_else(|| FailureReason::Malformed("expected [query, [suggestions]]".to_string()))?;
    Ok(suggestions
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect())
}

/// A suggestion attributed to the seed that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordIdea {
    pub keyword: String,
    pub source: String,
}

/// Expands seed phrases into normalized keyword candidate sets.
///
/// Source failures are logged and absorbed: callers always get at least the
/// normalized seed back.
#[derive(Clone)]
pub struct KeywordExpander {
    source: Arc<dyn SuggestionSource>,
}

impl KeywordExpander {
    #[must_use]
    pub fn new(source: Arc<dyn SuggestionSource>) -> Self {
        Self { source }
    }

    /// Seed plus its direct suggestions. A blank seed yields an empty set.
    pub async fn expand(&self, seed: &str) -> BTreeSet<String> {
        let seed = normalize(seed);
        let mut out = BTreeSet::new();
        if seed.is_empty() {
            return out;
        }
        self.collect_into(&seed, &mut out).await;
        out.insert(seed);
        out
    }

    /// Like [`KeywordExpander::expand`], additionally querying
    /// `"{seed} {modifier}"` for each of [`MODIFIERS`].
    pub async fn expand_with_modifiers(&self, seed: &str) -> BTreeSet<String> {
        let seed = normalize(seed);
        let mut out = BTreeSet::new();
        if seed.is_empty() {
            return out;
        }
        self.collect_into(&seed, &mut out).await;
        for modifier in MODIFIERS {
            self.collect_into(&format!("{seed} {modifier}"), &mut out)
                .await;
        }
        out.insert(seed);
        out
    }

    /// Suggestions for each seed in turn, deduplicated case-insensitively
    /// across seeds; the first seed to produce a keyword owns it.
    pub async fn keyword_ideas(&self, seeds: &[String]) -> Vec<KeywordIdea> {
        let mut seen = HashSet::new();
        let mut ideas = Vec::new();
        for seed in seeds {
            let trimmed = seed.trim();
            if trimmed.is_empty() {
                continue;
            }
            for suggestion in self.suggest_or_empty(trimmed).await {
                let keyword = collapse_whitespace(&suggestion);
                if keyword.is_empty() || !seen.insert(keyword.to_lowercase()) {
                    continue;
                }
                ideas.push(KeywordIdea {
                    keyword,
                    source: trimmed.to_string(),
                });
            }
        }
        ideas
    }

    async fn collect_into(&self, phrase: &str, out: &mut BTreeSet<String>) {
        out.extend(
            self.suggest_or_empty(phrase)
                .await
                .iter()
                .map(|s| normalize(s))
                .filter(|s| !s.is_empty()),
        );
    }

    async fn suggest_or_empty(&self, phrase: &str) -> Vec<String> {
        match self.source.suggest(phrase).await {
            Ok(suggestions) => suggestions,
            Err(error) => {
                tracing::warn!(
                    phrase,
                    error = %error,
                    "suggestion source failed; continuing without suggestions"
                );
                Vec::new()
            }
        }
    }
}

/// Lowercases and collapses internal whitespace.
#[must_use]
pub fn normalize(phrase: &str) -> String {
    collapse_whitespace(phrase).to_lowercase()
}

fn collapse_whitespace(phrase: &str) -> String {
    phrase.split_whitespace().collect::<Vec<_>>().join(" ")
}
