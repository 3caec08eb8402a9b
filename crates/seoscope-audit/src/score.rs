//! Category sub-scores (each `0..=100`) and their weighted overall.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use seoscope_core::{Category, ScoreWeights};

use crate::facts::PageFacts;
use crate::site_files::SiteFiles;

/// Title lengths (in characters) that earn the length points.
pub const TITLE_LEN: RangeInclusive<usize> = 10..=60;
/// Meta description lengths (in characters) that earn the length points.
pub const DESCRIPTION_LEN: RangeInclusive<usize> = 50..=160;

const IDENTITY_TYPES: [&str; 2] = ["Organization", "WebSite"];
const RICH_TYPES: [&str; 6] = [
    "FAQPage",
    "HowTo",
    "Article",
    "BlogPosting",
    "Product",
    "SoftwareApplication",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditScore {
    pub categories: BTreeMap<Category, f64>,
    pub overall: f64,
    /// Categories whose input signal was missing; they score 0.
    pub unavailable: Vec<Category>,
}

impl AuditScore {
    /// Folds sub-scores into an overall score. Categories absent from
    /// `scores` count as 0; every score is clamped to `0..=100`.
    #[must_use]
    pub fn combine(
        scores: &BTreeMap<Category, f64>,
        weights: &ScoreWeights,
        unavailable: Vec<Category>,
    ) -> Self {
        let categories: BTreeMap<Category, f64> = Category::ALL
            .into_iter()
            .map(|c| (c, clamp_score(scores.get(&c).copied().unwrap_or(0.0))))
            .collect();
        let overall = categories
            .iter()
            .map(|(c, score)| weights.weight(*c) * score)
            .sum::<f64>();
        Self {
            categories,
            overall: clamp_score(overall),
            unavailable,
        }
    }

    #[must_use]
    pub fn category(&self, category: Category) -> f64 {
        self.categories.get(&category).copied().unwrap_or(0.0)
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[must_use]
pub fn score_meta(facts: &PageFacts) -> f64 {
    let mut score = 0.0;
    if let Some(title) = &facts.title {
        score += 30.0;
        if TITLE_LEN.contains(&title.chars().count()) {
            score += 20.0;
        }
    }
    if let Some(desc) = &facts.meta_description {
        score += 30.0;
        if DESCRIPTION_LEN.contains(&desc.chars().count()) {
            score += 20.0;
        }
    }
    score
}

/// Unparseable JSON-LD blocks never count.
#[must_use]
pub fn score_structured_data(facts: &PageFacts) -> f64 {
    if facts.jsonld_blocks == 0 {
        return 0.0;
    }
    let has = |wanted: &[&str]| {
        facts
            .jsonld_types
            .iter()
            .any(|t| wanted.contains(&t.as_str()))
    };
    let mut score = 60.0;
    if has(&IDENTITY_TYPES) {
        score += 20.0;
    }
    if has(&RICH_TYPES) {
        score += 20.0;
    }
    score
}

#[must_use]
pub fn score_performance(speed: Option<f64>) -> Option<f64> {
    speed.map(clamp_score)
}

/// Share of `candidates` found as whole-word phrases in `body`, times 100.
/// `None` when there are no candidates to look for.
#[must_use]
pub fn score_keywords(candidates: &BTreeSet<String>, body: &str) -> Option<f64> {
    let haystack = format!(" {} ", word_tokens(body));
    let needles: Vec<String> = candidates
        .iter()
        .map(|c| word_tokens(c))
        .filter(|c| !c.is_empty())
        .collect();
    if needles.is_empty() {
        return None;
    }
    let found = needles
        .iter()
        .filter(|needle| haystack.contains(&format!(" {needle} ")))
        .count();
    #[allow(clippy::cast_precision_loss)]
    let share = found as f64 / needles.len() as f64;
    Some(share * 100.0)
}

#[must_use]
pub fn score_machine_readability(site: &SiteFiles) -> f64 {
    let mut score = 0.0;
    if site.llms_txt {
        score += 80.0;
    }
    if site.llms_full_txt {
        score += 20.0;
    }
    score
}

/// Lowercased words separated by single spaces, punctuation dropped.
fn word_tokens(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
