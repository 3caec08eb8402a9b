//! Body-text term frequency, language guess and keyword placement.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Terms reported per page.
pub const TOP_TERMS: usize = 10;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zа-яё]{3,}").expect("valid word regex"));
static CYRILLIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[а-яё]{3,}").expect("valid cyrillic regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermDensity {
    pub word: String,
    pub count: usize,
    /// Share of all counted words, in percent, to one decimal.
    pub density: f64,
    pub in_title: bool,
    pub in_h1: bool,
    pub in_desc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    /// `"ru"` when the body has a run of three Cyrillic letters, else `"en"`.
    pub lang: String,
    /// Words of three or more letters counted for density.
    pub counted_words: usize,
    pub top_terms: Vec<TermDensity>,
}

impl Default for ContentAnalysis {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            counted_words: 0,
            top_terms: Vec::new(),
        }
    }
}

/// Placement targets for the top terms; each is matched case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct Placement<'a> {
    pub title: Option<&'a str>,
    pub h1: Option<&'a str>,
    pub description: Option<&'a str>,
}

/// Ranks the body's words by frequency. Ties keep first-appearance order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze_content(body: &str, placement: Placement<'_>) -> ContentAnalysis {
    let lowered = body.to_lowercase();
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for m in WORD_RE.find_iter(&lowered) {
        total += 1;
        let count = counts.entry(m.as_str()).or_insert(0);
        if *count == 0 {
            order.push(m.as_str());
        }
        *count += 1;
    }

    let mut ranked: Vec<(&str, usize)> = order.iter().map(|w| (*w, counts[w])).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let lower = |s: Option<&str>| s.map(str::to_lowercase).unwrap_or_default();
    let (title, h1, description) = (
        lower(placement.title),
        lower(placement.h1),
        lower(placement.description),
    );

    let top_terms = ranked
        .into_iter()
        .take(TOP_TERMS)
        .map(|(word, count)| TermDensity {
            word: word.to_string(),
            count,
            density: (count as f64 / total as f64 * 1000.0).round() / 10.0,
            in_title: title.contains(word),
            in_h1: h1.contains(word),
            in_desc: description.contains(word),
        })
        .collect();

    ContentAnalysis {
        lang: if CYRILLIC_RE.is_match(body) { "ru" } else { "en" }.to_string(),
        counted_words: total,
        top_terms,
    }
}
