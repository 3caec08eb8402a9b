//! Audit score categories and the weight map used to fold them into an
//! overall score.
//!
//! Weights are operator-visible configuration: every category must carry a
//! weight in `[0.0, 1.0]` and the weights must sum to `1.0`.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Tolerance used when checking that weights sum to `1.0`.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Default weights as an env-style string, also the documented format of
/// `SEOSCOPE_SCORE_WEIGHTS`.
pub const DEFAULT_WEIGHTS: &str =
    "meta=0.25,structured_data=0.20,performance=0.20,keywords=0.20,machine_readability=0.15";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Meta,
    StructuredData,
    Performance,
    Keywords,
    MachineReadability,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Meta,
        Category::StructuredData,
        Category::Performance,
        Category::Keywords,
        Category::MachineReadability,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Meta => "meta",
            Category::StructuredData => "structured_data",
            Category::Performance => "performance",
            Category::Keywords => "keywords",
            Category::MachineReadability => "machine_readability",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| ConfigError::InvalidWeights(format!("unknown category \"{s}\"")))
    }
}

/// Validated `{category: weight}` map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreWeights(BTreeMap<Category, f64>);

impl ScoreWeights {
    /// Builds a weight map, rejecting missing categories, out-of-range values,
    /// and sums that differ from `1.0`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWeights`] describing the first violation.
    pub fn new(weights: BTreeMap<Category, f64>) -> Result<Self, ConfigError> {
        for category in Category::ALL {
            let Some(&w) = weights.get(&category) else {
                return Err(ConfigError::InvalidWeights(format!(
                    "missing weight for {category}"
                )));
            };
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(ConfigError::InvalidWeights(format!(
                    "weight for {category} must be within [0, 1], got {w}"
                )));
            }
        }

        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::InvalidWeights(format!(
                "weights must sum to 1.0, got {sum}"
            )));
        }

        Ok(Self(weights))
    }

    /// Parses `"meta=0.25,structured_data=0.2,..."`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWeights`] on malformed pairs, unknown or
    /// duplicate categories, or a failed validation.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                ConfigError::InvalidWeights(format!("expected category=weight, got \"{pair}\""))
            })?;
            let category: Category = name.parse()?;
            let weight = value.trim().parse::<f64>().map_err(|e| {
                ConfigError::InvalidWeights(format!("weight for {category}: {e}"))
            })?;
            if map.insert(category, weight).is_some() {
                return Err(ConfigError::InvalidWeights(format!(
                    "duplicate weight for {category}"
                )));
            }
        }
        Self::new(map)
    }

    #[must_use]
    pub fn weight(&self, category: Category) -> f64 {
        self.0.get(&category).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.0.iter().map(|(c, w)| (*c, *w))
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Category::Meta, 0.25),
            (Category::StructuredData, 0.20),
            (Category::Performance, 0.20),
            (Category::Keywords, 0.20),
            (Category::MachineReadability, 0.15),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let sum: f64 = ScoreWeights::default().iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
    }

    #[test]
    fn default_string_matches_default_map() {
        assert_eq!(
            ScoreWeights::parse(DEFAULT_WEIGHTS).unwrap(),
            ScoreWeights::default()
        );
    }

    #[test]
    fn parse_rejects_sum_not_one() {
        let err = ScoreWeights::parse(
            "meta=0.5,structured_data=0.5,performance=0.5,keywords=0,machine_readability=0",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights(ref m) if m.contains("sum")));
    }

    #[test]
    fn parse_rejects_missing_category() {
        let err = ScoreWeights::parse("meta=0.5,structured_data=0.5").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights(ref m) if m.contains("missing")));
    }

    #[test]
    fn parse_rejects_unknown_category() {
        let err = ScoreWeights::parse("speed=1.0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights(ref m) if m.contains("unknown")));
    }

    #[test]
    fn parse_rejects_duplicate_category() {
        let err = ScoreWeights::parse(
            "meta=0.2,meta=0.05,structured_data=0.2,performance=0.2,keywords=0.2,machine_readability=0.15",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn parse_rejects_negative_weight() {
        let err = ScoreWeights::parse(
            "meta=-0.1,structured_data=0.3,performance=0.3,keywords=0.3,machine_readability=0.2",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights(_)));
    }

    #[test]
    fn parse_accepts_zero_weights() {
        let weights = ScoreWeights::parse(
            "meta=1.0,structured_data=0,performance=0,keywords=0,machine_readability=0",
        )
        .unwrap();
        assert_eq!(weights.weight(Category::Meta), 1.0);
        assert_eq!(weights.weight(Category::Performance), 0.0);
    }

    #[test]
    fn category_round_trips_through_str() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
    }
}
