//! Matching configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Thresholds and weights shared by the table matcher, column matcher and aggregator.
///
/// Every field has a default, so a partial TOML table deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    /// Descriptor similarity that accepts a table pair on its own (default: 0.80).
    pub table_threshold: f64,
    /// Descriptor similarity that accepts a table pair with column overlap (default: 0.50).
    pub table_medium_threshold: f64,
    /// Column similarity required to accept an assigned column pair (default: 0.75).
    pub column_threshold: f64,
    /// Column similarities in this inclusive range get a secondary check (default: 0.50..0.80).
    pub ambiguous_band: [f64; 2],
    /// Fuzzy score on a 0-100 scale that counts as a name match (default: 70).
    pub fuzzy_threshold: f64,
    /// Weight of the column overlap count in the table assignment cost (default: 1000).
    pub overlap_weight: f64,
    /// Overlap a table pair needs to be assignable at all (default: 1).
    pub min_column_matches: usize,
    /// Share of answer columns that must match for a table hit (default: 0.80).
    pub min_column_ratio: f64,
    /// Points awarded per table hit (default: 0.5).
    pub points_per_table: f64,
    /// Only score pairs whose similarity also reaches `table_threshold` (default: true).
    pub require_table_similarity: bool,
    /// Columns included in a table descriptor text (default: 30).
    pub descriptor_column_limit: usize,
    /// Entries kept in the canonical-form memo (default: 4096).
    pub canonical_cache_capacity: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            table_threshold: 0.80,
            table_medium_threshold: 0.50,
            column_threshold: 0.75,
            ambiguous_band: [0.50, 0.80],
            fuzzy_threshold: 70.0,
            overlap_weight: 1000.0,
            min_column_matches: 1,
            min_column_ratio: 0.80,
            points_per_table: 0.5,
            require_table_similarity: true,
            descriptor_column_limit: 30,
            canonical_cache_capacity: 4096,
        }
    }
}

impl MatchConfig {
    /// Tighter thresholds for reference-quality grading.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            table_threshold: 0.85,
            table_medium_threshold: 0.60,
            column_threshold: 0.82,
            fuzzy_threshold: 80.0,
            min_column_ratio: 0.90,
            ..Self::default()
        }
    }

    /// Looser thresholds for exploratory grading of noisy submissions.
    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            table_threshold: 0.65,
            table_medium_threshold: 0.45,
            column_threshold: 0.70,
            fuzzy_threshold: 65.0,
            require_table_similarity: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_points_per_table(mut self, points: f64) -> Self {
        self.points_per_table = points;
        self
    }

    #[must_use]
    pub fn with_column_threshold(mut self, threshold: f64) -> Self {
        self.column_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_table_threshold(mut self, threshold: f64) -> Self {
        self.table_threshold = threshold;
        self
    }

    /// True when `score` falls inside the ambiguous band.
    pub fn in_ambiguous_band(&self, score: f64) -> bool {
        score >= self.ambiguous_band[0] && score <= self.ambiguous_band[1]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("table_threshold", self.table_threshold),
            ("table_medium_threshold", self.table_medium_threshold),
            ("column_threshold", self.column_threshold),
            ("min_column_ratio", self.min_column_ratio),
            ("ambiguous_band", self.ambiguous_band[0]),
            ("ambiguous_band", self.ambiguous_band[1]),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }
        if !(0.0..=100.0).contains(&self.fuzzy_threshold) {
            return Err(ConfigError::FuzzyThreshold(self.fuzzy_threshold));
        }
        let [low, high] = self.ambiguous_band;
        if low > high {
            return Err(ConfigError::InvertedBand { low, high });
        }
        for (field, value) in [
            ("overlap_weight", self.overlap_weight),
            ("points_per_table", self.points_per_table),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        Ok(())
    }
}
