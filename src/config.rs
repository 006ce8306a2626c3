//! Per-stage configuration records.
//!
//! Every numeric threshold in the pipeline is surfaced here rather than
//! buried in module-level constants, so hosts can tune each stage through a
//! single JSON-shaped document. All records implement `Default` with the
//! tuned values the extractor ships with, and deserialize with
//! `#[serde(default)]` so partial configs are accepted.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// BM25 term-weighting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    /// Term-frequency saturation. Higher values let repeated terms keep
    /// contributing; lower values flatten quickly.
    pub k1: f64,
    /// Length normalization strength in `[0, 1]`. `0` ignores sentence
    /// length, `1` fully penalizes long sentences.
    pub b: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Weights for the nine structural heuristics. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    pub heading_path: f64,
    pub coverage: f64,
    pub proximity: f64,
    pub heading_proximity: f64,
    pub structure: f64,
    pub density: f64,
    pub outlier: f64,
    pub meta_section: f64,
    pub position: f64,
}

impl HeuristicWeights {
    /// Sum of all nine weights.
    pub fn sum(&self) -> f64 {
        self.heading_path
            + self.coverage
            + self.proximity
            + self.heading_proximity
            + self.structure
            + self.density
            + self.outlier
            + self.meta_section
            + self.position
    }
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            heading_path: 0.17,
            coverage: 0.16,
            proximity: 0.14,
            heading_proximity: 0.11,
            structure: 0.11,
            density: 0.09,
            outlier: 0.09,
            meta_section: 0.08,
            position: 0.05,
        }
    }
}

/// Relevance decision strictness.
///
/// `Strict` is tuned for a single page the caller already trusts;
/// `Search` loosens the thresholds for multi-page result sets where
/// recall matters more than precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelevanceMode {
    #[default]
    Strict,
    Search,
}

/// Score combination and relevance detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// Weight of the normalized BM25 score in the combined score.
    pub bm25_weight: f64,
    /// Weight of the combined heuristic score. `bm25_weight + heuristic_weight`
    /// must equal 1.0.
    pub heuristic_weight: f64,
    pub bm25: Bm25Config,
    pub weights: HeuristicWeights,
    pub relevance_mode: RelevanceMode,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            bm25_weight: 0.6,
            heuristic_weight: 0.4,
            bm25: Bm25Config::default(),
            weights: HeuristicWeights::default(),
            relevance_mode: RelevanceMode::default(),
        }
    }
}

/// Anchor selection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Maximum number of anchors to seed context windows from.
    pub max_anchors: usize,
    /// Minimum combined score for a sentence to qualify as an anchor.
    pub min_score: f64,
    /// Maximum token Jaccard similarity to any already-selected anchor.
    pub diversity_threshold: f64,
    /// Minimum `global_index` distance to any already-selected anchor.
    pub min_position_gap: usize,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            max_anchors: 5,
            min_score: 0.25,
            diversity_threshold: 0.4,
            min_position_gap: 3,
        }
    }
}

/// Context window expansion settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandConfig {
    /// Sentences before the anchor in sentence-count mode.
    pub context_before: usize,
    /// Sentences after the anchor in sentence-count mode.
    pub context_after: usize,
    /// In sentence-count mode, trim window edges that would cut a
    /// multi-sentence block in half.
    pub respect_block_boundaries: bool,
    /// Character budget per chunk (raw sentence text plus one per sentence).
    pub max_chunk_chars: usize,
    /// Let a trailing code block bleed past the window, up to 1.5x the budget.
    pub include_code_blocks: bool,
    /// Expand to the enclosing section instead of a fixed sentence window.
    pub expand_to_section: bool,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            context_before: 5,
            context_after: 8,
            respect_block_boundaries: true,
            max_chunk_chars: 2000,
            include_code_blocks: true,
            expand_to_section: true,
        }
    }
}

/// Chunk merge/drop thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    /// Sentence-overlap ratio (over the smaller chunk) at which chunks merge.
    pub overlap_threshold: f64,
    /// Token Jaccard similarity at which the lower-scoring chunk is dropped.
    pub token_similarity_threshold: f64,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.3,
            token_similarity_threshold: 0.72,
        }
    }
}

/// Final excerpt assembly budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcerptConfig {
    pub max_excerpts: usize,
    /// Total character budget across all excerpts.
    pub char_budget: usize,
    /// Chunks below this size are never emitted.
    pub min_excerpt_chars: usize,
}

impl Default for ExcerptConfig {
    fn default() -> Self {
        Self {
            max_excerpts: 3,
            char_budget: 2000,
            min_excerpt_chars: 50,
        }
    }
}

/// Document quality gate thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub min_total_sentences: usize,
    /// Minimum count of sentences longer than 50 characters.
    pub min_long_sentences: usize,
    /// Maximum fraction of sentences shorter than 30 characters.
    pub max_fragment_ratio: f64,
    pub min_median_length: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_total_sentences: 5,
            min_long_sentences: 3,
            max_fragment_ratio: 0.65,
            min_median_length: 25.0,
        }
    }
}

/// Aggregate configuration for a single extraction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub ranker: RankerConfig,
    pub anchors: AnchorConfig,
    pub expand: ExpandConfig,
    pub dedupe: DedupeConfig,
    pub excerpts: ExcerptConfig,
    pub quality: QualityConfig,
    /// Bypass the document quality gate entirely.
    pub skip_quality_check: bool,
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

impl ExtractConfig {
    /// Check the configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranker_sum = self.ranker.bm25_weight + self.ranker.heuristic_weight;
        if (ranker_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::RankerWeightSum { sum: ranker_sum });
        }
        let heuristic_sum = self.ranker.weights.sum();
        if (heuristic_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::HeuristicWeightSum { sum: heuristic_sum });
        }
        if self.ranker.bm25.k1 <= 0.0 {
            return Err(ConfigError::InvalidK1 {
                k1: self.ranker.bm25.k1,
            });
        }
        if !(0.0..=1.0).contains(&self.ranker.bm25.b) {
            return Err(ConfigError::InvalidB {
                b: self.ranker.bm25.b,
            });
        }
        if self.excerpts.max_excerpts == 0 {
            return Err(ConfigError::ZeroMaxExcerpts);
        }
        if self.excerpts.char_budget == 0 {
            return Err(ConfigError::ZeroCharBudget);
        }
        Ok(())
    }
}
