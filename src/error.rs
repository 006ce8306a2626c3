//! Typed errors for configuration validation.
//!
//! Content defects (empty pages, junk documents, irrelevant queries) are not
//! errors; they surface as an [`ExtractionOutcome`](crate::ExtractionOutcome)
//! on the result. The only fallible surface of this crate is a malformed
//! configuration handed in by the host.

use thiserror::Error;

/// Errors produced by [`ExtractConfig::validate`](crate::ExtractConfig::validate).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// BM25 and heuristic weights must form a convex combination.
    #[error("ranker weights must sum to 1.0, got {sum}")]
    RankerWeightSum { sum: f64 },

    /// The nine heuristic metric weights must sum to 1.0.
    #[error("heuristic weights must sum to 1.0, got {sum}")]
    HeuristicWeightSum { sum: f64 },

    /// BM25 saturation parameter must be positive.
    #[error("bm25 k1 must be positive, got {k1}")]
    InvalidK1 { k1: f64 },

    /// BM25 length-normalization parameter must be within `[0, 1]`.
    #[error("bm25 b must be within [0, 1], got {b}")]
    InvalidB { b: f64 },

    /// An excerpt set of size zero can never contain results.
    #[error("max_excerpts must be at least 1")]
    ZeroMaxExcerpts,

    /// A zero character budget can never admit an excerpt.
    #[error("char_budget must be at least 1")]
    ZeroCharBudget,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn test_display_includes_offending_value() {
        let err = ConfigError::RankerWeightSum { sum: 0.9 };
        check!(err.to_string().contains("0.9"));

        let err = ConfigError::InvalidB { b: 1.5 };
        check!(err.to_string().contains("1.5"));
    }
}
