//! Document quality gate.
//!
//! Rejects low-signal documents (link farms, navigation shells, scraped
//! fragments) before any scoring work happens. Checks run in a fixed
//! priority order; the first failure wins and becomes the reject reason.

use crate::config::QualityConfig;
use crate::types::Sentence;

/// Character length above which a sentence counts as "long".
const LONG_SENTENCE_CHARS: usize = 50;

/// Character length below which a sentence counts as a fragment.
const FRAGMENT_CHARS: usize = 30;

/// Structural statistics plus the gate verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub total_sentences: usize,
    pub long_sentence_count: usize,
    pub median_sentence_length: f64,
    pub fragment_ratio: f64,
    pub passes: bool,
    pub reason: Option<String>,
}

/// Assess document quality over the post-filter sentences.
pub fn assess(sentences: &[Sentence], config: &QualityConfig) -> QualityReport {
    if sentences.is_empty() {
        return QualityReport {
            total_sentences: 0,
            long_sentence_count: 0,
            median_sentence_length: 0.0,
            fragment_ratio: 1.0,
            passes: false,
            reason: Some("No sentences found".to_string()),
        };
    }

    let lengths: Vec<usize> = sentences
        .iter()
        .map(|s| s.text.chars().count())
        .collect();
    let total_sentences = lengths.len();
    let long_sentence_count = lengths.iter().filter(|&&l| l > LONG_SENTENCE_CHARS).count();
    let fragment_count = lengths.iter().filter(|&&l| l < FRAGMENT_CHARS).count();
    let fragment_ratio = fragment_count as f64 / total_sentences as f64;
    let median_sentence_length = median(&lengths);

    let reason = if total_sentences < config.min_total_sentences {
        Some(format!(
            "Too few sentences ({} < {})",
            total_sentences, config.min_total_sentences
        ))
    } else if long_sentence_count < config.min_long_sentences {
        Some(format!(
            "Too few long sentences ({} < {})",
            long_sentence_count, config.min_long_sentences
        ))
    } else if fragment_ratio > config.max_fragment_ratio {
        Some(format!(
            "Too many fragments ({:.2} > {:.2})",
            fragment_ratio, config.max_fragment_ratio
        ))
    } else if median_sentence_length < config.min_median_length {
        Some(format!(
            "Median sentence too short ({:.0} < {:.0})",
            median_sentence_length, config.min_median_length
        ))
    } else {
        None
    };

    QualityReport {
        total_sentences,
        long_sentence_count,
        median_sentence_length,
        fragment_ratio,
        passes: reason.is_none(),
        reason,
    }
}

fn median(values: &[usize]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid] as f64
    } else {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockType;
    use assert2::check;

    fn sentence(text: &str) -> Sentence {
        Sentence {
            text: text.to_string(),
            tokens: Vec::new(),
            heading_path: Vec::new(),
            block_type: BlockType::P,
            block_index: 0,
            sentence_index: 0,
            global_index: 0,
            position: 0.0,
        }
    }

    fn long_sentence() -> Sentence {
        sentence("This sentence is comfortably longer than fifty characters in total.")
    }

    #[test]
    fn test_empty_input() {
        let report = assess(&[], &QualityConfig::default());
        check!(!report.passes);
        check!(report.reason.as_deref() == Some("No sentences found"));
        check!((report.fragment_ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_good_document_passes() {
        let sentences: Vec<Sentence> = (0..6).map(|_| long_sentence()).collect();
        let report = assess(&sentences, &QualityConfig::default());
        check!(report.passes);
        check!(report.reason.is_none());
    }

    #[test]
    fn test_too_few_sentences_wins_first() {
        // Also short and fragmented, but the count check has priority.
        let sentences = vec![sentence("tiny"), sentence("also tiny")];
        let report = assess(&sentences, &QualityConfig::default());
        check!(!report.passes);
        check!(report.reason.as_deref().unwrap().starts_with("Too few sentences"));
    }

    #[test]
    fn test_too_few_long_sentences() {
        let sentences = vec![
            long_sentence(),
            sentence("This one is of a medium, reasonable size."),
            sentence("As is this one, just over the fragment limit."),
            sentence("And this one too, sized like the previous two."),
            sentence("One more of the same comfortable middle size."),
        ];
        let report = assess(&sentences, &QualityConfig::default());
        check!(!report.passes);
        check!(report.reason.as_deref().unwrap().starts_with("Too few long sentences"));
    }

    #[test]
    fn test_fragment_ratio_rejects() {
        let mut sentences = vec![long_sentence(), long_sentence(), long_sentence()];
        for _ in 0..7 {
            sentences.push(sentence("shard"));
        }
        let report = assess(&sentences, &QualityConfig::default());
        check!(!report.passes);
        check!(report.reason.as_deref().unwrap().starts_with("Too many fragments"));
    }

    #[test]
    fn test_median_rejects() {
        // Three long sentences, four mid-length ones that keep the fragment
        // ratio legal but drag the median below 25.
        let mut sentences = vec![long_sentence(), long_sentence(), long_sentence()];
        for _ in 0..4 {
            sentences.push(sentence("thirty characters, about..."));
        }
        let config = QualityConfig {
            min_median_length: 40.0,
            ..QualityConfig::default()
        };
        let report = assess(&sentences, &config);
        check!(!report.passes);
        check!(report.reason.as_deref().unwrap().starts_with("Median sentence too short"));
    }
}
