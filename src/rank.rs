//! Score combination and relevance detection.
//!
//! BM25 and the structural heuristics are computed per sentence, the raw
//! BM25 range is min-max normalized, and the two are blended by the
//! configured weights. Relevance is decided on the *raw* BM25 ceiling plus
//! coverage/cooccurrence signals, before normalization flattens the scale.

use crate::bm25::{build_document_stats, score_sentence};
use crate::config::{RankerConfig, RelevanceMode};
use crate::heuristics::{density_stats, heuristic_score};
use crate::types::{RelevanceMetrics, ScoredSentence, Sentence};
use ahash::AHashSet;

/// Ranked output: every input sentence with its scores (still in document
/// order), plus the relevance signals gathered along the way.
#[derive(Debug, Clone)]
pub struct RankOutput {
    pub sentences: Vec<ScoredSentence>,
    pub metrics: RelevanceMetrics,
}

/// Minimum sentence count for a term to be "central" to the document.
const CENTRAL_TERM_MIN_SENTENCES: usize = 3;

/// A central term must appear in at least this fraction of sentences.
const CENTRAL_TERM_FRACTION: f64 = 0.10;

/// Score all sentences against the query.
///
/// Empty input on either side short-circuits to all-zero scores and
/// `has_relevant_results = false`.
pub fn rank(sentences: Vec<Sentence>, query: &[String], config: &RankerConfig) -> RankOutput {
    if sentences.is_empty() || query.is_empty() {
        let count = sentences.len();
        let scored = sentences
            .into_iter()
            .map(|sentence| ScoredSentence {
                sentence,
                bm25_score: 0.0,
                heuristic_score: 0.0,
                combined_score: 0.0,
            })
            .collect();
        return RankOutput {
            sentences: scored,
            metrics: RelevanceMetrics {
                sentence_count: count,
                ..RelevanceMetrics::default()
            },
        };
    }

    let stats = build_document_stats(&sentences);
    let density = density_stats(&sentences, query);
    let query_set: AHashSet<&str> = query.iter().map(String::as_str).collect();

    let raw_bm25: Vec<f64> = sentences
        .iter()
        .map(|s| score_sentence(s, query, &stats, &config.bm25))
        .collect();
    let max_bm25 = raw_bm25.iter().copied().fold(0.0_f64, f64::max);

    // Fraction of query terms that occur anywhere in the document.
    let covered = query
        .iter()
        .filter(|t| stats.doc_frequency.contains_key(t.as_str()))
        .count();
    let coverage = covered as f64 / query.len() as f64;

    // Most distinct query terms sharing a single sentence.
    let max_cooccurrence = sentences
        .iter()
        .map(|s| {
            s.tokens
                .iter()
                .map(String::as_str)
                .filter(|t| query_set.contains(t))
                .collect::<AHashSet<&str>>()
                .len()
        })
        .max()
        .unwrap_or(0);

    // A query term occurring in a large share of sentences marks the
    // document as topically about the query.
    let central_threshold = ((CENTRAL_TERM_FRACTION * sentences.len() as f64).ceil() as usize)
        .max(CENTRAL_TERM_MIN_SENTENCES);
    let has_central_term = query
        .iter()
        .any(|t| stats.doc_frequency.get(t.as_str()).copied().unwrap_or(0) >= central_threshold);

    let has_relevant_results = match config.relevance_mode {
        RelevanceMode::Search => {
            (max_bm25 > 0.8 && coverage >= 0.25)
                || (max_cooccurrence >= 2 && max_bm25 > 0.5)
                || (has_central_term && max_bm25 > 0.4)
                || (coverage >= 0.5 && max_bm25 > 0.3)
        }
        RelevanceMode::Strict => {
            (max_cooccurrence >= 2 && max_bm25 > 1.0)
                || (has_central_term && max_bm25 > 0.8)
                || (coverage >= 0.8 && max_bm25 > 0.5)
        }
    };

    // Min-max normalization; a flat range maps every sentence to 0.5.
    let min_raw = raw_bm25.iter().copied().fold(f64::INFINITY, f64::min);
    let max_raw = raw_bm25.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max_raw - min_raw;
    let normalize = |raw: f64| {
        if range > 0.0 {
            (raw - min_raw) / range
        } else {
            0.5
        }
    };

    let scored: Vec<ScoredSentence> = sentences
        .iter()
        .enumerate()
        .map(|(index, _)| {
            let bm25 = normalize(raw_bm25[index]);
            let heuristic = heuristic_score(
                index,
                &sentences,
                query,
                &stats,
                &density,
                &config.weights,
            );
            ScoredSentence {
                sentence: sentences[index].clone(),
                bm25_score: bm25,
                heuristic_score: heuristic,
                combined_score: config.bm25_weight * bm25 + config.heuristic_weight * heuristic,
            }
        })
        .collect();

    tracing::debug!(
        sentences = scored.len(),
        max_bm25,
        coverage,
        max_cooccurrence,
        relevant = has_relevant_results,
        "ranked sentences"
    );

    let metrics = RelevanceMetrics {
        has_relevant_results,
        sentence_count: scored.len(),
        query_term_coverage: coverage,
        max_bm25,
        max_cooccurrence,
        quality_reject_reason: None,
    };
    RankOutput {
        sentences: scored,
        metrics,
    }
}

/// Indices into `scored`, ordered by combined score descending with
/// `global_index` ascending as the tie-break. This is the canonical total
/// order every downstream consumer uses.
pub fn ranked_order(scored: &[ScoredSentence]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scored.len()).collect();
    order.sort_by(|&a, &b| {
        scored[b]
            .combined_score
            .total_cmp(&scored[a].combined_score)
            .then_with(|| scored[a].sentence.global_index.cmp(&scored[b].sentence.global_index))
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockType;
    use assert2::check;

    fn sentence(tokens: &[&str], global_index: usize) -> Sentence {
        Sentence {
            text: tokens.join(" "),
            tokens: tokens.iter().map(ToString::to_string).collect(),
            heading_path: Vec::new(),
            block_type: BlockType::P,
            block_index: global_index,
            sentence_index: 0,
            global_index,
            position: 0.0,
        }
    }

    fn query(terms: &[&str]) -> Vec<String> {
        terms.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_empty_query_short_circuits() {
        let output = rank(vec![sentence(&["alpha"], 0)], &[], &RankerConfig::default());
        check!(!output.metrics.has_relevant_results);
        check!(output.sentences[0].combined_score == 0.0);
        check!(output.metrics.sentence_count == 1);
    }

    #[test]
    fn test_empty_sentences_short_circuit() {
        let output = rank(Vec::new(), &query(&["alpha"]), &RankerConfig::default());
        check!(!output.metrics.has_relevant_results);
        check!(output.sentences.is_empty());
    }

    #[test]
    fn test_flat_bm25_normalizes_to_half() {
        // No sentence matches, so every raw score is 0 and the range is flat.
        let sentences = vec![sentence(&["alpha"], 0), sentence(&["beta"], 1)];
        let output = rank(sentences, &query(&["missing"]), &RankerConfig::default());
        check!(output
            .sentences
            .iter()
            .all(|s| (s.bm25_score - 0.5).abs() < 1e-9));
        check!(!output.metrics.has_relevant_results);
    }

    #[test]
    fn test_metrics_capture_signals() {
        let sentences = vec![
            sentence(&["alpha", "beta", "rest"], 0),
            sentence(&["alpha", "other"], 1),
            sentence(&["unrelated"], 2),
        ];
        let output = rank(sentences, &query(&["alpha", "beta"]), &RankerConfig::default());
        check!(output.metrics.max_cooccurrence == 2);
        check!((output.metrics.query_term_coverage - 1.0).abs() < 1e-9);
        check!(output.metrics.max_bm25 > 0.0);
    }

    #[test]
    fn test_search_mode_is_looser_than_strict() {
        // Two co-occurring query terms with moderate bm25: search accepts,
        // strict demands a raw score above 1.0.
        let sentences = vec![
            sentence(&["alpha", "beta", "x", "y"], 0),
            sentence(&["unrelated", "filler", "words"], 1),
            sentence(&["more", "filler"], 2),
        ];
        let q = query(&["alpha", "beta"]);

        let search = rank(
            sentences.clone(),
            &q,
            &RankerConfig {
                relevance_mode: RelevanceMode::Search,
                ..RankerConfig::default()
            },
        );
        let strict = rank(sentences, &q, &RankerConfig::default());

        check!(search.metrics.has_relevant_results);
        check!(search.metrics.max_bm25 > 0.5);
        // Same signals, stricter thresholds.
        check!(strict.metrics.max_bm25 == search.metrics.max_bm25);
    }

    #[test]
    fn test_central_term_detection() {
        // "widget" occurs in 50 of 100 sentences; far beyond the 10% bar.
        let mut sentences: Vec<Sentence> = Vec::new();
        for i in 0..50 {
            sentences.push(sentence(&["widget", "does", "various", "things"], i));
        }
        for i in 50..100 {
            sentences.push(sentence(&["unrelated", "filler", "content", "here"], i));
        }
        let output = rank(
            sentences,
            &query(&["widget"]),
            &RankerConfig {
                relevance_mode: RelevanceMode::Search,
                ..RankerConfig::default()
            },
        );
        check!(output.metrics.has_relevant_results);
    }

    #[test]
    fn test_combined_scores_in_unit_interval() {
        let sentences = vec![
            sentence(&["alpha", "beta"], 0),
            sentence(&["alpha"], 1),
            sentence(&["unrelated"], 2),
        ];
        let output = rank(sentences, &query(&["alpha", "beta"]), &RankerConfig::default());
        for s in &output.sentences {
            check!(s.bm25_score >= 0.0 && s.bm25_score <= 1.0);
            check!(s.combined_score >= 0.0 && s.combined_score <= 1.0);
        }
    }

    #[test]
    fn test_ranked_order_total_and_deterministic() {
        let sentences = vec![
            sentence(&["unrelated"], 0),
            sentence(&["alpha", "beta"], 1),
            sentence(&["unrelated"], 2),
        ];
        let output = rank(sentences, &query(&["alpha", "beta"]), &RankerConfig::default());
        let order = ranked_order(&output.sentences);
        check!(order[0] == 1);
        // Equal-scoring sentences fall back to document order.
        check!(order[1] == 0);
        check!(order[2] == 2);
    }
}
