//! Structural relevance heuristics.
//!
//! Nine per-sentence metrics, each in `[0, 1]`, combined by a weighted sum.
//! They reward what BM25 cannot see: where a sentence sits in the document,
//! what section it belongs to, how tightly query terms cluster inside it,
//! and whether its section is meta material (intro, conclusion, legal).

use crate::bm25::DocumentStats;
use crate::config::HeuristicWeights;
use crate::tokenize::{TokenizeOptions, term_overlap_ratio, tokenize};
use crate::types::{BlockType, Sentence};
use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;
use regex::RegexSet;

/// Headings whose sections are structural rather than substantive.
/// Anchored full match, case-insensitive.
static META_HEADINGS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)^introduction$",
        r"(?i)^overview$",
        r"(?i)^about( this \w+)?$",
        r"(?i)^prerequisites$",
        r"(?i)^requirements$",
        r"(?i)^summary$",
        r"(?i)^conclusions?$",
        r"(?i)^tl;?dr$",
        r"(?i)^(key )?takeaways$",
        r"(?i)^next steps$",
        r"(?i)^further reading$",
        r"(?i)^references$",
        r"(?i)^see also$",
        r"(?i)^table of contents$",
        r"(?i)^contents$",
        r"(?i)^on this page$",
        r"(?i)^disclaimer$",
        r"(?i)^privacy( policy)?$",
        r"(?i)^comments$",
        r"(?i)^share( this)?$",
        r"(?i)^subscribe$",
        r"(?i)^newsletter$",
        r"(?i)^author( bio)?$",
        r"(?i)^about the author$",
        r"(?i)^specifications$",
        r"(?i)^browser compatibility$",
        r"(?i)^related( articles| posts)?$",
        r"(?i)^acknowledge?ments$",
        r"(?i)^license$",
        r"(?i)^changelog$",
        r"(?i)^feedback$",
    ])
    .unwrap()
});

/// Phrases that mark framing prose rather than substance.
const META_PHRASES: &[&str] = &[
    "in this article",
    "in this tutorial",
    "in this post",
    "in this guide",
    "we will cover",
    "we'll cover",
    "you will learn",
    "you'll learn",
    "let's dive",
    "let us dive",
    "if you enjoyed this",
    "buy me a coffee",
    "subscribe to",
    "sign up for",
    "follow me on",
    "thanks for reading",
    "happy coding",
];

/// Robust dispersion of per-sentence query-term density, computed once per
/// document for the outlier metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityStats {
    pub median: f64,
    /// Median absolute deviation, floored at 0.001 so z-scores stay finite.
    pub mad: f64,
}

const MAD_FLOOR: f64 = 0.001;

/// Fraction of a sentence's tokens that match a query term.
fn query_density(sentence: &Sentence, query_set: &AHashSet<&str>) -> f64 {
    if sentence.tokens.is_empty() {
        return 0.0;
    }
    let matches = sentence
        .tokens
        .iter()
        .filter(|t| query_set.contains(t.as_str()))
        .count();
    matches as f64 / sentence.tokens.len() as f64
}

fn median_of(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

/// Compute the density median and MAD across all sentences.
pub fn density_stats(sentences: &[Sentence], query: &[String]) -> DensityStats {
    let query_set: AHashSet<&str> = query.iter().map(String::as_str).collect();
    let densities: Vec<f64> = sentences
        .iter()
        .map(|s| query_density(s, &query_set))
        .collect();
    let median = median_of(densities.clone());
    let deviations: Vec<f64> = densities.iter().map(|d| (d - median).abs()).collect();
    let mad = median_of(deviations).max(MAD_FLOOR);
    DensityStats { median, mad }
}

/// Piecewise-linear preference for early content: 1.0 at the top of the
/// document, easing to 0.3 at the bottom.
fn position_score(sentence: &Sentence) -> f64 {
    let p = sentence.position;
    if p <= 0.3 {
        1.0 - p
    } else if p <= 0.7 {
        0.7 - 0.5 * (p - 0.3)
    } else {
        0.5 - (p - 0.7) * (0.2 / 0.3)
    }
}

/// Closeness to the nearest preceding heading, boosted when that heading
/// shares terms with the query. 0.3 when no heading precedes the sentence.
fn heading_proximity_score(index: usize, sentences: &[Sentence], query: &[String]) -> f64 {
    let sentence = &sentences[index];
    let Some(heading) = sentences[..index]
        .iter()
        .rev()
        .find(|s| s.block_type.is_heading())
    else {
        return 0.3;
    };
    let gap = sentence.global_index.saturating_sub(heading.global_index) as f64;
    let distance_score = 1.0 / (1.0 + gap / 5.0);
    let overlap = term_overlap_ratio(query, &heading.tokens);
    if overlap > 0.0 {
        (0.6 * overlap + 0.4 * distance_score).min(1.0)
    } else {
        0.5 * distance_score
    }
}

/// Raw match density blended with query coverage.
fn density_score(sentence: &Sentence, query: &[String]) -> f64 {
    if sentence.tokens.is_empty() || query.is_empty() {
        return 0.0;
    }
    let query_set: AHashSet<&str> = query.iter().map(String::as_str).collect();
    let raw = query_density(sentence, &query_set);
    let unique_matches: AHashSet<&str> = sentence
        .tokens
        .iter()
        .map(String::as_str)
        .filter(|t| query_set.contains(t))
        .collect();
    let coverage = unique_matches.len() as f64 / query.len() as f64;
    0.4 * raw + 0.6 * coverage
}

/// Block-type baseline with bonuses for code adjacency, same-block query
/// support, and a query term in the heading ancestry. Capped at 1.0.
fn structure_score(index: usize, sentences: &[Sentence], query: &[String]) -> f64 {
    let sentence = &sentences[index];
    let mut score: f64 = match sentence.block_type {
        BlockType::P => 0.8,
        BlockType::Li => 0.7,
        BlockType::Pre => 0.65,
        _ => 0.4,
    };

    let code_adjacent = sentences.iter().enumerate().any(|(i, other)| {
        i != index
            && other.block_type == BlockType::Pre
            && sentence.global_index.abs_diff(other.global_index) <= 2
    });
    if code_adjacent {
        score += 0.1;
    }

    let same_block_support = sentences.iter().enumerate().any(|(i, other)| {
        i != index
            && other.block_index == sentence.block_index
            && term_overlap_ratio(query, &other.tokens) > 0.3
    });
    if same_block_support {
        score += 0.15;
    }

    let heading_mentions_query = sentence.heading_path.iter().any(|heading| {
        let lowered = heading.to_lowercase();
        query.iter().any(|term| lowered.contains(term.as_str()))
    });
    if heading_mentions_query {
        score += 0.1;
    }

    score.min(1.0)
}

/// Coverage plus tightness of the smallest token window containing every
/// matched query term.
fn proximity_score(sentence: &Sentence, query: &[String]) -> f64 {
    if sentence.tokens.is_empty() || query.is_empty() {
        return 0.0;
    }
    let query_set: AHashSet<&str> = query.iter().map(String::as_str).collect();
    let matched: Vec<(usize, &str)> = sentence
        .tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| query_set.contains(t.as_str()))
        .map(|(i, t)| (i, t.as_str()))
        .collect();
    let kinds: AHashSet<&str> = matched.iter().map(|&(_, t)| t).collect();
    let distinct = kinds.len();
    if distinct == 0 {
        return 0.0;
    }
    let coverage = distinct as f64 / query.len() as f64;
    if distinct == 1 {
        return coverage * 0.5;
    }

    // Smallest window over matched positions that contains all distinct
    // terms (sliding window over k kinds).
    let mut best_span = usize::MAX;
    let mut counts: AHashMap<&str, usize> = AHashMap::new();
    let mut covered = 0usize;
    let mut left = 0usize;
    for right in 0..matched.len() {
        let entry = counts.entry(matched[right].1).or_insert(0);
        *entry += 1;
        if *entry == 1 {
            covered += 1;
        }
        while covered == distinct {
            let span = matched[right].0 - matched[left].0 + 1;
            best_span = best_span.min(span);
            if let Some(count) = counts.get_mut(matched[left].1) {
                *count -= 1;
                if *count == 0 {
                    covered -= 1;
                }
            }
            left += 1;
        }
    }

    let span = best_span as f64;
    let span_tightness = 1.0 - (span / sentence.tokens.len() as f64).min(1.0);
    let density_in_span = distinct as f64 / span;
    0.4 * coverage + 0.35 * span_tightness + 0.25 * density_in_span.min(1.0)
}

/// IDF-weighted fraction of the query covered by `tokens`.
fn idf_weighted_overlap(query: &[String], tokens: &[String], stats: &DocumentStats) -> f64 {
    let token_set: AHashSet<&str> = tokens.iter().map(String::as_str).collect();
    let denominator: f64 = query.iter().map(|t| stats.idf(t)).sum();
    if denominator <= 0.0 {
        return 0.0;
    }
    let numerator: f64 = query
        .iter()
        .filter(|t| token_set.contains(t.as_str()))
        .map(|t| stats.idf(t))
        .sum();
    numerator / denominator
}

/// How much of the query the heading ancestry covers, IDF-weighted.
/// Neutral 0.3 when the sentence has no heading path.
fn heading_path_score(sentence: &Sentence, query: &[String], stats: &DocumentStats) -> f64 {
    if sentence.heading_path.is_empty() || query.is_empty() {
        return 0.3;
    }
    let path_tokens = tokenize(
        &sentence.heading_path.join(" "),
        &TokenizeOptions::default(),
    );
    0.3 + 0.7 * idf_weighted_overlap(query, &path_tokens, stats)
}

/// Query coverage within the sentence itself: IDF-weighted, blended with a
/// plain term-count ratio.
fn coverage_score(sentence: &Sentence, query: &[String], stats: &DocumentStats) -> f64 {
    if sentence.tokens.is_empty() || query.is_empty() {
        return 0.0;
    }
    let idf_coverage = idf_weighted_overlap(query, &sentence.tokens, stats);
    let token_set: AHashSet<&str> = sentence.tokens.iter().map(String::as_str).collect();
    let matched: AHashSet<&str> = query
        .iter()
        .map(String::as_str)
        .filter(|t| token_set.contains(t))
        .collect();
    let simple_coverage = matched.len() as f64 / query.len() as f64;
    0.7 * idf_coverage + 0.3 * simple_coverage
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Reward sentences whose query-term density is an upward outlier relative
/// to the document's median and MAD.
fn outlier_score(sentence: &Sentence, query: &[String], stats: &DensityStats) -> f64 {
    if sentence.tokens.is_empty() || query.is_empty() {
        return 0.3;
    }
    let query_set: AHashSet<&str> = query.iter().map(String::as_str).collect();
    let density = query_density(sentence, &query_set);
    let z = (density - stats.median) / stats.mad;
    if z <= 0.0 {
        0.3
    } else {
        0.3 + 0.7 * logistic(z - 2.0)
    }
}

/// Penalize sentences that live under a meta heading (0.2) or that read as
/// framing prose (0.3). Substantive sentences score 1.0.
fn meta_section_score(sentence: &Sentence) -> f64 {
    if sentence
        .heading_path
        .iter()
        .any(|heading| META_HEADINGS.is_match(heading.trim()))
    {
        return 0.2;
    }
    let lowered = sentence.text.to_lowercase();
    if META_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return 0.3;
    }
    1.0
}

/// Weighted combination of all nine metrics for one sentence.
pub fn heuristic_score(
    index: usize,
    sentences: &[Sentence],
    query: &[String],
    stats: &DocumentStats,
    density: &DensityStats,
    weights: &HeuristicWeights,
) -> f64 {
    let sentence = &sentences[index];
    weights.position * position_score(sentence)
        + weights.heading_proximity * heading_proximity_score(index, sentences, query)
        + weights.density * density_score(sentence, query)
        + weights.structure * structure_score(index, sentences, query)
        + weights.proximity * proximity_score(sentence, query)
        + weights.heading_path * heading_path_score(sentence, query, stats)
        + weights.coverage * coverage_score(sentence, query, stats)
        + weights.outlier * outlier_score(sentence, query, density)
        + weights.meta_section * meta_section_score(sentence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bm25::build_document_stats;
    use assert2::check;
    use rstest::rstest;

    fn sentence(tokens: &[&str], block_type: BlockType) -> Sentence {
        Sentence {
            text: tokens.join(" "),
            tokens: tokens.iter().map(ToString::to_string).collect(),
            heading_path: Vec::new(),
            block_type,
            block_index: 0,
            sentence_index: 0,
            global_index: 0,
            position: 0.0,
        }
    }

    fn query(terms: &[&str]) -> Vec<String> {
        terms.iter().map(ToString::to_string).collect()
    }

    fn at_position(position: f64) -> Sentence {
        Sentence {
            position,
            ..sentence(&["x"], BlockType::P)
        }
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.3, 0.7)]
    #[case(0.5, 0.6)]
    #[case(0.7, 0.5)]
    #[case(1.0, 0.3)]
    fn test_position_piecewise(#[case] position: f64, #[case] expected: f64) {
        check!((position_score(&at_position(position)) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_position_is_monotone_nonincreasing() {
        let mut last = f64::INFINITY;
        for step in 0..=100 {
            let p = f64::from(step) / 100.0;
            let score = position_score(&at_position(p));
            check!(score <= last + 1e-12);
            last = score;
        }
    }

    #[test]
    fn test_heading_proximity_without_heading() {
        let sentences = vec![sentence(&["alpha"], BlockType::P)];
        check!((heading_proximity_score(0, &sentences, &query(&["alpha"])) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_heading_proximity_prefers_matching_heading() {
        let mut heading = sentence(&["alpha"], BlockType::H2);
        heading.global_index = 0;
        let mut near = sentence(&["alpha", "beta"], BlockType::P);
        near.global_index = 1;
        let sentences = vec![heading, near];

        let with_match = heading_proximity_score(1, &sentences, &query(&["alpha"]));
        let without_match = heading_proximity_score(1, &sentences, &query(&["gamma"]));
        check!(with_match > without_match);
        // gap 1: distance score 1/(1 + 0.2), unmatched heading halves it
        check!((without_match - 0.5 / 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_density_blend() {
        let s = sentence(&["alpha", "beta", "gamma", "delta"], BlockType::P);
        // one match of a two-term query: raw 0.25, coverage 0.5
        let score = density_score(&s, &query(&["alpha", "missing"]));
        check!((score - (0.4 * 0.25 + 0.6 * 0.5)).abs() < 1e-9);
    }

    #[rstest]
    #[case(BlockType::P, 0.8)]
    #[case(BlockType::Li, 0.7)]
    #[case(BlockType::Pre, 0.65)]
    #[case(BlockType::H2, 0.4)]
    fn test_structure_baselines(#[case] block_type: BlockType, #[case] expected: f64) {
        let sentences = vec![sentence(&["unrelated"], block_type)];
        check!((structure_score(0, &sentences, &query(&["alpha"])) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_structure_code_adjacency_bonus() {
        let mut prose = sentence(&["unrelated"], BlockType::P);
        prose.global_index = 0;
        let mut code = sentence(&["snippet"], BlockType::Pre);
        code.global_index = 1;
        code.block_index = 1;
        let sentences = vec![prose, code];
        check!((structure_score(0, &sentences, &query(&["alpha"])) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_structure_heading_mention_bonus() {
        let mut s = sentence(&["unrelated"], BlockType::P);
        s.heading_path = vec!["Alpha Handling".to_string()];
        let sentences = vec![s];
        check!((structure_score(0, &sentences, &query(&["alpha"])) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_proximity_single_term() {
        let s = sentence(&["alpha", "filler", "filler"], BlockType::P);
        let score = proximity_score(&s, &query(&["alpha", "missing"]));
        // one of two terms matched: coverage 0.5, single-kind path halves it
        check!((score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_proximity_rewards_tight_windows() {
        let tight = sentence(&["alpha", "beta", "x", "y", "z", "w"], BlockType::P);
        let loose = sentence(&["alpha", "x", "y", "z", "w", "beta"], BlockType::P);
        let q = query(&["alpha", "beta"]);
        check!(proximity_score(&tight, &q) > proximity_score(&loose, &q));
    }

    #[test]
    fn test_proximity_no_match_is_zero() {
        let s = sentence(&["alpha"], BlockType::P);
        check!(proximity_score(&s, &query(&["missing"])) == 0.0);
    }

    #[test]
    fn test_heading_path_neutral_without_path() {
        let s = sentence(&["alpha"], BlockType::P);
        let stats = build_document_stats(&[s.clone()]);
        check!((heading_path_score(&s, &query(&["alpha"]), &stats) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_heading_path_full_overlap() {
        let mut s = sentence(&["detail"], BlockType::P);
        s.heading_path = vec!["Alpha".to_string()];
        let stats = build_document_stats(&[s.clone()]);
        // the full query appears in the path: overlap 1 → 0.3 + 0.7
        check!((heading_path_score(&s, &query(&["alpha"]), &stats) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_full_match() {
        let s = sentence(&["alpha", "beta"], BlockType::P);
        let stats = build_document_stats(&[s.clone()]);
        let score = coverage_score(&s, &query(&["alpha", "beta"]), &stats);
        check!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_outlier_below_median_is_neutral() {
        let stats = DensityStats {
            median: 0.5,
            mad: 0.1,
        };
        let s = sentence(&["alpha", "filler"], BlockType::P);
        // density 0.5 → z = 0 → neutral
        check!((outlier_score(&s, &query(&["alpha"]), &stats) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_outlier_rewards_spikes() {
        let stats = DensityStats {
            median: 0.0,
            mad: 0.001,
        };
        let s = sentence(&["alpha", "alpha"], BlockType::P);
        let score = outlier_score(&s, &query(&["alpha"]), &stats);
        // z is enormous, logistic saturates
        check!(score > 0.99);
        check!(score <= 1.0);
    }

    #[rstest]
    #[case("Introduction")]
    #[case("OVERVIEW")]
    #[case("See also")]
    #[case("Table of Contents")]
    fn test_meta_heading_penalty(#[case] heading: &str) {
        let mut s = sentence(&["alpha"], BlockType::P);
        s.heading_path = vec![heading.to_string()];
        check!((meta_section_score(&s) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_meta_phrase_penalty() {
        let mut s = sentence(&["alpha"], BlockType::P);
        s.text = "In this article we will cover the basics.".to_string();
        check!((meta_section_score(&s) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_meta_heading_must_match_fully() {
        let mut s = sentence(&["alpha"], BlockType::P);
        s.heading_path = vec!["Introduction to Async Rust".to_string()];
        check!((meta_section_score(&s) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_density_stats_mad_floor() {
        let sentences = vec![
            sentence(&["alpha"], BlockType::P),
            sentence(&["alpha"], BlockType::P),
        ];
        let stats = density_stats(&sentences, &query(&["alpha"]));
        check!((stats.median - 1.0).abs() < 1e-9);
        check!((stats.mad - MAD_FLOOR).abs() < 1e-9);
    }

    #[test]
    fn test_combined_score_within_unit_interval() {
        let mut heading = sentence(&["alpha"], BlockType::H2);
        heading.global_index = 0;
        let mut body = sentence(&["alpha", "beta", "gamma"], BlockType::P);
        body.global_index = 1;
        body.block_index = 1;
        body.heading_path = vec!["Alpha".to_string()];
        let sentences = vec![heading, body];
        let stats = build_document_stats(&sentences);
        let density = density_stats(&sentences, &query(&["alpha", "beta"]));
        let weights = HeuristicWeights::default();
        for index in 0..sentences.len() {
            let score = heuristic_score(
                index,
                &sentences,
                &query(&["alpha", "beta"]),
                &stats,
                &density,
                &weights,
            );
            check!(score >= 0.0);
            check!(score <= 1.0);
        }
    }
}
