//! Citation and footnote sentence filtering.
//!
//! Reference lists, retrieval timestamps, academic identifiers, and bare
//! publisher names carry no answerable content; they are dropped before
//! corpus statistics are built so they cannot distort IDF.

use crate::types::Sentence;
use once_cell::sync::Lazy;
use regex::RegexSet;

/// Patterns that mark a citation at any sentence length.
static STRONG_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        // Wikipedia-style footnote marker: ^ a b "Title ...
        r#"^\^\s*([a-z]\s*)*["'\w]"#,
        r"(?i)retrieved (\d{1,2} \w+ \d{4}|\w+ \d{1,2},? \d{4})",
        r"(?i)accessed (\d{1,2} \w+ \d{4}|\w+ \d{1,2},? \d{4})",
        r"(?i)archived from (the )?original",
        r"(?i)doi:10\.\d+",
        r"(?i)isbn[: ]?[\d-]{10,}",
        r"(?i)pmid[: ]?\d+",
        r"(?i)arxiv[: ]?[\d.]+",
        r"(?i)issn[: ]?[\d-]+",
        // Leading [3] followed by a word or quote
        r#"^\[\d+\]\s*["'\w]"#,
    ])
    .unwrap()
});

/// Patterns applied only to sentences under 50 characters, where a bare
/// domain or date is almost certainly reference metadata.
static SHORT_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\.(com|org|net|edu|gov|io|co\.uk)\.*\s*$",
        r"(?i)^(retrieved|accessed) ",
        r"(?i)^(github|arxiv|lwn|nist|ieee|acm|springer|elsevier|wiley|mdn|w3c|ietf|wikipedia)\.?$",
        // Standalone date
        r"^(\d{1,2} \w+ \d{4}|\w+ \d{1,2},? \d{4}|\d{4}-\d{2}-\d{2})\.?$",
        // Bibliography-entry phrase: capitalized words ending in a year or a
        // period, e.g. "Cambridge University Press, 2004." Bare heading-like
        // phrases ("Getting Started") do not match.
        r"^[A-Z][\w&'-]*(\s+([A-Z][\w&'-]*|of|and|the|for))+(,?\s+\d{4}\.?|\.)$",
    ])
    .unwrap()
});

/// Maximum length for the short-sentence pattern set.
const SHORT_SENTENCE_CHARS: usize = 50;

/// Classify a sentence as citation noise.
pub fn is_citation(text: &str) -> bool {
    let trimmed = text.trim();
    if STRONG_PATTERNS.is_match(trimmed) {
        return true;
    }
    trimmed.chars().count() < SHORT_SENTENCE_CHARS && SHORT_PATTERNS.is_match(trimmed)
}

/// Drop citation sentences. Surviving sentences keep their original
/// `global_index`; later stages identify sentences by that index, not by
/// position in this vector.
pub fn filter_citations(sentences: Vec<Sentence>) -> Vec<Sentence> {
    let before = sentences.len();
    let kept: Vec<Sentence> = sentences
        .into_iter()
        .filter(|s| !is_citation(&s.text))
        .collect();
    if kept.len() != before {
        tracing::trace!(removed = before - kept.len(), "filtered citation sentences");
    }
    kept
}
