//! Text tokenization: normalization, stop-word filtering, and stemming.
//!
//! Both queries and sentences pass through the same pipeline so that term
//! comparisons downstream are always stem-to-stem. The stop-word set and
//! stemmer are process-wide constants; no per-call initialization.

use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::sync::OnceLock;

/// Splits `createXML` at the lower→upper boundary.
static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{Ll}|\p{Nd})(\p{Lu})").unwrap());

/// Splits `XMLParser` between the acronym and the capitalized word.
static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\p{Lu}+)(\p{Lu}\p{Ll})").unwrap());

/// Any run of characters that are neither letters nor digits.
static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Common English stop words filtered out before stemming.
/// High-frequency pronouns, auxiliaries, and prepositions add nothing to
/// relevance and would dominate document frequencies.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

static STOP_WORD_SET: Lazy<AHashSet<&'static str>> =
    Lazy::new(|| STOP_WORDS.iter().copied().collect());

/// Process-wide English Porter stemmer.
fn stemmer() -> &'static Stemmer {
    static STEMMER: OnceLock<Stemmer> = OnceLock::new();
    STEMMER.get_or_init(|| Stemmer::create(Algorithm::English))
}

/// Options for [`tokenize`]. Queries and sentences both use the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizeOptions {
    pub remove_stop_words: bool,
    pub apply_stemming: bool,
    /// Tokens shorter than this (in characters) are dropped.
    pub min_length: usize,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self {
            remove_stop_words: true,
            apply_stemming: true,
            min_length: 2,
        }
    }
}

/// Tokenize text into normalized, stemmed terms.
///
/// camelCase and PascalCase identifiers split at case boundaries before
/// lowercasing, so `createXMLParser` yields `create`, `xml`, `parser` (the
/// last stemmed to `parser`). Punctuation separates tokens; it never
/// survives into them.
pub fn tokenize(text: &str, options: &TokenizeOptions) -> Vec<String> {
    let spaced = ACRONYM_BOUNDARY.replace_all(text, "$1 $2");
    let spaced = CAMEL_BOUNDARY.replace_all(&spaced, "$1 $2");
    let lowered = spaced.to_lowercase();
    let cleaned = NON_ALPHANUMERIC.replace_all(&lowered, " ");

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() >= options.min_length)
        .filter(|word| !options.remove_stop_words || !STOP_WORD_SET.contains(word))
        .map(|word| {
            if options.apply_stemming {
                stemmer().stem(word).into_owned()
            } else {
                word.to_string()
            }
        })
        .collect()
}

/// Count occurrences of each token.
pub fn build_term_frequency_map(tokens: &[String]) -> AHashMap<&str, usize> {
    let mut counts = AHashMap::with_capacity(tokens.len());
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    counts
}

/// `|set(a) ∩ set(b)| / |set(a) ∪ set(b)|`; 0 when the union is empty.
pub fn jaccard_similarity(a: &[String], b: &[String]) -> f64 {
    let set_a: AHashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: AHashSet<&str> = b.iter().map(String::as_str).collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Fraction of `a`'s terms that also appear in `b`; 0 when `a` is empty.
///
/// Asymmetric on purpose: `term_overlap_ratio(query, heading)` reads as
/// "how much of the query does this heading cover".
pub fn term_overlap_ratio(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    let set_a: AHashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: AHashSet<&str> = b.iter().map(String::as_str).collect();
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / a.len() as f64
}
