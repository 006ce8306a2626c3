//! BM25 term weighting over sentences-as-documents.
//!
//! Corpus statistics are built once per extraction from the post-filter
//! sentences and owned by that extraction; nothing is shared across calls.

use crate::config::Bm25Config;
use crate::tokenize::build_term_frequency_map;
use crate::types::Sentence;
use ahash::{AHashMap, AHashSet};

/// Per-document corpus statistics: document count, average length, and
/// per-term document frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStats {
    pub total_docs: usize,
    pub avg_doc_length: f64,
    pub doc_frequency: AHashMap<String, usize>,
}

impl DocumentStats {
    /// Inverse document frequency: `ln((N - df + 0.5) / (df + 0.5) + 1)`.
    ///
    /// Strictly positive, including for unseen terms (df = 0), so rare
    /// query terms always contribute.
    pub fn idf(&self, term: &str) -> f64 {
        let n = self.total_docs as f64;
        let df = self.doc_frequency.get(term).copied().unwrap_or(0) as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }
}

/// Build corpus statistics from the sentence set.
pub fn build_document_stats(sentences: &[Sentence]) -> DocumentStats {
    let total_docs = sentences.len();
    let total_length: usize = sentences.iter().map(|s| s.tokens.len()).sum();
    let avg_doc_length = if total_docs == 0 {
        0.0
    } else {
        total_length as f64 / total_docs as f64
    };

    let mut doc_frequency: AHashMap<String, usize> = AHashMap::new();
    for sentence in sentences {
        let unique: AHashSet<&str> = sentence.tokens.iter().map(String::as_str).collect();
        for term in unique {
            *doc_frequency.entry(term.to_string()).or_insert(0) += 1;
        }
    }

    DocumentStats {
        total_docs,
        avg_doc_length,
        doc_frequency,
    }
}

/// Score one sentence against the query token sequence.
///
/// Query terms are iterated with multiplicity, so a duplicated term
/// contributes twice. An empty query or empty sentence scores zero.
pub fn score_sentence(
    sentence: &Sentence,
    query: &[String],
    stats: &DocumentStats,
    config: &Bm25Config,
) -> f64 {
    if query.is_empty() || sentence.tokens.is_empty() {
        return 0.0;
    }
    let term_frequency = build_term_frequency_map(&sentence.tokens);
    let length_ratio = if stats.avg_doc_length > 0.0 {
        sentence.tokens.len() as f64 / stats.avg_doc_length
    } else {
        0.0
    };
    let length_norm = config.k1 * (1.0 - config.b + config.b * length_ratio);

    query
        .iter()
        .map(|term| {
            let Some(&count) = term_frequency.get(term.as_str()) else {
                return 0.0;
            };
            let tf = count as f64;
            stats.idf(term) * tf * (config.k1 + 1.0) / (tf + length_norm)
        })
        .sum()
}
