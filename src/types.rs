//! Core data model shared across pipeline stages.
//!
//! Each stage consumes owned values from the previous stage and produces
//! fresh output; nothing here is shared mutable state. The types mirror the
//! flow: blocks come out of segmentation, sentences out of splitting, scored
//! sentences out of ranking, chunks out of expansion, and excerpts out of
//! assembly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural kind of a block. Closed set; all per-type behavior
/// (sentence splitting, chunk formatting, structure baselines) dispatches
/// on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    P,
    Li,
    Pre,
}

impl BlockType {
    /// Map an HTML tag name to a block type, if the tag forms a block.
    pub fn from_tag(name: &str) -> Option<Self> {
        match name {
            "h1" => Some(Self::H1),
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            "h4" => Some(Self::H4),
            "h5" => Some(Self::H5),
            "h6" => Some(Self::H6),
            "p" => Some(Self::P),
            "li" => Some(Self::Li),
            "pre" => Some(Self::Pre),
            _ => None,
        }
    }

    /// Heading level for `h1..h6`, `None` for content blocks.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            Self::H1 => Some(1),
            Self::H2 => Some(2),
            Self::H3 => Some(3),
            Self::H4 => Some(4),
            Self::H5 => Some(5),
            Self::H6 => Some(6),
            Self::P | Self::Li | Self::Pre => None,
        }
    }

    pub fn is_heading(self) -> bool {
        self.heading_level().is_some()
    }

    /// Tag name as it appears in HTML.
    pub fn tag(self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
            Self::P => "p",
            Self::Li => "li",
            Self::Pre => "pre",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Atomic structural unit of a document: one heading, paragraph, list item,
/// or code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub block_type: BlockType,
    /// Whitespace-normalized text; for `pre`, internal line breaks preserved.
    pub text: String,
    /// 0-based position in document order.
    pub index: usize,
    /// Ancestor heading texts, excluding the block itself.
    ///
    /// For a heading at level L the path holds only strict ancestors
    /// (length `L - 1` in well-nested documents); equal-level siblings
    /// never appear.
    pub heading_path: Vec<String>,
}

/// Unit of scoring: one sentence with its tokens and document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub text: String,
    pub tokens: Vec<String>,
    pub heading_path: Vec<String>,
    pub block_type: BlockType,
    /// Owning block's `index`.
    pub block_index: usize,
    /// Position within the parent block; 0 for headings and code blocks.
    pub sentence_index: usize,
    /// Dense 0-based rank across all sentences of the document.
    pub global_index: usize,
    /// `block_index / max(1, total_blocks - 1)`, clamped to `[0, 1]`.
    pub position: f64,
}

/// A sentence with its ranking scores attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSentence {
    pub sentence: Sentence,
    /// Min-max normalized BM25 score in `[0, 1]`.
    pub bm25_score: f64,
    /// Weighted heuristic combination in `[0, 1]`.
    pub heuristic_score: f64,
    /// `bm25_weight * bm25 + heuristic_weight * heuristic`.
    pub combined_score: f64,
}

/// Expanded context window around an anchor sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Member sentences ordered by `global_index`, without duplicates.
    pub sentences: Vec<Sentence>,
    /// `global_index` of the seed sentence.
    pub anchor_index: usize,
    /// Inherited from the anchor's combined score.
    pub score: f64,
    /// Formatted rendering of the member sentences.
    pub text: String,
    /// Sum of raw sentence text lengths (not the formatted length).
    pub char_count: usize,
    /// Heading ancestry of the anchor sentence.
    pub heading_path: Vec<String>,
}

/// Public output unit of the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Excerpt {
    pub text: String,
    pub heading_path: Vec<String>,
    pub score: f64,
    pub char_count: usize,
}

/// Why an extraction produced (or failed to produce) excerpts.
///
/// Every non-`Ok` outcome still returns structurally valid metrics with an
/// empty excerpt list; content defects never raise errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// Excerpts were produced.
    Ok,
    /// The preprocessor could not locate a main content container.
    NoMainContent,
    /// Segmentation yielded no sentences.
    NoSentences,
    /// The citation filter removed every sentence.
    AllCitations,
    /// The quality gate rejected the document.
    LowQuality,
    /// The ranker found no relevant sentences.
    NotRelevant,
}

/// Signals gathered while ranking, surfaced for observability.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelevanceMetrics {
    pub has_relevant_results: bool,
    /// Sentences that survived the citation filter.
    pub sentence_count: usize,
    /// Fraction of query terms appearing anywhere in the document.
    pub query_term_coverage: f64,
    /// Highest raw (pre-normalization) BM25 score.
    pub max_bm25: f64,
    /// Most distinct query terms co-occurring in a single sentence.
    pub max_cooccurrence: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_reject_reason: Option<String>,
}

/// Result of a single extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Non-increasing by score; ties broken by anchor position.
    pub excerpts: Vec<Excerpt>,
    /// Sum of excerpt `char_count`s; never exceeds the configured budget.
    pub total_chars: usize,
    pub query: String,
    pub outcome: ExtractionOutcome,
    pub relevance_metrics: RelevanceMetrics,
}
