//! Pipeline orchestration: the single public entry point.
//!
//! Stages run strictly forward, each consuming the previous stage's output.
//! Every early exit returns a structurally valid result with an outcome tag
//! and empty excerpts; only a malformed configuration is an error.

use crate::anchor::select_anchors;
use crate::assemble::assemble;
use crate::citation::filter_citations;
use crate::config::ExtractConfig;
use crate::dedupe::dedupe;
use crate::error::ConfigError;
use crate::expand::{build_chunk_text, expand_anchor};
use crate::preprocess::preprocess;
use crate::quality::assess;
use crate::rank::rank;
use crate::segment::{SegmentOptions, segment_blocks, sentences_from_blocks};
use crate::tokenize::{TokenizeOptions, tokenize};
use crate::types::{
    Chunk, ExtractionOutcome, ExtractionResult, RelevanceMetrics, Sentence,
};

/// Sentences earlier than this position qualify for the empty-query preview.
const FALLBACK_POSITION_CUTOFF: f64 = 0.4;

/// Extract query-relevant excerpts from an HTML page.
///
/// One call is one-shot and self-contained: corpus statistics, IDF tables,
/// and density stats are built fresh and dropped with the call. Given
/// identical inputs and config the result is byte-for-byte identical.
pub fn extract(
    html: &str,
    query: &str,
    config: &ExtractConfig,
) -> Result<ExtractionResult, ConfigError> {
    config.validate()?;
    let start = std::time::Instant::now();

    let query_tokens = tokenize(query, &TokenizeOptions::default());

    let preprocessed = preprocess(html);
    let Some(main_node) = preprocessed.main_node else {
        return Ok(empty_result(
            query,
            ExtractionOutcome::NoMainContent,
            RelevanceMetrics::default(),
        ));
    };

    let blocks = segment_blocks(&preprocessed.dom, main_node, &SegmentOptions::default());
    let sentences = sentences_from_blocks(&blocks);
    if sentences.is_empty() {
        return Ok(empty_result(
            query,
            ExtractionOutcome::NoSentences,
            RelevanceMetrics::default(),
        ));
    }

    let kept = filter_citations(sentences);
    if kept.is_empty() {
        return Ok(empty_result(
            query,
            ExtractionOutcome::AllCitations,
            RelevanceMetrics::default(),
        ));
    }

    if !config.skip_quality_check {
        let report = assess(&kept, &config.quality);
        if !report.passes {
            tracing::debug!(reason = report.reason.as_deref(), "quality gate rejected");
            return Ok(empty_result(
                query,
                ExtractionOutcome::LowQuality,
                RelevanceMetrics {
                    sentence_count: report.total_sentences,
                    quality_reject_reason: report.reason,
                    ..RelevanceMetrics::default()
                },
            ));
        }
    }

    if query_tokens.is_empty() {
        return Ok(empty_query_fallback(kept, query, config));
    }

    let ranked = rank(kept, &query_tokens, &config.ranker);
    if !ranked.metrics.has_relevant_results {
        return Ok(ExtractionResult {
            excerpts: Vec::new(),
            total_chars: 0,
            query: query.to_string(),
            outcome: ExtractionOutcome::NotRelevant,
            relevance_metrics: ranked.metrics,
        });
    }

    let anchors = select_anchors(&ranked.sentences, &config.anchors);
    let chunks: Vec<Chunk> = anchors
        .iter()
        .map(|&anchor| expand_anchor(&ranked.sentences, anchor, &config.expand))
        .collect();
    let deduped = dedupe(chunks, &config.dedupe);
    let (excerpts, total_chars) = assemble(deduped, &config.excerpts);

    tracing::debug!(
        excerpts = excerpts.len(),
        total_chars,
        elapsed = ?start.elapsed(),
        "extraction complete"
    );

    Ok(ExtractionResult {
        excerpts,
        total_chars,
        query: query.to_string(),
        outcome: ExtractionOutcome::Ok,
        relevance_metrics: ranked.metrics,
    })
}

fn empty_result(
    query: &str,
    outcome: ExtractionOutcome,
    relevance_metrics: RelevanceMetrics,
) -> ExtractionResult {
    ExtractionResult {
        excerpts: Vec::new(),
        total_chars: 0,
        query: query.to_string(),
        outcome,
        relevance_metrics,
    }
}

/// Preview path for queries that tokenize to nothing (e.g. all stop words):
/// lead sentences from the top of the document, scored by earliness, pushed
/// through the normal assembly budget. No expansion or deduplication; this
/// is a preview, not a query answer.
fn empty_query_fallback(
    sentences: Vec<Sentence>,
    query: &str,
    config: &ExtractConfig,
) -> ExtractionResult {
    let sentence_count = sentences.len();
    let chunks: Vec<Chunk> = sentences
        .iter()
        .filter(|s| s.position < FALLBACK_POSITION_CUTOFF)
        .take(config.anchors.max_anchors)
        .map(|sentence| {
            let members = std::slice::from_ref(sentence);
            Chunk {
                text: build_chunk_text(members),
                char_count: sentence.text.chars().count(),
                anchor_index: sentence.global_index,
                score: 1.0 - sentence.position,
                heading_path: sentence.heading_path.clone(),
                sentences: vec![sentence.clone()],
            }
        })
        .collect();

    let (excerpts, total_chars) = assemble(chunks, &config.excerpts);
    tracing::debug!(excerpts = excerpts.len(), "empty-query fallback");

    ExtractionResult {
        excerpts,
        total_chars,
        query: query.to_string(),
        outcome: ExtractionOutcome::Ok,
        relevance_metrics: RelevanceMetrics {
            sentence_count,
            ..RelevanceMetrics::default()
        },
    }
}
