//! Excerpt assembly under a character budget.
//!
//! Best chunks first; a chunk that would blow the budget is skipped rather
//! than ending the scan, so a smaller later chunk can still fill the gap.
//! This skip-and-continue behavior is load-bearing: callers tune
//! `char_budget` around it.

use crate::config::ExcerptConfig;
use crate::types::{Chunk, Excerpt};

/// Pick excerpts from deduplicated chunks.
///
/// Returns the excerpt list (score descending, anchor ascending) and the
/// total characters admitted.
pub fn assemble(mut chunks: Vec<Chunk>, config: &ExcerptConfig) -> (Vec<Excerpt>, usize) {
    chunks.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.anchor_index.cmp(&b.anchor_index))
    });

    let mut excerpts: Vec<Excerpt> = Vec::new();
    let mut total_chars = 0usize;

    for chunk in chunks {
        if excerpts.len() >= config.max_excerpts {
            break;
        }
        if chunk.char_count < config.min_excerpt_chars {
            continue;
        }
        if total_chars + chunk.char_count > config.char_budget {
            continue;
        }
        total_chars += chunk.char_count;
        excerpts.push(Excerpt {
            text: chunk.text,
            heading_path: chunk.heading_path,
            score: chunk.score,
            char_count: chunk.char_count,
        });
    }

    tracing::debug!(excerpts = excerpts.len(), total_chars, "assembled excerpts");
    (excerpts, total_chars)
}
