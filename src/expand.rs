//! Context expansion: grow each anchor into a self-contained chunk.
//!
//! Section mode bounds the window by the anchor's enclosing section (the
//! nearest preceding heading through the next heading of equal-or-shallower
//! level) and expands outward from the anchor when the whole section does
//! not fit. Sentence-count mode uses a fixed window shrunk from the far
//! ends. Either way, a trailing code block may bleed past the window so
//! examples are not cut off mid-snippet.
//!
//! Indices here are positions in the post-filter sentence vector; the chunk
//! records the anchor's `global_index` for identity and ordering.

use crate::config::ExpandConfig;
use crate::types::{BlockType, Chunk, ScoredSentence, Sentence};

/// Character cost of a sentence inside a window budget: its raw text plus
/// one joining character.
fn cost(sentence: &Sentence) -> usize {
    sentence.text.chars().count() + 1
}

/// Expand one anchor into a chunk.
pub fn expand_anchor(scored: &[ScoredSentence], anchor: usize, config: &ExpandConfig) -> Chunk {
    let (low, mut high) = if config.expand_to_section {
        expand_section(scored, anchor, config)
    } else {
        expand_window(scored, anchor, config)
    };

    if config.include_code_blocks {
        high = bleed_code_blocks(scored, low, high, config);
    }

    build_chunk(scored, anchor, low, high)
}

/// Locate the anchor's section: nearest preceding heading (by filtered
/// position) through the sentence before the next heading of equal or
/// shallower level. Without a preceding heading the section starts at the
/// document top and any following heading ends it.
fn section_bounds(scored: &[ScoredSentence], anchor: usize) -> (usize, usize) {
    let mut start = 0usize;
    let mut level: Option<u8> = None;
    for i in (0..=anchor).rev() {
        if let Some(l) = scored[i].sentence.block_type.heading_level() {
            start = i;
            level = Some(l);
            break;
        }
    }

    let mut end = scored.len() - 1;
    for (i, s) in scored.iter().enumerate().skip(anchor + 1) {
        if let Some(l) = s.sentence.block_type.heading_level() {
            let closes = level.is_none_or(|section_level| l <= section_level);
            if closes {
                end = i - 1;
                break;
            }
        }
    }
    (start, end)
}

fn expand_section(
    scored: &[ScoredSentence],
    anchor: usize,
    config: &ExpandConfig,
) -> (usize, usize) {
    let (section_start, section_end) = section_bounds(scored, anchor);
    let section_cost: usize = scored[section_start..=section_end]
        .iter()
        .map(|s| cost(&s.sentence))
        .sum();
    if section_cost <= config.max_chunk_chars {
        return (section_start, section_end);
    }

    // Too big: center on the anchor and grow alternately before/after until
    // either side hits the section bound or the budget.
    let mut low = anchor;
    let mut high = anchor;
    let mut used = cost(&scored[anchor].sentence);
    let mut before_open = true;
    let mut after_open = true;
    while before_open || after_open {
        if before_open {
            if low == section_start {
                before_open = false;
            } else {
                let next_cost = cost(&scored[low - 1].sentence);
                if used + next_cost > config.max_chunk_chars {
                    before_open = false;
                } else {
                    low -= 1;
                    used += next_cost;
                }
            }
        }
        if after_open {
            if high == section_end {
                after_open = false;
            } else {
                let next_cost = cost(&scored[high + 1].sentence);
                if used + next_cost > config.max_chunk_chars {
                    after_open = false;
                } else {
                    high += 1;
                    used += next_cost;
                }
            }
        }
    }
    (low, high)
}

fn expand_window(
    scored: &[ScoredSentence],
    anchor: usize,
    config: &ExpandConfig,
) -> (usize, usize) {
    let mut low = anchor.saturating_sub(config.context_before);
    let mut high = (anchor + config.context_after).min(scored.len() - 1);

    if config.respect_block_boundaries {
        (low, high) = trim_partial_blocks(scored, anchor, low, high);
    }

    let mut used: usize = scored[low..=high].iter().map(|s| cost(&s.sentence)).sum();

    // Shrink from whichever end is farther from the anchor first.
    while used > config.max_chunk_chars && (low < anchor || high > anchor) {
        if anchor - low >= high - anchor {
            used -= cost(&scored[low].sentence);
            low += 1;
        } else {
            used -= cost(&scored[high].sentence);
            high -= 1;
        }
    }
    (low, high)
}

/// Pull the window edges inward until they sit on block boundaries, so a
/// multi-sentence paragraph is never cut in half at either end. The anchor
/// itself is never trimmed away.
fn trim_partial_blocks(
    scored: &[ScoredSentence],
    anchor: usize,
    mut low: usize,
    mut high: usize,
) -> (usize, usize) {
    let starts_block = |i: usize| {
        i == 0 || scored[i - 1].sentence.block_index != scored[i].sentence.block_index
    };
    let ends_block = |i: usize| {
        i + 1 >= scored.len()
            || scored[i + 1].sentence.block_index != scored[i].sentence.block_index
    };
    while low < anchor && !starts_block(low) {
        low += 1;
    }
    while high > anchor && !ends_block(high) {
        high -= 1;
    }
    (low, high)
}

/// Walk forward past the window end. A code block that keeps the total
/// within 1.5x the budget is taken (then the walk stops); paragraphs and
/// list items are taken while they fit the plain budget; any heading stops
/// the walk.
fn bleed_code_blocks(
    scored: &[ScoredSentence],
    low: usize,
    high: usize,
    config: &ExpandConfig,
) -> usize {
    let mut total: usize = scored[low..=high].iter().map(|s| cost(&s.sentence)).sum();
    let mut end = high;
    let code_budget = (1.5 * config.max_chunk_chars as f64) as usize;

    for (i, s) in scored.iter().enumerate().skip(high + 1) {
        let sentence = &s.sentence;
        if sentence.block_type.is_heading() {
            break;
        }
        let next_cost = cost(sentence);
        if sentence.block_type == BlockType::Pre {
            if total + next_cost <= code_budget {
                end = i;
            }
            break;
        }
        if total + next_cost > config.max_chunk_chars {
            break;
        }
        end = i;
        total += next_cost;
    }
    end
}

fn build_chunk(scored: &[ScoredSentence], anchor: usize, low: usize, high: usize) -> Chunk {
    let sentences: Vec<Sentence> = scored[low..=high]
        .iter()
        .map(|s| s.sentence.clone())
        .collect();
    let anchor_sentence = &scored[anchor];
    Chunk {
        text: build_chunk_text(&sentences),
        char_count: sentences.iter().map(|s| s.text.chars().count()).sum(),
        anchor_index: anchor_sentence.sentence.global_index,
        score: anchor_sentence.combined_score,
        heading_path: anchor_sentence.sentence.heading_path.clone(),
        sentences,
    }
}

/// Render chunk sentences into display text.
///
/// Headings and paragraph boundaries become blank lines, code blocks are
/// fenced, list items become dash bullets, and consecutive sentences of one
/// paragraph rejoin with a single space.
pub(crate) fn build_chunk_text(sentences: &[Sentence]) -> String {
    let mut out = String::new();
    let mut previous: Option<BlockType> = None;

    for sentence in sentences {
        match sentence.block_type {
            t if t.is_heading() => {
                if !out.is_empty() {
                    out.push_str("\n\n");
                }
                out.push_str(&sentence.text);
            }
            BlockType::Pre => {
                out.push_str("\n\n```\n");
                out.push_str(&sentence.text);
                out.push_str("\n```");
            }
            BlockType::Li => {
                if previous != Some(BlockType::Li) {
                    out.push('\n');
                }
                out.push_str("\n- ");
                out.push_str(&sentence.text);
            }
            _ => {
                match previous {
                    Some(BlockType::P) => out.push(' '),
                    Some(_) => out.push_str("\n\n"),
                    None => {}
                }
                out.push_str(&sentence.text);
            }
        }
        previous = Some(sentence.block_type);
    }
    out.trim().to_string()
}
