//! Chunk deduplication: merge overlaps, drop near-duplicates and subsets.
//!
//! Phase A walks chunks best-first and merges any later chunk sharing
//! enough sentences (transitively, so chains of overlap collapse into one).
//! Chunks that share few sentences but read the same (token Jaccard) are
//! dropped outright. Phase B removes any chunk whose sentence set is
//! contained in an already-accepted one; identical sets count as subsets in
//! both directions, and the size-desc/anchor-asc ordering decides which
//! survives.

use crate::config::DedupeConfig;
use crate::expand::build_chunk_text;
use crate::tokenize::jaccard_similarity;
use crate::types::Chunk;
use ahash::AHashSet;

/// Run both phases and return the surviving chunks sorted by score
/// descending, anchor ascending.
pub fn dedupe(chunks: Vec<Chunk>, config: &DedupeConfig) -> Vec<Chunk> {
    let before = chunks.len();
    let merged = merge_overlapping(chunks, config);
    let mut kept = remove_subsets(merged);
    kept.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.anchor_index.cmp(&b.anchor_index))
    });
    if kept.len() != before {
        tracing::trace!(before, after = kept.len(), "deduplicated chunks");
    }
    kept
}

fn index_set(chunk: &Chunk) -> AHashSet<usize> {
    chunk.sentences.iter().map(|s| s.global_index).collect()
}

fn all_tokens(chunk: &Chunk) -> Vec<String> {
    chunk
        .sentences
        .iter()
        .flat_map(|s| s.tokens.iter().cloned())
        .collect()
}

/// Shared sentences as a fraction of the smaller chunk.
fn sentence_overlap(a: &AHashSet<usize>, b: &AHashSet<usize>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / smaller as f64
}

fn merge_overlapping(mut chunks: Vec<Chunk>, config: &DedupeConfig) -> Vec<Chunk> {
    chunks.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.anchor_index.cmp(&b.anchor_index))
    });

    let mut consumed = vec![false; chunks.len()];
    let mut out: Vec<Chunk> = Vec::new();

    for i in 0..chunks.len() {
        if consumed[i] {
            continue;
        }
        let mut current = chunks[i].clone();
        let mut current_set = index_set(&current);
        let mut current_tokens = all_tokens(&current);

        // Re-scan after every merge so overlap is transitive through the
        // accumulated chunk.
        let mut changed = true;
        while changed {
            changed = false;
            for j in (i + 1)..chunks.len() {
                if consumed[j] {
                    continue;
                }
                let other_set = index_set(&chunks[j]);
                if sentence_overlap(&current_set, &other_set) >= config.overlap_threshold {
                    merge_into(&mut current, &chunks[j]);
                    current_set = index_set(&current);
                    current_tokens = all_tokens(&current);
                    consumed[j] = true;
                    changed = true;
                } else if jaccard_similarity(&current_tokens, &all_tokens(&chunks[j]))
                    >= config.token_similarity_threshold
                {
                    // Different sentences, same content: keep the winner.
                    consumed[j] = true;
                }
            }
        }
        out.push(current);
    }
    out
}

/// Union the sentences of `other` into `current`. Score becomes the max;
/// anchor and heading path stay with the higher-scoring parent (`current`,
/// by iteration order).
fn merge_into(current: &mut Chunk, other: &Chunk) {
    current.sentences.extend(other.sentences.iter().cloned());
    current.sentences.sort_by_key(|s| s.global_index);
    current.sentences.dedup_by_key(|s| s.global_index);
    current.score = current.score.max(other.score);
    current.text = build_chunk_text(&current.sentences);
    current.char_count = current
        .sentences
        .iter()
        .map(|s| s.text.chars().count())
        .sum();
}

fn remove_subsets(mut chunks: Vec<Chunk>) -> Vec<Chunk> {
    chunks.sort_by(|a, b| {
        b.sentences
            .len()
            .cmp(&a.sentences.len())
            .then_with(|| a.anchor_index.cmp(&b.anchor_index))
    });

    let mut accepted: Vec<Chunk> = Vec::new();
    let mut accepted_sets: Vec<AHashSet<usize>> = Vec::new();
    for chunk in chunks {
        let set = index_set(&chunk);
        if accepted_sets.iter().any(|kept| set.is_subset(kept)) {
            continue;
        }
        accepted_sets.push(set);
        accepted.push(chunk);
    }
    accepted
}
