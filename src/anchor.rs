//! Anchor selection: diversity-filtered top-K.
//!
//! A greedy pass over the ranked order accepts a sentence only when it is
//! good enough on its own and both textually and positionally distant from
//! everything already accepted. This trades a little score for coverage of
//! different parts of the document.

use crate::config::AnchorConfig;
use crate::rank::ranked_order;
use crate::tokenize::jaccard_similarity;
use crate::types::ScoredSentence;

/// Select anchor positions (indices into `scored`) in greedy rank order.
pub fn select_anchors(scored: &[ScoredSentence], config: &AnchorConfig) -> Vec<usize> {
    let mut selected: Vec<usize> = Vec::new();

    for index in ranked_order(scored) {
        if selected.len() >= config.max_anchors {
            break;
        }
        let candidate = &scored[index];
        if candidate.combined_score < config.min_score {
            continue;
        }
        let distinct = selected.iter().all(|&accepted| {
            let anchor = &scored[accepted];
            jaccard_similarity(&candidate.sentence.tokens, &anchor.sentence.tokens)
                <= config.diversity_threshold
                && candidate
                    .sentence
                    .global_index
                    .abs_diff(anchor.sentence.global_index)
                    >= config.min_position_gap
        });
        if distinct {
            selected.push(index);
        }
    }

    tracing::trace!(anchors = selected.len(), "selected anchors");
    selected
}
