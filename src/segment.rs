//! DOM segmentation into blocks and sentences.
//!
//! The walk is depth-first from the main container. Heading path tracking is
//! deliberately asymmetric: a heading's own path is truncated to its parent
//! level *before* capture (so equal-level siblings never appear in it), and
//! the heading's text is appended *after* emission (so every following block
//! sees it). Do not symmetrize this; downstream scoring depends on it.

use crate::tokenize::{TokenizeOptions, tokenize};
use crate::types::{Block, BlockType, Sentence};
use ahash::AHashSet;
use ego_tree::{NodeId, NodeRef};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

/// Trailing widget labels that survive inside code blocks after UI removal
/// ("Copy", "Run", "Open in Playground", ...).
static CODE_SUFFIXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\s*(Try|Run|Copy)$").unwrap(),
        Regex::new(r"\s*Open in (Playground|CodeSandbox|StackBlitz)$").unwrap(),
        Regex::new(r"\s*(Edit|View) on GitHub$").unwrap(),
    ]
});

/// Tokens that end with a period without ending a sentence.
static ABBREVIATIONS: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
    [
        "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "vs", "etc", "inc", "ltd", "st", "ave",
        "blvd", "rd", "e.g", "i.e", "cf", "al", "fig", "vol", "no",
    ]
    .into_iter()
    .collect()
});

/// Options for the DOM walk.
#[derive(Debug, Clone, Copy)]
pub struct SegmentOptions {
    /// Do not descend into `<nav>` subtrees.
    pub skip_nav: bool,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self { skip_nav: true }
    }
}

/// Walk the main container and emit blocks in document order.
pub fn segment_blocks(dom: &Html, main: NodeId, options: &SegmentOptions) -> Vec<Block> {
    let Some(root) = dom.tree.get(main) else {
        return Vec::new();
    };
    let mut blocks = Vec::new();
    let mut heading_path: Vec<String> = Vec::new();
    walk(root, options, &mut heading_path, &mut blocks);
    tracing::trace!(blocks = blocks.len(), "segmented main container");
    blocks
}

fn walk(
    node: NodeRef<'_, Node>,
    options: &SegmentOptions,
    heading_path: &mut Vec<String>,
    blocks: &mut Vec<Block>,
) {
    for child in node.children() {
        let Some(el) = ElementRef::wrap(child) else {
            continue;
        };
        let tag = el.value().name();
        if options.skip_nav && tag == "nav" {
            continue;
        }
        if let Some(block_type) = BlockType::from_tag(tag) {
            emit_block(el, block_type, heading_path, blocks);
        } else {
            walk(child, options, heading_path, blocks);
        }
    }
}

fn emit_block(
    el: ElementRef<'_>,
    block_type: BlockType,
    heading_path: &mut Vec<String>,
    blocks: &mut Vec<Block>,
) {
    let text = match block_type {
        BlockType::Pre => pre_text(el),
        _ => collapse_whitespace(&el.text().collect::<String>()),
    };
    if text.is_empty() {
        return;
    }

    if let Some(level) = block_type.heading_level() {
        // A heading's own path holds only strict ancestors.
        heading_path.truncate(level as usize - 1);
        blocks.push(Block {
            block_type,
            text: text.clone(),
            index: blocks.len(),
            heading_path: heading_path.clone(),
        });
        heading_path.push(text);
    } else {
        blocks.push(Block {
            block_type,
            text,
            index: blocks.len(),
            heading_path: heading_path.clone(),
        });
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract code text preserving line structure.
///
/// Syntax highlighters often wrap each line in an element with a
/// `line`-bearing class; when present those lines are rejoined with
/// newlines. Otherwise `<br>` elements become newlines, and failing both,
/// the raw text (with its original line breaks) is kept.
fn pre_text(el: ElementRef<'_>) -> String {
    let mut captured: AHashSet<NodeId> = AHashSet::new();
    let mut lines: Vec<String> = Vec::new();
    for node in el.descendants().skip(1) {
        if node.ancestors().any(|a| captured.contains(&a.id())) {
            continue;
        }
        let Some(child) = ElementRef::wrap(node) else {
            continue;
        };
        let has_line_class = child
            .value()
            .attr("class")
            .is_some_and(|class| class.to_lowercase().contains("line"));
        if has_line_class {
            captured.insert(node.id());
            lines.push(child.text().collect::<String>());
        }
    }

    let raw = if !lines.is_empty() {
        lines.join("\n")
    } else if el.inner_html().contains("<br") {
        text_with_breaks(el)
    } else {
        el.text().collect::<String>()
    };

    clean_code_suffix(raw.trim())
}

fn text_with_breaks(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants().skip(1) {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) if child.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

fn clean_code_suffix(text: &str) -> String {
    let mut out = text.to_string();
    for re in CODE_SUFFIXES.iter() {
        out = re.replace(&out, "").into_owned();
    }
    out.trim().to_string()
}

/// Split paragraph text into sentences.
///
/// A sentence ends at `.`, `!`, or `?` followed by whitespace and an
/// uppercase letter (or the end of the text), unless the word before a
/// period is a known abbreviation.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let normalized = collapse_whitespace(text);
    let chars: Vec<char> = normalized.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if matches!(c, '.' | '!' | '?') {
            let mut next = i + 1;
            while next < chars.len() && chars[next] == ' ' {
                next += 1;
            }
            let at_end = next >= chars.len();
            let upper_follows = !at_end && next > i + 1 && chars[next].is_uppercase();
            let abbreviation = c == '.' && is_abbreviation(&chars, i);
            if (at_end || upper_follows) && !abbreviation {
                push_sentence(&chars[start..=i], &mut sentences);
                start = next;
                i = next;
                continue;
            }
        }
        i += 1;
    }
    if start < chars.len() {
        push_sentence(&chars[start..], &mut sentences);
    }
    sentences
}

fn push_sentence(chars: &[char], sentences: &mut Vec<String>) {
    let sentence: String = chars.iter().collect();
    let trimmed = sentence.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

/// The word immediately before the period at `dot`, checked against the
/// abbreviation list. Keeps interior periods so `e.g.` resolves to `e.g`.
fn is_abbreviation(chars: &[char], dot: usize) -> bool {
    let mut begin = dot;
    while begin > 0 && !chars[begin - 1].is_whitespace() {
        begin -= 1;
    }
    let word: String = chars[begin..dot].iter().collect();
    let word = word
        .trim_matches(|ch: char| !ch.is_alphanumeric() && ch != '.')
        .to_lowercase();
    ABBREVIATIONS.contains(word.as_str())
}

/// Turn blocks into scored-pipeline sentences with document coordinates.
///
/// Paragraphs and list items are sentence-split; headings and code blocks
/// each become a single sentence. `global_index` is dense in document order.
pub fn sentences_from_blocks(blocks: &[Block]) -> Vec<Sentence> {
    let denominator = blocks.len().saturating_sub(1).max(1) as f64;
    let options = TokenizeOptions::default();
    let mut sentences: Vec<Sentence> = Vec::new();

    for block in blocks {
        let texts: Vec<String> = match block.block_type {
            BlockType::P | BlockType::Li => split_sentences(&block.text),
            _ => vec![block.text.clone()],
        };
        for (sentence_index, text) in texts.into_iter().enumerate() {
            let tokens = tokenize(&text, &options);
            let position = (block.index as f64 / denominator).clamp(0.0, 1.0);
            sentences.push(Sentence {
                text,
                tokens,
                heading_path: block.heading_path.clone(),
                block_type: block.block_type,
                block_index: block.index,
                sentence_index,
                global_index: sentences.len(),
                position,
            });
        }
    }
    sentences
}
