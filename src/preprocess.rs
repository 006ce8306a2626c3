//! HTML cleanup and main-content location.
//!
//! Four passes over the parsed document, in order: strip non-content
//! elements, remove boilerplate chrome (protecting anything under a declared
//! main region), locate the main content container, and scrub UI widgets
//! inside it. Removal is physical: doomed subtrees are detached from the
//! tree so later stages never see them.

use ahash::AHashSet;
use ego_tree::{NodeId, NodeRef};
use once_cell::sync::Lazy;
use regex::RegexSet;
use scraper::{ElementRef, Html, Node, Selector};
use scraper::node::Element;

/// Element kinds that never carry content: scripts, styles, media, form
/// controls, and vector/graphic containers.
static STRIP_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "script, style, link, img, iframe, audio, video, embed, object, \
         input, select, textarea, button, label, fieldset, legend, output, \
         progress, meter, noscript, svg, canvas, map, area",
    )
    .unwrap()
});

/// Declared main-content regions whose subtrees are protected from
/// boilerplate removal.
static PROTECTED_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("main, article, [role=\"main\"]").unwrap());

/// Page chrome removed wholesale unless protected.
static CHROME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("nav, footer, aside, header").unwrap());

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static MAIN_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("main").unwrap());
static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());

/// Matched against `id + " " + class` of every element.
static BOILERPLATE_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)nav(igation)?",
        r"(?i)footer",
        r"(?i)header",
        r"(?i)sidebar",
        r"(?i)menu",
        r"(?i)breadcrumb",
        r"(?i)cookie",
        r"(?i)consent",
        r"(?i)banner",
        r"(?i)advert(isement)?",
        r"(?i)\bads?\b",
        r"(?i)social",
        r"(?i)share",
        r"(?i)comment",
        r"(?i)related",
        r"(?i)recommend",
        r"(?i)popup",
        r"(?i)modal",
        r"(?i)newsletter",
        r"(?i)subscribe",
        r"(?i)signup",
        r"(?i)login",
        r"(?i)signin",
        r"(?i)search",
        r"(?i)widget",
        r"(?i)toolbar",
        r"(?i)promo",
    ])
    .unwrap()
});

/// Widget chrome inside the main container, matched against `id + " " + class`.
static UI_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)copy[-_]?(btn|button)",
        r"(?i)share[-_]?(btn|button)",
        r"(?i)action[-_]?(btn|button|menu)",
        r"(?i)clipboard",
        r"(?i)open[-_]?in",
        r"(?i)feedback",
        r"(?i)edit[-_]?(this[-_]?)?page",
        r"(?i)page[-_]?actions",
        r"(?i)\btoc\b",
        r"(?i)on[-_]?this[-_]?page",
        r"(?i)table[-_]?of[-_]?contents",
        r"(?i)\bsticky\b",
        r"(?i)\bfloating\b",
        r"(?i)anchor[-_]?link",
        r"(?i)heading[-_]?link",
    ])
    .unwrap()
});

/// Short interactive labels ("Copy", "Open in Playground", ...) matched
/// against normalized, lowercased element text under 50 characters.
static UI_TEXT_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^copy(\s+as\s+\w+)?$",
        r"^open in \w+",
        r"^(share|copy)\s*(this|link|page)?$",
        r"^edit\s*(this)?\s*(page|on github)?$",
        r"^(give )?feedback$",
        r"^(scroll to )?top$",
        r"^on this page$",
        r"^table of contents$",
    ])
    .unwrap()
});

/// Class substrings that identify widget chrome regardless of tag.
const UI_CLASS_SUBSTRINGS: &[&str] = &[
    "copy-button",
    "share-button",
    "actionmenu",
    "pageactions",
    "anchor-link",
    "heading-link",
    "sticky",
];

/// Result of preprocessing: the cleaned document plus the located main
/// content container, if any.
pub struct Preprocessed {
    pub dom: Html,
    /// Selector string identifying the container, e.g. `"main"` or
    /// `"body > :nth-child(2)"`. Doubles as the deterministic tie-break key
    /// during candidate scoring.
    pub main_selector: Option<String>,
    pub main_node: Option<NodeId>,
}

/// Parse and clean an HTML document, locating its main content.
///
/// Malformed HTML is tolerated; the worst case is an absent main container
/// (`main_node == None`).
pub fn preprocess(html: &str) -> Preprocessed {
    let mut dom = Html::parse_document(html);

    strip_non_content(&mut dom);
    remove_boilerplate(&mut dom);

    let located = locate_main_content(&dom);
    if let Some((_, node)) = &located {
        remove_ui_widgets(&mut dom, *node);
    }

    let (main_selector, main_node) = match located {
        Some((selector, node)) => (Some(selector), Some(node)),
        None => (None, None),
    };
    tracing::debug!(main_selector = main_selector.as_deref(), "preprocessed document");

    Preprocessed {
        dom,
        main_selector,
        main_node,
    }
}

fn detach_all(dom: &mut Html, ids: Vec<NodeId>) {
    for id in ids {
        if let Some(mut node) = dom.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn id_class_label(element: &Element) -> String {
    format!(
        "{} {}",
        element.attr("id").unwrap_or(""),
        element.attr("class").unwrap_or("")
    )
}

fn strip_non_content(dom: &mut Html) {
    let doomed: Vec<NodeId> = dom.select(&STRIP_SELECTOR).map(|el| el.id()).collect();
    detach_all(dom, doomed);
}

fn remove_boilerplate(dom: &mut Html) {
    // Protection flags: everything under a declared main region, plus the
    // ancestor chain that contains it.
    let mut protected: AHashSet<NodeId> = AHashSet::new();
    let mut protects_descendant: AHashSet<NodeId> = AHashSet::new();
    for region in dom.select(&PROTECTED_SELECTOR) {
        for node in region.descendants() {
            protected.insert(node.id());
        }
        for ancestor in region.ancestors() {
            protects_descendant.insert(ancestor.id());
        }
    }
    let is_protected =
        |id: NodeId| protected.contains(&id) || protects_descendant.contains(&id);

    let mut doomed: Vec<NodeId> = Vec::new();
    for el in dom.select(&CHROME_SELECTOR) {
        if !is_protected(el.id()) {
            doomed.push(el.id());
        }
    }

    for node in dom.tree.root().descendants() {
        let Some(element) = node.value().as_element() else {
            continue;
        };
        // Never remove the document skeleton on an id/class match.
        if matches!(element.name(), "html" | "body") {
            continue;
        }
        if is_protected(node.id()) {
            continue;
        }
        if BOILERPLATE_PATTERNS.is_match(&id_class_label(element)) {
            doomed.push(node.id());
        }
    }

    detach_all(dom, doomed);
}

/// Candidate selectors consulted when no `<main>` or `<article>` exists.
const CANDIDATE_SELECTORS: &[&str] = &[
    "[role=\"main\"]",
    "#content",
    "#main-content",
    ".content",
    ".main-content",
    ".post-content",
    ".article-content",
    ".entry-content",
];

static CANDIDATE_SELECTOR_LIST: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    CANDIDATE_SELECTORS
        .iter()
        .map(|s| (*s, Selector::parse(s).unwrap()))
        .collect()
});

/// Text volume minus twice the linked text volume. Link-heavy containers
/// (navigation, tag clouds) score negative.
fn content_score(el: ElementRef<'_>) -> i64 {
    let text_chars: usize = el.text().map(|t| t.chars().count()).sum();
    let link_chars: usize = el
        .select(&ANCHOR_SELECTOR)
        .map(|a| a.text().map(|t| t.chars().count()).sum::<usize>())
        .sum();
    text_chars as i64 - 2 * link_chars as i64
}

/// Locate the main content container.
///
/// Priority: first `<main>`, then first `<article>`, then the best-scoring
/// candidate among direct `<body>` children and the well-known content
/// selectors. Ties break on the lexicographically smallest selector string
/// so the choice is reproducible.
pub(crate) fn locate_main_content(dom: &Html) -> Option<(String, NodeId)> {
    if let Some(el) = dom.select(&MAIN_SELECTOR).next() {
        return Some(("main".to_string(), el.id()));
    }
    if let Some(el) = dom.select(&ARTICLE_SELECTOR).next() {
        return Some(("article".to_string(), el.id()));
    }

    let mut candidates: Vec<(i64, String, NodeId)> = Vec::new();
    if let Some(body) = dom.select(&BODY_SELECTOR).next() {
        for (i, child) in body.children().filter_map(ElementRef::wrap).enumerate() {
            candidates.push((
                content_score(child),
                format!("body > :nth-child({})", i + 1),
                child.id(),
            ));
        }
    }
    for (selector_str, selector) in CANDIDATE_SELECTOR_LIST.iter() {
        for el in dom.select(selector) {
            candidates.push((content_score(el), (*selector_str).to_string(), el.id()));
        }
    }

    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    candidates
        .into_iter()
        .next()
        .map(|(_, selector, id)| (selector, id))
}

fn has_ui_attributes(element: &Element) -> bool {
    if element.attr("data-copy").is_some() || element.attr("data-clipboard").is_some() {
        return true;
    }
    let labelled = |value: Option<&str>| {
        value.is_some_and(|v| {
            let v = v.to_lowercase();
            v.contains("copy") || v.contains("share")
        })
    };
    if labelled(element.attr("aria-label")) || labelled(element.attr("title")) {
        return true;
    }
    element.attr("class").is_some_and(|class| {
        let class = class.to_lowercase();
        UI_CLASS_SUBSTRINGS.iter().any(|s| class.contains(s))
    })
}

fn is_tab_chrome(element: &Element) -> bool {
    if element
        .attr("role")
        .is_some_and(|role| role == "tab" || role == "tablist")
    {
        return true;
    }
    element
        .attr("class")
        .is_some_and(|class| class.split_whitespace().any(|c| c == "tabs"))
}

/// True for short interactive labels like "Copy" or "Edit on GitHub".
fn has_ui_text(el: ElementRef<'_>) -> bool {
    let text = el.text().collect::<String>();
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() >= 50 {
        return false;
    }
    UI_TEXT_PATTERNS.is_match(&normalized.to_lowercase())
}

/// True for containers that are mostly links: at least three anchors whose
/// combined text exceeds 80% of a short element's text.
fn is_link_heavy(el: ElementRef<'_>) -> bool {
    let text_chars: usize = el.text().map(|t| t.chars().count()).sum();
    if text_chars >= 200 {
        return false;
    }
    let anchors: Vec<ElementRef<'_>> = el.select(&ANCHOR_SELECTOR).collect();
    if anchors.len() < 3 {
        return false;
    }
    let anchor_chars: usize = anchors
        .iter()
        .map(|a| a.text().map(|t| t.chars().count()).sum::<usize>())
        .sum();
    anchor_chars as f64 > 0.8 * text_chars as f64
}

fn remove_ui_widgets(dom: &mut Html, main_id: NodeId) {
    let mut doomed: Vec<NodeId> = Vec::new();
    {
        let Some(main) = dom.tree.get(main_id) else {
            return;
        };
        for node in descendants_excluding_self(main) {
            let Some(el) = ElementRef::wrap(node) else {
                continue;
            };
            let element = el.value();
            let tag = element.name();

            if UI_PATTERNS.is_match(&id_class_label(element))
                || is_tab_chrome(element)
                || has_ui_attributes(element)
            {
                doomed.push(node.id());
                continue;
            }
            if matches!(tag, "button" | "a" | "span" | "div") && has_ui_text(el) {
                doomed.push(node.id());
                continue;
            }
            if matches!(tag, "p" | "div" | "span") && is_link_heavy(el) {
                doomed.push(node.id());
            }
        }
    }
    detach_all(dom, doomed);
}

fn descendants_excluding_self<'a>(
    node: NodeRef<'a, Node>,
) -> impl Iterator<Item = NodeRef<'a, Node>> {
    node.descendants().skip(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn main_selector(html: &str) -> Option<String> {
        preprocess(html).main_selector
    }

    fn main_text(html: &str) -> String {
        let pre = preprocess(html);
        let id = pre.main_node.expect("main content should exist");
        let node = pre.dom.tree.get(id).unwrap();
        let el = ElementRef::wrap(node).unwrap();
        el.text().collect::<String>()
    }

    #[test]
    fn test_main_tag_wins() {
        let html = "<body><main><p>content</p></main><article><p>other</p></article></body>";
        check!(main_selector(html) == Some("main".to_string()));
    }

    #[test]
    fn test_article_when_no_main() {
        let html = "<body><article><p>content</p></article></body>";
        check!(main_selector(html) == Some("article".to_string()));
    }

    #[test]
    fn test_scored_candidate_fallback() {
        let html = r#"<body>
            <div><a href="/">home</a> <a href="/a">a</a> <a href="/b">b</a></div>
            <div id="content"><p>A long passage of real prose that easily outweighs the navigation links above it.</p></div>
        </body>"#;
        check!(main_selector(html) == Some("#content".to_string()));
    }

    #[test]
    fn test_no_candidates_yields_none() {
        check!(main_selector("") == None);
        check!(preprocess("").main_node.is_none());
    }

    #[rstest]
    #[case("<body><main><p>keep</p></main><script>var x = 1;</script></body>", "var x")]
    #[case("<body><main><p>keep</p></main><style>.a{}</style></body>", ".a{}")]
    #[case("<body><main><p>keep</p><noscript>enable js</noscript></main></body>", "enable js")]
    fn test_strips_non_content(#[case] html: &str, #[case] gone: &str) {
        let text = main_text(html);
        check!(text.contains("keep"));
        check!(!text.contains(gone));
    }

    #[test]
    fn test_removes_unprotected_chrome() {
        let html = "<body><nav><p>menu</p></nav><main><p>content</p></main>\
                    <footer><p>legal</p></footer></body>";
        let text = main_text(html);
        check!(text.contains("content"));
        check!(!text.contains("menu"));
        check!(!text.contains("legal"));
    }

    #[test]
    fn test_protection_keeps_header_inside_main() {
        let html = "<body><main><header><p>article header</p></header>\
                    <p>content</p></main></body>";
        let text = main_text(html);
        check!(text.contains("article header"));
        check!(text.contains("content"));
    }

    #[test]
    fn test_boilerplate_class_removed() {
        // No <main> in this document, so nothing is protected and the
        // newsletter block is gone before candidate scoring runs.
        let html = r#"<body><div id="content"><p>a reasonably long passage of content</p>
            <div class="newsletter-signup"><p>subscribe now</p></div></div></body>"#;
        let text = main_text(html);
        check!(text.contains("passage of content"));
        check!(!text.contains("subscribe now"));
    }

    #[test]
    fn test_boilerplate_respects_protection() {
        // The sidebar-classed div lives inside <main>, so it survives.
        let html = r#"<body><main><div class="sidebar"><p>inline aside</p></div>
            <p>content</p></main></body>"#;
        let text = main_text(html);
        check!(text.contains("inline aside"));
    }

    #[rstest]
    #[case(r#"<span class="copy-button">Copy</span>"#)]
    #[case(r#"<div data-clipboard="x">Copy code</div>"#)]
    #[case(r#"<span aria-label="Copy to clipboard">icon</span>"#)]
    #[case(r#"<div role="tablist"><span>one</span></div>"#)]
    fn test_ui_widgets_removed(#[case] widget: &str) {
        let html = format!("<body><main><p>real content here</p>{widget}</main></body>");
        let text = main_text(&html);
        check!(text.contains("real content here"));
        check!(!text.contains("icon"));
        check!(!text.contains("Copy"));
        check!(!text.contains("one"));
    }

    #[rstest]
    #[case("Copy")]
    #[case("Copy as Markdown")]
    #[case("Open in Playground")]
    #[case("Edit on GitHub")]
    #[case("On this page")]
    #[case("Scroll to top")]
    fn test_ui_text_removed(#[case] label: &str) {
        let html =
            format!("<body><main><p>real content here</p><span>{label}</span></main></body>");
        let text = main_text(&html);
        check!(!text.contains(label));
    }

    #[test]
    fn test_link_heavy_paragraph_removed() {
        let html = r#"<body><main><p>substantial prose content kept as is</p>
            <p><a href="1">First link</a> <a href="2">Second link</a> <a href="3">Third link</a></p>
            </main></body>"#;
        let text = main_text(html);
        check!(text.contains("substantial prose"));
        check!(!text.contains("First link"));
    }

    #[test]
    fn test_long_ui_like_text_survives() {
        let sentence = "Copy editors review every article before publication, \
                        checking grammar and style.";
        let html = format!("<body><main><p>{sentence}</p><p>second paragraph of prose</p></main></body>");
        let text = main_text(&html);
        check!(text.contains("Copy editors"));
    }
}
