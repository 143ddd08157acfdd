//! HTML sanitation and parsing.
//!
//! Raw clipboard markup is stripped of scripts, styles and comments, then
//! parsed with `scraper` as a fragment in body context, so partial captures
//! ("<li>one<li>two") still produce a usable tree.

use ego_tree::iter::Edge;
use ego_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

use crate::node::{element_children, has_class};
use crate::utilities::{is_blank, is_preserved_when_empty};
use crate::{ConvertError, Result};

static SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script pattern is valid"));
static STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("style pattern is valid"));
static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

/// Remove `<script>`, `<style>` and comments from raw markup
pub fn sanitize(html: &str) -> String {
    let html = SCRIPT.replace_all(html, "");
    let html = STYLE.replace_all(&html, "");
    COMMENT.replace_all(&html, "").into_owned()
}

/// Parse sanitized markup as a fragment scoped to a synthetic body.
pub fn parse(html: &str) -> Result<Html> {
    let document = Html::parse_fragment(html);
    if !document.root_element().value().name().eq_ignore_ascii_case("html") {
        return Err(ConvertError::Parse(
            "fragment has no synthetic root element".to_string(),
        ));
    }
    if !document.errors.is_empty() {
        tracing::trace!(errors = document.errors.len(), "recovered from malformed markup");
    }
    Ok(document)
}

/// Outer HTML of the `div.section` children of the first `div.document`.
///
/// Returns `None` when the markup does not have that shape.
pub fn extract_document_sections(html: &str) -> Option<String> {
    let document = Html::parse_fragment(html);
    let root = document.root_element();

    let container = root
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "div" && has_class(e, "document"))?;

    let sections: String = element_children(&container)
        .filter(|e| e.value().name() == "div" && has_class(e, "section"))
        .map(|section| section.html())
        .collect();

    (!sections.is_empty()).then_some(sections)
}

/// Detach every element that renders to nothing.
///
/// An element is empty when its text is blank (whitespace and zero-width
/// characters only) and it contains no element from the preserved set or
/// flagged by `significant`. The root element itself is never removed.
/// Returns the number of detached subtrees.
pub fn remove_empty_elements(document: &mut Html, significant: fn(&ElementRef<'_>) -> bool) -> usize {
    let root = document.root_element();
    let root_id = root.id();

    // Per open element: "has content" flag and where its empty descendants start
    let mut open: Vec<(bool, usize)> = Vec::new();
    let mut empty: Vec<NodeId> = Vec::new();

    for edge in root.traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(_) => open.push((false, empty.len())),
                Node::Text(text) if !is_blank(&text.text) => {
                    if let Some((flag, _)) = open.last_mut() {
                        *flag = true;
                    }
                }
                _ => {}
            },
            Edge::Close(node) => {
                let Some(element) = ElementRef::wrap(node) else {
                    continue;
                };
                let (has_content, first_empty) = open.pop().unwrap_or((false, empty.len()));
                let keep = has_content
                    || node.id() == root_id
                    || is_preserved_when_empty(element.value().name())
                    || significant(&element);

                if keep {
                    if let Some((flag, _)) = open.last_mut() {
                        *flag = true;
                    }
                } else {
                    // Only the outermost empty element needs detaching
                    empty.truncate(first_empty);
                    empty.push(node.id());
                }
            }
        }
    }

    let mut removed = 0;
    for id in empty {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
            removed += 1;
        }
    }
    removed
}
