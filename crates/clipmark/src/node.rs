//! Element helpers over the `scraper` DOM.
//!
//! Every helper walks with `ego_tree` iterators or an explicit stack, never
//! with native recursion, so deeply nested markup cannot exhaust the stack.

use ego_tree::iter::Edge;
use scraper::{ElementRef, Node};

use crate::utilities::is_void;

/// Lowercase tag name
pub fn tag_name(element: &ElementRef<'_>) -> String {
    element.value().name().to_lowercase()
}

/// Tag name of the parent element, if any
pub fn parent_tag(element: &ElementRef<'_>) -> Option<String> {
    element
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| tag_name(&parent))
}

/// Check for a whitespace separated class token
pub fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element
        .value()
        .attr("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Concatenated text of every descendant text node
pub fn text_content(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

/// Element children only
pub fn element_children<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.children().filter_map(ElementRef::wrap)
}

/// First descendant element (excluding `element`) with the given tag
pub fn find_descendant<'a>(element: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name().eq_ignore_ascii_case(tag))
}

/// Descendant elements (excluding `element`) whose tag is in `tags`
pub fn descendants_with<'a>(
    element: &ElementRef<'a>,
    tags: &'a [&'a str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |e| tags.iter().any(|t| e.value().name().eq_ignore_ascii_case(t)))
}

/// Number of ancestor elements whose tag is in `tags`
pub fn ancestor_count(element: &ElementRef<'_>, tags: &[&str]) -> usize {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|e| tags.iter().any(|t| e.value().name().eq_ignore_ascii_case(t)))
        .count()
}

/// Text with `<br>` turned into newlines, whitespace kept verbatim
pub fn preformatted_text(element: &ElementRef<'_>) -> String {
    let mut text = String::new();
    for edge in element.traverse() {
        if let Edge::Open(node) = edge {
            match node.value() {
                Node::Text(t) => text.push_str(&t.text),
                Node::Element(e) if e.name().eq_ignore_ascii_case("br") => text.push('\n'),
                _ => {}
            }
        }
    }
    text
}

/// Serialize `element` as HTML, keeping only the attributes named in `keep`
pub fn outer_html_keeping(element: &ElementRef<'_>, keep: &[&str]) -> String {
    let mut html = String::new();
    for edge in element.traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(e) => {
                    html.push('<');
                    html.push_str(e.name());
                    for (name, value) in e.attrs() {
                        if keep.iter().any(|k| k.eq_ignore_ascii_case(name)) {
                            html.push_str(&format!(" {}=\"{}\"", name, escape_html_attr(value)));
                        }
                    }
                    html.push('>');
                }
                Node::Text(t) => html.push_str(&escape_html_text(&t.text)),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(e) = node.value() {
                    if !is_void(e.name()) {
                        html.push_str(&format!("</{}>", e.name()));
                    }
                }
            }
        }
    }
    html
}

/// Escape HTML attribute value
fn escape_html_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_html_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(html: &'a Html, tag: &str) -> ElementRef<'a> {
        find_descendant(&html.root_element(), tag).unwrap()
    }

    #[test]
    fn test_text_and_classes() {
        let html = Html::parse_fragment(r#"<p class="a horizontal-splitline"><span>Hello</span> World</p>"#);
        let p = first(&html, "p");
        assert_eq!(text_content(&p), "Hello World");
        assert!(has_class(&p, "horizontal-splitline"));
        assert!(!has_class(&p, "horizontal"));
        assert_eq!(parent_tag(&first(&html, "span")).as_deref(), Some("p"));
    }

    #[test]
    fn test_preformatted_text_keeps_breaks() {
        let html = Html::parse_fragment("<pre><code>a<br>b\n  c</code></pre>");
        assert_eq!(preformatted_text(&first(&html, "code")), "a\nb\n  c");
    }

    #[test]
    fn test_outer_html_keeping() {
        let html = Html::parse_fragment(
            r#"<div><table class="t" style="x"><tr><td rowspan="2" style="y">a &amp; b</td><td><br></td></tr></table></div>"#,
        );
        let table = first(&html, "table");
        assert_eq!(
            outer_html_keeping(&table, &["colspan", "rowspan"]),
            r#"<table><tbody><tr><td rowspan="2">a &amp; b</td><td><br></td></tr></tbody></table>"#
        );
    }

    #[test]
    fn test_ancestor_count() {
        let html = Html::parse_fragment("<ul><li><ul><li>deep</li></ul></li></ul>");
        let inner = find_descendant(&first(&html, "li"), "li").unwrap();
        assert_eq!(ancestor_count(&inner, &["ul", "ol"]), 2);
    }
}
