//! Utility functions and constants for HTML processing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::fence_mask;

/// Block-level HTML elements
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "body", "canvas",
    "center", "dd", "dir", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hgroup", "hr", "html", "iframe", "li", "main", "menu",
    "nav", "noframes", "noscript", "ol", "output", "p", "pre", "section",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul", "video",
];

/// Void (self-closing) HTML elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements that carry meaning without any text
pub const PRESERVED_WHEN_EMPTY: &[&str] = &[
    "img", "br", "hr", "input", "svg", "iframe", "video", "audio", "canvas",
    "object", "embed", "source",
];

/// Check if a tag is a block-level element
pub fn is_block(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag.to_lowercase().as_str())
}

/// Check if a tag is a void element
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_lowercase().as_str())
}

/// Check if a tag survives empty-element elision
pub fn is_preserved_when_empty(tag: &str) -> bool {
    PRESERVED_WHEN_EMPTY.contains(&tag.to_lowercase().as_str())
}

/// Zero-width characters that never count as content
pub fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}')
}

/// True when `text` holds nothing but whitespace and zero-width characters
pub fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || is_zero_width(c))
}

/// Collapse whitespace runs to a single space and drop zero-width characters
pub fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_whitespace = false;

    for c in s.chars() {
        if is_zero_width(c) {
            continue;
        }
        if c.is_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
                prev_was_whitespace = true;
            }
        } else {
            result.push(c);
            prev_was_whitespace = false;
        }
    }

    result
}

static ESCAPES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\\", r"\\"),
        (r"\*", r"\*"),
        (r"^-", r"\-"),
        (r"^\+ ", r"\+ "),
        (r"^(=+)", r"\$1"),
        (r"^(#{1,6}) ", r"\$1 "),
        (r"`", r"\`"),
        (r"^~~~", r"\~~~"),
        (r"\[", r"\["),
        (r"\]", r"\]"),
        (r"^>", r"\>"),
        (r"_", r"\_"),
        (r"^(\d+)\. ", r"$1\. "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("escape pattern is valid"),
            replacement,
        )
    })
    .collect()
});

/// Escape Markdown syntax in a text run.
///
/// Inline markers are escaped everywhere; block markers only at the start of
/// the run.
pub fn escape_markdown(text: &str) -> String {
    ESCAPES
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

/// Clean an attribute value (trim and handle empty)
pub fn clean_attribute(value: Option<&str>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_default()
}

/// Move leading and trailing whitespace of `content` outside the delimiters
pub fn wrap_inline(content: &str, open: &str, close: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let leading = &content[..content.len() - content.trim_start().len()];
    let trailing = &content[content.trim_end().len()..];
    format!("{leading}{open}{trimmed}{close}{trailing}")
}

/// Prefix every line with `>` and close the block with a blank line.
///
/// Outside fenced code, lines are trimmed and blank runs collapse to a
/// single `>` line. Lines of fenced code are quoted verbatim.
pub fn quote_block(content: &str) -> String {
    let content = content.trim();
    if content.is_empty() {
        return String::new();
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let fenced = fence_mask(&lines);

    let mut quoted = Vec::with_capacity(lines.len());
    let mut blank_run = 0;
    for (line, in_fence) in lines.iter().zip(fenced) {
        let line = if in_fence { *line } else { line.trim() };
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 && !in_fence {
                continue;
            }
            quoted.push(">".to_string());
        } else {
            blank_run = 0;
            quoted.push(format!("> {line}"));
        }
    }

    format!("\n{}\n\n", quoted.join("\n"))
}
