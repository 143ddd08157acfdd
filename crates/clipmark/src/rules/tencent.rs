//! Tencent Docs rules.
//!
//! Tencent Docs (docs.qq.com, doc.weixin.qq.com) copies rich text in the
//! shape of a Word HTML export: lists are paragraphs carrying an
//! `mso-list: <id> level<N>` style with the generated bullet in an
//! `mso-list:Ignore` span, quotes are paragraphs with `mso-border-left-alt`,
//! emphasis is inline `span` styles, and separators are empty
//! `p.horizontal-splitline` paragraphs.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use super::common::{
    list_line, BLOCKQUOTE, BLOCK_CONTAINER, CODE_BLOCK, EMPHASIS, HEADING,
    HORIZONTAL_RULE, IGNORED, IMAGE, INLINE_CODE, LINE_BREAK, LINK, LIST, LIST_ITEM, MEDIA,
    PARAGRAPH, PREFORMATTED, STRIKETHROUGH, STRONG, SUBSCRIPT, SUPERSCRIPT, TABLE, TASK_INPUT,
};
use super::Rule;
use crate::context::ConversionContext;
use crate::node::{has_class, tag_name, text_content};
use crate::placeholder::PlaceholderKind;
use crate::style::{InlineStyle, VerticalAlign};
use crate::utilities::{clean_attribute, is_blank, is_zero_width, quote_block, wrap_inline};
use crate::Result;

/// Private-use glyph Tencent Docs emits for an unchecked checkbox
pub const CHECKBOX_GLYPH: char = '\u{F0AE}';

const CHECKBOX_GLYPHS: &[char] = &[CHECKBOX_GLYPH, '\u{2610}'];

const BULLET_GLYPHS: &[char] = &[
    '•', '●', '○', '◦', '▪', '▫', '■', '□', '◆', '◇', '➢', '➤', '►', '·', '\u{F0A7}', '\u{F0B7}',
];

/// Leading list glyph of a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Glyph {
    Bullet,
    Number(usize),
    Checkbox,
}

/// Split a leading glyph off `text`.
///
/// Numbers may carry the backslash escape added to text runs (`1\. `).
fn split_glyph(text: &str) -> Option<(Glyph, &str)> {
    static NUMBER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(\d{1,9})\\?[.)](?:\s+|$)").expect("number glyph pattern is valid")
    });

    let text = text.trim_start_matches(|c: char| c.is_whitespace() || is_zero_width(c));
    let first = text.chars().next()?;

    if CHECKBOX_GLYPHS.contains(&first) {
        return Some((Glyph::Checkbox, &text[first.len_utf8()..]));
    }
    if BULLET_GLYPHS.contains(&first) {
        return Some((Glyph::Bullet, &text[first.len_utf8()..]));
    }

    let caps = NUMBER.captures(text)?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    let whole = caps.get(0)?;
    Some((Glyph::Number(number), &text[whole.end()..]))
}

fn without_checkbox_glyphs(text: &str) -> String {
    text.chars().filter(|c| !CHECKBOX_GLYPHS.contains(c)).collect()
}

/// A drawn separator: `p.horizontal-splitline`, or an empty block with a
/// solid/dashed bottom border and no list or quote role
pub fn is_rule_container(element: &ElementRef<'_>) -> bool {
    if !matches!(element.value().name(), "p" | "div") {
        return false;
    }
    if has_class(element, "horizontal-splitline") {
        return true;
    }
    let style = InlineStyle::of(element);
    style.has_rule_border()
        && style.list_level().is_none()
        && !style.is_quote()
        && is_blank(&text_content(element))
}

/// Elements that survive empty-element elision in Tencent Docs markup
pub fn is_significant(element: &ElementRef<'_>) -> bool {
    is_rule_container(element) || matches!(element.value().name(), "td" | "th")
}

fn is_list_marker(element: &ElementRef<'_>) -> bool {
    InlineStyle::of(element).is_list_marker()
}

fn is_list_paragraph(element: &ElementRef<'_>) -> bool {
    element.value().name() == "p"
        && InlineStyle::of(element).list_level().is_some()
        && !is_rule_container(element)
}

fn is_glyph_paragraph(element: &ElementRef<'_>) -> bool {
    if element.value().name() != "p" || is_rule_container(element) {
        return false;
    }
    let style = InlineStyle::of(element);
    style.list_level().is_none() && !style.is_quote() && split_glyph(&text_content(element)).is_some()
}

fn is_quote_paragraph(element: &ElementRef<'_>) -> bool {
    if element.value().name() != "p" {
        return false;
    }
    let style = InlineStyle::of(element);
    style.is_quote() && style.list_level().is_none()
}

fn is_highlight_block(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    value.name() == "div"
        && (value.attr("data-bg-color").is_some() || value.attr("data-border-color").is_some())
}

fn is_styled_span(element: &ElementRef<'_>) -> bool {
    element.value().name() == "span" && InlineStyle::of(element).has_emphasis()
}

fn is_field_code_link(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    value.name() == "a"
        && value.attr("href").is_some()
        && value
            .attr("data-field-code")
            .map(|code| code.contains("HYPERLINK"))
            .unwrap_or(false)
}

pub const LIST_MARKER: Rule =
    Rule::when("list_marker", is_list_marker, |_, _, _| Ok(String::new())).opaque();

pub const SPLITLINE: Rule = Rule::when("splitline", is_rule_container, |_, _, context| {
    Ok(format!("\n\n{}\n\n", context.options().hr))
})
.opaque();

pub const LIST_PARAGRAPH: Rule = Rule::when("list_paragraph", is_list_paragraph, list_paragraph);

pub const GLYPH_LIST: Rule = Rule::when("glyph_list", is_glyph_paragraph, glyph_list);

pub const QUOTE_PARAGRAPH: Rule = Rule::when("quote_paragraph", is_quote_paragraph, |_, content, _| {
    Ok(quote_block(content))
});

pub const HIGHLIGHT_BLOCK: Rule =
    Rule::when("highlight_block", is_highlight_block, |_, content, _| {
        Ok(quote_block(content))
    });

pub const STYLED_SPAN: Rule = Rule::when("styled_span", is_styled_span, styled_span);

pub const FIELD_CODE_LINK: Rule =
    Rule::when("field_code_link", is_field_code_link, field_code_link).opaque();

/// Table of the Tencent Docs strategy
pub static TENCENT_RULES: &[Rule] = &[
    IGNORED,
    LIST_MARKER,
    HEADING,
    SPLITLINE,
    LIST_PARAGRAPH,
    GLYPH_LIST,
    QUOTE_PARAGRAPH,
    HIGHLIGHT_BLOCK,
    STYLED_SPAN,
    CODE_BLOCK,
    PREFORMATTED,
    INLINE_CODE,
    TABLE,
    IMAGE,
    MEDIA,
    FIELD_CODE_LINK,
    LINK,
    BLOCKQUOTE,
    LIST,
    LIST_ITEM,
    TASK_INPUT,
    PARAGRAPH,
    LINE_BREAK,
    HORIZONTAL_RULE,
    STRONG,
    EMPHASIS,
    STRIKETHROUGH,
    SUPERSCRIPT,
    SUBSCRIPT,
    BLOCK_CONTAINER,
];

fn list_paragraph(element: &ElementRef<'_>, content: &str, context: &mut ConversionContext<'_>) -> Result<String> {
    let options = context.options();
    let level = InlineStyle::of(element).list_level().unwrap_or(1);
    let indent = options.list_indent.repeat(level - 1);

    let marker_text: String = element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(is_list_marker)
        .map(|marker| text_content(&marker))
        .collect();

    // Without a marker span the glyph is typed into the text itself
    let (glyph, body) = match split_glyph(&marker_text) {
        Some((glyph, rest)) if rest.trim().is_empty() => (Some(glyph), content),
        _ if is_blank(&marker_text) => match split_glyph(content) {
            Some((glyph, rest)) => (Some(glyph), rest),
            None => (None, content),
        },
        _ => (None, content),
    };

    let is_checkbox = glyph == Some(Glyph::Checkbox)
        || marker_text.contains(CHECKBOX_GLYPHS)
        || body.contains(CHECKBOX_GLYPHS);
    let text = without_checkbox_glyphs(body);
    let text = text.trim();
    if text.is_empty() {
        return Ok(String::new());
    }

    let marker = match glyph {
        _ if is_checkbox => format!("{} [ ]", options.bullet_list_marker),
        Some(Glyph::Number(n)) => format!("{n}."),
        _ => options.bullet_list_marker.to_string(),
    };

    Ok(list_line(&indent, &marker, text))
}

fn glyph_list(element: &ElementRef<'_>, content: &str, context: &mut ConversionContext<'_>) -> Result<String> {
    let options = context.options();
    let Some((glyph, rest)) = split_glyph(content) else {
        // Predicate saw a glyph in the raw text; the rendered content lost it
        return Ok(format!("\n\n{}\n\n", content.trim()));
    };
    let text = without_checkbox_glyphs(rest);
    let text = text.trim();
    if text.is_empty() {
        return Ok(String::new());
    }

    let marker = match glyph {
        Glyph::Checkbox => format!("{} [ ]", options.bullet_list_marker),
        Glyph::Number(n) => format!("{n}."),
        Glyph::Bullet => options.bullet_list_marker.to_string(),
    };
    tracing::trace!(tag = %tag_name(element), ?glyph, "list detected from leading glyph");

    Ok(list_line("", &marker, text))
}

fn styled_span(element: &ElementRef<'_>, content: &str, context: &mut ConversionContext<'_>) -> Result<String> {
    let options = context.options();
    let style = InlineStyle::of(element);
    let mut text = content.to_string();

    match style.vertical_align() {
        Some(VerticalAlign::Super) => text = wrap_inline(&text, "<sup>", "</sup>"),
        Some(VerticalAlign::Sub) => text = wrap_inline(&text, "<sub>", "</sub>"),
        None => {}
    }
    if style.is_strikethrough() {
        text = wrap_inline(&text, &options.strike_delimiter, &options.strike_delimiter);
    }
    if style.is_italic() {
        let delimiter = options.em_delimiter.to_string();
        text = wrap_inline(&text, &delimiter, &delimiter);
    }
    if style.is_bold() {
        text = wrap_inline(&text, &options.strong_delimiter, &options.strong_delimiter);
    }

    Ok(text)
}

fn field_code_link(element: &ElementRef<'_>, _: &str, context: &mut ConversionContext<'_>) -> Result<String> {
    let href = clean_attribute(element.value().attr("href"));
    let kind = PlaceholderKind::UnrenderableLink;
    let index = context.record(kind, href.clone());
    Ok(format!("[{kind} placeholder {index}]({href})"))
}
