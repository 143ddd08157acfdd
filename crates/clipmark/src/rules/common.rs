//! Shared rule vocabulary.
//!
//! Origin-agnostic rules every strategy builds on, plus the generic
//! strategy's table. Rules are `const` so origin-specific tables can list
//! them next to their own.

use scraper::ElementRef;

use super::Rule;
use crate::context::ConversionContext;
use crate::node::{
    ancestor_count, descendants_with, element_children, find_descendant, parent_tag,
    outer_html_keeping, preformatted_text, tag_name, text_content,
};
use crate::placeholder::{PlaceholderKind, PlaceholderRecord};
use crate::utilities::{clean_attribute, collapse_whitespace, is_block, quote_block, wrap_inline};
use crate::{ConvertError, Result};

/// Attributes carrying a code block's language
const LANGUAGE_ATTRIBUTES: &[&str] = &["data-tco-code-type", "data-language", "data-lang"];

/// Attributes kept on complex tables
const SPAN_ATTRIBUTES: &[&str] = &["colspan", "rowspan"];

const MEDIA_TAGS: &[&str] = &["svg", "iframe", "video", "audio", "canvas", "object", "embed"];

pub const IGNORED: Rule = Rule::for_tags(
    "ignored",
    &["script", "style", "noscript", "template", "head", "title", "meta", "link"],
    |_, _, _| Ok(String::new()),
)
.opaque();

pub const HEADING: Rule = Rule::for_tags("heading", &["h1", "h2", "h3", "h4", "h5", "h6"], heading);

pub const CODE_BLOCK: Rule = Rule::when("code_block", is_code_block, code_block).opaque();

pub const PREFORMATTED: Rule = Rule::for_tag("preformatted", "pre", preformatted).opaque();

pub const INLINE_CODE: Rule = Rule::when("inline_code", is_inline_code, inline_code).opaque();

pub const TABLE: Rule = Rule::for_tag("table", "table", table).opaque();

pub const IMAGE: Rule = Rule::for_tag("image", "img", image).opaque();

pub const MEDIA: Rule = Rule::for_tags("media", MEDIA_TAGS, media).opaque();

pub const LINK: Rule = Rule::when("link", is_link, link);

pub const BLOCKQUOTE: Rule = Rule::for_tag("blockquote", "blockquote", |_, content, _| {
    Ok(quote_block(content))
});

pub const LIST: Rule = Rule::for_tags("list", &["ul", "ol"], list);

pub const LIST_ITEM: Rule = Rule::for_tag("list_item", "li", list_item);

pub const TASK_INPUT: Rule = Rule::for_tag("task_input", "input", task_input).opaque();

pub const PARAGRAPH: Rule = Rule::for_tag("paragraph", "p", |_, content, _| {
    let content = content.trim();
    if content.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("\n\n{content}\n\n"))
});

pub const LINE_BREAK: Rule = Rule::for_tag("line_break", "br", |_, _, _| Ok("  \n".to_string()));

pub const HORIZONTAL_RULE: Rule = Rule::for_tag("horizontal_rule", "hr", |_, _, context| {
    Ok(format!("\n\n{}\n\n", context.options().hr))
});

pub const STRONG: Rule = Rule::for_tags("strong", &["strong", "b"], |_, content, context| {
    let delimiter = &context.options().strong_delimiter;
    Ok(wrap_inline(content, delimiter, delimiter))
});

pub const EMPHASIS: Rule = Rule::for_tags("emphasis", &["em", "i"], |_, content, context| {
    let delimiter = context.options().em_delimiter.to_string();
    Ok(wrap_inline(content, &delimiter, &delimiter))
});

pub const STRIKETHROUGH: Rule =
    Rule::for_tags("strikethrough", &["del", "s", "strike"], |_, content, context| {
        let delimiter = &context.options().strike_delimiter;
        Ok(wrap_inline(content, delimiter, delimiter))
    });

pub const SUPERSCRIPT: Rule = Rule::for_tag("superscript", "sup", |_, content, _| {
    Ok(wrap_inline(content, "<sup>", "</sup>"))
});

pub const SUBSCRIPT: Rule = Rule::for_tag("subscript", "sub", |_, content, _| {
    Ok(wrap_inline(content, "<sub>", "</sub>"))
});

pub const BLOCK_CONTAINER: Rule = Rule::when(
    "block_container",
    |element| is_block(element.value().name()),
    |_, content, _| {
        let content = content.trim_matches('\n');
        if content.trim().is_empty() {
            return Ok(String::new());
        }
        Ok(format!("\n\n{content}\n\n"))
    },
);

/// Table of the generic strategy
pub static GENERIC_RULES: &[Rule] = &[
    IGNORED,
    HEADING,
    CODE_BLOCK,
    PREFORMATTED,
    INLINE_CODE,
    TABLE,
    IMAGE,
    MEDIA,
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

fn heading(element: &ElementRef<'_>, content: &str, _: &mut ConversionContext<'_>) -> Result<String> {
    let tag = tag_name(element);
    let level: usize = tag
        .get(1..)
        .and_then(|digits| digits.parse().ok())
        .filter(|level| (1..=6).contains(level))
        .ok_or_else(|| ConvertError::rule("heading", format!("unexpected heading tag <{tag}>")))?;

    let content = collapse_whitespace(content);
    let content = content.trim();
    if content.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("\n\n{} {}\n\n", "#".repeat(level), content))
}

fn is_code_block(element: &ElementRef<'_>) -> bool {
    element.value().name() == "pre" && find_descendant(element, "code").is_some()
}

/// Language hint from a dedicated attribute or a `language-*` class token
pub(crate) fn code_language(element: &ElementRef<'_>) -> Option<String> {
    let value = element.value();
    LANGUAGE_ATTRIBUTES
        .iter()
        .find_map(|attr| value.attr(attr))
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .or_else(|| {
            value.attr("class").and_then(|class| {
                class
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
                    .filter(|lang| !lang.is_empty())
                    .map(str::to_string)
            })
        })
}

/// Fence long enough not to be closed by backtick runs inside the code
fn fence_for(code: &str, fence: &str) -> String {
    let fence_char = fence.chars().next().unwrap_or('`');
    let longest_run = code
        .chars()
        .fold((0, 0), |(max, current), c| {
            if c == fence_char {
                (max.max(current + 1), current + 1)
            } else {
                (max, 0)
            }
        })
        .0;

    if longest_run >= fence.chars().count() {
        fence_char.to_string().repeat(longest_run + 1)
    } else {
        fence.to_string()
    }
}

fn fenced(code: &str, language: &str, context: &ConversionContext<'_>) -> String {
    // Markup usually ends the code with a newline the fence already supplies
    let code = code.strip_suffix('\n').unwrap_or(code);
    let fence = fence_for(code, &context.options().fence);
    // An info string holding fence characters would not open the fence
    let language: String = language
        .chars()
        .filter(|c| !matches!(c, '`' | '~') && !c.is_whitespace())
        .collect();
    format!("\n{fence}{language}\n{code}\n{fence}\n\n")
}

fn code_block(element: &ElementRef<'_>, _: &str, context: &mut ConversionContext<'_>) -> Result<String> {
    let code = find_descendant(element, "code")
        .ok_or_else(|| ConvertError::rule("code_block", "<pre> has no <code> descendant"))?;

    let language = code_language(&code)
        .or_else(|| code_language(element))
        .unwrap_or_default();

    Ok(fenced(&preformatted_text(&code), &language, context))
}

fn preformatted(element: &ElementRef<'_>, _: &str, context: &mut ConversionContext<'_>) -> Result<String> {
    let text = preformatted_text(element);
    if text.trim().is_empty() {
        return Ok(String::new());
    }
    let language = code_language(element).unwrap_or_default();
    Ok(fenced(&text, &language, context))
}

fn is_inline_code(element: &ElementRef<'_>) -> bool {
    element.value().name() == "code" && parent_tag(element).map(|t| t != "pre").unwrap_or(true)
}

fn inline_code(element: &ElementRef<'_>, _: &str, _: &mut ConversionContext<'_>) -> Result<String> {
    let content = text_content(element);
    if content.is_empty() {
        return Ok(String::new());
    }

    let max_consecutive_backticks = content
        .chars()
        .fold((0, 0), |(max, current), c| {
            if c == '`' {
                (max.max(current + 1), current + 1)
            } else {
                (max, 0)
            }
        })
        .0;

    let backticks = "`".repeat(max_consecutive_backticks + 1);

    let needs_space = content.starts_with('`') || content.ends_with('`');
    if needs_space {
        Ok(format!("{backticks} {content} {backticks}"))
    } else {
        Ok(format!("{backticks}{content}{backticks}"))
    }
}

/// Leading digits of a span attribute, the way browsers read `rowspan="2x"`
fn span_value(element: &ElementRef<'_>, attr: &str) -> u32 {
    element
        .value()
        .attr(attr)
        .map(|value| {
            value
                .trim()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(1)
}

/// A table with at least one merged cell
pub(crate) fn is_complex_table(table: &ElementRef<'_>) -> bool {
    descendants_with(table, &["td", "th"])
        .any(|cell| span_value(&cell, "colspan") > 1 || span_value(&cell, "rowspan") > 1)
}

/// Rows owned by `table` itself, skipping rows of nested tables
fn table_rows<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let table_id = table.id();
    descendants_with(table, &["tr"])
        .filter(|row| {
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == "table")
                .map(|owner| owner.id() == table_id)
                .unwrap_or(false)
        })
        .collect()
}

fn table(element: &ElementRef<'_>, _: &str, _: &mut ConversionContext<'_>) -> Result<String> {
    if is_complex_table(element) {
        return Ok(format!("\n\n{}\n\n", outer_html_keeping(element, SPAN_ATTRIBUTES)));
    }

    let rows: Vec<Vec<String>> = table_rows(element)
        .iter()
        .map(|row| {
            element_children(row)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(|cell| collapse_whitespace(&text_content(&cell)).trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    let Some((header, body)) = rows.split_first() else {
        return Ok(String::new());
    };

    let mut markdown = String::from("\n\n");
    markdown.push_str(&format!("| {} |\n", header.join(" | ")));
    markdown.push_str(&format!("| {} |\n", vec!["---"; header.len()].join(" | ")));
    for row in body {
        markdown.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    markdown.push('\n');

    Ok(markdown)
}

/// `data:` URIs and inline SVG markup cannot be linked from Markdown
fn is_embedded_source(src: &str) -> bool {
    let src = src.trim_start();
    src.get(..5).map(|p| p.eq_ignore_ascii_case("data:")).unwrap_or(false) || src.starts_with("<svg")
}

fn image(element: &ElementRef<'_>, _: &str, context: &mut ConversionContext<'_>) -> Result<String> {
    let src = clean_attribute(element.value().attr("src"));
    let alt = clean_attribute(element.value().attr("alt"));

    if src.is_empty() {
        return Ok(String::new());
    }

    if is_embedded_source(&src) {
        let description = if alt.is_empty() {
            context.options().unnamed_image.clone()
        } else {
            alt
        };
        return Ok(placeholder(context, PlaceholderKind::Image, description));
    }

    Ok(format!("![{alt}]({src})"))
}

/// Record a placeholder and return its stand-in line
pub(crate) fn placeholder(
    context: &mut ConversionContext<'_>,
    kind: PlaceholderKind,
    description: String,
) -> String {
    let index = context.record(kind, description.clone());
    PlaceholderRecord {
        kind,
        index,
        description,
    }
    .line()
}

fn media(element: &ElementRef<'_>, _: &str, context: &mut ConversionContext<'_>) -> Result<String> {
    let tag = tag_name(element);
    let kind = match tag.as_str() {
        "svg" => PlaceholderKind::Svg,
        "iframe" => PlaceholderKind::Iframe,
        "video" => PlaceholderKind::Video,
        "audio" => PlaceholderKind::Audio,
        "canvas" => PlaceholderKind::Canvas,
        _ => PlaceholderKind::UnknownElement,
    };

    let value = element.value();
    let source = ["src", "data"]
        .iter()
        .find_map(|attr| value.attr(attr))
        .map(str::to_string)
        .or_else(|| {
            find_descendant(element, "source").and_then(|s| s.value().attr("src").map(str::to_string))
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !is_embedded_source(s));

    let title = ["title", "aria-label"]
        .iter()
        .find_map(|attr| value.attr(attr))
        .map(|t| t.trim().to_string())
        .or_else(|| find_descendant(element, "title").map(|t| text_content(&t).trim().to_string()))
        .filter(|t| !t.is_empty());

    let description = match (title, source) {
        (Some(title), Some(source)) => format!("{title} ({source})"),
        (Some(title), None) => title,
        (None, Some(source)) => source,
        (None, None) => format!("<{tag}> element"),
    };

    Ok(placeholder(context, kind, description))
}

fn is_link(element: &ElementRef<'_>) -> bool {
    element.value().name() == "a" && element.value().attr("href").is_some()
}

fn link(element: &ElementRef<'_>, content: &str, _: &mut ConversionContext<'_>) -> Result<String> {
    let href = clean_attribute(element.value().attr("href"));
    let title = element.value().attr("title").map(str::trim).filter(|t| !t.is_empty());

    if href.is_empty() || href.to_lowercase().starts_with("javascript:") {
        return Ok(content.to_string());
    }

    let text = content.trim();
    let text = if text.is_empty() { href.as_str() } else { text };
    let title_part = title
        .map(|t| format!(" \"{}\"", t.replace('"', "\\\"")))
        .unwrap_or_default();

    Ok(format!("[{text}]({href}{title_part})"))
}

fn list(element: &ElementRef<'_>, content: &str, _: &mut ConversionContext<'_>) -> Result<String> {
    let content = content.trim_matches('\n');
    if content.trim().is_empty() {
        return Ok(String::new());
    }

    // Nested lists sit directly under their item's first line
    if parent_tag(element).as_deref() == Some("li") {
        Ok(format!("\n{content}\n"))
    } else {
        Ok(format!("\n\n{content}\n\n"))
    }
}

/// Render one list line: indentation, marker, text and indented continuations
pub(crate) fn list_line(indent: &str, marker: &str, text: &str) -> String {
    let continuation = format!("{indent}{}", " ".repeat(marker.chars().count() + 1));
    let mut lines = text.split('\n');
    let mut out = format!("{indent}{marker} {}", lines.next().unwrap_or_default());
    for line in lines {
        out.push('\n');
        if !line.is_empty() && !line.starts_with(' ') {
            out.push_str(&continuation);
        }
        out.push_str(line);
    }
    out.push('\n');
    out
}

fn list_item(element: &ElementRef<'_>, content: &str, context: &mut ConversionContext<'_>) -> Result<String> {
    let options = context.options();
    let depth = ancestor_count(element, &["ul", "ol"]).max(1);
    let indent = options.list_indent.repeat(depth - 1);

    let parent = element.parent().and_then(ElementRef::wrap);
    let marker = match parent.filter(|p| p.value().name() == "ol") {
        Some(ol) => {
            let start: u64 = ol
                .value()
                .attr("start")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1);
            let position = element
                .prev_siblings()
                .filter_map(ElementRef::wrap)
                .filter(|e| e.value().name() == "li")
                .count();
            format!("{}.", start.saturating_add(position as u64))
        }
        None => options.bullet_list_marker.to_string(),
    };

    Ok(list_line(&indent, &marker, content.trim()))
}

fn task_input(element: &ElementRef<'_>, _: &str, _: &mut ConversionContext<'_>) -> Result<String> {
    let value = element.value();
    let is_checkbox = value
        .attr("type")
        .map(|t| t.eq_ignore_ascii_case("checkbox"))
        .unwrap_or(false);
    if !is_checkbox {
        return Ok(String::new());
    }
    Ok(if value.attr("checked").is_some() { "[x] " } else { "[ ] " }.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::generic_rules;
    use crate::{MarkdownOptions, RuleEngine};

    fn convert(html: &str) -> String {
        let options = MarkdownOptions::default();
        let mut context = ConversionContext::new("https://example.com", &options);
        let markdown = RuleEngine::new(generic_rules())
            .render_html(html, &mut context)
            .unwrap();
        crate::normalize(&markdown)
    }

    #[test]
    fn test_generic_rule_order() {
        let rules = generic_rules();
        assert_eq!(rules.names().first(), Some(&"ignored"));
        assert_eq!(rules.names().last(), Some(&"block_container"));
        assert!(rules.priority("code_block") < rules.priority("preformatted"));
        assert!(rules.priority("inline_code") < rules.priority("block_container"));
        assert!(rules.priority("link") < rules.priority("paragraph"));
    }

    #[test]
    fn test_headings() {
        assert_eq!(convert("<h1>Title</h1>"), "# Title");
        assert_eq!(convert("<h3> Sub <em>title</em> </h3>"), "### Sub *title*");
        assert_eq!(convert("<p>a</p><h2>B</h2><p>c</p>"), "a\n\n## B\n\nc");
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(convert("<p>a <strong>bold </strong>b</p>"), "a **bold** b");
        assert_eq!(convert("<p><em>it</em> <del>gone</del> x<sup>2</sup></p>"), "*it* ~~gone~~ x<sup>2</sup>");
        assert_eq!(convert("<p>use <code>a`b</code></p>"), "use ``a`b``");
    }

    #[test]
    fn test_code_block_preserves_newlines() {
        assert_eq!(
            convert("<pre><code>line 1\nline 2</code></pre>"),
            "```\nline 1\nline 2\n```"
        );
        assert_eq!(
            convert("<pre><code class=\"language-rust\">fn a() {}\n\n\n\nfn b() {}\n</code></pre>"),
            "```rust\nfn a() {}\n\n\n\nfn b() {}\n```"
        );
        assert_eq!(
            convert("<pre><code data-tco-code-type=\"js\">a<br>b</code></pre>"),
            "```js\na\nb\n```"
        );
    }

    #[test]
    fn test_fence_grows_past_backticks() {
        assert_eq!(
            convert("<pre><code>```\nx\n```</code></pre>"),
            "````\n```\nx\n```\n````"
        );
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(convert(r#"<a href="https://e.com">Link</a>"#), "[Link](https://e.com)");
        assert_eq!(convert(r#"<a href="https://e.com"></a>x"#), "x");
        assert_eq!(convert(r#"<img src="a.png" alt="Alt">"#), "![Alt](a.png)");
    }

    #[test]
    fn test_lists() {
        assert_eq!(convert("<ul><li>One</li><li>Two</li></ul>"), "- One\n- Two");
        assert_eq!(convert(r#"<ol start="3"><li>C</li><li>D</li></ol>"#), "3. C\n4. D");
        assert_eq!(
            convert("<ul><li>A<ul><li>B</li></ul></li><li>C</li></ul>"),
            "- A\n  - B\n- C"
        );
        assert_eq!(
            convert(r#"<ul><li><input type="checkbox" checked>done</li><li><input type="checkbox">todo</li></ul>"#),
            "- [x] done\n- [ ] todo"
        );
    }

    #[test]
    fn test_huge_list_start_saturates() {
        assert_eq!(
            convert(r#"<ol start="18446744073709551615"><li>a</li><li>b</li></ol>"#),
            "18446744073709551615. a\n18446744073709551615. b"
        );
        assert_eq!(convert(r#"<ol start="99999999999999999999"><li>a</li></ol>"#), "1. a");
    }

    #[test]
    fn test_language_cannot_break_fence() {
        assert_eq!(
            convert("<pre><code data-lang=\"a`b ~c\">x</code></pre>"),
            "```abc\nx\n```"
        );
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            convert("<blockquote><p>a</p><p>b</p></blockquote>"),
            "> a\n>\n> b"
        );
    }

    #[test]
    fn test_simple_table() {
        let html = "<table><tr><th> Name </th><th>Age</th></tr><tr><td>Ann</td><td>3</td></tr></table>";
        assert_eq!(convert(html), "| Name | Age |\n| --- | --- |\n| Ann | 3 |");
    }

    #[test]
    fn test_complex_table_keeps_only_spans() {
        let html = r#"<table style="w"><tr><td rowspan="2" class="c">a</td><td>b</td></tr><tr><td id="x">c</td></tr></table>"#;
        assert_eq!(
            convert(html),
            r#"<table><tbody><tr><td rowspan="2">a</td><td>b</td></tr><tr><td>c</td></tr></tbody></table>"#
        );
    }

    #[test]
    fn test_span_value_reads_leading_digits() {
        let html = scraper::Html::parse_fragment(r#"<table><tr><td colspan="2x">a</td></tr></table>"#);
        let table = find_descendant(&html.root_element(), "table").unwrap();
        assert!(is_complex_table(&table));
    }

    #[test]
    fn test_media_placeholders() {
        assert_eq!(
            convert(r#"<iframe src="https://v.com/e"></iframe>"#),
            "[Iframe placeholder 1: https://v.com/e]"
        );
        assert_eq!(
            convert(r#"<video><source src="m.mp4"></video><audio title="Talk"></audio>"#),
            "[Video placeholder 1: m.mp4][Audio placeholder 1: Talk]"
        );
    }

    #[test]
    fn test_data_image_placeholder() {
        assert_eq!(
            convert(r#"<img src="data:image/png;base64,AAAA">"#),
            "[Image placeholder 1: unnamed image]"
        );
        assert_eq!(
            convert(r#"<img src="data:image/png;base64,AAAA" alt="chart"><img src="data:," alt="b">"#),
            "[Image placeholder 1: chart][Image placeholder 2: b]"
        );
    }

    #[test]
    fn test_list_line_indents_continuations() {
        assert_eq!(list_line("", "-", "a\n\nb"), "- a\n\n  b\n");
        assert_eq!(list_line("  ", "1.", "a\n  - nested"), "  1. a\n  - nested\n");
    }
}
