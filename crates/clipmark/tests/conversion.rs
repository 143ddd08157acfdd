use std::sync::Arc;

use clipmark::{convert, convert_html, normalize, registry, Converter, Origin, Registry, RuleConverter};
use proptest::prelude::*;

const DOCS_URL: &str = "https://docs.qq.com/doc/abc";
const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

fn generic(html: &str) -> String {
    RuleConverter::generic().convert(html, "https://example.com/x").unwrap()
}

fn tencent(html: &str) -> String {
    RuleConverter::tencent().convert(html, DOCS_URL).unwrap()
}

#[test]
fn selects_by_source_url() {
    assert_eq!(registry().select(DOCS_URL).name(), "tencent");
    assert_eq!(registry().select("https://example.com/x").name(), "generic");
}

#[test]
fn counters_do_not_leak_between_calls() {
    let html = format!(r#"<p>shot</p><img src="{PNG}" alt="chart">"#);
    let converter = RuleConverter::generic();

    let first = converter.convert(&html, "").unwrap();
    let second = converter.convert(&html, "").unwrap();
    assert!(first.contains("[Image placeholder 1: chart]"));
    assert_eq!(first, second);

    let via_registry = convert_html(&html, "https://example.com").unwrap();
    assert!(via_registry.contains("[Image placeholder 1: chart]"));
    assert!(!via_registry.contains("placeholder 2"));
}

#[test]
fn indices_are_dense_per_kind() {
    let html = format!(
        r#"<img src="{PNG}"><iframe src="https://a.example"></iframe><img src="{PNG}" alt="b"><video src="v.mp4"></video>"#
    );
    let markdown = generic(&html);
    assert!(markdown.contains("[Image placeholder 1: unnamed image]"));
    assert!(markdown.contains("[Image placeholder 2: b]"));
    assert!(markdown.contains("[Iframe placeholder 1: https://a.example]"));
    assert!(markdown.contains("[Video placeholder 1: v.mp4]"));
    assert!(markdown.contains("- Images: 2\n- Embedded frames: 2\n- Other: 0"));
}

#[test]
fn simple_table_separator_matches_header() {
    let html = "<table><thead><tr><th>A</th><th>B</th><th>C</th></tr></thead>\
                <tbody><tr><td>1</td><td></td><td>3</td></tr></tbody></table>";
    let markdown = generic(html);
    let lines: Vec<&str> = markdown.lines().collect();
    assert_eq!(lines[0], "| A | B | C |");
    assert_eq!(lines[1], "| --- | --- | --- |");
    assert_eq!(lines[1].matches("---").count(), lines[0].matches(" | ").count() + 1);
    assert_eq!(lines.len(), 3);
}

#[test]
fn complex_table_keeps_only_span_attributes() {
    let html = r#"<table class="grid" style="width:100%" border="1"><tbody>
        <tr><td rowspan="2" class="c" data-x="1">merged</td><td style="color:red"><span id="s">b</span></td></tr>
        <tr><td colspan="1">c</td></tr></tbody></table>"#;
    let markdown = generic(html);

    assert!(markdown.starts_with("<table>"));
    assert!(markdown.contains(r#"<td rowspan="2">merged</td>"#));
    assert!(markdown.contains(r#"<td colspan="1">c</td>"#));
    for attribute in ["class=", "style=", "border=", "data-x=", "id="] {
        assert!(!markdown.contains(attribute), "{attribute} survived in {markdown}");
    }
}

#[test]
fn footer_only_with_placeholders() {
    let plain = generic("<h2>Title</h2><p>Body <a href=\"https://e.com\">link</a></p>");
    assert!(!plain.contains("Placeholder notes"));
    assert_eq!(plain, "## Title\n\nBody [link](https://e.com)");

    let with_image = generic(&format!(r#"<p>Body</p><img src="{PNG}">"#));
    assert!(with_image.contains("\n\n---\n\n**Placeholder notes:**"));
    assert!(with_image.contains("`<kind> placeholder <index>`"));
}

#[test]
fn tencent_list_item() {
    let html = r#"<p style="mso-list:l0 level1"><span style="mso-list:Ignore">●</span>Item</p>"#;
    assert_eq!(tencent(html), "- Item");
}

#[test]
fn tencent_checkbox_item() {
    let html = "<p style=\"mso-list:l1 level1\"><span style=\"mso-list:Ignore\">\u{F0AE}</span>Ship release</p>";
    assert_eq!(tencent(html), "- [ ] Ship release");
}

#[test]
fn code_block_keeps_newlines() {
    let markdown = generic("<pre><code>line 1\nline 2</code></pre>");
    assert_eq!(markdown, "```\nline 1\nline 2\n```");

    let spaced = generic("<pre><code class=\"language-rust\">fn a() {}\n\n\n\nfn b() {}</code></pre>");
    assert_eq!(spaced, "```rust\nfn a() {}\n\n\n\nfn b() {}\n```");
}

#[test]
fn tencent_document_end_to_end() {
    let html = concat!(
        r#"<div class="document"><div class="section">"#,
        r#"<h1>Weekly</h1>"#,
        r#"<p style="mso-list:l0 level1"><span style="mso-list:Ignore">1.</span>Plan</p>"#,
        r#"<p style="mso-list:l0 level2"><span style="mso-list:Ignore">●</span><span style="font-weight:bold">Draft</span> notes</p>"#,
        r#"<p class="horizontal-splitline"></p>"#,
        r#"<p style="mso-border-left-alt:solid #ddd 3pt">Remember</p>"#,
        r#"<pre><code data-tco-code-type="bash">make all</code></pre>"#,
        r#"</div></div>"#,
    );
    assert_eq!(
        tencent(html),
        "# Weekly\n\n1. Plan\n  - **Draft** notes\n\n---\n\n> Remember\n\n```bash\nmake all\n```"
    );
}

#[test]
fn injected_converter_wins_for_its_domain() {
    struct Wiki;
    impl Converter for Wiki {
        fn name(&self) -> &str {
            "wiki"
        }
        fn supports(&self, url: &str) -> bool {
            url.starts_with("https://wiki.example/")
        }
        fn convert(&self, html: &str, _: &str) -> clipmark::Result<String> {
            Ok(format!("wiki:{}", html.len()))
        }
    }

    let mut registry = Registry::with_builtin();
    registry.register(Arc::new(Wiki)).unwrap();
    registry
        .register(Arc::new(RuleConverter::new(clipmark::Strategy::Origin(Origin::TencentDocs))))
        .unwrap();

    assert_eq!(registry.select("https://wiki.example/page").name(), "wiki");
    assert_eq!(registry.select(DOCS_URL).name(), "tencent");
    assert_eq!(
        registry.select("https://wiki.example/page").convert("<p>x</p>", "").unwrap(),
        "wiki:8"
    );
}

#[test]
fn async_entry_matches_sync() {
    let html = "<h1>Hello World</h1><p>text</p>";
    let async_output = futures::executor::block_on(convert(html, "https://example.com")).unwrap();
    assert_eq!(async_output, convert_html(html, "https://example.com").unwrap());
}

#[test]
fn pathological_numbers_do_not_panic() {
    let deep = tencent(r#"<p style="mso-list:l0 level18446744073709551615">x</p>"#);
    assert_eq!(deep, "- x");

    let start = generic(r#"<ol start="18446744073709551615"><li>a</li><li>b</li></ol>"#);
    assert_eq!(start, "18446744073709551615. a\n18446744073709551615. b");
}

#[test]
fn inline_fence_lookalikes_still_compact() {
    let tail = "<div><div><p>a</p></div></div><div><p>b</p></div>";
    assert_eq!(generic(&format!("<p><s><s>x</s></s></p>{tail}")), "~~~~x~~~~\n\na\n\nb");
    assert_eq!(generic(&format!("<p><code>``x</code></p>{tail}")), "``` ``x ```\n\na\n\nb");
}

#[test]
fn quoted_code_keeps_its_lines() {
    let html = "<div data-bg-color=\"#fff\"><pre><code>a\n\n\n\nb\n    indented</code></pre></div>";
    assert_eq!(tencent(html), "> ```\n> a\n>\n>\n>\n> b\n>     indented\n> ```");

    let html = "<blockquote><pre><code>x\n\n\ny</code></pre></blockquote>";
    assert_eq!(generic(html), "> ```\n> x\n>\n>\n> y\n> ```");
}

/// Lines outside code fences never hold more than one blank line in a row
fn has_blank_run_outside_code(markdown: &str) -> bool {
    let mut in_code = false;
    let mut blank_run = 0;
    for line in markdown.lines() {
        if line == "```" || line == "```rust" {
            in_code = !in_code;
            blank_run = 0;
            continue;
        }
        if in_code {
            continue;
        }
        blank_run = if line.is_empty() { blank_run + 1 } else { 0 };
        if blank_run > 1 {
            return true;
        }
    }
    false
}

fn block() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_flat_map(|word| {
        prop::sample::select(vec![
            format!("<p>{word}</p>"),
            format!("<div><div><p>{word}</p></div></div>"),
            format!("<p><s><s>{word}</s></s></p>"),
            format!("<p><code>``{word}</code></p>"),
            format!("<pre><code class=\"language-rust\">{word}\n\n\n{word}</code></pre>"),
            format!("<blockquote><p>{word}</p><p>{word}</p></blockquote>"),
            format!("<ul><li>{word}<ul><li>{word}</li></ul></li></ul>"),
            format!("<h3>{word}</h3><hr>"),
        ])
    })
}

fn fragment() -> impl Strategy<Value = String> {
    let word = "[a-zA-Z0-9]{1,12}";
    let tag = prop::sample::select(vec![
        "p", "div", "span", "h2", "b", "em", "li", "blockquote", "section",
    ]);
    prop::collection::vec((tag, word), 1..8).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(tag, word)| format!("<{tag}>{word}</{tag}>"))
            .collect::<String>()
    })
}

proptest! {
    #[test]
    fn normalize_is_idempotent(input in "(\n|\r| |a|`|~|-|#){0,64}") {
        let once = normalize(&input);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_on_any_text(input in "\\PC{0,128}") {
        let once = normalize(&input);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn no_blank_runs_outside_code(blocks in prop::collection::vec(block(), 1..10)) {
        let markdown = generic(&blocks.concat());
        prop_assert!(!has_blank_run_outside_code(&markdown), "{:?}", markdown);
    }

    #[test]
    fn generic_output_is_not_empty(html in fragment()) {
        let markdown = generic(&html);
        prop_assert!(!markdown.trim().is_empty());
    }
}
