//! Inline `style` attribute decoding.
//!
//! Word-processor exports (Tencent Docs included) encode most semantics in
//! inline styles: emphasis in `font-weight`, list membership in `mso-list`,
//! quotes in `mso-border-left-alt`. [`InlineStyle`] turns the attribute into
//! a property map and answers the questions the rules ask.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

/// Deepest list nesting rendered; deeper `mso-list` levels are clamped
pub const MAX_LIST_LEVEL: usize = 9;

/// Vertical alignment carried by a span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Super,
    Sub,
}

/// Decoded inline style, property names lowercased, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    properties: IndexMap<String, String>,
}

impl InlineStyle {
    /// Parse a `style` attribute value. Later declarations win.
    pub fn parse(style: &str) -> Self {
        let properties = style
            .split(';')
            .filter_map(|declaration| declaration.split_once(':'))
            .map(|(name, value)| (name.trim().to_lowercase(), value.trim().to_string()))
            .filter(|(name, _)| !name.is_empty())
            .collect();
        Self { properties }
    }

    /// Decode the `style` attribute of an element
    pub fn of(element: &ElementRef<'_>) -> Self {
        element
            .value()
            .attr("style")
            .map(Self::parse)
            .unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    fn value_lowercase(&self, name: &str) -> String {
        self.get(name).map(str::to_lowercase).unwrap_or_default()
    }

    pub fn is_bold(&self) -> bool {
        matches!(
            self.value_lowercase("font-weight").as_str(),
            "bold" | "bolder" | "700"
        )
    }

    pub fn is_italic(&self) -> bool {
        self.value_lowercase("font-style") == "italic"
    }

    pub fn is_strikethrough(&self) -> bool {
        self.value_lowercase("text-decoration").contains("line-through")
            || self
                .value_lowercase("text-decoration-line")
                .contains("line-through")
    }

    pub fn vertical_align(&self) -> Option<VerticalAlign> {
        match self.value_lowercase("vertical-align").as_str() {
            "super" => Some(VerticalAlign::Super),
            "sub" => Some(VerticalAlign::Sub),
            _ => None,
        }
    }

    /// Any of the emphasis properties the inline rule renders
    pub fn has_emphasis(&self) -> bool {
        self.is_bold() || self.is_italic() || self.is_strikethrough() || self.vertical_align().is_some()
    }

    /// `mso-list: <id> level<N>` list marker, returning the level
    pub fn list_level(&self) -> Option<usize> {
        static LEVEL: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(?i)level(\d+)").expect("level pattern is valid"));

        let value = self.get("mso-list")?;
        let digits = LEVEL.captures(value)?.get(1)?.as_str();
        // Digits too long for usize are still a (very deep) level
        let level = digits.parse::<usize>().unwrap_or(MAX_LIST_LEVEL);
        Some(level.clamp(1, MAX_LIST_LEVEL))
    }

    /// `mso-list: Ignore` marks the generated bullet of a list paragraph
    pub fn is_list_marker(&self) -> bool {
        self.value_lowercase("mso-list").contains("ignore")
    }

    /// Left border used by word processors to draw block quotes
    pub fn is_quote(&self) -> bool {
        self.has("mso-border-left-alt")
    }

    /// Solid or dashed bottom border, the shape of a drawn separator line
    pub fn has_rule_border(&self) -> bool {
        let shorthand = self.value_lowercase("border-bottom");
        let style = self.value_lowercase("border-bottom-style");
        [shorthand, style]
            .iter()
            .any(|value| value.contains("solid") || value.contains("dashed"))
    }
}
