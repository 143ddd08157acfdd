//! # clipmark
//!
//! Convert captured clipboard HTML into Markdown.
//!
//! Conversion is rule based in the spirit of
//! [turndown](https://github.com/mixmark-io/turndown): every element is
//! matched against an ordered rule table and the first matching rule turns
//! the element (and the Markdown already produced for its children) into
//! Markdown text. Content Markdown cannot express, such as embedded images,
//! frames or media, is replaced by counted placeholders and summarised in a
//! footer.
//!
//! ## Design
//!
//! - **Strategies**: a generic rule set handles any page; origin-specific
//!   rule sets (currently Tencent Docs) encode the markup conventions of one
//!   document platform.
//! - **Registry**: picks the strategy for a source URL, falling back to the
//!   generic one.
//! - **Fresh context**: placeholder counters live in a context created for
//!   each call, so independent conversions never share numbering.
//!
//! ## Example
//!
//! ```rust
//! let markdown = clipmark::convert_html("<h1>Hello World</h1>", "https://example.com").unwrap();
//! assert_eq!(markdown, "# Hello World");
//! ```
//!
//! ## Example (selecting a strategy)
//!
//! ```rust
//! use clipmark::{registry, Converter};
//!
//! let converter = registry().select("https://docs.qq.com/doc/abc");
//! assert_eq!(converter.name(), "tencent");
//!
//! let html = r#"<p style="mso-list:l0 level1"><span style="mso-list:Ignore">●</span>Item</p>"#;
//! assert_eq!(converter.convert(html, "https://docs.qq.com/doc/abc").unwrap(), "- Item");
//! ```

mod context;
mod engine;
pub mod html;
pub mod normalize;
mod node;
mod options;
pub mod placeholder;
mod registry;
mod rules;
mod strategy;
pub mod style;
mod utilities;

pub use context::ConversionContext;
pub use engine::RuleEngine;
pub use normalize::normalize;
pub use options::MarkdownOptions;
pub use placeholder::{build_footer, PlaceholderKind, PlaceholderRecord};
pub use registry::{install, registry, Registry};
pub use rules::{generic_rules, tencent_rules, Filter, Rule, Rules, Transform};
pub use strategy::{Converter, Origin, RuleConverter, Strategy};

/// Error type for conversion operations
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rule `{rule}` failed: {message}")]
    Rule { rule: &'static str, message: String },

    #[error("Invalid converter: {0}")]
    InvalidConverter(String),
}

impl ConvertError {
    /// Build a rule failure for the named rule
    pub fn rule(rule: &'static str, message: impl Into<String>) -> Self {
        ConvertError::Rule {
            rule,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Convert `html` captured from `source_url` using the process-wide registry.
///
/// The conversion itself never suspends; the function is `async` so it can
/// sit next to the capture and storage calls of its callers.
pub async fn convert(html: &str, source_url: &str) -> Result<String> {
    convert_html(html, source_url)
}

/// Synchronous twin of [`convert`].
pub fn convert_html(html: &str, source_url: &str) -> Result<String> {
    registry().select(source_url).convert(html, source_url)
}
