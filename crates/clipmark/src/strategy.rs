//! Conversion strategies.
//!
//! A strategy bundles one rule table with the source URLs it claims.

use scraper::ElementRef;

use crate::context::ConversionContext;
use crate::engine::{is_table_cell, RuleEngine};
use crate::html::{extract_document_sections, sanitize};
use crate::normalize::normalize;
use crate::options::MarkdownOptions;
use crate::placeholder::build_footer;
use crate::rules::{generic_rules, tencent, tencent_rules, Rules};
use crate::Result;

/// A converter the registry can select for a source URL
pub trait Converter: Send + Sync {
    /// Stable name, for logs and tests
    fn name(&self) -> &str;

    /// Whether this converter claims `url`. Must not panic.
    fn supports(&self, url: &str) -> bool;

    /// Convert captured `html` from `url` to Markdown
    fn convert(&self, html: &str, url: &str) -> Result<String>;
}

/// Document platforms with their own markup conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// docs.qq.com and doc.weixin.qq.com
    TencentDocs,
}

const TENCENT_HOSTS: &[&str] = &["docs.qq.com", "doc.weixin.qq.com"];

impl Origin {
    pub fn name(&self) -> &'static str {
        match self {
            Origin::TencentDocs => "tencent",
        }
    }

    fn hosts(&self) -> &'static [&'static str] {
        match self {
            Origin::TencentDocs => TENCENT_HOSTS,
        }
    }

    /// Match the URL host against the origin's hosts and their subdomains.
    ///
    /// Input without a scheme falls back to a substring match.
    pub fn matches(&self, url: &str) -> bool {
        let hosts = self.hosts();
        match host_of(url) {
            Some(host) => hosts.iter().any(|known| {
                host == *known
                    || host
                        .strip_suffix(known)
                        .map(|prefix| prefix.ends_with('.'))
                        .unwrap_or(false)
            }),
            None => hosts.iter().any(|known| url.contains(known)),
        }
    }
}

/// Lower-cased host of an absolute URL, `None` when `url` has no scheme
fn host_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.trim().split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
        return None;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = host_port.split(':').next().unwrap_or(host_port);
    Some(host.trim_end_matches('.').to_ascii_lowercase())
}

/// The built-in strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Origin-agnostic conversion, the registry fallback
    Generic,
    /// Conversion tuned to one document platform
    Origin(Origin),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Generic => "generic",
            Strategy::Origin(origin) => origin.name(),
        }
    }

    /// Generic supports every URL
    pub fn supports(&self, url: &str) -> bool {
        match self {
            Strategy::Generic => true,
            Strategy::Origin(origin) => origin.matches(url),
        }
    }

    pub fn rules(&self) -> Rules {
        match self {
            Strategy::Generic => generic_rules(),
            Strategy::Origin(Origin::TencentDocs) => tencent_rules(),
        }
    }

    /// Elements that survive empty-element elision besides the media set
    pub fn significant(&self) -> fn(&ElementRef<'_>) -> bool {
        match self {
            Strategy::Generic => is_table_cell,
            Strategy::Origin(Origin::TencentDocs) => tencent::is_significant,
        }
    }

    /// Narrow sanitized markup to the part worth converting
    pub fn scope(&self, html: String) -> String {
        match self {
            Strategy::Generic => html,
            Strategy::Origin(Origin::TencentDocs) => extract_document_sections(&html).unwrap_or(html),
        }
    }
}

/// A [`Strategy`] with its options, usable as a [`Converter`]
#[derive(Debug, Clone)]
pub struct RuleConverter {
    strategy: Strategy,
    options: MarkdownOptions,
}

impl RuleConverter {
    pub fn new(strategy: Strategy) -> Self {
        Self::with_options(strategy, MarkdownOptions::default())
    }

    pub fn with_options(strategy: Strategy, options: MarkdownOptions) -> Self {
        Self { strategy, options }
    }

    pub fn generic() -> Self {
        Self::new(Strategy::Generic)
    }

    pub fn tencent() -> Self {
        Self::new(Strategy::Origin(Origin::TencentDocs))
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    fn engine(&self) -> RuleEngine {
        RuleEngine::new(self.strategy.rules()).with_significant(self.strategy.significant())
    }
}

impl Converter for RuleConverter {
    fn name(&self) -> &str {
        self.strategy.name()
    }

    fn supports(&self, url: &str) -> bool {
        self.strategy.supports(url)
    }

    fn convert(&self, html: &str, url: &str) -> Result<String> {
        let span = tracing::debug_span!("convert", strategy = self.name(), url);
        let _guard = span.enter();

        let html = self.strategy.scope(sanitize(html));
        let mut context = ConversionContext::new(url, &self.options);
        let markdown = self.engine().render_html(&html, &mut context)?;

        let mut markdown = normalize(&markdown);
        markdown.push_str(&build_footer(&context));

        tracing::debug!(
            input_len = html.len(),
            output_len = markdown.len(),
            placeholders = context.records().len(),
            "converted"
        );
        Ok(markdown)
    }
}
