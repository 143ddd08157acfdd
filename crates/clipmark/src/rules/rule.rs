//! Rule and Filter types for HTML conversion.

use scraper::ElementRef;

use crate::context::ConversionContext;
use crate::Result;

/// Replacement function: element, Markdown of its children, running context
pub type Transform = fn(&ElementRef<'_>, &str, &mut ConversionContext<'_>) -> Result<String>;

/// A filter determines which elements a rule applies to
#[derive(Clone, Copy)]
pub enum Filter {
    /// Match a single tag name
    Tag(&'static str),
    /// Match any of multiple tag names
    Tags(&'static [&'static str]),
    /// Match using a predicate function
    Predicate(fn(&ElementRef<'_>) -> bool),
}

impl Filter {
    /// Check if this filter matches an element
    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        let tag = element.value().name();
        match self {
            Filter::Tag(t) => tag.eq_ignore_ascii_case(t),
            Filter::Tags(tags) => tags.iter().any(|t| tag.eq_ignore_ascii_case(t)),
            Filter::Predicate(f) => f(element),
        }
    }
}

/// A rule defines how to convert a matched HTML element to Markdown
#[derive(Clone, Copy)]
pub struct Rule {
    /// Stable name, used in traces and order tests
    pub name: &'static str,
    /// Filter to determine which elements this rule applies to
    pub filter: Filter,
    /// Replacement function that generates Markdown
    pub replacement: Transform,
    /// Whether children are converted before the replacement runs.
    /// Rules reading the element directly skip the walk, so nothing inside
    /// them is rendered or counted twice.
    pub walk_children: bool,
}

impl Rule {
    /// Create a new rule
    pub const fn new(name: &'static str, filter: Filter, replacement: Transform) -> Self {
        Self {
            name,
            filter,
            replacement,
            walk_children: true,
        }
    }

    /// Create a rule that matches a single tag
    pub const fn for_tag(name: &'static str, tag: &'static str, replacement: Transform) -> Self {
        Self::new(name, Filter::Tag(tag), replacement)
    }

    /// Create a rule that matches multiple tags
    pub const fn for_tags(
        name: &'static str,
        tags: &'static [&'static str],
        replacement: Transform,
    ) -> Self {
        Self::new(name, Filter::Tags(tags), replacement)
    }

    /// Create a rule that matches using a predicate
    pub const fn when(
        name: &'static str,
        predicate: fn(&ElementRef<'_>) -> bool,
        replacement: Transform,
    ) -> Self {
        Self::new(name, Filter::Predicate(predicate), replacement)
    }

    /// Mark the rule as reading the element directly
    pub const fn opaque(self) -> Self {
        Self {
            walk_children: false,
            ..self
        }
    }

    /// Check if this rule applies to an element
    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        self.filter.matches(element)
    }

    /// Apply this rule's replacement
    pub fn replace(
        &self,
        element: &ElementRef<'_>,
        content: &str,
        context: &mut ConversionContext<'_>,
    ) -> Result<String> {
        tracing::trace!(rule = self.name, tag = element.value().name(), "applying rule");
        (self.replacement)(element, content, context)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("walk_children", &self.walk_children)
            .finish()
    }
}
