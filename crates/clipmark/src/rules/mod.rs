//! Rule system for HTML to Markdown conversion.
//!
//! Each strategy declares one static, ordered rule table. Evaluation is first
//! match: specific rules sit ahead of the shared vocabulary and must exclude
//! the shapes claimed by the rules above them. Reordering a table changes
//! output.

pub(crate) mod common;
mod rule;
pub(crate) mod tencent;

pub use rule::{Filter, Rule, Transform};

use scraper::ElementRef;

/// An ordered rule table
#[derive(Debug, Clone, Copy)]
pub struct Rules {
    rules: &'static [Rule],
}

impl Rules {
    /// Wrap a static rule table
    pub const fn new(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    /// Find the first rule matching an element
    pub fn for_element(&self, element: &ElementRef<'_>) -> Option<&'static Rule> {
        self.rules.iter().find(|rule| rule.matches(element))
    }

    /// Rules in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &'static Rule> {
        self.rules.iter()
    }

    /// Rule names in evaluation order
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name).collect()
    }

    /// Position of a named rule, its priority (0 is evaluated first)
    pub fn priority(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|rule| rule.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Rules of the generic strategy
pub fn generic_rules() -> Rules {
    Rules::new(common::GENERIC_RULES)
}

/// Rules of the Tencent Docs strategy
pub fn tencent_rules() -> Rules {
    Rules::new(tencent::TENCENT_RULES)
}
