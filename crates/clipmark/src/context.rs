//! Per-conversion state.

use indexmap::IndexMap;

use crate::options::MarkdownOptions;
use crate::placeholder::{PlaceholderKind, PlaceholderRecord};

/// State owned by a single conversion.
///
/// A context is created at the start of every `convert` call and dropped
/// once the footer is built. Strategies never keep one around, so counters
/// always start at zero.
#[derive(Debug)]
pub struct ConversionContext<'a> {
    source_url: String,
    options: &'a MarkdownOptions,
    counters: IndexMap<PlaceholderKind, u32>,
    records: Vec<PlaceholderRecord>,
}

impl<'a> ConversionContext<'a> {
    pub fn new(source_url: &str, options: &'a MarkdownOptions) -> Self {
        Self {
            source_url: source_url.to_string(),
            options,
            counters: PlaceholderKind::ALL.iter().map(|kind| (*kind, 0)).collect(),
            records: Vec::new(),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn options(&self) -> &'a MarkdownOptions {
        self.options
    }

    /// Record a placeholder and return its 1-based index within `kind`
    pub fn record(&mut self, kind: PlaceholderKind, description: impl Into<String>) -> u32 {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        let index = *counter;

        self.records.push(PlaceholderRecord {
            kind,
            index,
            description: description.into(),
        });
        index
    }

    /// Current count for `kind`
    pub fn count(&self, kind: PlaceholderKind) -> u32 {
        self.counters.get(&kind).copied().unwrap_or(0)
    }

    /// Counters for every kind, in [`PlaceholderKind::ALL`] order
    pub fn counters(&self) -> &IndexMap<PlaceholderKind, u32> {
        &self.counters
    }

    /// Records in emission order
    pub fn records(&self) -> &[PlaceholderRecord] {
        &self.records
    }

    pub fn has_placeholders(&self) -> bool {
        self.counters.values().any(|count| *count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let options = MarkdownOptions::default();
        let context = ConversionContext::new("https://example.com", &options);
        assert_eq!(context.counters().len(), PlaceholderKind::ALL.len());
        assert!(context.counters().values().all(|c| *c == 0));
        assert!(!context.has_placeholders());
        assert_eq!(context.source_url(), "https://example.com");
    }

    #[test]
    fn test_indices_are_dense_per_kind() {
        let options = MarkdownOptions::default();
        let mut context = ConversionContext::new("https://example.com", &options);

        assert_eq!(context.record(PlaceholderKind::Image, "one"), 1);
        assert_eq!(context.record(PlaceholderKind::Iframe, "frame"), 1);
        assert_eq!(context.record(PlaceholderKind::Image, "two"), 2);
        assert_eq!(context.record(PlaceholderKind::Image, "three"), 3);

        let images: Vec<u32> = context
            .records()
            .iter()
            .filter(|r| r.kind == PlaceholderKind::Image)
            .map(|r| r.index)
            .collect();
        assert_eq!(images, vec![1, 2, 3]);
        assert_eq!(context.count(PlaceholderKind::Iframe), 1);
        assert_eq!(context.count(PlaceholderKind::Audio), 0);
        assert!(context.has_placeholders());
    }
}
