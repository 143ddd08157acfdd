//! Converter registry.
//!
//! Holds the fallback converter plus origin-specific converters in
//! registration order. The process-wide instance is built on first use and
//! is read-only afterwards.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::strategy::{Converter, RuleConverter};
use crate::{ConvertError, Result};

static REGISTRY: OnceCell<Registry> = OnceCell::new();

/// Ordered collection of converters with one fallback
pub struct Registry {
    converters: Vec<Arc<dyn Converter>>,
    fallback: Arc<dyn Converter>,
}

impl Registry {
    /// Create a registry holding only `fallback`
    pub fn new(fallback: Arc<dyn Converter>) -> Self {
        Self {
            converters: vec![Arc::clone(&fallback)],
            fallback,
        }
    }

    /// Generic fallback plus the Tencent Docs converter
    pub fn with_builtin() -> Self {
        let mut registry = Self::new(Arc::new(RuleConverter::generic()));
        registry.converters.push(Arc::new(RuleConverter::tencent()));
        registry
    }

    /// Append a converter. Duplicates are kept.
    pub fn register(&mut self, converter: Arc<dyn Converter>) -> Result<()> {
        if converter.name().trim().is_empty() {
            return Err(ConvertError::InvalidConverter(
                "converter name must not be empty".to_string(),
            ));
        }
        tracing::debug!(converter = converter.name(), "registered converter");
        self.converters.push(converter);
        Ok(())
    }

    /// First non-fallback converter supporting `url`, else the fallback
    pub fn select(&self, url: &str) -> &Arc<dyn Converter> {
        let selected = self
            .converters
            .iter()
            .filter(|converter| !Arc::ptr_eq(converter, &self.fallback))
            .find(|converter| converter.supports(url))
            .unwrap_or(&self.fallback);
        tracing::debug!(converter = selected.name(), url, "selected converter");
        selected
    }

    /// Every registered converter, fallback included, in registration order
    pub fn converters(&self) -> &[Arc<dyn Converter>] {
        &self.converters
    }

    pub fn fallback(&self) -> &Arc<dyn Converter> {
        &self.fallback
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.converters.iter().map(|c| c.name()).collect();
        f.debug_struct("Registry")
            .field("converters", &names)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

/// The process-wide registry, built with [`Registry::with_builtin`] on first use
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::with_builtin)
}

/// Replace the built-in process-wide registry.
///
/// Must run before the first call to [`registry`]; afterwards the instance
/// is fixed and `registry` is handed back.
pub fn install(registry: Registry) -> std::result::Result<(), Registry> {
    REGISTRY.set(registry)
}
