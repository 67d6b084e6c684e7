//! Lazily fetched, memoized message values per bundle and language.
//!
//! Requests in the bundle's source language are answered from the decoded
//! bundle itself. Any other language gets a [`LanguageMap`] holding one
//! [`LazyValue`] per key; a cell fetches its translation subpage the first
//! time it is read and keeps the result (absent pages become `""`).

use crate::bundle::Bundle;
use crate::config::ResolverConfig;
use crate::error::{LibraryError, LibraryResult};
use crate::i18n::ResolverMetrics;
use crate::store::{BundleRegistry, ContentStore};
use crate::title::CanonicalPath;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::{debug, info};

/// A message value that is fetched at most once.
#[derive(Debug)]
pub struct LazyValue {
    path: CanonicalPath,
    value: OnceLock<String>,
}

impl LazyValue {
    fn new(path: CanonicalPath) -> Self {
        Self {
            path,
            value: OnceLock::new(),
        }
    }

    /// Translation subpage backing this value.
    pub fn path(&self) -> &CanonicalPath {
        &self.path
    }

    pub fn is_evaluated(&self) -> bool {
        self.value.get().is_some()
    }

    /// The memoized value, if it has been evaluated.
    pub fn peek(&self) -> Option<&str> {
        self.value.get().map(String::as_str)
    }

    fn force(&self, store: &dyn ContentStore, metrics: &ResolverMetrics) -> &str {
        self.value.get_or_init(|| {
            metrics.record_store_fetch();
            store.fetch(&self.path).unwrap_or_default()
        })
    }
}

/// Lazy values for every key of one bundle in one language.
#[derive(Debug)]
pub struct LanguageMap {
    language: String,
    values: IndexMap<String, LazyValue>,
}

impl LanguageMap {
    fn build(bundle: &Bundle, language: &str) -> Self {
        let values = bundle
            .messages()
            .keys()
            .map(|key| {
                let path = bundle.identifier().translation_subpage(key, language);
                (key.clone(), LazyValue::new(path))
            })
            .collect();

        Self {
            language: language.to_string(),
            values,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn get(&self, key: &str) -> Option<&LazyValue> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values already fetched.
    pub fn evaluated_count(&self) -> usize {
        self.values.values().filter(|v| v.is_evaluated()).count()
    }
}

/// Resolves message values, caching one [`LanguageMap`] per bundle and language.
pub struct MessageResolver {
    config: ResolverConfig,
    store: Arc<dyn ContentStore>,
    registry: Arc<dyn BundleRegistry>,
    metrics: Arc<ResolverMetrics>,
    languages: RwLock<HashMap<(String, String), Arc<LanguageMap>>>,
}

impl MessageResolver {
    pub fn new(
        config: ResolverConfig,
        store: Arc<dyn ContentStore>,
        registry: Arc<dyn BundleRegistry>,
        metrics: Arc<ResolverMetrics>,
    ) -> Self {
        Self {
            config,
            store,
            registry,
            metrics,
            languages: RwLock::new(HashMap::new()),
        }
    }

    /// Keys of the bundle in authored order. Never fetches anything.
    pub fn keys(&self, bundle: &Bundle) -> Vec<String> {
        bundle.ordered_keys()
    }

    /// Source language of the bundle, falling back to the configured default.
    pub fn effective_source_language<'a>(&'a self, bundle: &'a Bundle) -> &'a str {
        bundle
            .source_language()
            .unwrap_or(&self.config.default_language_code)
    }

    /// Whether a request in `language` is served straight from the bundle.
    pub fn is_source_language(&self, bundle: &Bundle, language: Option<&str>) -> bool {
        match language {
            None => true,
            Some(code) => code == self.effective_source_language(bundle),
        }
    }

    /// Value of one message. Unknown keys yield `""`.
    ///
    /// Fetches at most the single translation subpage for `key`.
    pub fn value(&self, bundle: &Bundle, language: Option<&str>, key: &str) -> LibraryResult<String> {
        let code = match language {
            Some(code) if !self.is_source_language(bundle, language) => code,
            _ => return Ok(bundle.message(key).unwrap_or_default().to_string()),
        };

        let map = self.language_map(bundle, code)?;
        Ok(match map.get(key) {
            Some(lazy) => lazy.force(self.store.as_ref(), &self.metrics).to_string(),
            None => String::new(),
        })
    }

    /// Values of every message, in key order.
    ///
    /// For a translated language this evaluates every lazy value in the map,
    /// so later single-key lookups are free.
    pub fn values(
        &self,
        bundle: &Bundle,
        language: Option<&str>,
    ) -> LibraryResult<IndexMap<String, String>> {
        let code = match language {
            Some(code) if !self.is_source_language(bundle, language) => code,
            _ => return Ok(bundle.messages().clone()),
        };

        let map = self.language_map(bundle, code)?;
        Ok(map
            .values
            .iter()
            .map(|(key, lazy)| {
                let value = lazy.force(self.store.as_ref(), &self.metrics);
                (key.clone(), value.to_string())
            })
            .collect())
    }

    /// The language map for a bundle, building it on first request.
    ///
    /// Fails with [`LibraryError::InvalidLanguageCode`] for unrecognized
    /// codes, before any fetch happens. Codes must be in canonical lowercase
    /// form: `FR` is rejected rather than folded to `fr`.
    pub fn language_map(&self, bundle: &Bundle, language: &str) -> LibraryResult<Arc<LanguageMap>> {
        let code = language;
        let cache_key = (bundle.identifier().full_text(), code.to_string());

        {
            let languages = self.languages.read().unwrap_or_else(|e| e.into_inner());
            if let Some(map) = languages.get(&cache_key) {
                return Ok(Arc::clone(map));
            }
        }

        if !is_canonical_code(code) || !self.registry.is_valid_language_code(code) {
            debug!("Rejected language code '{}'", language);
            return Err(LibraryError::InvalidLanguageCode(language.to_string()));
        }

        let built = Arc::new(LanguageMap::build(bundle, code));
        let mut languages = self.languages.write().unwrap_or_else(|e| e.into_inner());
        let map = languages.entry(cache_key).or_insert_with(|| {
            self.metrics.record_language_map();
            info!(
                "Built '{}' language map for {} ({} keys)",
                code,
                bundle.identifier(),
                built.len()
            );
            Arc::clone(&built)
        });
        Ok(Arc::clone(map))
    }

    /// The language map for a bundle if one has been built.
    pub fn cached_language_map(&self, bundle: &Bundle, language: &str) -> Option<Arc<LanguageMap>> {
        let cache_key = (bundle.identifier().full_text(), language.to_string());
        let languages = self.languages.read().unwrap_or_else(|e| e.into_inner());
        languages.get(&cache_key).cloned()
    }
}

fn is_canonical_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
