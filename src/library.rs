//! Caller-facing operations.
//!
//! [`TranslateLibrary`] is what a host binding exposes to scripts. Each
//! method takes identifiers in their raw, caller-supplied form (a
//! [`serde_json::Value`]) and normalizes them before touching the caches.

use crate::bundle::{Bundle, BundleCache};
use crate::config::ResolverConfig;
use crate::error::LibraryResult;
use crate::i18n::{MetricsReport, ResolverMetrics};
use crate::messages::MessageResolver;
use crate::progress::ProgressCalculator;
use crate::store::{BundleRegistry, ContentStore, TranslationRegistry};
use crate::title::{CanonicalPath, TitleParser};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Bundle metadata as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetadataRecord {
    pub source_language: Option<String>,
    pub priority_languages: Vec<String>,
    pub allow_only_priority_languages: bool,
    pub description: Option<String>,
    pub label: Option<String>,
}

/// One long-lived resolver instance with its caches.
pub struct TranslateLibrary {
    parser: TitleParser,
    context: CanonicalPath,
    bundles: BundleCache,
    messages: MessageResolver,
    progress: ProgressCalculator,
    metrics: Arc<ResolverMetrics>,
}

impl TranslateLibrary {
    /// Create a library evaluated in the page `context`.
    pub fn new(
        config: ResolverConfig,
        context: CanonicalPath,
        store: Arc<dyn ContentStore>,
        registry: Arc<dyn BundleRegistry>,
        translations: Arc<dyn TranslationRegistry>,
    ) -> Self {
        let metrics = Arc::new(ResolverMetrics::new());
        Self {
            parser: TitleParser::new(),
            context,
            bundles: BundleCache::new(
                config.clone(),
                Arc::clone(&store),
                Arc::clone(&registry),
                Arc::clone(&metrics),
            ),
            messages: MessageResolver::new(config, store, registry, Arc::clone(&metrics)),
            progress: ProgressCalculator::new(translations),
            metrics,
        }
    }

    /// Replace the title parser (for example to recognise interwiki prefixes).
    pub fn with_parser(mut self, parser: TitleParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn context(&self) -> &CanonicalPath {
        &self.context
    }

    /// Normalize a raw identifier against this library's context page.
    pub fn normalize(&self, title: &Value) -> LibraryResult<CanonicalPath> {
        self.parser.normalize(title, &self.context)
    }

    fn bundle(&self, title: &Value) -> LibraryResult<Arc<Bundle>> {
        let path = self.normalize(title)?;
        Ok(self.bundles.resolve(&path)?)
    }

    /// `getBundleKeys`: message keys in authored order.
    pub fn get_bundle_keys(&self, title: &Value) -> LibraryResult<Vec<String>> {
        let bundle = self.bundle(title)?;
        Ok(self.messages.keys(&bundle))
    }

    /// `getBundleValue`: one message in `language` (source language when `None`).
    pub fn get_bundle_value(
        &self,
        title: &Value,
        key: &str,
        language: Option<&str>,
    ) -> LibraryResult<String> {
        let bundle = self.bundle(title)?;
        self.messages.value(&bundle, language, key)
    }

    /// `getBundleValues`: every message in `language`, in key order.
    pub fn get_bundle_values(
        &self,
        title: &Value,
        language: Option<&str>,
    ) -> LibraryResult<IndexMap<String, String>> {
        let bundle = self.bundle(title)?;
        self.messages.values(&bundle, language)
    }

    /// `getBundleMetadata`
    pub fn get_bundle_metadata(&self, title: &Value) -> LibraryResult<BundleMetadataRecord> {
        let bundle = self.bundle(title)?;
        Ok(BundleMetadataRecord {
            source_language: bundle.source_language().map(str::to_string),
            priority_languages: bundle.priority_languages().iter().cloned().collect(),
            allow_only_priority_languages: bundle.only_priority_languages_allowed(),
            description: bundle.description().map(str::to_string),
            label: bundle.label().map(str::to_string),
        })
    }

    /// `getCurrentLanguage`: language of the context page if it is a
    /// translation subpage.
    pub fn get_current_language(&self) -> Option<String> {
        self.progress.current_language(&self.context)
    }

    /// `getAvailableLanguages`
    pub fn get_available_languages(&self, title: &Value) -> LibraryResult<Vec<String>> {
        let path = self.normalize(title)?;
        Ok(self.progress.available_languages(&path))
    }

    /// `getLanguageProgress`
    pub fn get_language_progress(&self, title: &Value) -> LibraryResult<IndexMap<String, f64>> {
        let path = self.normalize(title)?;
        Ok(self.progress.language_progress(&path))
    }

    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BundleError, LibraryError};
    use crate::manifest::SiteManifest;
    use crate::store::MemoryStore;
    use crate::title::Namespace;
    use serde_json::json;

    const MANIFEST: &str = r#"{
        "bundles": ["Foo", "Broken", "Module:Described"],
        "translatable_pages": [{
            "title": "Guide",
            "marked_revision": "3",
            "message_group": "page-Guide",
            "variants": [
                { "language": "en", "title": "Guide/en" },
                { "language": "fr", "title": "Guide/fr" }
            ],
            "progress": { "Guide/en": "1.00", "Guide/fr": "0.25" }
        }]
    }"#;

    fn foo() -> CanonicalPath {
        CanonicalPath::new(Namespace::MAIN, "Foo")
    }

    fn library_in(context: CanonicalPath) -> (TranslateLibrary, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.insert(
            foo(),
            r#"{"@metadata": {"sourceLanguage": "en"}, "greeting": "Hello", "farewell": "Goodbye"}"#,
        );
        store.insert(CanonicalPath::new(Namespace::MAIN, "Broken"), r#"{"x": 1}"#);
        store.insert(
            CanonicalPath::new(Namespace::MODULE, "Described"),
            r#"{"@metadata": {"priorityLanguages": ["fr", "de"], "allowOnlyPriorityLanguages": true, "description": "D", "label": "L"}, "k": "v"}"#,
        );
        store.insert(foo().translation_subpage("greeting", "fr"), "Bonjour");

        let manifest = Arc::new(SiteManifest::from_json(MANIFEST).expect("valid manifest"));
        let library = TranslateLibrary::new(
            ResolverConfig::default(),
            context,
            store.clone(),
            manifest.clone(),
            manifest,
        );
        (library, store)
    }

    fn library() -> (TranslateLibrary, Arc<MemoryStore>) {
        library_in(CanonicalPath::new(Namespace::MODULE, "Sandbox"))
    }

    // ==================== Bundle Call Tests ====================

    #[test]
    fn test_get_bundle_keys() {
        let (library, _) = library();
        assert_eq!(
            library.get_bundle_keys(&json!("Foo")).unwrap(),
            vec!["greeting", "farewell"]
        );
    }

    #[test]
    fn test_get_bundle_value_and_values() {
        let (library, _) = library();
        assert_eq!(
            library.get_bundle_value(&json!("Foo"), "greeting", Some("fr")).unwrap(),
            "Bonjour"
        );
        assert_eq!(
            library.get_bundle_value(&json!("Foo"), "farewell", Some("fr")).unwrap(),
            ""
        );
        assert_eq!(
            library.get_bundle_value(&json!("Foo"), "farewell", None).unwrap(),
            "Goodbye"
        );

        let values = library.get_bundle_values(&json!({"text": "Foo"}), Some("fr")).unwrap();
        assert_eq!(values.get("greeting").map(String::as_str), Some("Bonjour"));
        assert_eq!(values.get("farewell").map(String::as_str), Some(""));
    }

    #[test]
    fn test_malformed_bundle_error_is_stable() {
        let (library, store) = library();
        let broken = CanonicalPath::new(Namespace::MAIN, "Broken");

        let first = library.get_bundle_keys(&json!("Broken")).unwrap_err();
        let second = library.get_bundle_keys(&json!("Broken")).unwrap_err();
        let third = library.get_bundle_values(&json!("Broken"), Some("fr")).unwrap_err();

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(
            first,
            LibraryError::Bundle(BundleError::InvalidData {
                page: "Broken".to_string()
            })
        );
        assert_eq!(store.fetch_count(&broken), 1);
    }

    #[test]
    fn test_not_a_bundle() {
        let (library, store) = library();
        let err = library.get_bundle_keys(&json!("Guide")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"Guide\" is not a message bundle, invalid content model \"wikitext\""
        );
        assert_eq!(store.total_fetches(), 0);
    }

    #[test]
    fn test_malformed_identifier() {
        let (library, store) = library();
        assert_eq!(
            library.get_bundle_keys(&json!(["Foo"])),
            Err(LibraryError::MalformedIdentifier)
        );
        assert_eq!(
            library.get_available_languages(&json!("a|b")),
            Err(LibraryError::MalformedIdentifier)
        );
        assert_eq!(store.total_fetches(), 0);
    }

    #[test]
    fn test_absent_identifier_uses_context() {
        let (library, _) = library_in(foo());
        assert_eq!(
            library.get_bundle_keys(&Value::Null).unwrap(),
            vec!["greeting", "farewell"]
        );
    }

    // ==================== Metadata Tests ====================

    #[test]
    fn test_get_bundle_metadata() {
        let (library, _) = library();
        let meta = library.get_bundle_metadata(&json!("Module:Described")).unwrap();

        // Undeclared source language stays undeclared
        assert_eq!(meta.source_language, None);
        assert_eq!(meta.priority_languages, vec!["fr", "de"]);
        assert!(meta.allow_only_priority_languages);
        assert_eq!(meta.description.as_deref(), Some("D"));
        assert_eq!(meta.label.as_deref(), Some("L"));

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["allowOnlyPriorityLanguages"], true);
        assert_eq!(json["sourceLanguage"], Value::Null);
    }

    // ==================== Progress Call Tests ====================

    #[test]
    fn test_current_language() {
        let (on_variant, _) = library_in(CanonicalPath::new(Namespace::MAIN, "Guide/fr"));
        assert_eq!(on_variant.get_current_language(), Some("fr".to_string()));

        let (on_source, _) = library_in(CanonicalPath::new(Namespace::MAIN, "Guide"));
        assert_eq!(on_source.get_current_language(), None);

        let (elsewhere, _) = library();
        assert_eq!(elsewhere.get_current_language(), None);
    }

    #[test]
    fn test_available_languages_and_progress() {
        let (library, _) = library();
        assert_eq!(
            library.get_available_languages(&json!("Guide")).unwrap(),
            vec!["en", "fr"]
        );
        let progress = library.get_language_progress(&json!("Guide/fr")).unwrap();
        assert_eq!(progress.get("fr"), Some(&0.25));
        assert_eq!(progress.get("en"), Some(&1.0));

        assert!(library.get_available_languages(&json!("Foo")).unwrap().is_empty());
        assert!(library.get_language_progress(&json!("Foo")).unwrap().is_empty());
    }

    // ==================== Metrics Tests ====================

    #[test]
    fn test_metrics_report() {
        let (library, _) = library();
        library.get_bundle_keys(&json!("Foo")).unwrap();
        library.get_bundle_value(&json!("Foo"), "greeting", Some("fr")).unwrap();

        let report = library.metrics();
        assert_eq!(report.bundle_misses, 1);
        assert_eq!(report.bundle_hits, 1);
        assert_eq!(report.store_fetches, 2);
        assert_eq!(report.language_maps, 1);
    }
}
