//! Bundle cache: one memoized resolution per bundle page.
//!
//! The first lookup of a page runs the integration gate, fetches the page
//! text and decodes it. Whatever comes out, a [`Bundle`] or a
//! [`BundleError`], is stored under the page's full text and returned for
//! every later lookup without touching the store again. Entries are never
//! evicted.

use crate::config::ResolverConfig;
use crate::content::{self, BundleContent, BundleMetadata};
use crate::error::BundleError;
use crate::i18n::ResolverMetrics;
use crate::store::{BundleRegistry, ContentStore};
use crate::title::CanonicalPath;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Content kind of a page that has been enabled as a message bundle.
pub const MESSAGE_BUNDLE_CONTENT_KIND: &str = "translate-messagebundle";

/// A decoded, validated message bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    identifier: CanonicalPath,
    messages: IndexMap<String, String>,
    metadata: BundleMetadata,
}

impl Bundle {
    pub fn new(identifier: CanonicalPath, content: BundleContent) -> Self {
        Self {
            identifier,
            messages: content.messages,
            metadata: content.metadata,
        }
    }

    pub fn identifier(&self) -> &CanonicalPath {
        &self.identifier
    }

    /// Message keys in authored order.
    pub fn ordered_keys(&self) -> Vec<String> {
        self.messages.keys().cloned().collect()
    }

    /// Source-language messages in authored order.
    pub fn messages(&self) -> &IndexMap<String, String> {
        &self.messages
    }

    /// Source-language text of one message.
    pub fn message(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    pub fn metadata(&self) -> &BundleMetadata {
        &self.metadata
    }

    pub fn source_language(&self) -> Option<&str> {
        self.metadata.source_language.as_deref()
    }

    pub fn priority_languages(&self) -> &IndexSet<String> {
        &self.metadata.priority_languages
    }

    pub fn only_priority_languages_allowed(&self) -> bool {
        self.metadata.allow_only_priority_languages
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.description.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.metadata.label.as_deref()
    }
}

/// Outcome of resolving one bundle page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleCacheEntry {
    Valid(Arc<Bundle>),
    Invalid(BundleError),
}

impl BundleCacheEntry {
    pub fn to_result(&self) -> Result<Arc<Bundle>, BundleError> {
        match self {
            BundleCacheEntry::Valid(bundle) => Ok(Arc::clone(bundle)),
            BundleCacheEntry::Invalid(err) => Err(err.clone()),
        }
    }
}

/// Process-lifetime cache of bundle resolutions keyed by page full text.
pub struct BundleCache {
    config: ResolverConfig,
    store: Arc<dyn ContentStore>,
    registry: Arc<dyn BundleRegistry>,
    metrics: Arc<ResolverMetrics>,
    entries: RwLock<HashMap<String, BundleCacheEntry>>,
}

impl BundleCache {
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
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a bundle page, consulting the store at most once per page.
    pub fn resolve(&self, path: &CanonicalPath) -> Result<Arc<Bundle>, BundleError> {
        let key = path.full_text();

        if let Some(entry) = self.cached(&key) {
            self.metrics.record_bundle_hit();
            return entry.to_result();
        }

        self.metrics.record_bundle_miss();
        let loaded = self.load(path, &key);

        // First write wins; a concurrent fill for the same page is identical
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.entry(key).or_insert(loaded).to_result()
    }

    /// The cached entry for a page, without resolving it.
    pub fn peek(&self, path: &CanonicalPath) -> Option<BundleCacheEntry> {
        self.cached(&path.full_text())
    }

    /// Number of pages with a cached entry.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, key: &str) -> Option<BundleCacheEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn load(&self, path: &CanonicalPath, key: &str) -> BundleCacheEntry {
        if !self.config.bundle_integration_enabled {
            debug!("Bundle integration disabled, rejecting {}", key);
            return BundleCacheEntry::Invalid(BundleError::IntegrationDisabled {
                page: key.to_string(),
            });
        }

        if !self.registry.is_bundle_source(path) {
            let kind = self.registry.content_kind(path);
            let reason = if kind == MESSAGE_BUNDLE_CONTENT_KIND {
                "may be missing a revision after being enabled".to_string()
            } else {
                format!("invalid content model \"{}\"", kind)
            };
            debug!("{} is not a bundle source ({})", key, kind);
            return BundleCacheEntry::Invalid(BundleError::NotABundle {
                page: key.to_string(),
                reason,
            });
        }

        self.metrics.record_store_fetch();
        let raw = self.store.fetch(path).unwrap_or_default();

        match content::decode(&raw) {
            Ok(content) => {
                debug!(
                    "Decoded bundle {} with {} messages",
                    key,
                    content.messages.len()
                );
                BundleCacheEntry::Valid(Arc::new(Bundle::new(path.clone(), content)))
            }
            Err(e) => {
                warn!("Bundle {} contains invalid data: {}", key, e);
                BundleCacheEntry::Invalid(BundleError::InvalidData {
                    page: key.to_string(),
                })
            }
        }
    }
}
