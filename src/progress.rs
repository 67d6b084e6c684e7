//! Translation progress of translatable pages.
//!
//! Every operation here first resolves its path to a [`TranslatablePage`].
//! Pages that are unknown, unmarked or missing a message group are not
//! errors: they produce `None`, an empty list or an empty map.

use crate::store::TranslationRegistry;
use crate::title::CanonicalPath;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::debug;

static NUMERIC_PREFIX: OnceLock<Regex> = OnceLock::new();

/// One language variant of a translatable page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageVariant {
    pub language_code: String,
    pub path: CanonicalPath,
}

/// A page recognized by the translation registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatablePage {
    /// The source page
    pub title: CanonicalPath,

    /// Language the source page is written in
    pub source_language: String,

    /// Revision marked for translation, if any
    pub marked_tag: Option<String>,

    /// Message group holding the page's translation units
    pub message_group: Option<String>,

    /// Existing language variants, in registry order
    pub variants: Vec<PageVariant>,

    /// Completion per variant page, as reported by the registry
    pub completion: Vec<(CanonicalPath, String)>,
}

impl TranslatablePage {
    pub fn variants(&self) -> &[PageVariant] {
        &self.variants
    }

    pub fn completion_percentages(&self) -> &[(CanonicalPath, String)] {
        &self.completion
    }

    pub fn is_marked(&self) -> bool {
        self.marked_tag.is_some()
    }

    /// Language code of one of this page's variants (or of the source page).
    pub fn language_of(&self, path: &CanonicalPath) -> Option<String> {
        if let Some(variant) = self.variants.iter().find(|v| v.path.same_page(path)) {
            return Some(variant.language_code.clone());
        }
        if path.same_page(&self.title) {
            return Some(self.source_language.clone());
        }
        path.subpage_suffix().map(str::to_string)
    }
}

/// Computes language and progress information for translatable pages.
pub struct ProgressCalculator {
    registry: Arc<dyn TranslationRegistry>,
}

impl ProgressCalculator {
    pub fn new(registry: Arc<dyn TranslationRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve a path (source page or translation subpage) to a usable
    /// translatable page.
    pub fn resolve_page(&self, path: &CanonicalPath) -> Option<TranslatablePage> {
        let page = self
            .registry
            .translatable_page(path)
            .filter(TranslatablePage::is_marked)
            .or_else(|| self.registry.translation_page_source(path))
            .filter(TranslatablePage::is_marked);

        let Some(page) = page else {
            debug!("{} is not a marked translatable page", path);
            return None;
        };

        if page.message_group.is_none() {
            debug!("Translatable page {} has no message group", page.title);
            return None;
        }

        Some(page)
    }

    /// Language of `context` when it is a translation subpage; `None` for
    /// source pages and pages that are not translatable.
    pub fn current_language(&self, context: &CanonicalPath) -> Option<String> {
        let page = self.resolve_page(context)?;
        if context.same_page(&page.title) {
            return None;
        }
        page.language_of(context)
    }

    /// Codes of every existing language variant of the page.
    pub fn available_languages(&self, path: &CanonicalPath) -> Vec<String> {
        match self.resolve_page(path) {
            Some(page) => page
                .variants
                .iter()
                .map(|v| v.language_code.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Completion ratio in `[0.0, 1.0]` per language variant.
    pub fn language_progress(&self, path: &CanonicalPath) -> IndexMap<String, f64> {
        let Some(page) = self.resolve_page(path) else {
            return IndexMap::new();
        };

        page.completion
            .iter()
            .filter_map(|(variant, percentage)| {
                let code = page.language_of(variant)?;
                Some((code, parse_percentage(percentage)))
            })
            .collect()
    }
}

/// Convert a registry percentage string into a ratio in `[0.0, 1.0]`.
///
/// Only the leading number is read (`"0.75 approx"` is 0.75); text without
/// one reads as 0. A `%` suffix marks a 0-100 value.
pub fn parse_percentage(text: &str) -> f64 {
    let regex = NUMERIC_PREFIX.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").unwrap()
    });

    let Some(m) = regex.find(text) else {
        return 0.0;
    };

    let mut value: f64 = m.as_str().trim().parse().unwrap_or(0.0);
    if text[m.end()..].trim_start().starts_with('%') {
        value /= 100.0;
    }

    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
