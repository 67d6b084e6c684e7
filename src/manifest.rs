//! Site manifest: a JSON description of which pages are bundles and which
//! pages are translatable.
//!
//! ```json
//! {
//!     "interwiki": ["meta"],
//!     "languages": ["en", "fr", "de"],
//!     "bundles": ["Foo"],
//!     "content_kinds": { "Module:Bar": "Scribunto" },
//!     "translatable_pages": [{
//!         "title": "Guide",
//!         "source_language": "en",
//!         "marked_revision": "1042",
//!         "message_group": "page-Guide",
//!         "variants": [{ "language": "fr", "title": "Guide/fr" }],
//!         "progress": { "Guide/fr": "0.50" }
//!     }]
//! }
//! ```
//!
//! `languages` is optional; without it the built-in language table applies.

use crate::bundle::MESSAGE_BUNDLE_CONTENT_KIND;
use crate::i18n::{LanguageConfig, LanguageRegistry};
use crate::progress::{PageVariant, TranslatablePage};
use crate::store::{BundleRegistry, TranslationRegistry};
use crate::title::{CanonicalPath, TitleParser};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Content kind reported for pages the manifest says nothing about.
pub const DEFAULT_CONTENT_KIND: &str = "wikitext";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ManifestFile {
    interwiki: Vec<String>,
    languages: Option<Vec<String>>,
    bundles: Vec<String>,
    content_kinds: HashMap<String, String>,
    translatable_pages: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PageEntry {
    title: String,
    #[serde(default = "default_source_language")]
    source_language: String,
    #[serde(default)]
    marked_revision: Option<String>,
    #[serde(default)]
    message_group: Option<String>,
    #[serde(default)]
    variants: Vec<VariantEntry>,
    #[serde(default)]
    progress: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariantEntry {
    language: String,
    title: String,
}

fn default_source_language() -> String {
    "en".to_string()
}

/// Registry answering bundle and translation questions from a manifest.
#[derive(Debug, Clone)]
pub struct SiteManifest {
    parser: TitleParser,
    languages: LanguageRegistry,
    bundles: Vec<CanonicalPath>,
    content_kinds: HashMap<String, String>,
    pages: Vec<TranslatablePage>,
}

impl SiteManifest {
    /// Load a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read site manifest {}", path.display()))?;
        let manifest = Self::from_json(&raw)
            .with_context(|| format!("Invalid site manifest {}", path.display()))?;

        info!(
            "Loaded site manifest with {} bundles and {} translatable pages",
            manifest.bundles.len(),
            manifest.pages.len()
        );
        Ok(manifest)
    }

    /// Parse a manifest from JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: ManifestFile =
            serde_json::from_str(raw).context("Failed to parse site manifest JSON")?;

        let parser = TitleParser::new().with_interwiki(&file.interwiki);
        let title = |text: &str| {
            parser
                .parse(text)
                .with_context(|| format!("Invalid page title '{}' in site manifest", text))
        };

        let languages = match file.languages {
            Some(codes) => LanguageRegistry::with_languages(
                codes
                    .iter()
                    .map(|code| LanguageConfig::new(code, code, code))
                    .collect(),
            ),
            None => LanguageRegistry::get().clone(),
        };

        let bundles = file
            .bundles
            .iter()
            .map(|text| title(text.as_str()))
            .collect::<Result<Vec<_>>>()?;

        let content_kinds = file
            .content_kinds
            .iter()
            .map(|(text, kind)| -> Result<(String, String)> {
                Ok((title(text.as_str())?.prefixed_text(), kind.clone()))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        let pages = file
            .translatable_pages
            .into_iter()
            .map(|entry| -> Result<TranslatablePage> {
                Ok(TranslatablePage {
                    title: title(entry.title.as_str())?,
                    source_language: entry.source_language,
                    marked_tag: entry.marked_revision,
                    message_group: entry.message_group,
                    variants: entry
                        .variants
                        .iter()
                        .map(|v| -> Result<PageVariant> {
                            Ok(PageVariant {
                                language_code: v.language.clone(),
                                path: title(v.title.as_str())?,
                            })
                        })
                        .collect::<Result<Vec<_>>>()?,
                    completion: entry
                        .progress
                        .iter()
                        .map(|(page, pct)| -> Result<(CanonicalPath, String)> {
                            Ok((title(page.as_str())?, pct.clone()))
                        })
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            parser,
            languages,
            bundles,
            content_kinds,
            pages,
        })
    }

    /// Title parser configured with the manifest's interwiki prefixes.
    pub fn parser(&self) -> &TitleParser {
        &self.parser
    }

    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }
}

impl BundleRegistry for SiteManifest {
    fn is_bundle_source(&self, path: &CanonicalPath) -> bool {
        self.bundles.iter().any(|b| b.same_page(path))
    }

    fn content_kind(&self, path: &CanonicalPath) -> String {
        if let Some(kind) = self.content_kinds.get(&path.prefixed_text()) {
            return kind.clone();
        }
        if self.is_bundle_source(path) {
            MESSAGE_BUNDLE_CONTENT_KIND.to_string()
        } else {
            DEFAULT_CONTENT_KIND.to_string()
        }
    }

    fn is_valid_language_code(&self, code: &str) -> bool {
        self.languages.is_known(code)
    }
}

impl TranslationRegistry for SiteManifest {
    fn translatable_page(&self, path: &CanonicalPath) -> Option<TranslatablePage> {
        self.pages.iter().find(|p| p.title.same_page(path)).cloned()
    }

    fn translation_page_source(&self, path: &CanonicalPath) -> Option<TranslatablePage> {
        self.pages
            .iter()
            .find(|p| p.variants.iter().any(|v| v.path.same_page(path)))
            .cloned()
    }
}
