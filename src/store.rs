//! Collaborator seams: where page content and page metadata come from.
//!
//! The resolver never reads storage directly. It asks a [`ContentStore`] for
//! raw text and a [`BundleRegistry`] / [`TranslationRegistry`] for facts about
//! pages. Two stores ship with the crate: [`MemoryStore`] and
//! [`DirectoryStore`].

use crate::progress::TranslatablePage;
use crate::title::{CanonicalPath, Namespace};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Source of raw page text.
pub trait ContentStore: Send + Sync {
    /// Raw text of the page, or `None` when it does not exist.
    fn fetch(&self, path: &CanonicalPath) -> Option<String>;
}

/// Facts about bundle pages and language codes.
pub trait BundleRegistry: Send + Sync {
    /// Whether the page is a recognized message bundle source.
    fn is_bundle_source(&self, path: &CanonicalPath) -> bool;

    /// Content kind of the page (for example `wikitext` or
    /// `translate-messagebundle`).
    fn content_kind(&self, path: &CanonicalPath) -> String;

    /// Whether `code` is a recognized language code.
    fn is_valid_language_code(&self, code: &str) -> bool;
}

/// Facts about translatable pages and their language variants.
pub trait TranslationRegistry: Send + Sync {
    /// The translatable page whose source is `path`.
    fn translatable_page(&self, path: &CanonicalPath) -> Option<TranslatablePage>;

    /// The translatable page that `path` is a translation subpage of.
    fn translation_page_source(&self, path: &CanonicalPath) -> Option<TranslatablePage>;
}

// ==================== MemoryStore ====================

/// In-memory page store that remembers every fetch it served.
///
/// Pages are stored per page, so a `#fragment` on the requested path is
/// ignored on lookup. The fetch log keeps the path as requested.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: RwLock<HashMap<CanonicalPath, String>>,
    fetches: Mutex<Vec<CanonicalPath>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the text of a page.
    pub fn insert(&self, path: CanonicalPath, text: impl Into<String>) {
        let mut pages = self.pages.write().unwrap_or_else(|e| e.into_inner());
        pages.insert(path.without_fragment(), text.into());
    }

    /// Every path fetched so far, in call order.
    pub fn fetch_log(&self) -> Vec<CanonicalPath> {
        self.fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of times `path` was fetched.
    pub fn fetch_count(&self, path: &CanonicalPath) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|p| *p == path)
            .count()
    }

    /// Total number of fetches served.
    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl ContentStore for MemoryStore {
    fn fetch(&self, path: &CanonicalPath) -> Option<String> {
        self.fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.clone());

        let pages = self.pages.read().unwrap_or_else(|e| e.into_inner());
        pages.get(&path.without_fragment()).cloned()
    }
}

// ==================== DirectoryStore ====================

/// Page store backed by one file per page.
///
/// `Module:Foo/bar` lives at `<root>/Module/Foo/bar.txt`; main namespace
/// pages live under `<root>/Main/`. Spaces in page text map to `_` on disk.
/// Interwiki pages are never local and always read as absent.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the page's text, or `None` for paths that cannot be local.
    pub fn file_path(&self, path: &CanonicalPath) -> Option<PathBuf> {
        if !path.interwiki().is_empty() {
            return None;
        }

        let namespace_dir = match Namespace::name(path.namespace())? {
            "" => "Main",
            name => name,
        };

        let mut file = self.root.join(namespace_dir);
        let segments: Vec<&str> = path.text().split('/').collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == "..")
        {
            return None;
        }

        let (last, parents) = segments.split_last()?;
        for segment in parents {
            file.push(segment.replace(' ', "_"));
        }
        file.push(format!("{}.txt", last.replace(' ', "_")));
        Some(file)
    }

    /// Write the text of a page, creating parent directories as needed.
    pub fn write(&self, path: &CanonicalPath, text: &str) -> Result<()> {
        let file = self
            .file_path(path)
            .with_context(|| format!("Page {} cannot be stored locally", path))?;

        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        std::fs::write(&file, text)
            .with_context(|| format!("Failed to write {}", file.display()))
    }
}

impl ContentStore for DirectoryStore {
    fn fetch(&self, path: &CanonicalPath) -> Option<String> {
        let file = self.file_path(path)?;

        match std::fs::read_to_string(&file) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No page file at {}", file.display());
                None
            }
            Err(e) => {
                warn!("Failed to read page file {}: {}", file.display(), e);
                None
            }
        }
    }
}
