//! Resolve message bundles into localized strings.
//!
//! A bundle is a page holding a JSON object of message keys and their
//! source-language text. Translations of each message live on their own
//! subpage (`Translations:<bundle>/<key>/<language>`) and are fetched only
//! when asked for.
//!
//! ```rust,ignore
//! use bundle_resolver::{TranslateLibrary, ResolverConfig, MemoryStore, SiteManifest};
//!
//! let library = TranslateLibrary::new(config, context, store, manifest.clone(), manifest);
//! let greeting = library.get_bundle_value(&json!("Foo"), "greeting", Some("fr"))?;
//! ```

pub mod bundle;
pub mod config;
pub mod content;
pub mod error;
pub mod i18n;
pub mod library;
pub mod manifest;
pub mod messages;
pub mod progress;
pub mod store;
pub mod title;

pub use bundle::{Bundle, BundleCache, BundleCacheEntry};
pub use config::{Config, ResolverConfig};
pub use error::{BundleError, LibraryError, LibraryResult};
pub use library::{BundleMetadataRecord, TranslateLibrary};
pub use manifest::SiteManifest;
pub use messages::{LanguageMap, LazyValue, MessageResolver};
pub use progress::{PageVariant, ProgressCalculator, TranslatablePage};
pub use store::{BundleRegistry, ContentStore, DirectoryStore, MemoryStore, TranslationRegistry};
pub use title::{CanonicalPath, Namespace, TitleParser};
