//! Language codes and resolver observability.
//!
//! - `registry`: built-in table of recognized language codes
//! - `metrics`: per-instance cache and fetch counters
//!
//! # Example
//!
//! ```rust,ignore
//! use bundle_resolver::i18n::LanguageRegistry;
//!
//! let registry = LanguageRegistry::get();
//! assert!(registry.is_known("fr"));
//! ```

mod metrics;
mod registry;

pub use metrics::{MetricsReport, ResolverMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
