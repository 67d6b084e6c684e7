//! Error types surfaced to callers of the library.
//!
//! All three kinds are terminal: nothing in this crate retries them.

use thiserror::Error;

/// Failure to resolve a bundle page into a usable bundle.
///
/// Instances are memoized per bundle identifier by [`crate::bundle::BundleCache`],
/// so every failed lookup for the same page yields an equal value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BundleError {
    #[error("message bundle integration is disabled (requested \"{page}\")")]
    IntegrationDisabled { page: String },

    #[error("\"{page}\" is not a message bundle, {reason}")]
    NotABundle { page: String, reason: String },

    #[error("the message bundle \"{page}\" contains invalid data")]
    InvalidData { page: String },
}

impl BundleError {
    /// Full text of the page this error is about.
    pub fn page(&self) -> &str {
        match self {
            BundleError::IntegrationDisabled { page }
            | BundleError::NotABundle { page, .. }
            | BundleError::InvalidData { page } => page,
        }
    }
}

/// Errors returned by the caller-facing operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LibraryError {
    #[error("failed to parse title")]
    MalformedIdentifier,

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error("invalid language code: {0}")]
    InvalidLanguageCode(String),
}

pub type LibraryResult<T> = Result<T, LibraryError>;
