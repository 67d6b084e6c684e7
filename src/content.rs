//! Decoding stored bundle text into messages and metadata.
//!
//! Bundle pages hold a JSON object. Every member is a message except the
//! reserved `@metadata` member:
//!
//! ```json
//! {
//!     "@metadata": { "sourceLanguage": "en", "priorityLanguages": ["fr"] },
//!     "greeting": "Hello",
//!     "farewell": "Goodbye"
//! }
//! ```
//!
//! Decoding either yields a complete [`BundleContent`] or a [`MalformedBundle`]
//! describing the first violation found.

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// Member name reserved for bundle metadata.
pub const METADATA_KEY: &str = "@metadata";

/// Longest accepted message key, in bytes.
pub const MAX_KEY_LENGTH: usize = 100;

static INVALID_KEY_CHARS: OnceLock<Regex> = OnceLock::new();

/// Why stored content could not be decoded as a bundle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedBundle {
    #[error("bundle content is empty")]
    Empty,

    #[error("bundle content is not valid JSON: {0}")]
    NotJson(String),

    #[error("bundle content must be a JSON object")]
    NotAnObject,

    #[error("invalid bundle metadata: {0}")]
    InvalidMetadata(String),

    #[error("message key is empty")]
    EmptyKey,

    #[error("message key \"{0}\" is longer than 100 bytes")]
    KeyTooLong(String),

    #[error("message key \"{0}\" contains invalid characters")]
    InvalidKeyCharacters(String),

    #[error("value of message \"{0}\" is not a string")]
    InvalidValue(String),

    #[error("value of message \"{0}\" is empty")]
    EmptyValue(String),
}

/// Metadata carried in the `@metadata` member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetadata {
    pub source_language: Option<String>,
    pub priority_languages: IndexSet<String>,
    pub allow_only_priority_languages: bool,
    pub description: Option<String>,
    pub label: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawMetadata {
    #[serde(default)]
    source_language: Option<String>,
    #[serde(default)]
    priority_languages: Vec<String>,
    #[serde(default)]
    allow_only_priority_languages: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

/// Successfully decoded bundle content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleContent {
    /// Messages in the order they appear in the source text
    pub messages: IndexMap<String, String>,
    pub metadata: BundleMetadata,
}

/// Decode raw page text into bundle content.
pub fn decode(raw: &str) -> Result<BundleContent, MalformedBundle> {
    if raw.trim().is_empty() {
        return Err(MalformedBundle::Empty);
    }

    let value: Value =
        serde_json::from_str(raw).map_err(|e| MalformedBundle::NotJson(e.to_string()))?;

    let Value::Object(members) = value else {
        return Err(MalformedBundle::NotAnObject);
    };

    let mut messages = IndexMap::with_capacity(members.len());
    let mut metadata = BundleMetadata::default();

    for (key, value) in members {
        if key == METADATA_KEY {
            metadata = decode_metadata(value)?;
            continue;
        }

        validate_key(&key)?;

        let Value::String(text) = value else {
            return Err(MalformedBundle::InvalidValue(key));
        };
        if text.trim().is_empty() {
            return Err(MalformedBundle::EmptyValue(key));
        }

        messages.insert(key, text);
    }

    Ok(BundleContent { messages, metadata })
}

fn decode_metadata(value: Value) -> Result<BundleMetadata, MalformedBundle> {
    if !value.is_object() {
        return Err(MalformedBundle::InvalidMetadata(
            "metadata must be an object".to_string(),
        ));
    }

    let raw: RawMetadata = serde_json::from_value(value)
        .map_err(|e| MalformedBundle::InvalidMetadata(e.to_string()))?;

    if raw
        .source_language
        .as_deref()
        .is_some_and(|code| code.trim().is_empty())
    {
        return Err(MalformedBundle::InvalidMetadata(
            "sourceLanguage must not be blank".to_string(),
        ));
    }

    Ok(BundleMetadata {
        source_language: raw.source_language,
        priority_languages: raw.priority_languages.into_iter().collect(),
        allow_only_priority_languages: raw.allow_only_priority_languages,
        description: raw.description,
        label: raw.label,
    })
}

fn validate_key(key: &str) -> Result<(), MalformedBundle> {
    if key.trim().is_empty() {
        return Err(MalformedBundle::EmptyKey);
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(MalformedBundle::KeyTooLong(key.to_string()));
    }

    // Keys become path segments of translation subpages
    let regex = INVALID_KEY_CHARS.get_or_init(|| Regex::new(r"[/|#<>\[\]{}]").unwrap());
    if regex.is_match(key) {
        return Err(MalformedBundle::InvalidKeyCharacters(key.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Valid Content Tests ====================

    #[test]
    fn test_decode_preserves_key_order() {
        let content = decode(r#"{"zeta": "Z", "alpha": "A", "mid": "M"}"#).expect("valid");
        let keys: Vec<&str> = content.messages.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(content.metadata, BundleMetadata::default());
    }

    #[test]
    fn test_decode_metadata() {
        let raw = r#"{
            "@metadata": {
                "sourceLanguage": "en",
                "priorityLanguages": ["fr", "de", "fr"],
                "allowOnlyPriorityLanguages": true,
                "description": "Greetings",
                "label": "Greeter"
            },
            "greeting": "Hello"
        }"#;
        let content = decode(raw).expect("valid");
        let meta = &content.metadata;
        assert_eq!(meta.source_language.as_deref(), Some("en"));
        assert_eq!(
            meta.priority_languages.iter().collect::<Vec<_>>(),
            vec!["fr", "de"]
        );
        assert!(meta.allow_only_priority_languages);
        assert_eq!(meta.description.as_deref(), Some("Greetings"));
        assert_eq!(meta.label.as_deref(), Some("Greeter"));
        assert_eq!(content.messages.len(), 1);
        assert!(!content.messages.contains_key(METADATA_KEY));
    }

    #[test]
    fn test_decode_metadata_only() {
        let content = decode(r#"{"@metadata": {}}"#).expect("valid");
        assert!(content.messages.is_empty());
    }

    // ==================== Malformed Content Tests ====================

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode(""), Err(MalformedBundle::Empty));
        assert_eq!(decode("   \n"), Err(MalformedBundle::Empty));
    }

    #[test]
    fn test_decode_not_json() {
        assert!(matches!(decode("{not json"), Err(MalformedBundle::NotJson(_))));
    }

    #[test]
    fn test_decode_not_an_object() {
        assert_eq!(decode(r#"["a", "b"]"#), Err(MalformedBundle::NotAnObject));
        assert_eq!(decode(r#""text""#), Err(MalformedBundle::NotAnObject));
    }

    #[test]
    fn test_decode_non_string_value() {
        assert_eq!(
            decode(r#"{"count": 3}"#),
            Err(MalformedBundle::InvalidValue("count".to_string()))
        );
    }

    #[test]
    fn test_decode_blank_value() {
        assert_eq!(
            decode(r#"{"greeting": "  "}"#),
            Err(MalformedBundle::EmptyValue("greeting".to_string()))
        );
    }

    #[test]
    fn test_decode_bad_keys() {
        assert_eq!(decode(r#"{"": "x"}"#), Err(MalformedBundle::EmptyKey));
        assert_eq!(
            decode(r#"{"a/b": "x"}"#),
            Err(MalformedBundle::InvalidKeyCharacters("a/b".to_string()))
        );
        let long = format!(r#"{{"{}": "x"}}"#, "k".repeat(MAX_KEY_LENGTH + 1));
        assert!(matches!(decode(&long), Err(MalformedBundle::KeyTooLong(_))));
    }

    #[test]
    fn test_decode_bad_metadata() {
        for raw in [
            r#"{"@metadata": "x"}"#,
            r#"{"@metadata": {"unknown": 1}}"#,
            r#"{"@metadata": {"sourceLanguage": 5}}"#,
            r#"{"@metadata": {"sourceLanguage": ""}}"#,
            r#"{"@metadata": {"priorityLanguages": "fr"}}"#,
            r#"{"@metadata": {"allowOnlyPriorityLanguages": "yes"}}"#,
        ] {
            assert!(
                matches!(decode(raw), Err(MalformedBundle::InvalidMetadata(_))),
                "expected {raw} to be rejected"
            );
        }
    }
}
