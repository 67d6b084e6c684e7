//! Language registry: the set of language codes the resolver accepts.
//!
//! The built-in table is initialized once through `OnceLock` and shared by
//! every resolver that does not bring its own list.

use std::sync::OnceLock;

/// A recognized language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// BCP 47 style code as used in page names (e.g., "en", "pt-br")
    pub code: String,

    /// English name of the language (e.g., "French")
    pub name: String,

    /// Native name of the language (e.g., "Français")
    pub native_name: String,
}

impl LanguageConfig {
    pub fn new(code: &str, name: &str, native_name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            native_name: native_name.to_string(),
        }
    }
}

/// Table of recognized language codes.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Built-in registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the built-in language registry.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Build a registry from an explicit list of languages.
    ///
    /// Codes are compared case-insensitively; later duplicates are dropped.
    pub fn with_languages(languages: Vec<LanguageConfig>) -> Self {
        let mut unique: Vec<LanguageConfig> = Vec::with_capacity(languages.len());
        for mut lang in languages {
            lang.code = lang.code.trim().to_lowercase();
            if !lang.code.is_empty() && !unique.iter().any(|l| l.code == lang.code) {
                unique.push(lang);
            }
        }
        Self { languages: unique }
    }

    /// Get a language by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        let code = code.to_lowercase();
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// All languages, in table order.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Whether `code` is a recognized language code.
    pub fn is_known(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

/// Languages recognized out of the box.
fn default_languages() -> Vec<LanguageConfig> {
    [
        ("ar", "Arabic", "العربية"),
        ("bn", "Bangla", "বাংলা"),
        ("ca", "Catalan", "català"),
        ("cs", "Czech", "čeština"),
        ("da", "Danish", "dansk"),
        ("de", "German", "Deutsch"),
        ("el", "Greek", "Ελληνικά"),
        ("en", "English", "English"),
        ("en-gb", "British English", "British English"),
        ("eo", "Esperanto", "Esperanto"),
        ("es", "Spanish", "español"),
        ("fa", "Persian", "فارسی"),
        ("fi", "Finnish", "suomi"),
        ("fr", "French", "français"),
        ("he", "Hebrew", "עברית"),
        ("hi", "Hindi", "हिन्दी"),
        ("hu", "Hungarian", "magyar"),
        ("id", "Indonesian", "Bahasa Indonesia"),
        ("it", "Italian", "italiano"),
        ("ja", "Japanese", "日本語"),
        ("ko", "Korean", "한국어"),
        ("nl", "Dutch", "Nederlands"),
        ("nb", "Norwegian Bokmål", "norsk bokmål"),
        ("pl", "Polish", "polski"),
        ("pt", "Portuguese", "português"),
        ("pt-br", "Brazilian Portuguese", "português do Brasil"),
        ("qqq", "Message documentation", "Message documentation"),
        ("ro", "Romanian", "română"),
        ("ru", "Russian", "русский"),
        ("sv", "Swedish", "svenska"),
        ("th", "Thai", "ไทย"),
        ("tr", "Turkish", "Türkçe"),
        ("uk", "Ukrainian", "українська"),
        ("vi", "Vietnamese", "Tiếng Việt"),
        ("zh-hans", "Simplified Chinese", "中文（简体）"),
        ("zh-hant", "Traditional Chinese", "中文（繁體）"),
    ]
    .into_iter()
    .map(|(code, name, native)| LanguageConfig::new(code, name, native))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_get_returns_singleton() {
        let registry1 = LanguageRegistry::get();
        let registry2 = LanguageRegistry::get();

        // Should return the same instance (same memory address)
        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_get_by_code_french() {
        let registry = LanguageRegistry::get();
        let config = registry.get_by_code("fr").expect("French should be known");

        assert_eq!(config.code, "fr");
        assert_eq!(config.name, "French");
        assert_eq!(config.native_name, "français");
    }

    #[test]
    fn test_get_by_code_is_case_insensitive() {
        let registry = LanguageRegistry::get();
        assert!(registry.is_known("PT-BR"));
        assert!(registry.is_known("zh-Hans"));
    }

    #[test]
    fn test_get_by_code_nonexistent() {
        let registry = LanguageRegistry::get();
        assert!(registry.get_by_code("xx-not-a-code").is_none());
        assert!(!registry.is_known(""));
    }

    #[test]
    fn test_builtin_codes_are_unique() {
        let all = LanguageRegistry::get().list_all();
        let mut codes: Vec<&str> = all.iter().map(|l| l.code.as_str()).collect();
        let before = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), before);
    }

    #[test]
    fn test_with_languages_normalizes_and_dedups() {
        let registry = LanguageRegistry::with_languages(vec![
            LanguageConfig::new(" EN ", "English", "English"),
            LanguageConfig::new("en", "Duplicate", "Duplicate"),
            LanguageConfig::new("", "Blank", "Blank"),
            LanguageConfig::new("tlh", "Klingon", "tlhIngan Hol"),
        ]);

        let all = registry.list_all();
        assert_eq!(all.len(), 2);
        assert_eq!(registry.get_by_code("en").map(|l| l.name.as_str()), Some("English"));
        assert!(registry.is_known("tlh"));
        assert!(!registry.is_known("fr"));
    }
}
