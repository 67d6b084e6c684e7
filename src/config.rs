use anyhow::{bail, Result};
use std::path::PathBuf;

/// Settings handed to the resolver components at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Whether message bundle pages may be resolved at all
    pub bundle_integration_enabled: bool,

    /// Content language assumed for bundles that declare no source language
    pub default_language_code: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            bundle_integration_enabled: true,
            default_language_code: "en".to_string(),
        }
    }
}

/// Process configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub resolver: ResolverConfig,

    // Storage
    pub content_root: PathBuf,
    pub site_manifest: PathBuf,

    /// Page the caller is evaluated in, as a title string
    pub context_page: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let content_root = PathBuf::from(
            std::env::var("CONTENT_ROOT").unwrap_or_else(|_| "content".to_string()),
        );

        Ok(Self {
            resolver: ResolverConfig {
                bundle_integration_enabled: match std::env::var("BUNDLE_INTEGRATION_ENABLED") {
                    Ok(v) => parse_flag("BUNDLE_INTEGRATION_ENABLED", &v)?,
                    Err(_) => true,
                },
                default_language_code: std::env::var("DEFAULT_LANGUAGE_CODE")
                    .ok()
                    .map(|v| v.trim().to_lowercase())
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| "en".to_string()),
            },

            site_manifest: std::env::var("SITE_MANIFEST")
                .map(PathBuf::from)
                .unwrap_or_else(|_| content_root.join("site.json")),
            content_root,

            context_page: std::env::var("CONTEXT_PAGE")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{} must be a boolean, got '{}'", name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "BUNDLE_INTEGRATION_ENABLED",
        "DEFAULT_LANGUAGE_CODE",
        "CONTENT_ROOT",
        "SITE_MANIFEST",
        "CONTEXT_PAGE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();

        let config = Config::from_env().expect("Should load defaults");
        assert_eq!(config.resolver, ResolverConfig::default());
        assert_eq!(config.content_root, PathBuf::from("content"));
        assert_eq!(config.site_manifest, PathBuf::from("content").join("site.json"));
        assert_eq!(config.context_page, None);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("BUNDLE_INTEGRATION_ENABLED", "no");
        std::env::set_var("DEFAULT_LANGUAGE_CODE", " DE ");
        std::env::set_var("CONTENT_ROOT", "/srv/wiki");
        std::env::set_var("CONTEXT_PAGE", "Module:Greeter/fr");

        let config = Config::from_env().expect("Should load overrides");
        assert!(!config.resolver.bundle_integration_enabled);
        assert_eq!(config.resolver.default_language_code, "de");
        assert_eq!(config.site_manifest, PathBuf::from("/srv/wiki/site.json"));
        assert_eq!(config.context_page.as_deref(), Some("Module:Greeter/fr"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_flag() {
        clear_env();
        std::env::set_var("BUNDLE_INTEGRATION_ENABLED", "sometimes");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("BUNDLE_INTEGRATION_ENABLED"));

        clear_env();
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(parse_flag("X", "1").unwrap());
        assert!(!parse_flag("X", "off").unwrap());
        assert!(parse_flag("X", "").is_err());
    }
}
