//! Evaluate one library call against an on-disk site and print the result as JSON.
//!
//! Usage:
//!   bundle-resolver getBundleKeys Foo
//!   bundle-resolver getBundleValue Foo greeting fr
//!   bundle-resolver getBundleValues '{"namespace": 828, "text": "Greeter"}' de
//!   bundle-resolver getCurrentLanguage
//!
//! Arguments are read as JSON when they parse as JSON, otherwise as plain
//! strings. Pass `null` to leave an optional argument out.
//!
//! Optional environment variables:
//! - CONTENT_ROOT (defaults to content)
//! - SITE_MANIFEST (defaults to <CONTENT_ROOT>/site.json)
//! - CONTEXT_PAGE (defaults to "Main Page")
//! - BUNDLE_INTEGRATION_ENABLED (defaults to true)
//! - DEFAULT_LANGUAGE_CODE (defaults to en)

use anyhow::{bail, Context, Result};
use bundle_resolver::{
    config::Config, CanonicalPath, DirectoryStore, Namespace, SiteManifest, TranslateLibrary,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

const CALLS: [&str; 7] = [
    "getBundleKeys",
    "getBundleValue",
    "getBundleValues",
    "getBundleMetadata",
    "getCurrentLanguage",
    "getAvailableLanguages",
    "getLanguageProgress",
];

fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging (stderr, so stdout stays valid JSON)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bundle_resolver=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((call, rest)) = args.split_first() else {
        bail!("Usage: bundle-resolver <call> [args...]\nCalls: {}", CALLS.join(", "));
    };

    let config = Config::from_env()?;
    let manifest = Arc::new(SiteManifest::load(&config.site_manifest)?);
    let store = Arc::new(DirectoryStore::new(&config.content_root));

    let context = match &config.context_page {
        Some(title) => manifest
            .parser()
            .parse(title)
            .with_context(|| format!("CONTEXT_PAGE '{}' is not a valid title", title))?,
        None => CanonicalPath::new(Namespace::MAIN, "Main Page"),
    };

    info!(
        "Evaluating {} in {} against {}",
        call,
        context,
        store.root().display()
    );

    let library = TranslateLibrary::new(
        config.resolver.clone(),
        context,
        store,
        manifest.clone(),
        manifest.clone(),
    )
    .with_parser(manifest.parser().clone());

    let args: Vec<Value> = rest.iter().map(|raw| parse_arg(raw)).collect();
    let output = dispatch(&library, call, &args)?;

    println!("{}", serde_json::to_string_pretty(&output)?);

    let report = library.metrics();
    info!(
        "Done: {} bundle lookups ({} cached), {} store fetches",
        report.bundle_hits + report.bundle_misses,
        report.bundle_hits,
        report.store_fetches
    );
    Ok(())
}

fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&Value::Null)
}

fn optional_string(args: &[Value], index: usize, name: &str) -> Result<Option<String>> {
    match arg(args, index) {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => bail!("Argument '{}' must be a string, got {}", name, other),
    }
}

fn dispatch(library: &TranslateLibrary, call: &str, args: &[Value]) -> Result<Value> {
    let title = arg(args, 0);

    let output = match call {
        "getBundleKeys" => serde_json::to_value(library.get_bundle_keys(title)?)?,
        "getBundleValue" => {
            let key = optional_string(args, 1, "key")?.context("Argument 'key' is required")?;
            let language = optional_string(args, 2, "code")?;
            Value::String(library.get_bundle_value(title, &key, language.as_deref())?)
        }
        "getBundleValues" => {
            let language = optional_string(args, 1, "code")?;
            serde_json::to_value(library.get_bundle_values(title, language.as_deref())?)?
        }
        "getBundleMetadata" => serde_json::to_value(library.get_bundle_metadata(title)?)?,
        "getCurrentLanguage" => serde_json::to_value(library.get_current_language())?,
        "getAvailableLanguages" => {
            serde_json::to_value(library.get_available_languages(title)?)?
        }
        "getLanguageProgress" => serde_json::to_value(library.get_language_progress(title)?)?,
        other => bail!("Unknown call '{}'. Calls: {}", other, CALLS.join(", ")),
    };

    Ok(output)
}
