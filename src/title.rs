//! Page identifiers: parsing user-supplied titles into canonical paths.
//!
//! A caller may name a page with a plain string (`"Module:Foo#Usage"`) or a
//! record with named fields (`{"namespace": 828, "text": "Foo"}`). Both forms
//! normalize to the same [`CanonicalPath`].

use crate::error::{LibraryError, LibraryResult};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;

/// Well-known namespace ids.
pub struct Namespace;

impl Namespace {
    pub const MAIN: i64 = 0;
    pub const TALK: i64 = 1;
    pub const USER: i64 = 2;
    pub const PROJECT: i64 = 4;
    pub const FILE: i64 = 6;
    pub const MEDIAWIKI: i64 = 8;
    pub const TEMPLATE: i64 = 10;
    pub const HELP: i64 = 12;
    pub const CATEGORY: i64 = 14;
    pub const MODULE: i64 = 828;
    pub const TRANSLATIONS: i64 = 1198;

    const NAMES: &'static [(i64, &'static str)] = &[
        (Self::MAIN, ""),
        (Self::TALK, "Talk"),
        (Self::USER, "User"),
        (Self::PROJECT, "Project"),
        (Self::FILE, "File"),
        (Self::MEDIAWIKI, "MediaWiki"),
        (Self::TEMPLATE, "Template"),
        (Self::HELP, "Help"),
        (Self::CATEGORY, "Category"),
        (Self::MODULE, "Module"),
        (Self::TRANSLATIONS, "Translations"),
    ];

    /// Canonical name of a namespace id, `""` for the main namespace.
    pub fn name(id: i64) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(ns, _)| *ns == id)
            .map(|(_, name)| *name)
    }

    /// Look up a namespace id by name, ignoring case and `_`/space differences.
    pub fn from_name(name: &str) -> Option<i64> {
        let wanted = name.replace('_', " ").trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        Self::NAMES
            .iter()
            .find(|(_, candidate)| candidate.to_lowercase() == wanted)
            .map(|(ns, _)| *ns)
    }
}

/// Normalized identifier for a content resource.
///
/// Values are immutable once built; equality compares all four fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath {
    namespace: i64,
    text: String,
    fragment: String,
    interwiki: String,
}

impl CanonicalPath {
    /// Build a path from already-normalized parts, skipping validation.
    ///
    /// Used for paths derived from other canonical paths (translation
    /// subpages) and by collaborators that mint their own identifiers.
    pub fn from_parts(
        namespace: i64,
        text: impl Into<String>,
        fragment: impl Into<String>,
        interwiki: impl Into<String>,
    ) -> Self {
        Self {
            namespace,
            text: text.into(),
            fragment: fragment.into(),
            interwiki: interwiki.into(),
        }
    }

    /// Shorthand for a fragment-less, local page.
    pub fn new(namespace: i64, text: impl Into<String>) -> Self {
        Self::from_parts(namespace, text, "", "")
    }

    pub fn namespace(&self) -> i64 {
        self.namespace
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn interwiki(&self) -> &str {
        &self.interwiki
    }

    /// `[interwiki:][Namespace:]Text`, without the fragment.
    pub fn prefixed_text(&self) -> String {
        let mut out = String::new();
        if !self.interwiki.is_empty() {
            out.push_str(&self.interwiki);
            out.push(':');
        }
        match Namespace::name(self.namespace) {
            Some("") => {}
            Some(name) => {
                out.push_str(name);
                out.push(':');
            }
            // Unknown namespaces only come from collaborator-built paths
            None => {
                out.push_str(&self.namespace.to_string());
                out.push(':');
            }
        }
        out.push_str(&self.text);
        out
    }

    /// `[interwiki:][Namespace:]Text[#fragment]`. Used as the cache key.
    pub fn full_text(&self) -> String {
        let mut out = self.prefixed_text();
        if !self.fragment.is_empty() {
            out.push('#');
            out.push_str(&self.fragment);
        }
        out
    }

    /// Path holding the translation of `key` into `language` for a bundle at
    /// this path: `Translations:<full text>/<key>/<language>`.
    pub fn translation_subpage(&self, key: &str, language: &str) -> CanonicalPath {
        CanonicalPath::new(
            Namespace::TRANSLATIONS,
            format!("{}/{}/{}", self.full_text(), key, language),
        )
    }

    /// The same path with its fragment dropped.
    pub fn without_fragment(&self) -> CanonicalPath {
        CanonicalPath {
            fragment: String::new(),
            ..self.clone()
        }
    }

    /// Whether both paths name the same page, ignoring fragments.
    pub fn same_page(&self, other: &CanonicalPath) -> bool {
        self.namespace == other.namespace
            && self.text == other.text
            && self.interwiki == other.interwiki
    }

    /// Text after the last `/`, if the page is a subpage.
    pub fn subpage_suffix(&self) -> Option<&str> {
        self.text
            .rsplit_once('/')
            .map(|(_, suffix)| suffix)
            .filter(|suffix| !suffix.is_empty())
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_text())
    }
}

/// Maximum byte length of a page's text.
const MAX_TITLE_BYTES: usize = 255;

static ILLEGAL_CHARS: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();

fn illegal_chars() -> &'static Regex {
    ILLEGAL_CHARS.get_or_init(|| Regex::new(r"[<>\[\]{}|#\x00-\x1f\x7f]").unwrap())
}

fn whitespace_run() -> &'static Regex {
    WHITESPACE_RUN.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Parses user input into [`CanonicalPath`] values.
#[derive(Debug, Clone, Default)]
pub struct TitleParser {
    interwiki_prefixes: Vec<String>,
}

impl TitleParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognise the given prefixes (case-insensitive) as interwiki links.
    pub fn with_interwiki<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.interwiki_prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    fn is_interwiki(&self, prefix: &str) -> bool {
        let prefix = prefix.trim().to_lowercase();
        self.interwiki_prefixes.iter().any(|p| *p == prefix)
    }

    /// Normalize a caller-supplied identifier.
    ///
    /// `null` and `""` resolve to `context`. Strings are parsed as titles,
    /// objects must carry named fields, and everything else (including
    /// positional arrays) is rejected.
    pub fn normalize(&self, input: &Value, context: &CanonicalPath) -> LibraryResult<CanonicalPath> {
        match input {
            Value::Null => Ok(context.clone()),
            Value::String(s) if s.is_empty() => Ok(context.clone()),
            Value::String(s) => self.parse(s),
            Value::Object(record) => self.parse_record(record),
            _ => Err(LibraryError::MalformedIdentifier),
        }
    }

    /// Parse a title string in the main namespace by default.
    pub fn parse(&self, input: &str) -> LibraryResult<CanonicalPath> {
        let cleaned = clean(input);

        let (mut rest, fragment) = match cleaned.split_once('#') {
            Some((head, tail)) => (head.trim().to_string(), tail.trim().to_string()),
            None => (cleaned.clone(), String::new()),
        };

        let mut namespace = Namespace::MAIN;
        let mut interwiki = String::new();

        // A leading colon forces the main namespace
        if let Some(stripped) = rest.strip_prefix(':') {
            rest = stripped.trim_start().to_string();
        } else if let Some((prefix, remainder)) = rest.split_once(':') {
            if let Some(ns) = Namespace::from_name(prefix) {
                namespace = ns;
                rest = remainder.trim_start().to_string();
            } else if self.is_interwiki(prefix) {
                interwiki = prefix.trim().to_lowercase();
                rest = remainder.trim_start().to_string();
            }
        }

        let text = validate_text(&rest, interwiki.is_empty())?;
        Ok(CanonicalPath::from_parts(namespace, text, fragment, interwiki))
    }

    /// Build a path from discrete parts, validating each one.
    pub fn make_safe(
        &self,
        namespace: i64,
        text: &str,
        fragment: &str,
        interwiki: &str,
    ) -> LibraryResult<CanonicalPath> {
        if Namespace::name(namespace).is_none() {
            return Err(LibraryError::MalformedIdentifier);
        }

        let interwiki = interwiki.trim().to_lowercase();
        if !interwiki.is_empty() && !self.is_interwiki(&interwiki) {
            return Err(LibraryError::MalformedIdentifier);
        }

        let text = validate_text(&clean(text), interwiki.is_empty())?;
        Ok(CanonicalPath::from_parts(
            namespace,
            text,
            fragment.replace('_', " ").trim(),
            interwiki,
        ))
    }

    fn parse_record(&self, record: &Map<String, Value>) -> LibraryResult<CanonicalPath> {
        let namespace = match record.get("namespace") {
            None | Some(Value::Null) => Namespace::MAIN,
            Some(Value::Number(n)) => namespace_number(n)?,
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| LibraryError::MalformedIdentifier)?,
            Some(_) => return Err(LibraryError::MalformedIdentifier),
        };

        let text = match record.get("text") {
            Some(Value::String(s)) => s.as_str(),
            _ => return Err(LibraryError::MalformedIdentifier),
        };

        let fragment = optional_string(record, "fragment")?;
        let interwiki = optional_string(record, "interwiki")?;

        self.make_safe(namespace, text, fragment, interwiki)
    }
}

fn optional_string<'a>(record: &'a Map<String, Value>, field: &str) -> LibraryResult<&'a str> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(LibraryError::MalformedIdentifier),
    }
}

/// Underscores to spaces, trim, and collapse whitespace runs.
fn clean(input: &str) -> String {
    let spaced = input.replace('_', " ");
    whitespace_run().replace_all(spaced.trim(), " ").into_owned()
}

fn validate_text(text: &str, capitalize: bool) -> LibraryResult<String> {
    let text = text.trim();

    if text.is_empty() || text.len() > MAX_TITLE_BYTES || illegal_chars().is_match(text) {
        return Err(LibraryError::MalformedIdentifier);
    }

    if is_relative(text) || text.starts_with(':') {
        return Err(LibraryError::MalformedIdentifier);
    }

    if !capitalize {
        return Ok(text.to_string());
    }

    let mut chars = text.chars();
    Ok(match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    })
}

fn is_relative(text: &str) -> bool {
    text == "."
        || text == ".."
        || text.starts_with("./")
        || text.starts_with("../")
        || text.contains("/./")
        || text.contains("/../")
        || text.ends_with("/.")
        || text.ends_with("/..")
}

/// Namespace id from a JSON number. Script hosts pass integers as doubles,
/// so `828.0` is accepted while `1.5` is not.
fn namespace_number(n: &serde_json::Number) -> LibraryResult<i64> {
    if let Some(id) = n.as_i64() {
        return Ok(id);
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => Ok(f as i64),
        _ => Err(LibraryError::MalformedIdentifier),
    }
}
