//! Identifier validation and the injected reserved-keyword set

use std::sync::OnceLock;

const QUOTES: [char; 3] = ['\'', '"', '`'];

/// A case-insensitive set of reserved SQL keywords.
///
/// The set is plain configuration: validation consults whichever set it is
/// handed, and an empty set disables keyword rejection entirely. A process-wide
/// default (empty unless overridden via [`set_default_keywords`]) backs the
/// convenience [`is_valid_identifier`] entry point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keywords {
    words: Vec<String>,
}

impl Keywords {
    /// Build a keyword set from any iterable of words.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().to_uppercase())
            .collect();
        words.sort();
        words.dedup();
        Self { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, word: &str) -> bool {
        if self.words.is_empty() {
            return false;
        }
        self.words.binary_search(&word.to_uppercase()).is_ok()
    }
}

static DEFAULT_KEYWORDS: OnceLock<Keywords> = OnceLock::new();

/// Install the process-wide default keyword set.
///
/// Takes effect once; returns the set back on failure if a default was
/// already installed.
pub fn set_default_keywords(keywords: Keywords) -> std::result::Result<(), Keywords> {
    DEFAULT_KEYWORDS.set(keywords)
}

/// The process-wide default keyword set (empty unless overridden).
pub fn default_keywords() -> &'static Keywords {
    static EMPTY: Keywords = Keywords { words: Vec::new() };
    DEFAULT_KEYWORDS.get().unwrap_or(&EMPTY)
}

/// Validate an identifier against the process-wide default keyword set.
pub fn is_valid_identifier(ident: &str) -> bool {
    is_valid_identifier_with(ident, default_keywords())
}

/// Validate an identifier against an explicit keyword set.
///
/// A bare `*` is always valid (wildcard). A form opening with one of the
/// three quote characters is valid iff its matching closing quote is the
/// last character. An unquoted form must start with an ASCII letter,
/// continue with letters, digits, underscores or dots, and must not be a
/// reserved keyword.
pub fn is_valid_identifier_with(ident: &str, keywords: &Keywords) -> bool {
    if ident == "*" {
        return true;
    }
    let mut chars = ident.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if QUOTES.contains(&first) {
        let rest = chars.as_str();
        match rest.find(first) {
            Some(pos) => rest[pos + first.len_utf8()..].is_empty(),
            None => false,
        }
    } else {
        if keywords.contains(ident) {
            return false;
        }
        first.is_ascii_alphabetic()
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    }
}
