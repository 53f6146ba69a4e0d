//! Canned response templates
//!
//! The `[responses]` config table is consumed as opaque key -> string
//! lookups. Lookups are exact-key: a missing (or mistyped, e.g. trailing
//! whitespace) key surfaces `Error::Template` instead of silently dropping
//! the response, so typos fail during startup validation rather than in
//! production replies.

use crate::{Error, Result};
use std::collections::BTreeMap;

/// Placeholder substituted with the relevant user mention
pub const USER_PLACEHOLDER: &str = "<user>";

/// Key holding the comma-separated stop-word list for argument sanitizing
pub const STOP_WORDS_KEY: &str = "stop_words";

/// Immutable response template map
#[derive(Debug, Clone)]
pub struct Templates {
    map: BTreeMap<String, String>,
}

impl Templates {
    pub fn new(map: BTreeMap<String, String>) -> Self {
        Templates { map }
    }

    /// Exact-key lookup. Missing keys are an error, never a fallback.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.map
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::Template(key.to_string()))
    }

    /// Exact-key lookup for keys that are allowed to be absent
    /// (per-category footers).
    pub fn maybe(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Look up `key` and substitute the `<user>` placeholder
    pub fn render(&self, key: &str, user_mention: &str) -> Result<String> {
        Ok(self.get(key)?.replace(USER_PLACEHOLDER, user_mention))
    }

    /// Parse the configured stop-word list (comma-separated, trimmed,
    /// empties dropped)
    pub fn stop_words(&self) -> Result<Vec<String>> {
        Ok(self
            .get(STOP_WORDS_KEY)?
            .split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Check that every required key is present, reporting the first miss.
    ///
    /// Run once at startup so a missing template aborts before any event is
    /// consumed.
    pub fn validate(&self, required: &[&str]) -> Result<()> {
        for key in required {
            self.get(key)?;
        }
        Ok(())
    }
}
