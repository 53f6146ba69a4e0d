//! Alias/reference dataset
//!
//! The dataset is an externally-maintained JSON document of named
//! categories, each holding entries with a display name, a target link, and
//! searchable aliases:
//!
//! ```json
//! {
//!   "link": [
//!     { "name": "Phone (3a)", "link": "https://...", "aliases": ["phone (3a)", "3a"] }
//!   ],
//!   "wiki": [ ... ]
//! }
//! ```
//!
//! The loaded dataset is an immutable snapshot. Hot reload replaces the
//! snapshot wholesale when the backing file's modification time advances;
//! nothing is ever mutated in place, and a failed reload keeps the previous
//! snapshot serving.

pub mod resolver;

use crate::commands::CommandKind;
use modmate_common::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};

/// Dataset category, one per lookup command
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AliasCategory {
    Link,
    Wiki,
    Glyph,
    App,
    Toy,
    Firmware,
}

impl AliasCategory {
    /// Key naming this category in the dataset document
    pub fn document_key(self) -> &'static str {
        match self {
            AliasCategory::Link => "link",
            AliasCategory::Wiki => "wiki",
            AliasCategory::Glyph => "glyph",
            AliasCategory::App => "app",
            AliasCategory::Toy => "toy",
            AliasCategory::Firmware => "firmware",
        }
    }

    fn from_document_key(key: &str) -> Option<Self> {
        match key {
            "link" => Some(AliasCategory::Link),
            "wiki" => Some(AliasCategory::Wiki),
            "glyph" => Some(AliasCategory::Glyph),
            "app" => Some(AliasCategory::App),
            "toy" => Some(AliasCategory::Toy),
            "firmware" => Some(AliasCategory::Firmware),
            _ => None,
        }
    }

    /// Category a lookup command resolves against
    pub fn for_command(kind: CommandKind) -> Option<Self> {
        match kind {
            CommandKind::Link => Some(AliasCategory::Link),
            CommandKind::Wiki => Some(AliasCategory::Wiki),
            CommandKind::Glyph => Some(AliasCategory::Glyph),
            CommandKind::App => Some(AliasCategory::App),
            CommandKind::Toy => Some(AliasCategory::Toy),
            CommandKind::Firmware => Some(AliasCategory::Firmware),
            _ => None,
        }
    }

    /// Maximum whitespace-separated words a sanitized argument may carry
    /// before resolution fast-fails as over-long garbage
    pub fn max_argument_words(self) -> usize {
        6
    }
}

/// One canonical reference entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub display_name: String,
    pub link: String,
    pub aliases: Vec<String>,
    pub category: AliasCategory,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    link: String,
    aliases: Vec<String>,
}

/// Immutable loaded dataset, grouped by category in document order
#[derive(Debug, Default)]
pub struct AliasIndex {
    by_category: BTreeMap<AliasCategory, Vec<AliasEntry>>,
}

impl AliasIndex {
    /// Parse the JSON dataset document. Unknown category keys are an error
    /// so dataset typos fail loudly instead of silently dropping entries.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<RawEntry>> = serde_json::from_str(text)
            .map_err(|e| Error::Document(format!("alias dataset: {e}")))?;

        let mut by_category: BTreeMap<AliasCategory, Vec<AliasEntry>> = BTreeMap::new();
        for (key, entries) in raw {
            let category = AliasCategory::from_document_key(&key).ok_or_else(|| {
                Error::Document(format!("alias dataset: unknown category {key:?}"))
            })?;
            let bucket = by_category.entry(category).or_default();
            for entry in entries {
                bucket.push(AliasEntry {
                    display_name: entry.name,
                    link: entry.link,
                    aliases: entry.aliases,
                    category,
                });
            }
        }
        Ok(AliasIndex { by_category })
    }

    /// Entries of one category, in document order
    pub fn entries(&self, category: AliasCategory) -> &[AliasEntry] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total entry count across all categories
    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned, versioned snapshot of the alias dataset.
///
/// Reload is a pure "replace snapshot if the source timestamp advanced"
/// operation, checked on lookup dispatch rather than on a poll loop.
#[derive(Debug)]
pub struct AliasSnapshot {
    path: PathBuf,
    modified: Option<SystemTime>,
    index: Arc<AliasIndex>,
}

impl AliasSnapshot {
    /// Load the dataset from `path`
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)?;
        let index = AliasIndex::from_json(&text)?;
        let modified = file_mtime(&path);
        Ok(AliasSnapshot {
            path,
            modified,
            index: Arc::new(index),
        })
    }

    pub fn index(&self) -> &AliasIndex {
        &self.index
    }

    /// Replace the snapshot if the backing file changed since it was taken.
    ///
    /// Returns true when a new snapshot was installed. A reload failure
    /// keeps the current snapshot serving and logs a warning.
    pub fn maybe_reload(&mut self) -> bool {
        let current = file_mtime(&self.path);
        let advanced = match (self.modified, current) {
            (Some(prev), Some(now)) => now > prev,
            // If we could not stat the file before but can now, reload.
            (None, Some(_)) => true,
            (_, None) => false,
        };
        if !advanced {
            return false;
        }

        match std::fs::read_to_string(&self.path)
            .map_err(Error::from)
            .and_then(|text| AliasIndex::from_json(&text))
        {
            Ok(index) => {
                info!(
                    path = %self.path.display(),
                    entries = index.len(),
                    "alias dataset reloaded"
                );
                self.index = Arc::new(index);
                self.modified = current;
                true
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "alias dataset reload failed, keeping previous snapshot"
                );
                false
            }
        }
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DATASET: &str = r#"{
        "link": [
            { "name": "Phone (3a)", "link": "https://example.com/3a", "aliases": ["phone (3a)", "3a"] },
            { "name": "Charger", "link": "https://example.com/charger", "aliases": ["charger", "45w charger"] }
        ],
        "wiki": [
            { "name": "Glyph Guide", "link": "https://example.com/wiki/glyphs#guide", "aliases": ["glyph guide"] }
        ]
    }"#;

    #[test]
    fn test_from_json_groups_by_category() {
        let index = AliasIndex::from_json(DATASET).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.entries(AliasCategory::Link).len(), 2);
        assert_eq!(index.entries(AliasCategory::Wiki).len(), 1);
        assert!(index.entries(AliasCategory::Glyph).is_empty());
        let first = &index.entries(AliasCategory::Link)[0];
        assert_eq!(first.display_name, "Phone (3a)");
        assert_eq!(first.category, AliasCategory::Link);
    }

    #[test]
    fn test_unknown_category_key_fails_loudly() {
        let err = AliasIndex::from_json(r#"{ "links": [] }"#).unwrap_err();
        assert!(matches!(err, Error::Document(_)));
    }

    #[test]
    fn test_snapshot_reloads_when_mtime_advances() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{DATASET}").unwrap();
        file.flush().unwrap();

        let mut snapshot = AliasSnapshot::load(file.path()).unwrap();
        assert_eq!(snapshot.index().len(), 3);
        assert!(!snapshot.maybe_reload(), "unchanged file must not reload");

        // Rewrite the dataset and force the mtime forward; coarse filesystem
        // timestamps otherwise make this race on fast machines.
        std::fs::write(
            file.path(),
            r#"{ "link": [ { "name": "Dock", "link": "https://example.com/dock", "aliases": ["dock"] } ] }"#,
        )
        .unwrap();
        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(2);
        file.as_file().set_modified(later).unwrap();

        assert!(snapshot.maybe_reload());
        assert_eq!(snapshot.index().len(), 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{DATASET}").unwrap();
        file.flush().unwrap();

        let mut snapshot = AliasSnapshot::load(file.path()).unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();
        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(2);
        file.as_file().set_modified(later).unwrap();

        assert!(!snapshot.maybe_reload());
        assert_eq!(snapshot.index().len(), 3, "previous snapshot must survive");
    }
}
