//! Reference resolution: exact alias match, then ranked fuzzy suggestions
//!
//! Resolution never errors: every outcome, including garbage input, maps to
//! a [`Resolution`] variant the dispatcher turns into a reply.

use super::{AliasCategory, AliasEntry};
use std::cmp::Ordering;

/// Minimum similarity for a fuzzy suggestion
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Maximum number of fuzzy suggestions surfaced
pub const MAX_SUGGESTIONS: usize = 3;

/// One fuzzy candidate, carrying the alias that matched and the entry that
/// owns it
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub display_name: String,
    pub link: String,
    pub alias: String,
    pub similarity: f64,
}

/// Resolution outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The argument is an alias of exactly this entry
    Exact { display_name: String, link: String },
    /// No exact hit; up to three close aliases, best first, deduplicated by
    /// owning entry
    Suggestions(Vec<Suggestion>),
    /// The argument has more words than any legitimate query in this
    /// category; distinct from an ordinary miss
    TooLong,
    /// Nothing matched and nothing came close
    NoMatch,
}

/// Resolve a sanitized argument against a category's entries.
///
/// Exact matching is a normalized membership test over every entry's alias
/// set; the first entry in dataset order wins and no fuzzy scoring runs.
/// Fuzzy matching scores every alias with a normalized edit-distance ratio.
pub fn resolve(argument: &str, category: AliasCategory, entries: &[AliasEntry]) -> Resolution {
    if argument.split_whitespace().count() > category.max_argument_words() {
        return Resolution::TooLong;
    }

    for entry in entries {
        if entry
            .aliases
            .iter()
            .any(|alias| alias.to_lowercase() == argument)
        {
            return Resolution::Exact {
                display_name: entry.display_name.clone(),
                link: entry.link.clone(),
            };
        }
    }

    // Score every alias; keep candidates over the threshold, best first.
    // The sort is stable, so equal scores keep dataset order.
    let mut scored: Vec<(f64, &AliasEntry, &str)> = Vec::new();
    for entry in entries {
        for alias in &entry.aliases {
            let similarity = strsim::normalized_levenshtein(argument, &alias.to_lowercase());
            if similarity >= SIMILARITY_THRESHOLD {
                scored.push((similarity, entry, alias));
            }
        }
    }
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.truncate(MAX_SUGGESTIONS);

    // The same entry may own several close aliases; only its best hit is
    // surfaced, preserving the similarity ranking.
    let mut suggestions: Vec<Suggestion> = Vec::new();
    for (similarity, entry, alias) in scored {
        if suggestions
            .iter()
            .any(|s| s.display_name == entry.display_name)
        {
            continue;
        }
        suggestions.push(Suggestion {
            display_name: entry.display_name.clone(),
            link: entry.link.clone(),
            alias: alias.to_string(),
            similarity,
        });
    }

    if suggestions.is_empty() {
        Resolution::NoMatch
    } else {
        Resolution::Suggestions(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, link: &str, aliases: &[&str]) -> AliasEntry {
        AliasEntry {
            display_name: name.to_string(),
            link: link.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            category: AliasCategory::Link,
        }
    }

    fn entries() -> Vec<AliasEntry> {
        vec![
            entry(
                "Glyphify",
                "https://example.com/glyphify",
                &["glyphify", "glyph matrix", "glyphtones"],
            ),
            entry(
                "Phone (3a)",
                "https://example.com/3a",
                &["phone (3a)", "3a"],
            ),
        ]
    }

    #[test]
    fn test_exact_match_skips_fuzzy() {
        let resolution = resolve("phone (3a)", AliasCategory::Link, &entries());
        assert_eq!(
            resolution,
            Resolution::Exact {
                display_name: "Phone (3a)".to_string(),
                link: "https://example.com/3a".to_string(),
            }
        );
    }

    #[test]
    fn test_exact_match_first_entry_wins_ties() {
        let dupes = vec![
            entry("First", "https://example.com/1", &["shared"]),
            entry("Second", "https://example.com/2", &["shared"]),
        ];
        let resolution = resolve("shared", AliasCategory::Link, &dupes);
        assert!(matches!(
            resolution,
            Resolution::Exact { display_name, .. } if display_name == "First"
        ));
    }

    #[test]
    fn test_fuzzy_ranking_prefers_closest_alias() {
        let resolution = resolve("glyphfy", AliasCategory::Link, &entries());
        let Resolution::Suggestions(suggestions) = resolution else {
            panic!("expected suggestions");
        };
        assert!(suggestions.len() <= MAX_SUGGESTIONS);
        assert_eq!(suggestions[0].alias, "glyphify");
        for s in &suggestions {
            assert!(s.similarity >= SIMILARITY_THRESHOLD);
        }
    }

    #[test]
    fn test_suggestions_deduplicate_by_owning_entry() {
        // "glyphify" and "glyphtones" both belong to the Glyphify entry;
        // only its best alias may surface.
        let resolution = resolve("glyphton", AliasCategory::Link, &entries());
        let Resolution::Suggestions(suggestions) = resolution else {
            panic!("expected suggestions");
        };
        let names: Vec<&str> = suggestions.iter().map(|s| s.display_name.as_str()).collect();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names, deduped);
    }

    #[test]
    fn test_no_match_below_threshold() {
        let resolution = resolve("zzzzzz", AliasCategory::Link, &entries());
        assert_eq!(resolution, Resolution::NoMatch);
    }

    #[test]
    fn test_over_long_argument_fast_fails() {
        let resolution = resolve(
            "one two three four five six seven",
            AliasCategory::Link,
            &entries(),
        );
        assert_eq!(resolution, Resolution::TooLong);
    }

    #[test]
    fn test_empty_entry_list_is_no_match() {
        assert_eq!(resolve("anything", AliasCategory::Link, &[]), Resolution::NoMatch);
    }
}
