//! Argument sanitization before alias lookup
//!
//! Lookup arguments arrive as free text: filler words, punctuation, emoji,
//! emoticons. Everything the alias dataset does not care about is stripped
//! before resolution. Sanitization is idempotent, so re-sanitizing an
//! already-clean argument is a no-op.

use once_cell::sync::Lazy;
use regex::Regex;

/// Emoticon glyph sequences (`:)`, `;-)`, `:p`, `xd`, `<3`, `^^`, ...).
/// Matched against already-lowercased text, before punctuation stripping
/// (otherwise `<3` would leave a stray `3` behind).
static EMOTICON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[:;=8][-']?[()\[\]dpo3/\\|*]|\bx[do]\b|<3|\^_?\^").expect("valid emoticon pattern")
});

/// Argument terms marking an accessory lookup, where the product brand word
/// is noise rather than signal
const ACCESSORY_MARKERS: [&str; 2] = ["ear", "phone"];

/// Whole-word stop-word and glyph stripper for lookup arguments
#[derive(Debug, Clone)]
pub struct Sanitizer {
    stop_words: Vec<String>,
}

impl Sanitizer {
    /// Build from the configured stop-word list (matched whole-word,
    /// case-insensitively)
    pub fn new(stop_words: Vec<String>) -> Self {
        Sanitizer {
            stop_words: stop_words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Normalize a raw lookup argument.
    ///
    /// Lowercases, strips emoticon sequences and emoji code points, replaces
    /// punctuation with spaces (parentheses survive, they are significant in
    /// aliases like `phone (3a)`), drops stop words, and collapses runs of
    /// whitespace.
    pub fn sanitize(&self, raw: &str) -> String {
        let lowered = raw.to_lowercase();
        let no_emoticons = EMOTICON.replace_all(&lowered, " ");
        let cleaned: String = no_emoticons
            .chars()
            .map(|c| {
                if is_emoji(c) {
                    ' '
                } else if c.is_alphanumeric() || c.is_whitespace() || c == '(' || c == ')' {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        cleaned
            .split_whitespace()
            .filter(|word| word.chars().any(char::is_alphanumeric))
            .filter(|word| !self.stop_words.iter().any(|s| s == word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Emoji and related presentation code points
fn is_emoji(c: char) -> bool {
    matches!(u32::from(c),
        0x1F000..=0x1FAFF   // pictographs, smileys, symbols
        | 0x2600..=0x27BF   // misc symbols and dingbats
        | 0x1F1E6..=0x1F1FF // regional indicators
        | 0xFE0E..=0xFE0F   // variation selectors
        | 0x200D            // zero-width joiner
        | 0x2B00..=0x2BFF   // arrows and stars
    )
}

/// Whether an argument looks like an accessory lookup whose brand prefix
/// should be ignored
pub fn wants_brand_strip(argument: &str) -> bool {
    ACCESSORY_MARKERS
        .iter()
        .any(|marker| argument.contains(marker))
}

/// Remove the product brand word from an argument, re-collapsing whitespace
pub fn strip_brand(argument: &str, brand: &str) -> String {
    argument
        .replace(brand, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
