//! Command detection and parsing
//!
//! Commands are embedded in free-form comment text as `!keyword [argument]`.
//! Detection produces a closed [`CommandKind`] enumeration so dispatch is an
//! exhaustive match instead of scattered string checks. Detection order is
//! fixed: commands are not mutually exclusive per comment, and every kind
//! present in the text is dispatched, in priority order.

pub mod sanitize;

/// All commands the engine understands.
///
/// The lookup family (`Link` through `Firmware`) resolves an argument
/// against the alias dataset; the rest act on the thread itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Mark the submission solved
    Solved,
    /// Mark solved and nominate the parent comment as the accepted answer
    Answer,
    /// Award the parent comment's author a leaderboard point
    Thanks,
    /// Post the support contact channels
    Support,
    /// Post the feedback form link
    Feedback,
    /// Look up a reference link
    Link,
    /// Look up a community wiki page
    Wiki,
    /// Look up a glyph pattern reference
    Glyph,
    /// Look up a companion app reference
    App,
    /// Look up an accessory reference
    Toy,
    /// Look up a firmware release reference
    Firmware,
}

impl CommandKind {
    /// Dispatch priority order. Earlier commands run first, but a match does
    /// not stop later commands in the same comment from running.
    pub const PRIORITY: [CommandKind; 11] = [
        CommandKind::Solved,
        CommandKind::Answer,
        CommandKind::Thanks,
        CommandKind::Support,
        CommandKind::Feedback,
        CommandKind::Link,
        CommandKind::Wiki,
        CommandKind::Glyph,
        CommandKind::App,
        CommandKind::Toy,
        CommandKind::Firmware,
    ];

    /// Keyword as written after the `!` sigil
    pub fn keyword(self) -> &'static str {
        match self {
            CommandKind::Solved => "solved",
            CommandKind::Answer => "answer",
            CommandKind::Thanks => "thanks",
            CommandKind::Support => "support",
            CommandKind::Feedback => "feedback",
            CommandKind::Link => "link",
            CommandKind::Wiki => "wiki",
            CommandKind::Glyph => "glyph",
            CommandKind::App => "app",
            CommandKind::Toy => "toy",
            CommandKind::Firmware => "firmware",
        }
    }

    /// Whether this command resolves an argument against the alias dataset
    pub fn is_lookup(self) -> bool {
        matches!(
            self,
            CommandKind::Link
                | CommandKind::Wiki
                | CommandKind::Glyph
                | CommandKind::App
                | CommandKind::Toy
                | CommandKind::Firmware
        )
    }
}

/// One recognized command occurrence in a comment body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub kind: CommandKind,
    /// Argument text up to the next line break, trimmed. May be empty,
    /// which is distinct from the keyword being absent entirely.
    pub argument: String,
    /// Whether the keyword also appears quoted somewhere in the body
    pub quoted: bool,
}

/// Return every command whose keyword occurs in `body`, in priority order
pub fn detect(body: &str) -> Vec<CommandKind> {
    let lower = body.to_lowercase();
    CommandKind::PRIORITY
        .iter()
        .copied()
        .filter(|kind| lower.contains(&format!("!{}", kind.keyword())))
        .collect()
}

/// Extract the command and its argument from `body`.
///
/// The argument spans from just after the keyword to the next line break
/// (or end of text), trimmed and lowercased; lookup arguments are
/// normalized further by the sanitizer anyway. Returns `None` when the
/// keyword does not occur.
pub fn parse(body: &str, kind: CommandKind) -> Option<ParsedCommand> {
    let lower = body.to_lowercase();
    let token = format!("!{}", kind.keyword());
    let start = lower.find(&token)? + token.len();
    let end = lower[start..]
        .find('\n')
        .map(|offset| start + offset)
        .unwrap_or(lower.len());
    Some(ParsedCommand {
        kind,
        argument: lower[start..end].trim().to_string(),
        quoted: is_quoted(body, kind.keyword()),
    })
}

/// Whether the keyword appears wrapped in matching quote characters.
///
/// A quoted command is discussion ("just type `\"!solved\"`"), not an
/// invocation, and must not execute. Recognizes double quotes, single
/// quotes, backticks, and the escaped double-quote form.
pub fn is_quoted(body: &str, keyword: &str) -> bool {
    let lower = body.to_lowercase();
    let token = format!("!{keyword}");
    const QUOTE_PAIRS: [(&str, &str); 4] = [
        ("\"", "\""),
        ("'", "'"),
        ("`", "`"),
        ("\\\"", "\\\""),
    ];
    QUOTE_PAIRS
        .iter()
        .any(|(open, close)| lower.contains(&format!("{open}{token}{close}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_takes_argument_to_end_of_line() {
        let parsed = parse("hey !link phone (3a)\nthanks in advance", CommandKind::Link).unwrap();
        assert_eq!(parsed.argument, "phone (3a)");
        assert!(!parsed.quoted);
    }

    #[test]
    fn test_parse_takes_argument_to_end_of_text() {
        let parsed = parse("!wiki glyph matrix", CommandKind::Wiki).unwrap();
        assert_eq!(parsed.argument, "glyph matrix");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let parsed = parse("!LINK Charger", CommandKind::Link).unwrap();
        assert_eq!(parsed.argument, "charger");
    }

    #[test]
    fn test_parse_missing_keyword_is_none() {
        assert!(parse("no commands here", CommandKind::Link).is_none());
    }

    #[test]
    fn test_parse_empty_argument_is_distinct_from_missing() {
        let parsed = parse("!link \nmore text", CommandKind::Link).unwrap();
        assert_eq!(parsed.argument, "");
    }

    #[test]
    fn test_detect_preserves_priority_order() {
        let kinds = detect("!link charger and also !solved, cheers");
        assert_eq!(kinds, vec![CommandKind::Solved, CommandKind::Link]);
    }

    #[test]
    fn test_detect_empty_for_plain_text() {
        assert!(detect("a perfectly ordinary comment").is_empty());
    }

    #[test]
    fn test_is_quoted_double_single_backtick() {
        assert!(is_quoted("just write \"!solved\" as a reply", "solved"));
        assert!(is_quoted("just write '!solved' as a reply", "solved"));
        assert!(is_quoted("just write `!solved` as a reply", "solved"));
    }

    #[test]
    fn test_is_quoted_escaped_form() {
        assert!(is_quoted("the bot reacts to \\\"!solved\\\" comments", "solved"));
    }

    #[test]
    fn test_unquoted_is_not_quoted() {
        assert!(!is_quoted("!solved", "solved"));
        assert!(!is_quoted("ok !solved thanks", "solved"));
    }

    #[test]
    fn test_mismatched_quotes_are_not_quoted() {
        assert!(!is_quoted("\"!solved' is what you type", "solved"));
    }
}
