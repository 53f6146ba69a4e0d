//! Event and action types for the ModMate engine
//!
//! A `CommentEvent` is what the upstream feed delivers for every new comment;
//! it is read-only to the engine and scoped to one dispatch cycle. An
//! `Action` is what the engine asks the platform to perform in response.
//! Both serialize to JSON so the local adapter can replay recorded sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Case-insensitive identity comparison. Platform identities preserve
/// display casing but compare caselessly.
pub fn same_user(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Render an identity as a mention, leaving an existing prefix alone
pub fn mention(username: &str) -> String {
    if username.starts_with("u/") {
        username.to_string()
    } else {
        format!("u/{username}")
    }
}

/// Submission status tag managed by the engine.
///
/// The only legal transitions are `Support -> Solved` and `Unset -> Solved`;
/// see `modmate_bot::flair` for the transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlairState {
    /// No category assigned yet
    Unset,
    /// Open support request
    Support,
    /// Resolved support request
    Solved,
}

impl FlairState {
    /// Display name used in logs and rendered replies
    pub fn as_str(self) -> &'static str {
        match self {
            FlairState::Unset => "unset",
            FlairState::Support => "support",
            FlairState::Solved => "solved",
        }
    }
}

/// What a comment is attached to: another comment, or the submission itself.
///
/// Several commands require a comment parent (e.g. thanking the helper you
/// are replying to); the engine must be able to tell the two apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ParentRef {
    /// Reply to another comment
    Comment {
        id: String,
        author: String,
        /// Raw text of the parent comment, needed when nominating it as the
        /// accepted answer (the nomination quotes it).
        body: String,
    },
    /// Top-level comment directly under the submission
    Submission,
}

impl ParentRef {
    /// Author of the parent comment, if the parent is a comment
    pub fn comment_author(&self) -> Option<&str> {
        match self {
            ParentRef::Comment { author, .. } => Some(author),
            ParentRef::Submission => None,
        }
    }
}

/// Submission the comment lives under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionInfo {
    pub id: String,
    /// Original author of the submission
    pub author: String,
    /// Current flair category at event time
    pub flair: FlairState,
}

/// One comment delivered by the upstream feed.
///
/// `body` is the lowercased text used for command detection; `body_raw`
/// preserves the original casing for quoting and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEvent {
    pub id: String,
    pub author: String,
    pub body: String,
    pub body_raw: String,
    pub parent: ParentRef,
    pub submission: SubmissionInfo,
    pub subreddit: String,
    /// When the feed observed the comment
    pub observed_at: DateTime<Utc>,
}

/// Output action produced by one dispatch cycle.
///
/// Actions are computed in full before any of them is applied, so a failed
/// cycle never leaves a partially-written leaderboard or a duplicate reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Post a reply under an existing comment
    Reply { comment_id: String, body: String },

    /// Change the submission's flair category
    SelectFlair {
        submission_id: String,
        state: FlairState,
    },

    /// Post a new top-level comment under a submission, optionally pinned
    SubmitComment {
        submission_id: String,
        body: String,
        sticky: bool,
    },

    /// Rewrite a named backing document in full (leaderboard updates)
    WriteDocument {
        name: String,
        content: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_user_ignores_case() {
        assert!(same_user("Alice", "alice"));
        assert!(!same_user("alice", "bob"));
    }

    #[test]
    fn test_mention_is_idempotent() {
        assert_eq!(mention("alice"), "u/alice");
        assert_eq!(mention("u/alice"), "u/alice");
    }

    #[test]
    fn test_parent_ref_comment_author() {
        let parent = ParentRef::Comment {
            id: "c1".into(),
            author: "alice".into(),
            body: "try rebooting".into(),
        };
        assert_eq!(parent.comment_author(), Some("alice"));
        assert_eq!(ParentRef::Submission.comment_author(), None);
    }

    #[test]
    fn test_action_serializes_with_type_tag() {
        let action = Action::SelectFlair {
            submission_id: "s1".into(),
            state: FlairState::Solved,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"type\":\"SelectFlair\""));
        assert!(json.contains("\"Solved\""));
    }
}
