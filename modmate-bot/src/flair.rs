//! Submission flair transitions and answer nomination
//!
//! The flair state machine is deliberately tiny: the only transitions are
//! `Support -> Solved` and `Unset -> Solved`, fired by the submission author
//! or a moderator of that submission's subreddit. Everything else is a
//! refused transition, not an error.

use modmate_common::events::{mention, same_user};
use modmate_common::FlairState;
use std::collections::HashSet;

/// State after marking the submission solved, or `None` when no transition
/// applies (already solved)
pub fn solve(current: FlairState) -> Option<FlairState> {
    match current {
        FlairState::Unset | FlairState::Support => Some(FlairState::Solved),
        FlairState::Solved => None,
    }
}

/// Whether `actor` may change this submission's flair: the original author,
/// or a moderator of the submission's own subreddit. `moderators` is the
/// lowercased identity set for that specific subreddit.
pub fn is_authorized(actor: &str, submission_author: &str, moderators: &HashSet<String>) -> bool {
    same_user(actor, submission_author) || moderators.contains(&actor.to_lowercase())
}

/// Build the pinned nomination comment for an accepted answer.
///
/// The helper's text is re-indented as block-quotes, paragraph breaks
/// preserved. Wording differs when a moderator nominates on the author's
/// behalf versus the author nominating directly.
pub fn nomination_comment(
    helper: &str,
    helper_text: &str,
    nominator: &str,
    by_moderator: bool,
) -> String {
    let quoted: String = helper_text
        .trim()
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line.trim_end())
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let attribution = if by_moderator {
        format!(
            "{} (moderator) marked this answer from {} as the accepted solution on the author's behalf:",
            mention(nominator),
            mention(helper),
        )
    } else {
        format!(
            "{} marked this answer from {} as the accepted solution:",
            mention(nominator),
            mention(helper),
        )
    };

    format!("{attribution}\n\n{quoted}")
}
