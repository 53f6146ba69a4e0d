//! Once-per-thread grant guard
//!
//! A helper may be thanked at most once per submission thread. There is no
//! grant ledger: the thread itself is the record. The guard walks the
//! submission's full comment tree looking for an earlier bot-authored
//! confirmation addressed to the same recipient, posted in direct reply to
//! a grant comment from the submission author.

use crate::platform::{TreeSource, TreeWalker, WalkedComment};
use modmate_common::events::same_user;
use modmate_common::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Keyword of the grant command
pub const GRANT_KEYWORD: &str = "thanks";

/// Canonical confirmation pattern posted when a grant is registered.
/// The `thanks_confirmation` response template must stay recognizable by
/// this pattern or earlier grants become invisible to the guard.
static CONFIRMATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)thanks registered[^\n]*?\bu/([\w-]+)").expect("valid confirmation pattern")
});

/// Recipient addressed by a confirmation reply, if the text is one
pub fn confirmation_recipient(body: &str) -> Option<&str> {
    CONFIRMATION
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// A grant where the actor thanks themselves is rejected outright,
/// regardless of prior history or moderator status
pub fn is_self_grant(actor: &str, recipient: &str) -> bool {
    same_user(actor, recipient)
}

/// A grant targeting the bot itself gets a static acknowledgement and is
/// never recorded
pub fn is_bot_target(recipient: &str, bot_identity: &str) -> bool {
    same_user(recipient, bot_identity)
}

/// Whether this thread has already granted `recipient` a point.
///
/// Walks every comment in the submission tree, expanding placeholders on
/// demand. A prior grant is a bot-authored confirmation addressed to
/// `recipient` whose parent comment is by the submission author and
/// contains the grant keyword.
pub async fn already_granted<S: TreeSource>(
    source: &S,
    submission_id: &str,
    submission_author: &str,
    bot_identity: &str,
    recipient: &str,
) -> Result<bool> {
    let token = format!("!{GRANT_KEYWORD}");
    let roots = source.top_level(submission_id).await?;
    let mut walker = TreeWalker::new(source, roots);

    while let Some(walked) = walker.next().await? {
        if confirms_grant(&walked, &token, submission_author, bot_identity, recipient) {
            debug!(comment = %walked.comment.id, "prior grant found in thread");
            return Ok(true);
        }
    }
    Ok(false)
}

fn confirms_grant(
    walked: &WalkedComment,
    grant_token: &str,
    submission_author: &str,
    bot_identity: &str,
    recipient: &str,
) -> bool {
    let Some(parent) = &walked.parent else {
        return false;
    };
    same_user(&walked.comment.author, bot_identity)
        && same_user(&parent.author, submission_author)
        && parent.body.to_lowercase().contains(grant_token)
        && confirmation_recipient(&walked.comment.body)
            .is_some_and(|addressed| same_user(addressed, recipient.trim_start_matches("u/")))
}
