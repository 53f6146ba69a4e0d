//! Event dispatcher
//!
//! Single-consumer loop over the comment feed. Each event is handled in two
//! stages: `handle_event` computes the full action list without submitting
//! anything, then `apply` performs the actions. A cycle that fails while
//! computing therefore leaves no partial leaderboard writes and no
//! duplicate replies.
//!
//! Command routing runs in fixed priority order, and every command present
//! in a comment runs; commands are not mutually exclusive per event.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::commands::{self, sanitize, CommandKind};
use crate::commands::sanitize::Sanitizer;
use crate::flair;
use crate::leaderboard::{self, PointsLabel};
use crate::platform::{CommentFeed, Platform, TreeSource};
use crate::reference::resolver::{self, Resolution, Suggestion};
use crate::reference::{AliasCategory, AliasSnapshot};
use crate::thanks;
use modmate_common::config::BotSection;
use modmate_common::events::{mention, same_user};
use modmate_common::{Action, CommentEvent, Error, ParentRef, Result, Templates};

/// Response template keys the dispatcher renders. Validated at startup so a
/// missing key aborts before any event is consumed.
pub const REQUIRED_TEMPLATE_KEYS: &[&str] = &[
    "footer",
    "solved_response",
    "answer_parent_required",
    "support_response",
    "feedback_response",
    "thanks_confirmation",
    "thanks_self",
    "thanks_bot",
    "thanks_already",
    "thanks_parent_required",
    "thanks_custom_ack",
    "no_match",
    "stop_words",
    "link_usage",
    "wiki_usage",
    "glyph_usage",
    "app_usage",
    "toy_usage",
    "firmware_usage",
];

/// Engine settings the dispatcher needs per cycle
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub bot_username: String,
    pub leaderboard_document: String,
    pub backoff: Duration,
    pub send_responses: bool,
    pub brand_word: Option<String>,
}

impl From<&BotSection> for DispatcherConfig {
    fn from(bot: &BotSection) -> Self {
        DispatcherConfig {
            bot_username: bot.username.clone(),
            leaderboard_document: bot.leaderboard_document.clone(),
            backoff: Duration::from_secs(bot.backoff_secs),
            send_responses: bot.send_responses,
            brand_word: bot.brand_word.clone(),
        }
    }
}

/// Load the per-subreddit moderator snapshot injected into each cycle.
/// Keys and identities are lowercased for caseless membership tests.
pub async fn load_moderator_snapshot<P: Platform>(
    platform: &P,
    subreddits: &[String],
) -> Result<HashMap<String, HashSet<String>>> {
    let mut snapshot = HashMap::new();
    for subreddit in subreddits {
        let mods = platform.moderators(subreddit).await?;
        info!(subreddit = %subreddit, moderators = mods.len(), "moderator set loaded");
        snapshot.insert(
            subreddit.to_lowercase(),
            mods.into_iter().map(|m| m.to_lowercase()).collect(),
        );
    }
    Ok(snapshot)
}

/// Top-level engine loop
pub struct Dispatcher<F, P>
where
    F: CommentFeed,
    P: Platform + TreeSource,
{
    feed: F,
    platform: P,
    config: DispatcherConfig,
    templates: Templates,
    sanitizer: Sanitizer,
    aliases: AliasSnapshot,
    moderators: HashMap<String, HashSet<String>>,
}

impl<F, P> Dispatcher<F, P>
where
    F: CommentFeed,
    P: Platform + TreeSource,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feed: F,
        platform: P,
        config: DispatcherConfig,
        templates: Templates,
        sanitizer: Sanitizer,
        aliases: AliasSnapshot,
        moderators: HashMap<String, HashSet<String>>,
    ) -> Self {
        Dispatcher {
            feed,
            platform,
            config,
            templates,
            sanitizer,
            aliases,
            moderators,
        }
    }

    /// Platform collaborator, for post-run inspection
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Drain the feed until it closes or a fatal error occurs. Transient
    /// failures back off for the configured delay and resume; the failed
    /// cycle's actions are abandoned, never partially applied.
    pub async fn run(&mut self) -> Result<()> {
        info!(bot = %self.config.bot_username, "dispatcher running");
        loop {
            let event = match self.feed.next_event().await {
                Ok(event) => event,
                Err(Error::FeedClosed) => {
                    info!("event feed closed, shutting down");
                    return Ok(());
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        error = %e,
                        backoff_secs = self.config.backoff.as_secs(),
                        "feed error, backing off"
                    );
                    tokio::time::sleep(self.config.backoff).await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.dispatch(&event).await {
                Ok(()) => {}
                Err(e) if e.is_transient() => {
                    warn!(
                        comment = %event.id,
                        error = %e,
                        "dispatch failed, backing off"
                    );
                    tokio::time::sleep(self.config.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Handle one event: compute all actions, then apply them
    pub async fn dispatch(&mut self, event: &CommentEvent) -> Result<()> {
        let actions = self.handle_event(event).await?;
        self.apply(event, actions).await
    }

    async fn handle_event(&mut self, event: &CommentEvent) -> Result<Vec<Action>> {
        if same_user(&event.author, &self.config.bot_username) {
            debug!(comment = %event.id, "skipping own comment");
            return Ok(Vec::new());
        }
        debug!(
            comment = %event.id,
            author = %event.author,
            submission = %event.submission.id,
            "processing comment"
        );

        let mut actions = Vec::new();
        for kind in commands::detect(&event.body) {
            if commands::is_quoted(&event.body, kind.keyword()) {
                debug!(command = kind.keyword(), "quoted command ignored");
                continue;
            }
            match kind {
                CommandKind::Solved => self.handle_solved(event, &mut actions)?,
                CommandKind::Answer => self.handle_answer(event, &mut actions)?,
                CommandKind::Thanks => self.handle_thanks(event, &mut actions).await?,
                CommandKind::Support => self.handle_support(event, &mut actions)?,
                CommandKind::Feedback => self.handle_feedback(event, &mut actions)?,
                lookup => self.handle_lookup(event, lookup, &mut actions)?,
            }
        }
        Ok(actions)
    }

    async fn apply(&self, event: &CommentEvent, actions: Vec<Action>) -> Result<()> {
        for action in actions {
            if !self.config.send_responses {
                info!(
                    comment = %event.id,
                    ?action,
                    "send_responses disabled, action not submitted"
                );
                continue;
            }
            match &action {
                Action::Reply { comment_id, body } => {
                    debug!(comment = %comment_id, "posting reply");
                    self.platform.reply(comment_id, body).await?;
                }
                Action::SelectFlair {
                    submission_id,
                    state,
                } => {
                    info!(submission = %submission_id, state = state.as_str(), "selecting flair");
                    self.platform.select_flair(submission_id, *state).await?;
                }
                Action::SubmitComment {
                    submission_id,
                    body,
                    sticky,
                } => {
                    info!(submission = %submission_id, sticky, "submitting comment");
                    self.platform.submit_comment(submission_id, body, *sticky).await?;
                }
                Action::WriteDocument {
                    name,
                    content,
                    reason,
                } => {
                    info!(document = %name, reason = %reason, "rewriting document");
                    self.platform.write_document(name, content, reason).await?;
                }
            }
        }
        Ok(())
    }

    // ========================================
    // Per-command handlers
    // ========================================

    fn handle_solved(&self, event: &CommentEvent, actions: &mut Vec<Action>) -> Result<()> {
        if !self.authorized(event) {
            debug!(author = %event.author, "unauthorized !solved ignored");
            return Ok(());
        }
        let Some(next) = flair::solve(event.submission.flair) else {
            debug!(submission = %event.submission.id, "submission already solved");
            return Ok(());
        };
        info!(submission = %event.submission.id, "marking solved");
        actions.push(Action::SelectFlair {
            submission_id: event.submission.id.clone(),
            state: next,
        });
        let body = self.templates.render("solved_response", &mention(&event.author))?;
        actions.push(self.reply(event, body)?);
        Ok(())
    }

    fn handle_answer(&self, event: &CommentEvent, actions: &mut Vec<Action>) -> Result<()> {
        if !self.authorized(event) {
            debug!(author = %event.author, "unauthorized !answer ignored");
            return Ok(());
        }
        let ParentRef::Comment {
            author: helper,
            body: helper_text,
            ..
        } = &event.parent
        else {
            let body = self
                .templates
                .render("answer_parent_required", &mention(&event.author))?;
            actions.push(self.reply(event, body)?);
            return Ok(());
        };

        // The nomination rides on the solved transition; an already-solved
        // submission is not re-nominated.
        let Some(next) = flair::solve(event.submission.flair) else {
            debug!(submission = %event.submission.id, "submission already solved, nomination skipped");
            return Ok(());
        };
        let by_moderator = !same_user(&event.author, &event.submission.author);
        info!(
            submission = %event.submission.id,
            helper = %helper,
            by_moderator,
            "nominating accepted answer"
        );
        actions.push(Action::SelectFlair {
            submission_id: event.submission.id.clone(),
            state: next,
        });
        let nomination = flair::nomination_comment(helper, helper_text, &event.author, by_moderator);
        let footer = self.templates.get("footer")?;
        actions.push(Action::SubmitComment {
            submission_id: event.submission.id.clone(),
            body: format!("{nomination}\n\n{footer}"),
            sticky: true,
        });
        Ok(())
    }

    async fn handle_thanks(&self, event: &CommentEvent, actions: &mut Vec<Action>) -> Result<()> {
        let Some(recipient) = event.parent.comment_author().map(str::to_string) else {
            let body = self
                .templates
                .render("thanks_parent_required", &mention(&event.author))?;
            actions.push(self.reply(event, body)?);
            return Ok(());
        };

        if thanks::is_self_grant(&event.author, &recipient) {
            debug!(author = %event.author, "self-grant rejected");
            let body = self.templates.render("thanks_self", &mention(&event.author))?;
            actions.push(self.reply(event, body)?);
            return Ok(());
        }
        if thanks::is_bot_target(&recipient, &self.config.bot_username) {
            let body = self.templates.render("thanks_bot", &mention(&event.author))?;
            actions.push(self.reply(event, body)?);
            return Ok(());
        }

        let actor_is_author = same_user(&event.author, &event.submission.author);
        let actor_is_moderator = self.is_moderator(&event.subreddit, &event.author);
        if !actor_is_author && !actor_is_moderator {
            debug!(author = %event.author, "thanks from non-author non-moderator ignored");
            return Ok(());
        }

        // Moderators granting on behalf of the author bypass the tree scan;
        // the author path is gated to once per thread.
        if actor_is_author {
            let granted = thanks::already_granted(
                &self.platform,
                &event.submission.id,
                &event.submission.author,
                &self.config.bot_username,
                &recipient,
            )
            .await?;
            if granted {
                info!(recipient = %recipient, "already thanked in this thread");
                let body = self.templates.render("thanks_already", &mention(&event.author))?;
                actions.push(self.reply(event, body)?);
                return Ok(());
            }
        }

        // Custom helper labels are terminal: acknowledged, never counted.
        let label = self
            .platform
            .user_flair(&event.subreddit, &recipient)
            .await?
            .filter(|label| !label.trim().is_empty());
        if let Some(label) = &label {
            if PointsLabel::parse(label) == PointsLabel::Custom {
                info!(recipient = %recipient, label = %label, "custom label, grant acknowledged only");
                let body = self
                    .templates
                    .render("thanks_custom_ack", &mention(&recipient))?;
                actions.push(self.reply(event, body)?);
                return Ok(());
            }
        }

        let document = self
            .platform
            .read_document(&self.config.leaderboard_document)
            .await?;
        let mut rows = leaderboard::load(&document);
        let today = Utc::now().date_naive();
        let points = leaderboard::upsert(&mut rows, &recipient, today);
        info!(recipient = %recipient, points, "thanks grant recorded");
        actions.push(Action::WriteDocument {
            name: self.config.leaderboard_document.clone(),
            content: leaderboard::render(&rows, today),
            reason: format!("+1 point for {}", mention(&recipient)),
        });
        let body = self
            .templates
            .render("thanks_confirmation", &mention(&recipient))?;
        actions.push(self.reply(event, body)?);
        Ok(())
    }

    fn handle_support(&self, event: &CommentEvent, actions: &mut Vec<Action>) -> Result<()> {
        // Address whoever the comment replies to; for top-level comments
        // that is the submission author.
        let target = event
            .parent
            .comment_author()
            .unwrap_or(&event.submission.author);
        let body = self.templates.render("support_response", &mention(target))?;
        actions.push(self.reply(event, body)?);
        Ok(())
    }

    fn handle_feedback(&self, event: &CommentEvent, actions: &mut Vec<Action>) -> Result<()> {
        let body = self
            .templates
            .render("feedback_response", &mention(&event.author))?;
        actions.push(self.reply(event, body)?);
        Ok(())
    }

    fn handle_lookup(
        &mut self,
        event: &CommentEvent,
        kind: CommandKind,
        actions: &mut Vec<Action>,
    ) -> Result<()> {
        let Some(parsed) = commands::parse(&event.body, kind) else {
            return Ok(());
        };
        if parsed.argument.is_empty() {
            actions.push(self.usage_reply(event, kind)?);
            return Ok(());
        }
        let Some(category) = AliasCategory::for_command(kind) else {
            return Ok(());
        };

        // The dataset may have changed on disk since the last lookup.
        self.aliases.maybe_reload();

        let mut argument = self.sanitizer.sanitize(&parsed.argument);
        if kind == CommandKind::Link {
            if let Some(brand) = &self.config.brand_word {
                if sanitize::wants_brand_strip(&argument) {
                    argument = sanitize::strip_brand(&argument, brand);
                }
            }
        }
        if argument.is_empty() {
            actions.push(self.usage_reply(event, kind)?);
            return Ok(());
        }
        info!(command = kind.keyword(), argument = %argument, "lookup request");

        let resolution = resolver::resolve(&argument, category, self.aliases.index().entries(category));
        match resolution {
            Resolution::Exact { display_name, link } => {
                let mut body = format_exact(&argument, &display_name, &link);
                if let Some(footer) = self.templates.maybe(&format!("{}_footer", kind.keyword())) {
                    body.push_str("\n\n");
                    body.push_str(footer);
                }
                actions.push(self.reply(event, body)?);
            }
            Resolution::Suggestions(suggestions) => {
                debug!(count = suggestions.len(), "no exact match, suggesting");
                actions.push(self.reply(event, format_suggestions(&argument, &suggestions))?);
            }
            Resolution::TooLong => {
                debug!(argument = %argument, "argument too long for a legitimate query");
                actions.push(self.usage_reply(event, kind)?);
            }
            Resolution::NoMatch => {
                let no_match = self.templates.get("no_match")?;
                let body = format!("I couldn't find a match for `{argument}`.\n\n{no_match}");
                actions.push(self.reply(event, body)?);
            }
        }
        Ok(())
    }

    // ========================================
    // Helpers
    // ========================================

    /// Build a reply to the triggering comment, with the bot footer
    fn reply(&self, event: &CommentEvent, body: String) -> Result<Action> {
        let footer = self.templates.get("footer")?;
        Ok(Action::Reply {
            comment_id: event.id.clone(),
            body: format!("{body}\n\n{footer}"),
        })
    }

    fn usage_reply(&self, event: &CommentEvent, kind: CommandKind) -> Result<Action> {
        let key = format!("{}_usage", kind.keyword());
        let body = self.templates.render(&key, &mention(&event.author))?;
        self.reply(event, body)
    }

    /// Actor may change this submission: original author or a moderator of
    /// the submission's own subreddit
    fn authorized(&self, event: &CommentEvent) -> bool {
        let empty = HashSet::new();
        let mods = self
            .moderators
            .get(&event.subreddit.to_lowercase())
            .unwrap_or(&empty);
        flair::is_authorized(&event.author, &event.submission.author, mods)
    }

    fn is_moderator(&self, subreddit: &str, username: &str) -> bool {
        self.moderators
            .get(&subreddit.to_lowercase())
            .is_some_and(|mods| mods.contains(&username.to_lowercase()))
    }
}

/// Exact-hit reply. Links with a section anchor get a two-line answer
/// naming both the section and its parent page.
fn format_exact(argument: &str, display_name: &str, link: &str) -> String {
    match link.split_once('#') {
        Some((page, _anchor)) => format!(
            "`{argument}` is covered in the **{display_name}** section: {link}\n\nThat section is part of {page}"
        ),
        None => format!("Here's the link for `{argument}`: {link}"),
    }
}

fn format_suggestions(argument: &str, suggestions: &[Suggestion]) -> String {
    let mut body = format!(
        "I couldn't find an exact match for `{argument}`. Did you mean any of the following?\n"
    );
    for suggestion in suggestions {
        body.push_str(&format!("\n* `{}`: {}", suggestion.alias, suggestion.link));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_exact_plain_link() {
        let body = format_exact("charger", "Charger", "https://example.com/charger");
        assert_eq!(body, "Here's the link for `charger`: https://example.com/charger");
    }

    #[test]
    fn test_format_exact_anchor_link_names_parent_page() {
        let body = format_exact(
            "glyph guide",
            "Glyph Guide",
            "https://example.com/wiki/glyphs#guide",
        );
        assert!(body.contains("https://example.com/wiki/glyphs#guide"));
        assert!(body.contains("part of https://example.com/wiki/glyphs"));
    }

    #[test]
    fn test_format_suggestions_is_a_bullet_list() {
        let suggestions = vec![Suggestion {
            display_name: "Glyphify".into(),
            link: "https://example.com/glyphify".into(),
            alias: "glyphify".into(),
            similarity: 0.9,
        }];
        let body = format_suggestions("glyphfy", &suggestions);
        assert!(body.contains("Did you mean"));
        assert!(body.contains("* `glyphify`: https://example.com/glyphify"));
    }
}
