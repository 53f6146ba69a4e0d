//! Local JSONL platform adapter
//!
//! Replays recorded comment events from a JSONL file and records the
//! engine's actions instead of talking to a live platform. Used by the
//! binary for offline runs and by integration tests; the in-memory state
//! behaves like the platform's: document writes are visible to later
//! reads within the same run.

use super::{CommentFeed, MoreRef, Platform, TreeNode, TreeSource};
use async_trait::async_trait;
use modmate_common::{Action, CommentEvent, Error, FlairState, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

/// Seed state for the local platform, loaded from a JSON file
#[derive(Debug, Default, Deserialize)]
pub struct LocalState {
    /// Subreddit -> moderator identities
    #[serde(default)]
    pub moderators: HashMap<String, Vec<String>>,
    /// Username -> helper flair label
    #[serde(default)]
    pub user_flairs: HashMap<String, String>,
    /// Document name -> content
    #[serde(default)]
    pub documents: HashMap<String, String>,
    /// Submission id -> top-level tree nodes
    #[serde(default)]
    pub trees: HashMap<String, Vec<TreeNode>>,
    /// Placeholder id -> nodes it expands into
    #[serde(default)]
    pub more: HashMap<String, Vec<TreeNode>>,
}

impl LocalState {
    /// Load seed state from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Document(format!("local state {}: {e}", path.display())))
    }
}

/// In-memory platform double
pub struct LocalPlatform {
    state: Mutex<LocalState>,
    actions: Mutex<Vec<Action>>,
    /// Echo every recorded action to stdout as a JSON line
    echo: bool,
}

impl LocalPlatform {
    pub fn new(state: LocalState) -> Self {
        LocalPlatform {
            state: Mutex::new(state),
            actions: Mutex::new(Vec::new()),
            echo: false,
        }
    }

    /// Like [`LocalPlatform::new`], but actions are also printed as JSONL
    pub fn with_echo(state: LocalState) -> Self {
        LocalPlatform {
            echo: true,
            ..LocalPlatform::new(state)
        }
    }

    /// Everything recorded so far, in submission order
    pub fn actions(&self) -> Vec<Action> {
        self.actions
            .lock()
            .map(|actions| actions.clone())
            .unwrap_or_default()
    }

    fn record(&self, action: Action) -> Result<()> {
        if self.echo {
            let line = serde_json::to_string(&action)
                .map_err(|e| Error::Platform(format!("cannot serialize action: {e}")))?;
            println!("{line}");
        }
        self.actions
            .lock()
            .map_err(|_| Error::Platform("action log poisoned".to_string()))?
            .push(action);
        Ok(())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut LocalState) -> T) -> Result<T> {
        self.state
            .lock()
            .map(|mut state| f(&mut state))
            .map_err(|_| Error::Platform("state poisoned".to_string()))
    }
}

#[async_trait]
impl Platform for LocalPlatform {
    async fn reply(&self, comment_id: &str, body: &str) -> Result<()> {
        self.record(Action::Reply {
            comment_id: comment_id.to_string(),
            body: body.to_string(),
        })
    }

    async fn select_flair(&self, submission_id: &str, state: FlairState) -> Result<()> {
        self.record(Action::SelectFlair {
            submission_id: submission_id.to_string(),
            state,
        })
    }

    async fn submit_comment(&self, submission_id: &str, body: &str, sticky: bool) -> Result<()> {
        self.record(Action::SubmitComment {
            submission_id: submission_id.to_string(),
            body: body.to_string(),
            sticky,
        })
    }

    async fn user_flair(&self, _subreddit: &str, username: &str) -> Result<Option<String>> {
        self.with_state(|state| state.user_flairs.get(username).cloned())
    }

    async fn read_document(&self, name: &str) -> Result<String> {
        self.with_state(|state| state.documents.get(name).cloned().unwrap_or_default())
    }

    async fn write_document(&self, name: &str, content: &str, reason: &str) -> Result<()> {
        self.with_state(|state| {
            state
                .documents
                .insert(name.to_string(), content.to_string());
        })?;
        self.record(Action::WriteDocument {
            name: name.to_string(),
            content: content.to_string(),
            reason: reason.to_string(),
        })
    }

    async fn moderators(&self, subreddit: &str) -> Result<HashSet<String>> {
        self.with_state(|state| {
            state
                .moderators
                .get(subreddit)
                .map(|mods| mods.iter().map(|m| m.to_lowercase()).collect())
                .unwrap_or_default()
        })
    }
}

#[async_trait]
impl TreeSource for LocalPlatform {
    async fn top_level(&self, submission_id: &str) -> Result<Vec<TreeNode>> {
        self.with_state(|state| state.trees.get(submission_id).cloned().unwrap_or_default())
    }

    async fn expand(&self, more: &MoreRef) -> Result<Vec<TreeNode>> {
        self.with_state(|state| state.more.get(&more.id).cloned().unwrap_or_default())
    }
}

/// Comment feed reading one JSON event per line
pub struct JsonlFeed {
    lines: Lines<BufReader<File>>,
}

impl JsonlFeed {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).await?;
        Ok(JsonlFeed {
            lines: BufReader::new(file).lines(),
        })
    }
}

#[async_trait]
impl CommentFeed for JsonlFeed {
    async fn next_event(&mut self) -> Result<CommentEvent> {
        loop {
            match self.lines.next_line().await? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    return serde_json::from_str(&line)
                        .map_err(|e| Error::Platform(format!("malformed event line: {e}")))
                }
                None => return Err(Error::FeedClosed),
            }
        }
    }
}

/// In-memory feed over a fixed queue of events; closes once drained.
/// Useful for replaying a prepared scenario through the full loop.
pub struct QueueFeed {
    events: VecDeque<CommentEvent>,
}

impl QueueFeed {
    pub fn new(events: Vec<CommentEvent>) -> Self {
        QueueFeed {
            events: events.into(),
        }
    }
}

#[async_trait]
impl CommentFeed for QueueFeed {
    async fn next_event(&mut self) -> Result<CommentEvent> {
        self.events.pop_front().ok_or(Error::FeedClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_document_writes_are_visible_to_later_reads() {
        let platform = LocalPlatform::new(LocalState::default());
        assert_eq!(platform.read_document("board").await.unwrap(), "");
        platform
            .write_document("board", "content", "test")
            .await
            .unwrap();
        assert_eq!(platform.read_document("board").await.unwrap(), "content");
        assert_eq!(platform.actions().len(), 1);
    }

    #[tokio::test]
    async fn test_jsonl_feed_reads_events_then_closes() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"id":"c1","author":"asker","body":"!link charger","body_raw":"!link charger","parent":{{"kind":"Submission"}},"submission":{{"id":"s1","author":"op","flair":"Support"}},"subreddit":"gadgets","observed_at":"2026-08-05T09:00:00Z"}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        file.flush().unwrap();

        let mut feed = JsonlFeed::open(file.path()).await.unwrap();
        let event = feed.next_event().await.unwrap();
        assert_eq!(event.id, "c1");
        assert_eq!(event.subreddit, "gadgets");
        assert!(matches!(
            feed.next_event().await.unwrap_err(),
            Error::FeedClosed
        ));
    }

    #[tokio::test]
    async fn test_moderators_are_lowercased() {
        let mut state = LocalState::default();
        state
            .moderators
            .insert("gadgets".to_string(), vec!["ModOne".to_string()]);
        let platform = LocalPlatform::new(state);
        let mods = platform.moderators("gadgets").await.unwrap();
        assert!(mods.contains("modone"));
        assert!(platform.moderators("elsewhere").await.unwrap().is_empty());
    }
}
