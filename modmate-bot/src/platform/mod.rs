//! Platform collaborator interface
//!
//! The engine talks to the host platform through three narrow traits:
//! [`CommentFeed`] delivers events, [`Platform`] performs actions and
//! point queries, and [`TreeSource`] materializes comment trees lazily.
//! The real network transport lives behind these traits and is out of
//! scope; [`local`] provides a JSONL adapter for the binary and for
//! end-to-end tests.

pub mod local;

use async_trait::async_trait;
use modmate_common::{CommentEvent, FlairState, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Ordered source of comment events. `next_event` blocks until an event is
/// available; errors are transient and the dispatcher retries after a fixed
/// backoff.
#[async_trait]
pub trait CommentFeed: Send {
    async fn next_event(&mut self) -> Result<CommentEvent>;
}

/// Actions and queries against the host platform
#[async_trait]
pub trait Platform: Send + Sync {
    /// Post a reply under an existing comment
    async fn reply(&self, comment_id: &str, body: &str) -> Result<()>;

    /// Change a submission's flair category
    async fn select_flair(&self, submission_id: &str, state: FlairState) -> Result<()>;

    /// Post a new comment under a submission, optionally pinned
    async fn submit_comment(&self, submission_id: &str, body: &str, sticky: bool) -> Result<()>;

    /// Current helper label of a user in a subreddit, if any
    async fn user_flair(&self, subreddit: &str, username: &str) -> Result<Option<String>>;

    /// Read a named backing document (empty if it does not exist yet)
    async fn read_document(&self, name: &str) -> Result<String>;

    /// Replace a named backing document in full
    async fn write_document(&self, name: &str, content: &str, reason: &str) -> Result<()>;

    /// Moderator identity set of a subreddit
    async fn moderators(&self, subreddit: &str) -> Result<HashSet<String>>;
}

/// Reference to a collapsed tree placeholder that must be expanded through
/// the platform before its comments are visible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoreRef {
    pub id: String,
}

/// One comment inside a submission tree, carrying its direct replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeComment {
    pub id: String,
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub replies: Vec<TreeNode>,
}

/// A tree position: a materialized comment or a collapsed placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum TreeNode {
    Comment(TreeComment),
    More(MoreRef),
}

/// Lazily materializes submission comment trees
#[async_trait]
pub trait TreeSource: Send + Sync {
    /// Top-level nodes of a submission
    async fn top_level(&self, submission_id: &str) -> Result<Vec<TreeNode>>;

    /// Expand a collapsed placeholder into its nodes
    async fn expand(&self, more: &MoreRef) -> Result<Vec<TreeNode>>;
}

/// Author and body of the comment a walked node replies to
#[derive(Debug, Clone)]
pub struct ParentContext {
    pub author: String,
    pub body: String,
}

/// A comment yielded by the walk, with its parent's context. The walker
/// consumes `replies` as it descends, so they are empty here; inspect the
/// parent context instead of re-walking.
#[derive(Debug)]
pub struct WalkedComment {
    pub comment: TreeComment,
    /// `None` for top-level comments
    pub parent: Option<Arc<ParentContext>>,
}

/// Depth-first walk over a submission tree with replace-more semantics.
///
/// The walk keeps an explicit stack instead of recursing, so arbitrarily
/// deep trees cannot overflow, and placeholders are expanded only when the
/// walk reaches them. Children are moved onto the stack, not cloned;
/// expanded placeholder nodes inherit the placeholder's parent, keeping the
/// direct-reply relation intact.
pub struct TreeWalker<'a, S: TreeSource> {
    source: &'a S,
    stack: Vec<(TreeNode, Option<Arc<ParentContext>>)>,
}

impl<'a, S: TreeSource> TreeWalker<'a, S> {
    pub fn new(source: &'a S, roots: Vec<TreeNode>) -> Self {
        let mut stack: Vec<_> = roots.into_iter().map(|node| (node, None)).collect();
        stack.reverse();
        TreeWalker { source, stack }
    }

    /// Next comment in depth-first order, or `None` when the tree is
    /// exhausted
    pub async fn next(&mut self) -> Result<Option<WalkedComment>> {
        while let Some((node, parent)) = self.stack.pop() {
            match node {
                TreeNode::Comment(mut comment) => {
                    let context = Arc::new(ParentContext {
                        author: comment.author.clone(),
                        body: comment.body.clone(),
                    });
                    let children = std::mem::take(&mut comment.replies);
                    for child in children.into_iter().rev() {
                        self.stack.push((child, Some(context.clone())));
                    }
                    return Ok(Some(WalkedComment { comment, parent }));
                }
                TreeNode::More(more) => {
                    let expanded = self.source.expand(&more).await?;
                    for node in expanded.into_iter().rev() {
                        self.stack.push((node, parent.clone()));
                    }
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource {
        more: HashMap<String, Vec<TreeNode>>,
    }

    #[async_trait]
    impl TreeSource for MapSource {
        async fn top_level(&self, _submission_id: &str) -> Result<Vec<TreeNode>> {
            Ok(Vec::new())
        }

        async fn expand(&self, more: &MoreRef) -> Result<Vec<TreeNode>> {
            Ok(self.more.get(&more.id).cloned().unwrap_or_default())
        }
    }

    fn comment(id: &str, replies: Vec<TreeNode>) -> TreeNode {
        TreeNode::Comment(TreeComment {
            id: id.to_string(),
            author: "someone".to_string(),
            body: String::new(),
            replies,
        })
    }

    async fn walk_ids(source: &MapSource, roots: Vec<TreeNode>) -> Vec<String> {
        let mut walker = TreeWalker::new(source, roots);
        let mut ids = Vec::new();
        while let Some(walked) = walker.next().await.unwrap() {
            ids.push(walked.comment.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_walk_is_depth_first() {
        let source = MapSource { more: HashMap::new() };
        let roots = vec![
            comment("a", vec![comment("a1", vec![comment("a1x", vec![])]), comment("a2", vec![])]),
            comment("b", vec![]),
        ];
        assert_eq!(walk_ids(&source, roots).await, vec!["a", "a1", "a1x", "a2", "b"]);
    }

    #[tokio::test]
    async fn test_walk_tracks_parent_context() {
        let source = MapSource { more: HashMap::new() };
        let roots = vec![comment("a", vec![comment("a1", vec![])])];
        let mut walker = TreeWalker::new(&source, roots);

        let top = walker.next().await.unwrap().unwrap();
        assert!(top.parent.is_none());
        let child = walker.next().await.unwrap().unwrap();
        assert_eq!(child.comment.id, "a1");
        assert_eq!(child.parent.unwrap().author, "someone");
    }

    #[tokio::test]
    async fn test_placeholders_expand_in_place_inheriting_parent() {
        let mut more = HashMap::new();
        more.insert(
            "m1".to_string(),
            vec![comment("hidden1", vec![]), comment("hidden2", vec![])],
        );
        let source = MapSource { more };
        let roots = vec![comment(
            "a",
            vec![TreeNode::More(MoreRef { id: "m1".to_string() })],
        )];
        let mut walker = TreeWalker::new(&source, roots);

        let mut ids = Vec::new();
        let mut hidden_parents = Vec::new();
        while let Some(walked) = walker.next().await.unwrap() {
            if walked.comment.id.starts_with("hidden") {
                hidden_parents.push(walked.parent.clone().unwrap().author.clone());
            }
            ids.push(walked.comment.id);
        }
        assert_eq!(ids, vec!["a", "hidden1", "hidden2"]);
        // Expanded nodes count as direct replies of the placeholder's parent.
        assert_eq!(hidden_parents, vec!["someone", "someone"]);
    }

    #[tokio::test]
    async fn test_deep_tree_does_not_recurse() {
        // A 50k-deep reply chain walks fine because the stack is explicit
        // and children are moved, never cloned.
        let mut node = comment("leaf", vec![]);
        for depth in 0..50_000 {
            node = comment(&format!("c{depth}"), vec![node]);
        }
        let source = MapSource { more: HashMap::new() };
        let mut walker = TreeWalker::new(&source, vec![node]);
        let mut count = 0usize;
        while walker.next().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 50_001);
    }
}
