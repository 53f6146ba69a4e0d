//! # ModMate Common Library
//!
//! Shared code for the ModMate moderation assistant:
//! - Error type used across the workspace
//! - Startup configuration loading
//! - Comment event and output action types
//! - Response template map (key -> string lookups)

pub mod config;
pub mod error;
pub mod events;
pub mod templates;

pub use error::{Error, Result};
pub use events::{Action, CommentEvent, FlairState, ParentRef, SubmissionInfo};
pub use templates::Templates;
