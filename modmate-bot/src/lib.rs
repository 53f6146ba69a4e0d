//! # ModMate Bot (modmate-bot)
//!
//! Command resolution and idempotent action engine for a rule-driven
//! moderation assistant.
//!
//! **Purpose:** Consume a stream of discussion-thread comments, recognize
//! embedded textual commands (`!solved`, `!thanks`, `!link`, ...), and emit
//! reply / flair / sticky-comment actions through a narrow platform
//! interface.
//!
//! **Architecture:** Single-consumer dispatch loop over pure components:
//! command parser, argument sanitizer, alias resolver, thread thanks guard,
//! leaderboard store, and flair state machine. The platform transport lives
//! behind the traits in [`platform`].

pub mod commands;
pub mod dispatch;
pub mod flair;
pub mod leaderboard;
pub mod platform;
pub mod reference;
pub mod thanks;

pub use modmate_common::{Error, Result};
