//! Common error types for ModMate

use thiserror::Error;

/// Common result type for ModMate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the ModMate workspace
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response template key is absent from the configured map.
    ///
    /// Template lookups are exact-key; a missing key is surfaced loudly
    /// instead of falling back to an empty string.
    #[error("Missing response template key: {0:?}")]
    Template(String),

    /// A backing document (leaderboard table, alias dataset) failed to parse
    #[error("Malformed document: {0}")]
    Document(String),

    /// Transient upstream platform failure (feed or action submission)
    #[error("Platform error: {0}")]
    Platform(String),

    /// The event feed has no further events (local adapters only; the live
    /// platform feed blocks instead of closing)
    #[error("Event feed closed")]
    FeedClosed,
}

impl Error {
    /// Whether the dispatcher may retry after a fixed backoff.
    ///
    /// Everything else aborts the run: configuration and template problems
    /// will not heal on their own.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Platform(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_errors_are_transient() {
        assert!(Error::Platform("rate limited".into()).is_transient());
        assert!(!Error::Config("bad".into()).is_transient());
        assert!(!Error::Template("footer".into()).is_transient());
        assert!(!Error::FeedClosed.is_transient());
    }
}
