use std::io;

use thiserror::Error;

/// Errors surfaced by the Waypoint core.
///
/// The markdown transformer itself never fails; these cover the writer-backed
/// paths, configuration and the conversation glue.
#[derive(Debug, Error)]
pub enum Error {
    /// The output writer rejected rendered HTML.
    #[error("failed to write rendered html: {0}")]
    Io(#[from] io::Error),
    /// lol_html refused a chunk of rendered HTML.
    #[error("html rewrite failed: {0}")]
    Rewrite(String),
    /// Reveal ticks must be at least one millisecond apart.
    #[error("reveal interval must be a positive number of milliseconds")]
    InvalidInterval,
    /// A timed reveal was started outside of a Tokio runtime.
    #[error("a tokio runtime is required to drive a timed reveal")]
    NoRuntime,
    /// Blank user input is never appended to the conversation.
    #[error("message is empty")]
    EmptyMessage,
    /// An itinerary request failed the form checks.
    #[error("{0}")]
    InvalidRequest(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
