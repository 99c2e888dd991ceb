//! Error taxonomy for a run.
//!
//! `LibraryError` is what a Library Client reports; `RunError` is what the
//! coordinator returns when a run cannot proceed. Per-item fetch and
//! placement failures never surface here: they become `DownloadOutcome::Failure`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a Library Client.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Server unreachable or transport failure.
    #[error("connection failed: {0}")]
    Connection(String),
    /// Token rejected or account switch refused.
    #[error("unauthorized: {0}")]
    Auth(String),
    /// Requested playlist, account or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Downloading one asset's bytes failed.
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// The server answered with something we could not interpret.
    #[error("unexpected response: {0}")]
    Protocol(String),
}

/// Fatal errors that stop a run before any download starts.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("filename collision: {name:?} is shared by {titles:?}")]
    NameCollision { name: String, titles: Vec<String> },

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
