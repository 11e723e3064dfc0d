//! Error types for the tracker.
//!
//! `ValidationError` is returned to callers and leaves state untouched.
//! `PersistenceError` is logged by the engine and never returned from an
//! engine operation.

use thiserror::Error;

/// A rejected user intent. No state was mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a project first")]
    NoActiveProject,

    #[error("Please enter a session name")]
    EmptySessionName,

    #[error("Please enter a project name")]
    EmptyProjectName,

    #[error("project not found: {0}")]
    UnknownProject(String),

    #[error("timer already running")]
    TimerAlreadyRunning,
}

/// Failure reading or writing the durable snapshot.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// SQLite store error
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("snapshot is not a JSON object")]
    NotAnObject,

    /// A store lock was poisoned by a panicking writer
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;
