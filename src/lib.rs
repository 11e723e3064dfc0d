//! Personal time tracking: projects, a start/pause/stop timer attributed to
//! the active project, and per-project session history.
//!
//! [`TimeTracker`] owns all state and writes a full snapshot to a
//! [`KeyValueStore`] after every change. Rendering is left to the embedder,
//! which drives the tracker through its methods, listens on
//! [`TimeTracker::subscribe`], and may run a [`DisplayTicker`] for a live
//! clock.

pub mod clock;
pub mod error;
pub mod models;
pub mod settings;
pub mod store;
pub mod timer;
pub mod tracker;
pub mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PersistenceError, ValidationError};
pub use models::{AppState, Project, ProjectSummary, WorkSession};
pub use settings::TrackerSettings;
pub use store::{KeyValueStore, LoadSource, MemoryStore, SnapshotStore, SqliteStore};
pub use timer::{DisplayTicker, TimerSnapshot, TimerState, TimerStatus};
pub use tracker::{TimeTracker, TrackerEvent};

/// Wire up a tracker from settings: logging at the configured verbosity,
/// SQLite when a database path is set, otherwise an in-memory store, and the
/// system clock.
pub fn bootstrap(settings: TrackerSettings) -> Result<TimeTracker> {
    utils::logging::init_logging(settings.debug);

    let store: Arc<dyn KeyValueStore> = match &settings.database_path {
        Some(path) => Arc::new(
            SqliteStore::open(path)
                .with_context(|| format!("failed to open tracker store at {}", path.display()))?,
        ),
        None => {
            info!("No database path configured; tracker state will not survive restart");
            Arc::new(MemoryStore::new())
        }
    };

    let snapshots = SnapshotStore::new(store, settings.storage_key.clone());
    Ok(TimeTracker::open(snapshots, Arc::new(SystemClock), settings))
}
