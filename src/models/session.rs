//! Completed work sessions.
//!
//! A `WorkSession` is only ever produced by stopping the timer and is never
//! edited afterwards; it disappears only when its project is deleted.

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkSession {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(with = "ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    /// Milliseconds of tracked time. Excludes paused intervals, so it can be
    /// shorter than `end_time - start_time` when the timer was never resumed
    /// after a pause.
    pub duration: u64,
}

impl WorkSession {
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            name: name.into(),
            start_time,
            end_time,
            duration,
        }
    }
}
