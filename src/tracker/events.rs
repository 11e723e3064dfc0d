use serde::Serialize;

use crate::models::WorkSession;
use crate::timer::TimerSnapshot;

/// Change notifications for whatever renders the tracker.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum TrackerEvent {
    TimerStateChanged(TimerSnapshot),
    SessionCompleted(WorkSession),
    ProjectsChanged,
}
