//! The aggregate root: everything the tracker persists, as one value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{Project, ProjectSummary, WorkSession};
use crate::timer::TimerState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub projects: Vec<Project>,
    pub work_sessions: Vec<WorkSession>,
    #[serde(rename = "activeProject")]
    pub active_project_id: Option<String>,
    pub current_timer: TimerState,
    /// Top-level keys this version does not understand. Kept so that a save
    /// does not drop data written by another version.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppState {
    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == project_id)
    }

    pub fn has_project(&self, project_id: &str) -> bool {
        self.project(project_id).is_some()
    }

    /// Sessions for a project in the order they were recorded.
    pub fn project_sessions(&self, project_id: &str) -> Vec<&WorkSession> {
        self.work_sessions
            .iter()
            .filter(|session| session.project_id == project_id)
            .collect()
    }

    pub fn project_total_time(&self, project_id: &str) -> u64 {
        self.work_sessions
            .iter()
            .filter(|session| session.project_id == project_id)
            .fold(0u64, |total, session| total.saturating_add(session.duration))
    }

    pub fn project_summaries(&self) -> Vec<ProjectSummary> {
        self.projects
            .iter()
            .map(|project| ProjectSummary {
                project: project.clone(),
                session_count: self.project_sessions(&project.id).len(),
                total_ms: self.project_total_time(&project.id),
            })
            .collect()
    }
}
