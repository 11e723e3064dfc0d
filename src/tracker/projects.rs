//! Project lifecycle and read-side queries.

use log::info;

use crate::{
    error::ValidationError,
    models::{Project, ProjectSummary, WorkSession},
    utils::format::format_duration,
};

use super::{TimeTracker, TrackerEvent};

impl TimeTracker {
    /// Names are trimmed; duplicates are allowed.
    pub fn create_project(&mut self, name: &str) -> Result<Project, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }

        let project = Project::new(name, self.clock_now());
        self.state.projects.push(project.clone());
        info!("Created project '{}' ({})", project.name, project.id);

        self.persist();
        self.emit(TrackerEvent::ProjectsChanged);
        Ok(project)
    }

    /// Change which project new timer activity is attributed to. Leaves any
    /// in-progress timer untouched.
    pub fn select_project(&mut self, project_id: Option<&str>) -> Result<(), ValidationError> {
        if let Some(id) = project_id {
            if !self.state.has_project(id) {
                return Err(ValidationError::UnknownProject(id.to_string()));
            }
        }

        self.state.active_project_id = project_id.map(str::to_string);
        self.persist();
        let snapshot = self.timer_snapshot();
        self.emit(TrackerEvent::TimerStateChanged(snapshot));
        Ok(())
    }

    /// Remove a project and every session recorded against it. Deleting the
    /// active project also clears the selection and throws away the current
    /// timer without recording it.
    ///
    /// Sessions and the selection are cleaned up even when no project has
    /// that id, so references left dangling by stored data can be removed.
    /// Returns false if nothing changed.
    pub fn delete_project(&mut self, project_id: &str) -> bool {
        let projects_before = self.state.projects.len();
        self.state.projects.retain(|project| project.id != project_id);
        let removed_project = self.state.projects.len() != projects_before;

        let sessions_before = self.state.work_sessions.len();
        self.state
            .work_sessions
            .retain(|session| session.project_id != project_id);
        let removed_sessions = sessions_before - self.state.work_sessions.len();

        let was_active = self.state.active_project_id.as_deref() == Some(project_id);
        if was_active {
            self.state.active_project_id = None;
            if self.state.current_timer.has_time() {
                info!(
                    "Discarding {} of unsaved time with deleted project",
                    format_duration(self.elapsed_ms())
                );
            }
            self.state.current_timer.clear();
        }

        if !removed_project && removed_sessions == 0 && !was_active {
            return false;
        }

        info!(
            "Deleted project {} and {} session(s)",
            project_id, removed_sessions
        );

        self.persist();
        self.emit(TrackerEvent::ProjectsChanged);
        if was_active {
            let snapshot = self.timer_snapshot();
            self.emit(TrackerEvent::TimerStateChanged(snapshot));
        }
        true
    }

    pub fn projects(&self) -> &[Project] {
        &self.state.projects
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.state.project(project_id)
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.state
            .active_project_id
            .as_deref()
            .and_then(|id| self.state.project(id))
    }

    /// Sessions in the order they were recorded.
    pub fn project_sessions(&self, project_id: &str) -> Vec<&WorkSession> {
        self.state.project_sessions(project_id)
    }

    /// Newest first by start time, for history views.
    pub fn project_sessions_recent_first(&self, project_id: &str) -> Vec<&WorkSession> {
        let mut sessions = self.state.project_sessions(project_id);
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions
    }

    pub fn project_total_time(&self, project_id: &str) -> u64 {
        self.state.project_total_time(project_id)
    }

    pub fn project_summaries(&self) -> Vec<ProjectSummary> {
        self.state.project_summaries()
    }
}
