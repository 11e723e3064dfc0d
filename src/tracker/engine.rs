use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::broadcast;

use crate::{
    clock::Clock,
    error::ValidationError,
    models::{AppState, WorkSession},
    settings::TrackerSettings,
    store::{LoadSource, SnapshotStore},
    timer::{state::offset_back, TimerSnapshot, TimerState},
    utils::format::format_duration,
};

use super::TrackerEvent;

const EVENT_CAPACITY: usize = 64;

/// Owns the application state and is its only writer.
///
/// Every operation runs to completion synchronously. Operations that change
/// state end with a full snapshot write; a failed write is logged and the
/// in-memory state stays authoritative.
pub struct TimeTracker {
    pub(super) state: AppState,
    snapshots: SnapshotStore,
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
    events: broadcast::Sender<TrackerEvent>,
    load_source: LoadSource,
}

impl TimeTracker {
    /// Load the saved snapshot and pick up a timer that was running when the
    /// previous process went away.
    pub fn open(snapshots: SnapshotStore, clock: Arc<dyn Clock>, settings: TrackerSettings) -> Self {
        let (state, load_source) = snapshots.load();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let mut tracker = Self {
            state,
            snapshots,
            clock,
            settings,
            events,
            load_source,
        };
        tracker.resume_on_load();
        tracker
    }

    fn resume_on_load(&mut self) {
        let now = self.clock.now();
        if self.state.current_timer.resume(now) {
            info!(
                "Resumed running timer '{}' at {}",
                self.state.current_timer.session_name,
                format_duration(self.state.current_timer.elapsed_ms(now))
            );
        }
    }

    pub(super) fn clock_now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub fn load_source(&self) -> LoadSource {
        self.load_source
    }

    pub fn snapshot(&self) -> &AppState {
        &self.state
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    pub fn timer(&self) -> &TimerState {
        &self.state.current_timer
    }

    /// Derived elapsed time of the current timer as of now.
    pub fn elapsed_ms(&self) -> u64 {
        self.state.current_timer.elapsed_ms(self.clock.now())
    }

    pub fn timer_snapshot(&self) -> TimerSnapshot {
        let timer = &self.state.current_timer;
        TimerSnapshot {
            status: timer.status(),
            elapsed_ms: timer.elapsed_ms(self.clock.now()),
            session_name: timer.session_name.clone(),
            started_at: timer.start_time,
            active_project_id: self.state.active_project_id.clone(),
        }
    }

    pub fn start(&mut self, session_name: &str) -> Result<TimerSnapshot, ValidationError> {
        if self.state.active_project_id.is_none() {
            return Err(ValidationError::NoActiveProject);
        }

        let session_name = session_name.trim();
        if session_name.is_empty() {
            return Err(ValidationError::EmptySessionName);
        }

        if self.state.current_timer.is_running {
            return Err(ValidationError::TimerAlreadyRunning);
        }

        let now = self.clock.now();
        let resumed_from = self.state.current_timer.elapsed_time;
        self.state.current_timer.begin(session_name, now);

        if resumed_from > 0 {
            info!(
                "Timer resumed for '{}' at {}",
                session_name,
                format_duration(resumed_from)
            );
        } else {
            info!("Timer started for '{}'", session_name);
        }

        Ok(self.timer_changed())
    }

    pub fn pause(&mut self) -> TimerSnapshot {
        let now = self.clock.now();
        if !self.state.current_timer.pause(now) {
            return self.timer_snapshot();
        }

        info!(
            "Timer paused at {}",
            format_duration(self.state.current_timer.elapsed_time)
        );
        self.timer_changed()
    }

    /// End the current timer. Returns the recorded session, if the accumulated
    /// time was long enough to keep. The timer is idle afterwards either way.
    pub fn stop(&mut self) -> Option<WorkSession> {
        if !self.state.current_timer.has_time() {
            return None;
        }

        let now = self.clock.now();
        let timer = &self.state.current_timer;
        let final_duration = timer.elapsed_ms(now);

        let session = if final_duration < self.settings.min_session_ms {
            debug!(
                "Discarding {}ms timer; below {}ms minimum",
                final_duration, self.settings.min_session_ms
            );
            None
        } else if let Some(project_id) = self.state.active_project_id.clone() {
            let name = if timer.session_name.trim().is_empty() {
                self.settings.default_session_name.clone()
            } else {
                timer.session_name.clone()
            };
            let start_time = timer
                .start_time
                .unwrap_or_else(|| offset_back(now, final_duration));
            Some(WorkSession::new(project_id, name, start_time, now, final_duration))
        } else {
            warn!(
                "Discarding {} of tracked time; no active project to attribute it to",
                format_duration(final_duration)
            );
            None
        };

        if let Some(session) = &session {
            info!(
                "Recorded session '{}' ({})",
                session.name,
                format_duration(session.duration)
            );
            self.state.work_sessions.push(session.clone());
        }

        self.state.current_timer.clear();
        self.timer_changed();

        if let Some(session) = &session {
            self.emit(TrackerEvent::SessionCompleted(session.clone()));
        }

        session
    }

    /// Discard the current timer without recording anything.
    pub fn reset(&mut self) -> TimerSnapshot {
        if self.state.current_timer.has_time() {
            info!(
                "Timer reset; discarded {}",
                format_duration(self.elapsed_ms())
            );
        }
        self.state.current_timer.clear();
        self.timer_changed()
    }

    /// Best-effort final write, for a teardown hook.
    pub fn flush(&self) {
        self.persist();
    }

    fn timer_changed(&self) -> TimerSnapshot {
        self.persist();
        let snapshot = self.timer_snapshot();
        self.emit(TrackerEvent::TimerStateChanged(snapshot.clone()));
        snapshot
    }

    pub(super) fn persist(&self) {
        if let Err(err) = self.snapshots.save(&self.state) {
            error!("Error saving data to '{}': {err}", self.snapshots.key());
        }
    }

    pub(super) fn emit(&self, event: TrackerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
