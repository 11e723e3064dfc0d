//! Whole-state persistence.
//!
//! The entire [`AppState`] is written to one slot on every change and read
//! once at startup. Reading is forgiving: a missing slot or an unreadable one
//! both yield the default state, and a readable one is shallow-merged over the
//! defaults so that keys added after it was written still get values.

use std::sync::Arc;

use log::{error, info, warn};
use serde_json::{Map, Value};

use super::KeyValueStore;
use crate::error::{PersistenceError, PersistenceResult};
use crate::models::AppState;

/// Older spellings of top-level keys, mapped to the current one.
const KEY_ALIASES: &[(&str, &str)] = &[("activeProjectId", "activeProject")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Nothing stored under the key yet
    Fresh,
    Restored,
    /// Stored data could not be read or decoded
    Fallback,
}

pub struct SnapshotStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Never fails; see the module docs for the fallback rules.
    pub fn load(&self) -> (AppState, LoadSource) {
        match self.try_load() {
            Ok(Some(state)) => {
                info!(
                    "Restored {} projects and {} sessions from '{}'",
                    state.projects.len(),
                    state.work_sessions.len(),
                    self.key
                );
                (state, LoadSource::Restored)
            }
            Ok(None) => {
                info!("No saved data under '{}'; starting fresh", self.key);
                (AppState::default(), LoadSource::Fresh)
            }
            Err(err) => {
                error!("Error loading saved data from '{}': {err}", self.key);
                (AppState::default(), LoadSource::Fallback)
            }
        }
    }

    pub fn try_load(&self) -> PersistenceResult<Option<AppState>> {
        match self.store.read(&self.key)? {
            Some(raw) => decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn save(&self, state: &AppState) -> PersistenceResult<()> {
        let encoded = encode(state)?;
        self.store.write(&self.key, &encoded)
    }
}

pub fn encode(state: &AppState) -> PersistenceResult<String> {
    serde_json::to_string(state).map_err(PersistenceError::Encode)
}

pub fn decode(raw: &str) -> PersistenceResult<AppState> {
    let parsed: Value = serde_json::from_str(raw).map_err(PersistenceError::Decode)?;
    let Value::Object(stored) = parsed else {
        return Err(PersistenceError::NotAnObject);
    };

    let merged = merge_over_defaults(canonicalize_keys(stored))?;
    let mut state: AppState =
        serde_json::from_value(Value::Object(merged)).map_err(PersistenceError::Decode)?;

    if state.current_timer.normalize() {
        warn!("Stored timer flags were inconsistent; treating timer as paused");
    }

    if let Some(active) = state.active_project_id.as_deref() {
        if !state.has_project(active) {
            warn!("Stored active project {active} does not exist; clearing selection");
            state.active_project_id = None;
        }
    }

    Ok(state)
}

fn canonicalize_keys(mut stored: Map<String, Value>) -> Map<String, Value> {
    for (alias, canonical) in KEY_ALIASES {
        if stored.contains_key(*canonical) {
            continue;
        }
        if let Some(value) = stored.remove(*alias) {
            stored.insert((*canonical).to_string(), value);
        }
    }
    stored
}

fn merge_over_defaults(stored: Map<String, Value>) -> PersistenceResult<Map<String, Value>> {
    let defaults = serde_json::to_value(AppState::default()).map_err(PersistenceError::Encode)?;
    let mut merged = match defaults {
        Value::Object(map) => map,
        _ => return Err(PersistenceError::NotAnObject),
    };

    for (key, value) in stored {
        merged.insert(key, value);
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use crate::models::{Project, WorkSession};
    use crate::store::MemoryStore;
    use crate::timer::TimerStatus;
    use chrono::{Duration, TimeZone, Utc};

    fn snapshots() -> (Arc<MemoryStore>, SnapshotStore) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), SnapshotStore::new(store, "timetracker-data"))
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn read(&self, _key: &str) -> PersistenceResult<Option<String>> {
            Err(PersistenceError::Unavailable("disk gone".into()))
        }

        fn write(&self, _key: &str, _value: &str) -> PersistenceResult<()> {
            Err(PersistenceError::Unavailable("quota exceeded".into()))
        }
    }

    #[test]
    fn save_then_load_preserves_entities_in_order() {
        let (_, snapshots) = snapshots();
        let t0 = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let writing = Project::new("Writing", t0);
        let reading = Project::new("Reading", t0 + Duration::seconds(5));
        let mut state = AppState {
            projects: vec![writing.clone(), reading.clone()],
            active_project_id: Some(reading.id.clone()),
            ..Default::default()
        };
        state.work_sessions = vec![
            WorkSession::new(&writing.id, "Draft", t0, t0 + Duration::seconds(65), 65_000),
            WorkSession::new(&reading.id, "Notes", t0, t0 + Duration::seconds(2), 2_000),
        ];
        state.current_timer.begin("Edit", t0 + Duration::seconds(90));

        snapshots.save(&state).unwrap();
        let (loaded, source) = snapshots.load();

        assert_eq!(source, LoadSource::Restored);
        assert_eq!(loaded, state);
    }

    #[test]
    fn absent_slot_is_fresh_default() {
        let (_, snapshots) = snapshots();
        let (state, source) = snapshots.load();
        assert_eq!(source, LoadSource::Fresh);
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn corrupt_slot_falls_back_to_default() {
        let (store, snapshots) = snapshots();
        store.write("timetracker-data", "{\"projects\": [").unwrap();

        let (state, source) = snapshots.load();

        assert_eq!(source, LoadSource::Fallback);
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn non_object_slot_falls_back_to_default() {
        let (store, snapshots) = snapshots();
        store.write("timetracker-data", "[1, 2, 3]").unwrap();

        assert!(matches!(
            snapshots.try_load(),
            Err(PersistenceError::NotAnObject)
        ));
        assert_eq!(snapshots.load().1, LoadSource::Fallback);
    }

    #[test]
    fn unreadable_store_falls_back_and_write_errors_surface() {
        let snapshots = SnapshotStore::new(Arc::new(BrokenStore), "k");
        assert_eq!(snapshots.load(), (AppState::default(), LoadSource::Fallback));
        assert!(snapshots.save(&AppState::default()).is_err());
    }

    #[test]
    fn missing_keys_take_defaults() {
        let state = decode(r#"{ "projects": [ { "id": "p1", "name": "Writing", "createdAt": 1700000000000 } ] }"#)
            .unwrap();

        assert_eq!(state.projects.len(), 1);
        assert!(state.work_sessions.is_empty());
        assert_eq!(state.active_project_id, None);
        assert_eq!(state.current_timer.status(), TimerStatus::Idle);
    }

    #[test]
    fn reads_snapshot_with_epoch_millis_and_short_ids() {
        let raw = r#"{
            "projects": [{ "id": "lq2x9abc", "name": "Writing", "createdAt": 1700000000000 }],
            "workSessions": [{
                "id": "lq2xa001", "projectId": "lq2x9abc", "name": "Draft",
                "startTime": 1700000100000, "endTime": 1700000165000, "duration": 65000
            }],
            "activeProject": "lq2x9abc",
            "currentTimer": { "isRunning": true, "startTime": 1700000200000, "elapsedTime": 0, "sessionName": "Edit" }
        }"#;

        let state = decode(raw).unwrap();

        assert_eq!(state.active_project_id.as_deref(), Some("lq2x9abc"));
        assert_eq!(state.project_total_time("lq2x9abc"), 65_000);
        assert_eq!(state.current_timer.status(), TimerStatus::Running);
        assert_eq!(
            state.current_timer.start_time,
            Some(Utc.timestamp_millis_opt(1_700_000_200_000).unwrap())
        );
    }

    #[test]
    fn accepts_active_project_id_spelling() {
        let state = decode(
            r#"{
                "projects": [{ "id": "p1", "name": "Writing", "createdAt": 1700000000000 }],
                "activeProjectId": "p1"
            }"#,
        )
        .unwrap();
        assert_eq!(state.active_project_id.as_deref(), Some("p1"));
        assert!(state.extra.is_empty());
    }

    #[test]
    fn active_project_missing_from_projects_is_cleared() {
        let state = decode(
            r#"{
                "projects": [{ "id": "p1", "name": "Writing", "createdAt": 1700000000000 }],
                "activeProject": "ghost",
                "currentTimer": { "isRunning": true, "startTime": 1700000200000, "elapsedTime": 0, "sessionName": "Edit" }
            }"#,
        )
        .unwrap();

        assert_eq!(state.active_project_id, None);
        assert_eq!(state.projects.len(), 1);
        assert_eq!(state.current_timer.status(), TimerStatus::Running);
    }

    #[test]
    fn unknown_keys_survive_a_save() {
        let state = decode(r#"{ "theme": "dark", "projects": [] }"#).unwrap();
        assert_eq!(state.extra.get("theme"), Some(&Value::String("dark".into())));

        let reencoded: Value = serde_json::from_str(&encode(&state).unwrap()).unwrap();
        assert_eq!(reencoded["theme"], Value::String("dark".into()));
    }

    #[test]
    fn running_without_start_time_is_loaded_as_paused() {
        let state = decode(
            r#"{ "currentTimer": { "isRunning": true, "startTime": null, "elapsedTime": 4000, "sessionName": "Draft" } }"#,
        )
        .unwrap();

        assert_eq!(state.current_timer.status(), TimerStatus::Paused);
        assert_eq!(state.current_timer.elapsed_time, 4_000);
    }
}
