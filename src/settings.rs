use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_STORAGE_KEY: &str = "timetracker-data";
pub const DEFAULT_SESSION_NAME: &str = "Untitled Session";

const ENV_DATABASE_PATH: &str = "TIMETRACKER_DB";
const ENV_DEBUG: &str = "TIMETRACKER_DEBUG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerSettings {
    /// Name of the persistence slot holding the whole snapshot
    pub storage_key: String,
    /// Stopping with less tracked time than this records nothing
    pub min_session_ms: u64,
    pub default_session_name: String,
    pub tick_interval_ms: u64,
    /// SQLite file for durable state. `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,
    pub debug: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.into(),
            min_session_ms: 1000,
            default_session_name: DEFAULT_SESSION_NAME.into(),
            tick_interval_ms: 1000,
            database_path: None,
            debug: false,
        }
    }
}

impl TrackerSettings {
    /// Read settings from a JSON file. A missing file yields defaults, as does
    /// a file that fails to parse.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        match serde_json::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(err) => {
                warn!(
                    "Ignoring unreadable settings at {}: {err}; using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create settings directory {}", parent.display())
            })?;
        }

        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// injectable lookup.
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|value| !value.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup(ENV_DEBUG) {
            self.debug = value == "1" || value.eq_ignore_ascii_case("true");
        }

        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
