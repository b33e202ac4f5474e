use crate::app_dirs::AppDirs;
use crate::corpus::{Category, Difficulty};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::session::{SessionConfig, TimerMode, DEFAULT_DURATION_SECS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Preferences remembered between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub category: Category,
    pub mode: TimerMode,
    pub duration_secs: u32,
    pub sound: bool,
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            category: Category::default(),
            mode: TimerMode::default(),
            duration_secs: DEFAULT_DURATION_SECS,
            sound: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            difficulty: self.difficulty,
            category: self.category,
            mode: self.mode,
            duration_secs: self.duration_secs,
        }
        .sanitized()
    }

    /// Copy the session-shaping fields back, e.g. after a settings change in the UI
    pub fn apply_session_config(&mut self, session: &SessionConfig) {
        self.difficulty = session.difficulty;
        self.category = session.category;
        self.mode = session.mode;
        self.duration_secs = session.duration_secs;
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("velo_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
