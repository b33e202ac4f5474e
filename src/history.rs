use crate::corpus::{Category, Difficulty};
use crate::session::{SessionConfig, TimerMode};
use crate::store::{KeyValueStore, StoreError};
use chrono::{DateTime, Local};
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const BEST_WPM_KEY: &str = "best_wpm";
pub const HISTORY_KEY: &str = "history";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// How a session was configured, stored alongside each result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDescriptor {
    pub mode: TimerMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    pub difficulty: Difficulty,
    pub category: Category,
}

impl From<&SessionConfig> for ModeDescriptor {
    fn from(config: &SessionConfig) -> Self {
        Self {
            mode: config.mode,
            duration_secs: config.is_timed().then_some(config.duration_secs),
            difficulty: config.difficulty,
            category: config.category,
        }
    }
}

impl fmt::Display for ModeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.duration_secs {
            Some(secs) => write!(f, "{} {}s", self.mode, secs)?,
            None => write!(f, "{}", self.mode)?,
        }
        write!(f, " / {} / {}", self.category, self.difficulty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub wpm: u32,
    pub accuracy: u32,
    #[serde(default)]
    pub mistakes: u32,
    #[serde(default)]
    pub best_streak: u32,
    #[serde(default)]
    pub seconds_elapsed: u32,
    pub timestamp: DateTime<Local>,
    pub mode: ModeDescriptor,
}

/// Classification of a finished session against the personal best
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// First recorded session; sets the best
    Baseline,
    HighScore,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub sessions: usize,
    pub average_wpm: f64,
    pub min_wpm: u32,
    pub max_wpm: u32,
    pub average_accuracy: f64,
}

/// Best WPM plus a bounded, oldest-first log of results
#[derive(Debug, Clone, PartialEq)]
pub struct Scoreboard {
    best_wpm: Option<u32>,
    history: Vec<SessionRecord>,
    limit: usize,
}

impl Scoreboard {
    pub fn new(limit: usize) -> Self {
        Self {
            best_wpm: None,
            history: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Read both keys. Missing, unreadable or corrupt values count as absent.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, limit: usize) -> Self {
        let mut board = Self::new(limit);
        board.best_wpm = read_json(store, BEST_WPM_KEY);
        board.history = read_json(store, HISTORY_KEY).unwrap_or_default();
        board.truncate();
        board
    }

    pub fn best_wpm(&self) -> Option<u32> {
        self.best_wpm
    }

    pub fn history(&self) -> &[SessionRecord] {
        &self.history
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.truncate();
    }

    pub fn classify(&self, wpm: u32) -> SessionOutcome {
        match self.best_wpm {
            None => SessionOutcome::Baseline,
            Some(best) if wpm > best => SessionOutcome::HighScore,
            Some(_) => SessionOutcome::Completed,
        }
    }

    /// Read-modify-write of both keys. Values another writer stored since
    /// startup are merged in when they read cleanly; a failed or corrupt read
    /// leaves the in-memory board as it is, so the best never goes down.
    /// Write failures are logged and the in-memory result still stands.
    pub fn record<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        record: SessionRecord,
    ) -> SessionOutcome {
        self.refresh(store);

        let outcome = self.classify(record.wpm);
        if outcome != SessionOutcome::Completed {
            self.best_wpm = Some(record.wpm);
        }
        self.history.push(record);
        self.truncate();

        if let Err(e) = self.save(store) {
            tracing::warn!(error = %e, "failed to persist scores");
        }
        outcome
    }

    fn refresh<S: KeyValueStore + ?Sized>(&mut self, store: &S) {
        if let Some(stored) = read_json::<u32, S>(store, BEST_WPM_KEY) {
            self.best_wpm = Some(self.best_wpm.map_or(stored, |best| best.max(stored)));
        }
        if let Some(stored) = read_json::<Vec<SessionRecord>, S>(store, HISTORY_KEY) {
            self.history = stored;
            self.truncate();
        }
    }

    fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        let mut entries = vec![(HISTORY_KEY, serde_json::to_string(&self.history)?)];
        if let Some(best) = self.best_wpm {
            entries.push((BEST_WPM_KEY, serde_json::to_string(&best)?));
        }
        store.set_many(&entries)
    }

    fn truncate(&mut self) {
        if self.history.len() > self.limit {
            let excess = self.history.len() - self.limit;
            self.history.drain(..excess);
        }
    }

    pub fn summary(&self) -> Option<HistorySummary> {
        let (min_wpm, max_wpm) = match self.history.iter().map(|r| r.wpm).minmax() {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(w) => (w, w),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        let sessions = self.history.len();
        let total_wpm: u64 = self.history.iter().map(|r| r.wpm as u64).sum();
        let total_acc: u64 = self.history.iter().map(|r| r.accuracy as u64).sum();

        Some(HistorySummary {
            sessions,
            average_wpm: total_wpm as f64 / sessions as f64,
            min_wpm,
            max_wpm,
            average_accuracy: total_acc as f64 / sessions as f64,
        })
    }
}

fn read_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: serde::de::DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read persisted value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring corrupt persisted value");
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct CsvRow {
    date: String,
    wpm: u32,
    accuracy: u32,
    mistakes: u32,
    best_streak: u32,
    elapsed_secs: u32,
    mode: String,
    duration_secs: Option<u32>,
    category: String,
    difficulty: String,
}

impl From<&SessionRecord> for CsvRow {
    fn from(r: &SessionRecord) -> Self {
        Self {
            date: r.timestamp.to_rfc3339(),
            wpm: r.wpm,
            accuracy: r.accuracy,
            mistakes: r.mistakes,
            best_streak: r.best_streak,
            elapsed_secs: r.seconds_elapsed,
            mode: r.mode.mode.to_string(),
            duration_secs: r.mode.duration_secs,
            category: r.mode.category.to_string(),
            difficulty: r.mode.difficulty.to_string(),
        }
    }
}

/// Write the history as CSV with a header row. Returns the number of rows.
pub fn export_csv<P: AsRef<Path>>(records: &[SessionRecord], path: P) -> Result<usize, ExportError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(records.len())
}
