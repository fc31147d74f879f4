use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

/// Lifecycle events recorded for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    RunStarted,
    StageStarted,
    StageCompleted,
    StageFailed,
    RunCompleted,
    SecondaryRegenerated,
}

impl RunEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RunStarted => "run_started",
            Self::StageStarted => "stage_started",
            Self::StageCompleted => "stage_completed",
            Self::StageFailed => "stage_failed",
            Self::RunCompleted => "run_completed",
            Self::SecondaryRegenerated => "secondary_regenerated",
        }
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only writer for a run's `events.jsonl`.
///
/// Every line is one compact object with `type`, `run_id` and `ts`; the
/// caller's payload is merged last and wins on key collisions. Clones share
/// the same file lock.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<EventWriterInner>,
}

#[derive(Debug)]
struct EventWriterInner {
    path: PathBuf,
    run_id: String,
    lock: Mutex<()>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EventWriterInner {
                path: path.into(),
                run_id: run_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn run_id(&self) -> &str {
        &self.inner.run_id
    }

    /// Same file, different run id. Used when one log spans a regeneration.
    pub fn for_run(&self, run_id: impl Into<String>) -> Self {
        Self::new(self.inner.path.clone(), run_id)
    }

    pub fn emit(&self, event: RunEvent, payload: EventPayload) -> anyhow::Result<Value> {
        let mut record = Map::new();
        record.insert("type".to_string(), Value::String(event.as_str().to_string()));
        record.insert(
            "run_id".to_string(),
            Value::String(self.inner.run_id.clone()),
        );
        record.insert("ts".to_string(), Value::String(now_utc_iso()));
        record.extend(payload);

        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create event log dir {}", parent.display()))?;
        }

        let line = serde_json::to_string(&record)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)
            .with_context(|| format!("open event log {}", self.inner.path.display()))?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(Value::Object(record))
    }
}

/// Parses every line of an events file. Blank lines are skipped.
pub fn read_events(path: &Path) -> anyhow::Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read event log {}", path.display()))?;
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).context("malformed event line"))
        .collect()
}

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
