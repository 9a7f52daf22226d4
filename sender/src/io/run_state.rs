//! Run state storage: the once-per-month gate.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::atomic::write_atomic;

/// Persisted record (`<home>/state/run_state.json`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunState {
    /// Calendar month (1-12) whose send attempt was last started.
    #[serde(alias = "mes")]
    pub month: u32,
    /// Always `true` once written.
    #[serde(alias = "enviado")]
    pub sent: bool,
}

impl RunState {
    pub fn started(month: u32) -> Self {
        Self { month, sent: true }
    }
}

/// Durable "already attempted this month" record.
///
/// The gate is keyed on the current calendar month, never on the period
/// being sent.
pub trait RunStateStore {
    /// Current record; `None` when the workflow never ran.
    fn load(&self) -> Result<Option<RunState>>;

    /// Overwrite the record with `{month, sent: true}`.
    fn mark_run_started(&self, month: u32) -> Result<()>;

    fn has_run_this_month(&self, month: u32) -> Result<bool> {
        Ok(self.load()?.is_some_and(|state| state.month == month))
    }

    /// Check and mark in one step. Returns `false` if `month` was already
    /// consumed, leaving the record untouched.
    fn claim_month(&self, month: u32) -> Result<bool> {
        claim(self, month)
    }
}

fn claim<S: RunStateStore + ?Sized>(store: &S, month: u32) -> Result<bool> {
    if store.has_run_this_month(month)? {
        debug!(month, "month already consumed");
        return Ok(false);
    }
    store.mark_run_started(month)?;
    info!(month, "month claimed");
    Ok(true)
}

/// JSON file store. Claims are serialized so concurrent runs in one process
/// cannot both pass the check before either marks the month. Separate
/// processes are not locked against each other.
#[derive(Debug)]
pub struct FileRunStateStore {
    path: PathBuf,
    claim_lock: Mutex<()>,
}

impl FileRunStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            claim_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunStateStore for FileRunStateStore {
    fn load(&self) -> Result<Option<RunState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        match load_run_state(&self.path) {
            Ok(state) => Ok(Some(state)),
            Err(err) if err.chain().any(|cause| cause.is::<serde_json::Error>()) => {
                warn!(
                    path = %self.path.display(),
                    error = %format!("{err:#}"),
                    "unparseable run state, treating as never run"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn mark_run_started(&self, month: u32) -> Result<()> {
        write_run_state(&self.path, &RunState::started(month))
    }

    fn claim_month(&self, month: u32) -> Result<bool> {
        let _guard = self
            .claim_lock
            .lock()
            .map_err(|_| anyhow!("run state lock poisoned"))?;
        claim(self, month)
    }
}

/// Load run state from disk.
pub fn load_run_state(path: &Path) -> Result<RunState> {
    debug!(path = %path.display(), "loading run state");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read run state {}", path.display()))?;
    let state: RunState = serde_json::from_str(&contents)
        .with_context(|| format!("parse run state {}", path.display()))?;
    debug!(month = state.month, "run state loaded");
    Ok(state)
}

/// Atomically write run state to disk (temp file + rename).
pub fn write_run_state(path: &Path, state: &RunState) -> Result<()> {
    debug!(path = %path.display(), month = state.month, "writing run state");
    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');
    write_atomic(path, &buf, "run state")
}
