//! Test-only fakes and fixtures shared by unit and integration tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use tempfile::TempDir;

use crate::core::settings::Settings;
use crate::io::archiver::{ArchiveError, Archiver};
use crate::io::mailer::{MailError, MailRequest, Mailer};
use crate::io::paths::AppPaths;
use crate::io::run_state::{RunState, RunStateStore};

/// Calendar date shorthand.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Complete settings for "Acme" sending from a@b.com to c@d.com.
pub fn sample_settings(
    pasta_vendas: impl AsRef<Path>,
    pasta_cancelados: impl AsRef<Path>,
) -> Settings {
    Settings {
        name: Some("Acme".to_string()),
        email: Some("a@b.com".to_string()),
        password: Some("x".to_string()),
        contabilidade: Some("c@d.com".to_string()),
        cnpj: Some("123".to_string()),
        pasta_vendas: Some(pasta_vendas.as_ref().to_path_buf()),
        pasta_cancelados: Some(pasta_cancelados.as_ref().to_path_buf()),
    }
}

/// Write one document into `<base>/<year>/<MM>/<name>`.
pub fn write_document(base: &Path, year: i32, month: u32, name: &str, contents: &str) -> PathBuf {
    let dir = base.join(year.to_string()).join(format!("{month:02}"));
    fs::create_dir_all(&dir).expect("create document dir");
    let path = dir.join(name);
    fs::write(&path, contents).expect("write document");
    path
}

/// Temporary home directory with the canonical layout.
pub struct TestHome {
    dir: TempDir,
    pub paths: AppPaths,
}

impl TestHome {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let paths = AppPaths::new(dir.path().join("home"));
        Ok(Self { dir, paths })
    }

    /// Scratch space next to the home directory (document trees live here).
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Archiver that "succeeds" for a fixed set of source folders and records every call.
#[derive(Debug, Default)]
pub struct FakeArchiver {
    available: HashSet<PathBuf>,
    calls: RefCell<Vec<PathBuf>>,
    discarded: RefCell<Vec<PathBuf>>,
}

impl FakeArchiver {
    pub fn with_available<I>(sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        Self {
            available: sources.into_iter().map(Into::into).collect(),
            calls: RefCell::new(Vec::new()),
            discarded: RefCell::new(Vec::new()),
        }
    }

    /// Source folders passed to `archive`, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }

    /// Destinations passed to `discard`, in call order.
    pub fn discarded(&self) -> Vec<PathBuf> {
        self.discarded.borrow().clone()
    }
}

impl Archiver for FakeArchiver {
    fn archive(&self, source: &Path, destination: &Path) -> Result<PathBuf, ArchiveError> {
        self.calls.borrow_mut().push(source.to_path_buf());
        if self.available.contains(source) {
            Ok(destination.to_path_buf())
        } else {
            Err(ArchiveError::SourceUnavailable {
                path: source.to_path_buf(),
                reason: "not found".to_string(),
            })
        }
    }

    fn discard(&self, destination: &Path) -> Result<(), ArchiveError> {
        self.discarded.borrow_mut().push(destination.to_path_buf());
        Ok(())
    }
}

/// Mailer that records requests and optionally fails every send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    failure: Option<MailError>,
    sent: RefCell<Vec<MailRequest>>,
}

impl RecordingMailer {
    pub fn failing(error: MailError) -> Self {
        Self {
            failure: Some(error),
            sent: RefCell::new(Vec::new()),
        }
    }

    /// Requests that reached the mailer, including failed ones.
    pub fn sent(&self) -> Vec<MailRequest> {
        self.sent.borrow().clone()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, request: &MailRequest) -> Result<(), MailError> {
        self.sent.borrow_mut().push(request.clone());
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// In-memory run state.
#[derive(Debug, Default)]
pub struct MemoryRunStateStore {
    state: RefCell<Option<RunState>>,
    fail_writes: bool,
}

impl MemoryRunStateStore {
    pub fn with_state(state: RunState) -> Self {
        Self {
            state: RefCell::new(Some(state)),
            fail_writes: false,
        }
    }

    /// Store whose writes always fail (e.g. read-only disk).
    pub fn failing_writes() -> Self {
        Self {
            state: RefCell::new(None),
            fail_writes: true,
        }
    }

    pub fn current(&self) -> Option<RunState> {
        *self.state.borrow()
    }
}

impl RunStateStore for MemoryRunStateStore {
    fn load(&self) -> Result<Option<RunState>> {
        Ok(self.current())
    }

    fn mark_run_started(&self, month: u32) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow!("read-only file system"));
        }
        *self.state.borrow_mut() = Some(RunState::started(month));
        Ok(())
    }
}
