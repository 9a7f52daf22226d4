//! Canonical on-disk locations under the sender home directory.

use std::path::PathBuf;

use anyhow::{Result, anyhow};

use super::config::SenderConfig;

const APP_DIR: &str = "sat-sender";

/// All canonical paths for a home directory.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub home: PathBuf,
    pub settings_path: PathBuf,
    pub config_path: PathBuf,
    pub state_dir: PathBuf,
    pub run_state_path: PathBuf,
    pub archives_dir: PathBuf,
}

impl AppPaths {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let state_dir = home.join("state");
        Self {
            settings_path: home.join("settings.json"),
            config_path: home.join("config.toml"),
            run_state_path: state_dir.join("run_state.json"),
            archives_dir: home.join("archives"),
            state_dir,
            home,
        }
    }

    /// Directory receiving the archives: `archive_dir` from config, relative
    /// paths resolved against home, else `<home>/archives`.
    pub fn archive_dir(&self, cfg: &SenderConfig) -> PathBuf {
        match &cfg.archive_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.home.join(dir),
            None => self.archives_dir.clone(),
        }
    }
}

/// Platform local data directory joined with the application name.
pub fn default_home() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("no local data directory on this platform (pass --home)"))?;
    Ok(base.join(APP_DIR))
}
