//! Persisted settings record (`<home>/settings.json`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::atomic::write_atomic;
use crate::core::settings::Settings;

/// Load settings from disk. A missing file yields `None`.
pub fn load_settings(path: &Path) -> Result<Option<Settings>> {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file");
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read settings {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&contents)
        .with_context(|| format!("parse settings {}", path.display()))?;
    Ok(Some(settings))
}

/// Atomically write settings to disk.
pub fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    debug!(path = %path.display(), "writing settings");
    let mut buf = serde_json::to_string_pretty(settings).context("serialize settings")?;
    buf.push('\n');
    write_atomic(path, &buf, "settings")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_file_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let loaded = load_settings(&temp.path().join("settings.json")).expect("load");
        assert_eq!(loaded, None);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.json");
        let settings = Settings {
            name: Some("Acme".to_string()),
            email: Some("a@b.com".to_string()),
            pasta_vendas: Some(PathBuf::from("/v")),
            ..Settings::default()
        };
        write_settings(&path, &settings).expect("write");
        assert_eq!(load_settings(&path).expect("load"), Some(settings));
    }

    /// Files written by the earlier desktop app have only some of the keys.
    #[test]
    fn reads_partial_records() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.json");
        fs::write(
            &path,
            r#"{"name":"Acme","email":"a@b.com","pastaCancelados":"C:\\SAT\\CFeCanc"}"#,
        )
        .expect("write");
        let loaded = load_settings(&path).expect("load").expect("present");
        assert_eq!(loaded.name.as_deref(), Some("Acme"));
        assert_eq!(loaded.password, None);
        assert_eq!(
            loaded.pasta_cancelados,
            Some(PathBuf::from("C:\\SAT\\CFeCanc"))
        );
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.json");
        fs::write(&path, "{not json").expect("write");
        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("parse settings"));
    }
}
