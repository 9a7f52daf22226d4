//! Sender configuration stored at `<home>/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// Operator configuration (TOML).
///
/// Intended to be edited by hand. Missing fields default to the Gmail relay
/// the tool was first deployed against.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SenderConfig {
    /// SMTP relay host. Connections use implicit TLS.
    pub smtp_host: String,

    /// Override the relay port (465 when unset).
    pub smtp_port: Option<u16>,

    /// Upper bound for the whole SMTP exchange, in seconds.
    pub smtp_timeout_secs: u64,

    /// Where `Vendas.zip` and `Cancelados.zip` are written. Relative paths
    /// resolve against the home directory.
    pub archive_dir: Option<PathBuf>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: None,
            smtp_timeout_secs: 60,
            archive_dir: None,
        }
    }
}

impl SenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.smtp_host.trim().is_empty() {
            return Err(anyhow!("smtp_host must be non-empty"));
        }
        if self.smtp_port == Some(0) {
            return Err(anyhow!("smtp_port must be > 0"));
        }
        if self.smtp_timeout_secs == 0 {
            return Err(anyhow!("smtp_timeout_secs must be > 0"));
        }
        Ok(())
    }

    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SenderConfig::default()`.
pub fn load_config(path: &Path) -> Result<SenderConfig> {
    if !path.exists() {
        let cfg = SenderConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SenderConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate().with_context(|| format!("invalid {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, SenderConfig::default());
    }

    #[test]
    fn full_file_overrides_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let contents = r#"
smtp_host = "smtp.example.com"
smtp_port = 2465
smtp_timeout_secs = 15
archive_dir = "zips"
"#;
        fs::write(&path, contents).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(
            loaded,
            SenderConfig {
                smtp_host: "smtp.example.com".to_string(),
                smtp_port: Some(2465),
                smtp_timeout_secs: 15,
                archive_dir: Some(PathBuf::from("zips")),
            }
        );
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "smtp_timeout_secs = 5\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.smtp_host, "smtp.gmail.com");
        assert_eq!(cfg.smtp_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "smtp_timeout_secs = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("smtp_timeout_secs"));
    }
}
