//! Settings resolution: command line flags over a JSON file over
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::cli::Cli;

const DEFAULT_PORT: u16 = 22;
const DEFAULT_OP_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// On-disk settings file; every field optional so flags can fill gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileSettings {
    pub source: Option<PathBuf>,
    pub target: Option<String>,
    pub host: Option<String>,
    pub user: Option<String>,
    pub key: Option<PathBuf>,
    pub pull: Option<bool>,
    pub op_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl FileSettings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: PathBuf,
    pub target: String,
    /// Always `host:port`.
    pub host: String,
    pub user: String,
    pub key: PathBuf,
    pub pull: bool,
    pub dry_run: bool,
    pub op_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub log_level: String,
}

impl Settings {
    /// Merge flags over the optional settings file and validate.
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => FileSettings::load(path)?,
            None => FileSettings::default(),
        };

        let Some(source) = cli.source.clone().or(file.source) else {
            bail!("source root is required (--source or the settings file)");
        };
        let Some(target) = cli.target.clone().or(file.target) else {
            bail!("target root is required (--target or the settings file)");
        };
        let Some(host) = cli.host.clone().or(file.host) else {
            bail!("remote host is required (--host or the settings file)");
        };
        let Some(user) = cli.user.clone().or(file.user) else {
            bail!("ssh user is required (--user or the settings file)");
        };
        let Some(key) = cli.key.clone().or(file.key) else {
            bail!("private key path is required (--key or the settings file)");
        };

        let host = if host.contains(':') {
            host
        } else {
            format!("{host}:{DEFAULT_PORT}")
        };

        Ok(Self {
            source,
            target,
            host,
            user,
            key,
            pull: cli.pull || file.pull.unwrap_or(false),
            dry_run: cli.dry_run,
            op_timeout: Duration::from_secs(
                file.op_timeout_secs.unwrap_or(DEFAULT_OP_TIMEOUT_SECS),
            ),
            max_retries: file.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_base_delay: Duration::from_millis(
                file.retry_base_delay_ms.unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
            ),
            log_level: cli
                .log_level
                .clone()
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn full_cli() -> Cli {
        Cli {
            source: Some(PathBuf::from("/data")),
            target: Some("/srv/data".to_string()),
            host: Some("example.com".to_string()),
            user: Some("deploy".to_string()),
            key: Some(PathBuf::from("/home/deploy/.ssh/id_ed25519")),
            ..Cli::default()
        }
    }

    #[test]
    fn default_port_is_appended() {
        let settings = Settings::resolve(&full_cli()).unwrap();
        assert_eq!(settings.host, "example.com:22");
    }

    #[test]
    fn explicit_port_is_kept() {
        let mut cli = full_cli();
        cli.host = Some("example.com:2222".to_string());
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.host, "example.com:2222");
    }

    #[test]
    fn missing_source_is_rejected() {
        let mut cli = full_cli();
        cli.source = None;
        let err = Settings::resolve(&cli).unwrap_err();
        assert!(err.to_string().contains("source root is required"));
    }

    #[test]
    fn flags_override_the_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"source": "/from-file", "user": "filer", "pull": true, "maxRetries": 7}}"#
        )
        .unwrap();

        let mut cli = full_cli();
        cli.config = Some(file.path().to_path_buf());
        let settings = Settings::resolve(&cli).unwrap();

        // Flag wins where both are set; file fills the rest.
        assert_eq!(settings.source, PathBuf::from("/data"));
        assert_eq!(settings.user, "deploy");
        assert!(settings.pull);
        assert_eq!(settings.max_retries, 7);
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = Settings::resolve(&full_cli()).unwrap();
        assert!(!settings.pull);
        assert_eq!(settings.op_timeout, Duration::from_secs(60));
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn malformed_file_is_a_contextual_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let mut cli = full_cli();
        cli.config = Some(file.path().to_path_buf());
        let err = Settings::resolve(&cli).unwrap_err();
        assert!(err.to_string().contains("failed to parse settings file"));
    }
}
