//! Settings file for the command line runner
//!
//! Settings live in `<config_dir>/sqlfile/settings.toml` unless a path is
//! given with `--config`. Every key is optional; command line flags win over
//! file values.
//!
//! ```toml
//! database = "~/data/app.db"
//! log_filter = "info,sqlfile=debug"
//! log_dir = "/var/log/sqlfile"
//! format = "json"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Database to run statements against
    pub database: Option<String>,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: Option<String>,
    /// Directory for daily-rotated JSON log files
    pub log_dir: Option<PathBuf>,
    pub format: OutputFormat,
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sqlfile").join("settings.toml"))
    }

    /// Load settings from `explicit`, or from the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        Self::from_toml(&text).with_context(|| format!("Invalid settings file: {:?}", path))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_settings() {
        let settings = Settings::from_toml(indoc! {r#"
            database = "app.db"
            log_filter = "debug"
            log_dir = "/tmp/sqlfile-logs"
            format = "json"
        "#})
        .unwrap();

        assert_eq!(
            settings,
            Settings {
                database: Some("app.db".to_string()),
                log_filter: Some("debug".to_string()),
                log_dir: Some(PathBuf::from("/tmp/sqlfile-logs")),
                format: OutputFormat::Json,
            }
        );
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.format, OutputFormat::Table);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Settings::from_toml("databse = \"typo.db\"").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("settings.toml");

        let err = Settings::load(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "database = \":memory:\"\n").unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.database.as_deref(), Some(":memory:"));
    }
}
