use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tagwise_learn::ConfidencePolicy;

/// Shape of the optional TOML config file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// SQLite database path. Defaults to `corrections.db` in the platform
    /// data directory.
    pub database: Option<PathBuf>,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: Option<String>,
    pub learning: ConfidencePolicy,
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content).context("parsing config file")?;
        settings
            .learning
            .validate()
            .context("invalid [learning] section")?;
        Ok(settings)
    }

    /// Reads `path` if given, else the default config location if a file
    /// exists there. Missing default config means built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (project_dirs().map(|d| d.config_dir().join("config.toml")), false),
        };

        match path {
            Some(p) if required || p.exists() => {
                let raw = std::fs::read_to_string(&p)
                    .with_context(|| format!("reading config file {}", p.display()))?;
                Self::from_toml(&raw)
            }
            _ => Ok(Settings::default()),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(p) => Ok(p.clone()),
            None => {
                let dirs = project_dirs().context("no home directory to place the database in")?;
                Ok(dirs.data_dir().join("corrections.db"))
            }
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "tagwise", "Tagwise")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert!(settings.database.is_none());
        assert_eq!(settings.log_filter(), "info");
        assert_eq!(settings.learning, ConfidencePolicy::default());
    }

    #[test]
    fn parses_all_sections() {
        let settings = Settings::from_toml(
            r#"
            database = "/tmp/tagwise.db"
            log_level = "debug"

            [learning]
            initial = 0.6
            step = 0.05
            "#,
        )
        .unwrap();
        assert_eq!(settings.database_path().unwrap(), PathBuf::from("/tmp/tagwise.db"));
        assert_eq!(settings.log_filter(), "debug");
        assert_eq!(settings.learning.initial, 0.6);
        assert_eq!(settings.learning.step, 0.05);
        // Unset keys keep their defaults.
        assert_eq!(settings.learning.prune_below, 0.3);
    }

    #[test]
    fn rejects_invalid_policy() {
        let result = Settings::from_toml(
            r#"
            [learning]
            prune_below = 1.5
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_level = \"warn\"\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.log_filter(), "warn");
    }
}
