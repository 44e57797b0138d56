//! Migration configuration.
//!
//! Loaded from a TOML file; command line flags are applied on top with
//! [`MigrateConfig::apply_overrides`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, MigrateError, Result};

pub const CONFIG_FILE_NAME: &str = "webform-migrate.toml";

/// Options recognised by a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationOptions {
    /// Restrict the run to one legacy form (nid)
    pub form_identifier: Option<i64>,
    /// Produce and report results without persisting them
    pub simulate: bool,
    /// Cap on submissions per form; `Some(0)` disables submissions, `None`
    /// is unlimited
    pub max_submissions: Option<u64>,
}

impl MigrationOptions {
    /// Whether submissions should be loaded at all.
    pub fn loads_submissions(&self) -> bool {
        self.max_submissions != Some(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Legacy (source) database
    #[serde(default = "default_legacy")]
    pub legacy: DatabaseConfig,
    /// Target database
    #[serde(default = "default_target")]
    pub target: DatabaseConfig,
    #[serde(default)]
    pub migration: MigrationOptions,
}

fn default_legacy() -> DatabaseConfig {
    DatabaseConfig {
        path: PathBuf::from("legacy.db"),
    }
}

fn default_target() -> DatabaseConfig {
    DatabaseConfig {
        path: PathBuf::from("target.db"),
    }
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            legacy: default_legacy(),
            target: default_target(),
            migration: MigrationOptions::default(),
        }
    }
}

impl MigrateConfig {
    /// Apply command line overrides. Flags that were not given leave the
    /// file values alone.
    pub fn apply_overrides(
        &mut self,
        form_identifier: Option<i64>,
        simulate: bool,
        max_submissions: Option<u64>,
    ) {
        if form_identifier.is_some() {
            self.migration.form_identifier = form_identifier;
        }
        if simulate {
            self.migration.simulate = true;
        }
        if max_submissions.is_some() {
            self.migration.max_submissions = max_submissions;
        }
    }
}

/// Load configuration from a TOML file.
///
/// Relative database paths are resolved against the file's directory.
pub async fn load_config(path: &Path) -> Result<MigrateConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MigrateError::Config {
            config_path: path.display().to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    let mut config: MigrateConfig =
        toml::from_str(&content).map_err(|e| MigrateError::Config {
            config_path: path.display().to_string(),
            cause: ConfigError::TomlParse(e.to_string()),
        })?;

    if config.migration.form_identifier.is_some_and(|nid| nid <= 0) {
        return Err(MigrateError::Config {
            config_path: path.display().to_string(),
            cause: ConfigError::InvalidValue {
                field: "migration.form_identifier".to_string(),
                reason: "must be a positive legacy form id".to_string(),
            },
        });
    }

    let base_dir = path.parent().unwrap_or(Path::new("."));
    config.legacy.path = resolve_path(base_dir, &config.legacy.path);
    config.target.path = resolve_path(base_dir, &config.target.path);

    Ok(config)
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Standard config locations, most specific first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("webform-migrate").join("config.toml"));
    }
    paths
}

/// Load the first config found in the standard locations, or defaults.
pub async fn load_config_from_standard_locations() -> Result<MigrateConfig> {
    for path in config_paths() {
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_config(&path).await;
        }
    }

    Ok(MigrateConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_load_config_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(
            &path,
            r#"
[legacy]
path = "d7.db"

[migration]
form_identifier = 12
max_submissions = 0
"#,
        )
        .await
        .unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.legacy.path, dir.path().join("d7.db"));
        assert_eq!(config.target.path, dir.path().join("target.db"));
        assert_eq!(config.migration.form_identifier, Some(12));
        assert!(!config.migration.simulate);
        assert!(!config.migration.loads_submissions());
    }

    #[tokio::test]
    async fn test_invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "[migration\nsimulate = yes").await.unwrap();

        let err = load_config(&path).await.unwrap_err();
        assert!(matches!(
            err,
            MigrateError::Config {
                cause: ConfigError::TomlParse(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_negative_form_identifier_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "[migration]\nform_identifier = -3\n")
            .await
            .unwrap();

        let err = load_config(&path).await.unwrap_err();
        assert!(matches!(
            err,
            MigrateError::Config {
                cause: ConfigError::InvalidValue { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = MigrateConfig::default();
        config.migration.max_submissions = Some(10);

        config.apply_overrides(Some(4), false, None);
        assert_eq!(config.migration.form_identifier, Some(4));
        assert_eq!(config.migration.max_submissions, Some(10));
        assert!(!config.migration.simulate);

        config.apply_overrides(None, true, Some(0));
        assert_eq!(config.migration.form_identifier, Some(4));
        assert_eq!(config.migration.max_submissions, Some(0));
        assert!(config.migration.simulate);
    }
}
