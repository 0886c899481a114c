//! Configuration file management for wanderplan.
//!
//! Provides a TOML-based config file at `~/.config/wanderplan/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use wanderplan_core::{BatchConfig, PipelineConfig, RetryPolicy, TemplateConfig};
use wanderplan_store::StoreConfig;

pub const MODEL_CMD_ENV: &str = "WANDERPLAN_MODEL_CMD";
pub const PHOTO_CMD_ENV: &str = "WANDERPLAN_PHOTO_CMD";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub model: CommandSection,
    pub photos: CommandSection,
    pub storage: StorageSection,
    pub retry: RetryPolicy,
    pub batch: BatchConfig,
    pub templates: TemplateConfig,
}

/// An external command, as a whitespace-separated command line.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the wanderplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/wanderplan` or
/// `~/.config/wanderplan`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("wanderplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("wanderplan")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Load the config file if there is one; a missing file is an empty config.
pub fn load_config_if_present() -> Result<ConfigFile> {
    if config_path().exists() {
        load_config()
    } else {
        Ok(ConfigFile::default())
    }
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line; `None` defers to the next source.
#[derive(Debug, Default)]
pub struct Overrides {
    pub model_cmd: Option<String>,
    pub photo_cmd: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub count: Option<usize>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct WanderplanConfig {
    pub model_cmd: Option<String>,
    pub photo_cmd: Option<String>,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
}

impl WanderplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Model command: `--model-cmd` > `WANDERPLAN_MODEL_CMD` > `[model] command` > none
    /// - Photo command: `--photo-cmd` > `WANDERPLAN_PHOTO_CMD` > `[photos] command` > none
    /// - Data dir: `--data-dir` > `WANDERPLAN_DATA_DIR` > `[storage] data_dir` > platform data dir
    /// - Trip count: `--count` > `[batch] count` > 3
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let file = load_config_if_present()?;

        let model_cmd = overrides
            .model_cmd
            .or_else(|| non_empty_env(MODEL_CMD_ENV))
            .or(file.model.command);
        let photo_cmd = overrides
            .photo_cmd
            .or_else(|| non_empty_env(PHOTO_CMD_ENV))
            .or(file.photos.command);
        let data_dir = overrides
            .data_dir
            .or_else(|| non_empty_env(StoreConfig::ENV_VAR).map(PathBuf::from))
            .or(file.storage.data_dir)
            .unwrap_or_else(StoreConfig::default_data_dir);

        let mut pipeline = PipelineConfig {
            retry: file.retry,
            batch: file.batch,
            templates: file.templates,
        };
        if let Some(count) = overrides.count {
            pipeline.batch.count = count;
        }

        Ok(Self {
            model_cmd,
            photo_cmd,
            store: StoreConfig::new(data_dir),
            pipeline,
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point the config dir at a fresh temp dir and clear the command env
    /// vars for the duration of `f`.
    fn with_temp_config<T>(f: impl FnOnce(&std::path::Path) -> T) -> T {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        unsafe { std::env::remove_var(MODEL_CMD_ENV) };
        unsafe { std::env::remove_var(PHOTO_CMD_ENV) };
        unsafe { std::env::remove_var(StoreConfig::ENV_VAR) };

        let result = f(tmp.path());

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
        unsafe { std::env::remove_var(MODEL_CMD_ENV) };
        unsafe { std::env::remove_var(PHOTO_CMD_ENV) };
        unsafe { std::env::remove_var(StoreConfig::ENV_VAR) };
        result
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("wanderplan/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        with_temp_config(|root| {
            let original = ConfigFile {
                model: CommandSection {
                    command: Some("llm -m flash".to_string()),
                },
                batch: BatchConfig {
                    count: 5,
                    ..Default::default()
                },
                ..Default::default()
            };
            save_config(&original).unwrap();
            assert!(root.join("wanderplan/config.toml").exists());

            let loaded = load_config().unwrap();
            assert_eq!(loaded.model.command.as_deref(), Some("llm -m flash"));
            assert_eq!(loaded.batch.count, 5);
            assert!(loaded.photos.command.is_none());
            assert_eq!(loaded.retry, RetryPolicy::default());
        });
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        with_temp_config(|_| {
            save_config(&ConfigFile::default()).unwrap();
            let meta = std::fs::metadata(config_path()).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        });
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        with_temp_config(|_| {
            let config = WanderplanConfig::resolve(Overrides::default()).unwrap();
            assert!(config.model_cmd.is_none());
            assert!(config.photo_cmd.is_none());
            assert_eq!(config.store.data_dir, StoreConfig::default_data_dir());
            assert_eq!(config.pipeline, PipelineConfig::default());
        });
    }

    #[test]
    fn resolve_prefers_env_over_config_file() {
        with_temp_config(|_| {
            std::fs::create_dir_all(config_dir()).unwrap();
            std::fs::write(
                config_path(),
                "[model]\ncommand = \"from-file\"\n\n[photos]\ncommand = \"photo-file\"\n",
            )
            .unwrap();
            unsafe { std::env::set_var(MODEL_CMD_ENV, "from-env") };

            let config = WanderplanConfig::resolve(Overrides::default()).unwrap();
            assert_eq!(config.model_cmd.as_deref(), Some("from-env"));
            assert_eq!(config.photo_cmd.as_deref(), Some("photo-file"));
        });
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        with_temp_config(|_| {
            std::fs::create_dir_all(config_dir()).unwrap();
            std::fs::write(
                config_path(),
                "[storage]\ndata_dir = \"/from/file\"\n\n[batch]\ncount = 4\n",
            )
            .unwrap();
            unsafe { std::env::set_var(MODEL_CMD_ENV, "from-env") };
            unsafe { std::env::set_var(StoreConfig::ENV_VAR, "/from/env") };

            let config = WanderplanConfig::resolve(Overrides {
                model_cmd: Some("from-cli".to_string()),
                data_dir: Some(PathBuf::from("/from/cli")),
                count: Some(1),
                ..Default::default()
            })
            .unwrap();
            assert_eq!(config.model_cmd.as_deref(), Some("from-cli"));
            assert_eq!(config.store.data_dir, PathBuf::from("/from/cli"));
            assert_eq!(config.pipeline.batch.count, 1);
        });
    }

    #[test]
    fn file_values_apply_without_overrides() {
        with_temp_config(|_| {
            std::fs::create_dir_all(config_dir()).unwrap();
            std::fs::write(
                config_path(),
                "[storage]\ndata_dir = \"/from/file\"\n\n[batch]\ncount = 4\n\n[templates]\nnamed = \"Plan {name}\"\n",
            )
            .unwrap();

            let config = WanderplanConfig::resolve(Overrides::default()).unwrap();
            assert_eq!(config.store.data_dir, PathBuf::from("/from/file"));
            assert_eq!(config.pipeline.batch.count, 4);
            assert_eq!(config.pipeline.templates.named.as_deref(), Some("Plan {name}"));
        });
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        with_temp_config(|_| {
            std::fs::create_dir_all(config_dir()).unwrap();
            std::fs::write(config_path(), "[batch\ncount = ").unwrap();
            let err = WanderplanConfig::resolve(Overrides::default()).unwrap_err();
            assert!(err.to_string().contains("failed to parse config file"));
        });
    }
}
