//! Where the trip store keeps its files.

use std::env;
use std::path::PathBuf;

/// Storage configuration.
///
/// Reads from the `WANDERPLAN_DATA_DIR` environment variable, falling back
/// to the platform data directory (`~/.local/share/wanderplan` on Linux).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Root directory holding per-user trip files.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub const ENV_VAR: &str = "WANDERPLAN_DATA_DIR";

    /// Build a config from the environment.
    ///
    /// Priority: `WANDERPLAN_DATA_DIR`, then [`Self::default_data_dir`].
    pub fn from_env() -> Self {
        let data_dir = env::var_os(Self::ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_data_dir);
        Self { data_dir }
    }

    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `<platform data dir>/wanderplan`, or `./.wanderplan` when the
    /// platform has no data directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("wanderplan"))
            .unwrap_or_else(|| PathBuf::from(".wanderplan"))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_is_kept() {
        let cfg = StoreConfig::new("/tmp/trips");
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/trips"));
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        let dir = StoreConfig::default_data_dir();
        assert!(dir.ends_with("wanderplan") || dir.ends_with(".wanderplan"));
    }
}
