//! Runtime configuration: a YAML file of recognized options
//! with defaults, following the pattern of a single parsed
//! config struct handed to every subsystem at startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;

fn default_inbox() -> PathBuf {
    PathBuf::from("inbox")
}
fn default_processed() -> PathBuf {
    PathBuf::from("processed")
}
fn default_failed() -> PathBuf {
    PathBuf::from("failed")
}
fn default_poll_seconds() -> u64 {
    3
}
fn default_snapshot_every_seconds() -> u64 {
    60
}
fn default_metrics_every_seconds() -> u64 {
    10
}
fn default_max_files_per_tick() -> u32 {
    4
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub inbox_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub failed_dir: PathBuf,
    pub poll_seconds: u64,
    pub snapshot_every_seconds: u64,
    pub metrics_every_seconds: u64,
    pub max_files_per_tick: u32,
    pub enable_decay: bool,
    pub enable_srs: bool,
    pub snapshot_path: PathBuf,
    pub metrics_log_path: PathBuf,
    pub http_addr: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inbox_dir: default_inbox(),
            processed_dir: default_processed(),
            failed_dir: default_failed(),
            poll_seconds: default_poll_seconds(),
            snapshot_every_seconds: default_snapshot_every_seconds(),
            metrics_every_seconds: default_metrics_every_seconds(),
            max_files_per_tick: default_max_files_per_tick(),
            enable_decay: false,
            enable_srs: false,
            snapshot_path: PathBuf::from("melvin.snapshot"),
            metrics_log_path: PathBuf::from("melvin_metrics.csv"),
            http_addr: Some("127.0.0.1:4287".to_string()),
        }
    }
}

impl EngineConfig {
    /// Load from a YAML file, falling back to all defaults if it doesn't
    /// exist. Any recognized numerical parameter may also be overridden
    /// via `MELVIN_<NAME>` environment variables, applied after load via
    /// `ParameterGenome::apply_env_overrides` for the reasoning knobs and
    /// directly here for engine-level options.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.inbox_dir)?;
        std::fs::create_dir_all(&self.processed_dir)?;
        std::fs::create_dir_all(&self.failed_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load("/nonexistent/melvin.yaml").unwrap();
        assert_eq!(config.poll_seconds, 3);
        assert_eq!(config.max_files_per_tick, 4);
    }

    #[test]
    fn parses_a_partial_yaml_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("melvin.yaml");
        std::fs::write(&path, "poll_seconds: 7\nenable_srs: true\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.poll_seconds, 7);
        assert!(config.enable_srs);
        assert_eq!(config.snapshot_every_seconds, 60); // untouched default
    }
}
