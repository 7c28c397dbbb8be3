//! assetgen configuration types and loading

use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::renderer::SyntheticConfig;
use crate::scheduler::SchedulerConfig;

/// Main assetgen configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Job scheduler limits and timing
    pub scheduler: SchedulerConfig,

    /// Synthetic renderer used by `ag simulate`
    pub synthetic: SyntheticConfig,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// An explicit path must load. Otherwise the first readable file from
    /// [`Config::search_paths`] wins, and defaults apply when none does.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => warn!(path = %candidate.display(), error = %e, "Skipping unusable config file"),
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Project-local file first, then the user config directory
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".assetgen.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("assetgen").join("assetgen.yml"));
        }
        paths
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.max_jobs == Some(0) {
            bail!("scheduler.max-jobs must be at least 1");
        }
        if self.scheduler.channel_buffer == 0 {
            bail!("scheduler.channel-buffer must be at least 1");
        }
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate().context("Invalid config file")?;

        debug!(path = %path.display(), ?config, "Config::load_from_file: loaded");
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduler, SchedulerConfig::default());
        assert_eq!(config.synthetic, SyntheticConfig::default());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "scheduler:\n  max-jobs: 2\n  quiet-period-ms: 250\nsynthetic:\n  latency-ms: 5\n  fail-every: 3"
        )
        .unwrap();

        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.scheduler.max_jobs, Some(2));
        assert_eq!(config.scheduler.quiet_period_ms, 250);
        assert_eq!(config.scheduler.channel_buffer, 256);
        assert_eq!(config.synthetic.latency_ms, 5);
        assert_eq!(config.synthetic.fail_every, 3);
        assert_eq!(config.synthetic.layer_width, 64);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let path = PathBuf::from("/nonexistent/assetgen.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "scheduler: [not, a, map]").unwrap();
        assert!(Config::load(Some(&file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_load_rejects_zero_max_jobs() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "scheduler:\n  max-jobs: 0").unwrap();
        let err = Config::load(Some(&file.path().to_path_buf())).unwrap_err();
        assert!(format!("{:?}", err).contains("max-jobs"));
    }

    #[test]
    fn test_validate_defaults() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.scheduler.channel_buffer = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_paths_start_local() {
        let paths = Config::search_paths();
        assert_eq!(paths[0], PathBuf::from(".assetgen.yml"));
        assert!(paths.iter().skip(1).all(|p| p.ends_with("assetgen/assetgen.yml")));
    }

    #[test]
    fn test_yaml_roundtrip_uses_kebab_keys() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(yaml.contains("quiet-period-ms"));
        assert!(yaml.contains("latency-ms"));
    }
}
