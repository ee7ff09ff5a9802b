//! Configuration for worker clients and coordinator-side polling
//!
//! Supports:
//! - TOML/YAML configuration files
//! - Environment variable overrides
//! - Defaults matching the reference worker timings
//! - Validation

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct WorkerLinkConfig {
    #[serde(default)]
    pub write_node: WriteNodeConfig,

    #[serde(default)]
    pub build_index: BuildIndexConfig,

    #[serde(default)]
    pub poll: PollConfig,
}

impl WorkerLinkConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file specified by WORKERLINK_CONFIG env var
    /// 3. ./config/workerlink.{toml,yaml,json}
    /// 4. Hardcoded defaults (lowest priority)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        if let Ok(config_path) = std::env::var("WORKERLINK_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder.add_source(File::with_name("./config/workerlink").required(false));

        // Example: WORKERLINK__WRITE_NODE__MATURATION_MS=500
        builder = builder.add_source(
            Environment::with_prefix("WORKERLINK")
                .separator("__")
                .try_parsing(true),
        );

        let config: WorkerLinkConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("write_node.maturation_ms", DEFAULT_MATURATION_MS)?
            .set_default("build_index.maturation_ms", DEFAULT_MATURATION_MS)?
            .set_default("build_index.files_per_index", 3)?
            .set_default("poll.interval_ms", 100)?
            .set_default("poll.timeout_ms", 30_000)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_node.maturation_ms == 0 {
            return Err(ConfigError::Message(
                "write_node.maturation_ms must be > 0".to_string(),
            ));
        }

        if self.build_index.maturation_ms == 0 {
            return Err(ConfigError::Message(
                "build_index.maturation_ms must be > 0".to_string(),
            ));
        }

        if self.build_index.files_per_index == 0 {
            return Err(ConfigError::Message(
                "build_index.files_per_index must be > 0".to_string(),
            ));
        }

        if self.poll.interval_ms == 0 {
            return Err(ConfigError::Message(
                "poll.interval_ms must be > 0".to_string(),
            ));
        }

        if self.poll.timeout_ms < self.poll.interval_ms {
            return Err(ConfigError::Message(
                "poll.timeout_ms must be >= poll.interval_ms".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: WorkerLinkConfig = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;
        config.validate()?;

        Ok(config)
    }
}

/// Reference time for a flush or build to mature on a worker.
pub const DEFAULT_MATURATION_MS: u64 = 2_000;

/// Simulated write node timing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WriteNodeConfig {
    /// Time from flush submission until the segment reports closed
    pub maturation_ms: u64,
}

impl Default for WriteNodeConfig {
    fn default() -> Self {
        Self {
            maturation_ms: DEFAULT_MATURATION_MS,
        }
    }
}

impl WriteNodeConfig {
    pub fn maturation(&self) -> Duration {
        Duration::from_millis(self.maturation_ms)
    }
}

/// Simulated build worker timing and output shape
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildIndexConfig {
    /// Time from build submission until the job reports finished
    pub maturation_ms: u64,

    /// Number of artifact files reported per index
    pub files_per_index: usize,
}

impl Default for BuildIndexConfig {
    fn default() -> Self {
        Self {
            maturation_ms: DEFAULT_MATURATION_MS,
            files_per_index: 3,
        }
    }
}

impl BuildIndexConfig {
    pub fn maturation(&self) -> Duration {
        Duration::from_millis(self.maturation_ms)
    }
}

/// Coordinator-side polling cadence
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between consecutive polls
    pub interval_ms: u64,

    /// Give up after this long
    pub timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            timeout_ms: 30_000,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
