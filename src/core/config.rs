//! Configuration parsing and validation.
//!
//! Tool configuration is loaded from a TOML file with CLI overrides. The
//! `[cluster]` section describes the cluster a node belongs to; the node itself
//! is described by its own descriptor file under the cluster root.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cluster::ClusterContext;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cluster the managed nodes belong to.
    pub cluster: ClusterConfig,

    /// Process launch behaviour.
    #[serde(default)]
    pub launch: LaunchConfig,

    /// Logging configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Cluster-wide settings consumed by node operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster name.
    pub name: String,

    /// Directory holding one subdirectory per node.
    pub root: PathBuf,

    /// Seed addresses written into every node's configuration.
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Partitioner class; left untouched in the node config when unset.
    #[serde(default)]
    pub partitioner: Option<String>,

    /// Database installation directory (contains `bin/` and `conf/`).
    pub install_dir: PathBuf,
}

/// Process launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Number of pidfile reads after spawning. One read matches the historical behaviour.
    #[serde(default = "default_pid_poll_attempts")]
    pub pid_poll_attempts: u32,

    /// Delay between pidfile reads in milliseconds.
    #[serde(default = "default_pid_poll_interval_ms")]
    pub pid_poll_interval_ms: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            pid_poll_attempts: default_pid_poll_attempts(),
            pid_poll_interval_ms: default_pid_poll_interval_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions

fn default_pid_poll_attempts() -> u32 {
    1
}

fn default_pid_poll_interval_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ClusterContext for ClusterConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn root_path(&self) -> &Path {
        &self.root
    }

    fn seed_addresses(&self) -> &[String] {
        &self.seeds
    }

    fn partitioner(&self) -> Option<&str> {
        self.partitioner.as_deref()
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = Self::parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating it.
    ///
    /// Callers that apply overrides validate the merged result themselves.
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "failed to parse config file")
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        if let Some(ref install_dir) = overrides.install_dir {
            self.cluster.install_dir = install_dir.clone();
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_cluster()?;
        self.validate_launch()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_cluster(&self) -> Result<()> {
        if self.cluster.name.trim().is_empty() {
            anyhow::bail!("cluster.name must not be empty");
        }
        if self.cluster.root.as_os_str().is_empty() {
            anyhow::bail!("cluster.root must not be empty");
        }
        if let Some(seed) = self.cluster.seeds.iter().find(|s| s.trim().is_empty()) {
            anyhow::bail!("cluster.seeds contains an empty address: {:?}", seed);
        }
        Ok(())
    }

    fn validate_launch(&self) -> Result<()> {
        if self.launch.pid_poll_attempts == 0 {
            anyhow::bail!("launch.pid_poll_attempts must be > 0");
        }
        Ok(())
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }
        Ok(())
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level.
    pub log_level: Option<String>,
    /// Override installation directory.
    pub install_dir: Option<PathBuf>,
}
