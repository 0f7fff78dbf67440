//! Command-line interface.
//!
//! One subcommand per node operation; all of them load the tool
//! configuration, bind the named node and act on it.

pub mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::core::config::{Config, ConfigOverrides};

/// ccm-node - manage one node of a local Cassandra test cluster.
#[derive(Parser, Debug)]
#[command(name = "ccm-node")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Database installation directory, overriding the configured one.
    #[arg(long, global = true)]
    pub install_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Global flags that override configuration values.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            log_level: self.log_level.clone(),
            install_dir: self.install_dir.clone(),
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a node to the cluster directory.
    Add(commands::AddArgs),
    /// Show node status and properties.
    Show(commands::ShowArgs),
    /// Patch configuration and start the node.
    Start(commands::StartArgs),
    /// Kill the node's process.
    Stop(commands::StopArgs),
    /// Mark the node decommissioned.
    Decommission(commands::DecommissionArgs),
    /// Wipe the node's data, commit logs, caches and logs.
    Clear(commands::ClearArgs),
    /// Run an admin client command against the node.
    Nodetool(commands::NodetoolArgs),
    /// Open the interactive client on the node.
    Cli(commands::ShellArgs),
    /// Change the node's log level.
    Setlog(commands::SetlogArgs),
    /// Configuration operations.
    Config(commands::ConfigArgs),
}

/// Load the configuration file, apply CLI overrides, then validate the result.
pub fn load_config(path: &Path, overrides: &ConfigOverrides) -> Result<Config> {
    let mut config = Config::parse_file(path)
        .with_context(|| format!("failed to load config from {:?}", path))?;
    config.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}

/// Initialize tracing subscriber if the telemetry feature is enabled.
#[cfg(feature = "telemetry")]
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[cfg(not(feature = "telemetry"))]
pub fn init_tracing(_default_level: &str) {}
