//! Config command implementation.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::Path;

use crate::cluster::ClusterContext;
use crate::core::config::Config;

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the configuration file.
    Validate,
    /// Print configuration with defaults.
    Show {
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// Run the config command against the file at `path`.
pub fn run_config(args: ConfigArgs, path: &Path) -> Result<()> {
    match args.command {
        ConfigCommand::Validate => validate_config(path),
        ConfigCommand::Show { format } => show_config(path, &format),
    }
}

fn validate_config(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {:?}", path);
    }

    let config = Config::from_file(path)?;
    println!("✓ Config file is valid");

    let cluster = &config.cluster;
    if !cluster.install_dir.join("bin").join("cassandra").exists() {
        println!(
            "  ⚠ Warning: no server binary under {}",
            cluster.install_dir.display()
        );
    }
    if !cluster.root_path().exists() {
        println!(
            "  ⚠ Warning: cluster root {} does not exist yet",
            cluster.root_path().display()
        );
    }
    if cluster.seed_addresses().is_empty() {
        println!("  ⚠ Warning: cluster.seeds is empty");
    }

    println!("✓ Configuration validation complete");
    Ok(())
}

fn show_config(path: &Path, format: &str) -> Result<()> {
    let config = Config::from_file(path)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        _ => {
            // Default to TOML output
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
