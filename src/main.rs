//! ccm-node - unified CLI entrypoint.
//!
//! Usage:
//!   ccm-node add node1 --thrift 127.0.0.1:9160 --storage 127.0.0.1:7000 --jmx-port 7100
//!   ccm-node start node1
//!   ccm-node show node1 [--format json]
//!   ccm-node stop node1
//!   ccm-node nodetool node1 ring
//!   ccm-node config validate

use anyhow::Result;
use ccm_node::cli::commands::{
    run_add, run_clear, run_config, run_decommission, run_nodetool, run_setlog, run_shell,
    run_show, run_start, run_stop,
};
use ccm_node::cli::{init_tracing, load_config, Cli, Commands};
use clap::Parser;
use std::path::PathBuf;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let overrides = cli.overrides();

    // Determine config path - use global --config or default
    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ccm.toml"));

    match cli.command {
        Commands::Config(args) => run_config(args, &config_path),
        command => {
            let config = load_config(&config_path, &overrides)?;
            init_tracing(&config.telemetry.log_level);

            match command {
                Commands::Add(args) => run_add(args, &config),
                Commands::Show(args) => run_show(args, &config),
                Commands::Start(args) => run_start(args, &config),
                Commands::Stop(args) => run_stop(args, &config),
                Commands::Decommission(args) => run_decommission(args, &config),
                Commands::Clear(args) => run_clear(args, &config),
                Commands::Nodetool(args) => run_nodetool(args, &config),
                Commands::Cli(args) => run_shell(args, &config),
                Commands::Setlog(args) => run_setlog(args, &config),
                Commands::Config(args) => run_config(args, &config_path),
            }
        }
    }
}
