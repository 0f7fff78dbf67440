//! Decommission command implementation.

use anyhow::Result;
use clap::Args;

use super::load_node;
use crate::core::config::Config;

/// Mark the node decommissioned.
#[derive(Args, Debug)]
pub struct DecommissionArgs {
    /// Node name.
    pub name: String,

    /// Also run `nodetool decommission` against the node first.
    #[arg(long)]
    pub nodetool: bool,
}

/// Run the decommission command.
pub fn run_decommission(args: DecommissionArgs, config: &Config) -> Result<()> {
    let mut node = load_node(config, &args.name)?;
    if args.nodetool {
        let status = node.nodetool(&config.cluster.install_dir, "decommission")?;
        if !status.success() {
            anyhow::bail!("nodetool decommission failed: {}", status);
        }
    }
    node.decommission()?;
    println!("{}: {}", node.name(), node.status_string());
    Ok(())
}
