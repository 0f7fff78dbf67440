//! Nodetool command implementation.

use anyhow::Result;
use clap::Args;

use super::load_node;
use crate::core::config::Config;

/// Run an admin client command against the node.
#[derive(Args, Debug)]
pub struct NodetoolArgs {
    /// Node name.
    pub name: String,

    /// Admin subcommand (e.g. ring, flush, compact).
    pub cmd: String,
}

/// Run the nodetool command.
pub fn run_nodetool(args: NodetoolArgs, config: &Config) -> Result<()> {
    let node = load_node(config, &args.name)?;
    let status = node.nodetool(&config.cluster.install_dir, &args.cmd)?;
    if !status.success() {
        anyhow::bail!("nodetool {} exited with {}", args.cmd, status);
    }
    Ok(())
}
