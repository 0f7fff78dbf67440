//! Interactive client command implementation.

use anyhow::Result;
use clap::Args;

use super::load_node;
use crate::core::config::Config;

/// Open the interactive client on the node.
#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Node name.
    pub name: String,
}

/// Run the cli command. Does not return on success.
pub fn run_shell(args: ShellArgs, config: &Config) -> Result<()> {
    let node = load_node(config, &args.name)?;
    Err(node.run_cli(&config.cluster.install_dir).into())
}
