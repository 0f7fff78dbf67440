//! Stop command implementation.

use anyhow::Result;
use clap::Args;

use super::load_node;
use crate::core::config::Config;

/// Kill the node's process.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Node name.
    pub name: String,
}

/// Run the stop command.
pub fn run_stop(args: StopArgs, config: &Config) -> Result<()> {
    let mut node = load_node(config, &args.name)?;
    if node.stop()? {
        println!("Stopped {}", node.name());
    } else {
        println!("{} was not running", node.name());
    }
    Ok(())
}
