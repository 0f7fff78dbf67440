//! Clear command implementation.

use anyhow::Result;
use clap::Args;

use super::load_node;
use crate::core::config::Config;

/// Wipe the node's runtime directories.
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Node name.
    pub name: String,
}

/// Run the clear command.
pub fn run_clear(args: ClearArgs, config: &Config) -> Result<()> {
    let mut node = load_node(config, &args.name)?;
    if node.is_running()? {
        anyhow::bail!("{} is running; stop it before clearing", node.name());
    }
    node.clear()?;
    println!("Cleared {}", node.name());
    Ok(())
}
