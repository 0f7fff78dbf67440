//! Setlog command implementation.

use anyhow::Result;
use clap::Args;

use super::load_node;
use crate::core::config::Config;

/// Change the node's log level.
#[derive(Args, Debug)]
pub struct SetlogArgs {
    /// Node name.
    pub name: String,

    /// New root logger level.
    #[arg(value_parser = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"], ignore_case = true)]
    pub level: String,
}

/// Run the setlog command.
pub fn run_setlog(args: SetlogArgs, config: &Config) -> Result<()> {
    let node = load_node(config, &args.name)?;
    if !node.set_log_level(&args.level)? {
        anyhow::bail!("{} has no root logger line in its logging configuration", node.name());
    }
    println!("{}: log level set to {}", node.name(), args.level.to_ascii_uppercase());
    Ok(())
}
