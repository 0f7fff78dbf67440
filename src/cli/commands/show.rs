//! Show command implementation.

use anyhow::Result;
use clap::Args;

use super::load_node;
use crate::core::config::Config;

/// Show node status and properties.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Node name.
    pub name: String,

    /// Print only the status line.
    #[arg(long)]
    pub only_status: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Run the show command.
pub fn run_show(args: ShowArgs, config: &Config) -> Result<()> {
    let mut node = load_node(config, &args.name)?;
    match args.format.as_str() {
        "json" => {
            let summary = node.summary()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => print!("{}", node.show(args.only_status, true)?),
    }
    Ok(())
}
