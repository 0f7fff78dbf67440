//! Start command implementation.

use anyhow::{Context, Result};
use clap::Args;
use std::time::Duration;

use super::load_node;
use crate::core::config::Config;

/// Patch configuration and start the node.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Node name.
    pub name: String,

    /// Start with the configuration files as they are.
    #[arg(long)]
    pub no_update_config: bool,
}

/// Run the start command.
pub fn run_start(args: StartArgs, config: &Config) -> Result<()> {
    let mut node = load_node(config, &args.name)?;

    let child = node
        .launch(&config.cluster.install_dir, !args.no_update_config)
        .with_context(|| format!("failed to start {}", args.name))?;
    let launch = &config.launch;
    let captured = if launch.pid_poll_attempts > 1 {
        node.capture_pid_polling(
            child,
            launch.pid_poll_attempts,
            Duration::from_millis(launch.pid_poll_interval_ms),
        )
    } else {
        node.capture_pid(child)
    };

    match captured {
        Ok(_child) => {
            println!("{}: {}", node.name(), node.status_string());
            Ok(())
        }
        Err(e) if e.is_start_error() => {
            let message = e.to_string();
            let Some(child) = e.into_child() else {
                anyhow::bail!(message);
            };
            let aborted = node.abort_start(child)?;
            if aborted.killed {
                anyhow::bail!(
                    "{}: pidfile not written after {} read(s), server killed; raise launch.pid_poll_attempts",
                    message,
                    launch.pid_poll_attempts
                )
            }
            anyhow::bail!(
                "{}: server exited with {} before its pidfile was read\n{}",
                message,
                aborted.status,
                aborted.stderr.trim_end()
            )
        }
        Err(e) => Err(e.into()),
    }
}
