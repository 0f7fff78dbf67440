//! CLI command implementations.

mod add;
mod clear;
mod config;
mod decommission;
mod nodetool;
mod setlog;
mod shell;
mod show;
mod start;
mod stop;

pub use add::{run_add, AddArgs};
pub use clear::{run_clear, ClearArgs};
pub use config::{run_config, ConfigArgs};
pub use decommission::{run_decommission, DecommissionArgs};
pub use nodetool::{run_nodetool, NodetoolArgs};
pub use setlog::{run_setlog, SetlogArgs};
pub use shell::{run_shell, ShellArgs};
pub use show::{run_show, ShowArgs};
pub use start::{run_start, StartArgs};
pub use stop::{run_stop, StopArgs};

use anyhow::{Context, Result};

use crate::core::config::Config;
use crate::node::Node;

/// Bind the named node of the configured cluster.
fn load_node<'c>(config: &'c Config, name: &str) -> Result<Node<'c>> {
    Node::load(&config.cluster, name).with_context(|| {
        format!(
            "failed to load node {} from {}",
            name,
            config.cluster.root.display()
        )
    })
}
