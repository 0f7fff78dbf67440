//! Add command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::core::config::Config;
use crate::node::{Interface, Node};

/// Add a node to the cluster directory.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Node name, unique within the cluster.
    pub name: String,

    /// Client-facing endpoint (address:port).
    #[arg(long, value_parser = parse_interface)]
    pub thrift: Interface,

    /// Inter-node endpoint (address:port).
    #[arg(long, value_parser = parse_interface)]
    pub storage: Interface,

    /// Management port.
    #[arg(long)]
    pub jmx_port: u16,

    /// Let the node bootstrap data when it joins.
    #[arg(long)]
    pub auto_bootstrap: bool,

    /// Do not copy the installation's conf/ files into the node.
    #[arg(long)]
    pub no_import_conf: bool,
}

/// Run the add command.
pub fn run_add(args: AddArgs, config: &Config) -> Result<()> {
    if config.cluster.root.join(&args.name).exists() {
        anyhow::bail!("node {} already exists", args.name);
    }

    let node = Node::create(
        &config.cluster,
        &args.name,
        args.auto_bootstrap,
        args.thrift,
        args.storage,
        args.jmx_port,
    )?;

    if !args.no_import_conf {
        let copied = node
            .dirs()
            .import_conf(&config.cluster.install_dir)
            .with_context(|| "failed to import configuration from installation")?;
        println!("Imported {} configuration files", copied);
    }

    println!("Added node {} at {}", node.name(), node.path().display());
    Ok(())
}

/// Parse `address:port`.
pub(crate) fn parse_interface(value: &str) -> Result<Interface, String> {
    let (address, port) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected address:port, got {:?}", value))?;
    if address.is_empty() {
        return Err(format!("missing address in {:?}", value));
    }
    let port = port
        .parse::<u16>()
        .map_err(|e| format!("invalid port in {:?}: {}", value, e))?;
    Ok(Interface::new(address, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interface() {
        assert_eq!(
            parse_interface("127.0.0.1:9160").unwrap(),
            Interface::new("127.0.0.1", 9160)
        );
        assert!(parse_interface("127.0.0.1").is_err());
        assert!(parse_interface(":9160").is_err());
        assert!(parse_interface("127.0.0.1:99999").is_err());
    }
}
