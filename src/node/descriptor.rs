//! Persisted node record: identity, endpoints and lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    /// Created but never observed alive.
    Uninitialized,
    /// Process observed alive.
    Up,
    /// No live process tracked.
    Down,
    /// Marked for removal from the ring; the process may still be alive.
    #[serde(alias = "DECOMMISIONNED")]
    Decommissioned,
}

impl NodeStatus {
    /// Whether this status claims a live process.
    pub fn claims_process(self) -> bool {
        matches!(self, Self::Up | Self::Decommissioned)
    }

    /// Upper-case name as written to the descriptor file.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Decommissioned => "DECOMMISSIONED",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network endpoint the node binds, stored as an `[address, port]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, u16)", into = "(String, u16)")]
pub struct Interface {
    pub address: String,
    pub port: u16,
}

impl Interface {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl From<(String, u16)> for Interface {
    fn from((address, port): (String, u16)) -> Self {
        Self { address, port }
    }
}

impl From<Interface> for (String, u16) {
    fn from(itf: Interface) -> Self {
        (itf.address, itf.port)
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', {})", self.address, self.port)
    }
}

/// Client-facing and inter-node endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interfaces {
    pub thrift: Interface,
    pub storage: Interface,
}

/// The durable record of one node.
///
/// `pid` is only set while the node was last observed alive. The cluster
/// back-reference is not part of the record; it is supplied when the record is
/// bound to a [`Node`](super::Node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    name: String,
    pub status: NodeStatus,
    pub auto_bootstrap: bool,
    pub interfaces: Interfaces,
    pub jmx_port: u16,
    pub pid: Option<u32>,
}

impl NodeDescriptor {
    /// Create an UNINITIALIZED descriptor with no tracked process.
    pub fn new(
        name: impl Into<String>,
        auto_bootstrap: bool,
        thrift: Interface,
        storage: Interface,
        jmx_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            status: NodeStatus::Uninitialized,
            auto_bootstrap,
            interfaces: Interfaces { thrift, storage },
            jmx_port,
            pid: None,
        }
    }

    /// Node name; fixed at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thrift(&self) -> &Interface {
        &self.interfaces.thrift
    }

    pub fn storage(&self) -> &Interface {
        &self.interfaces.storage
    }
}
