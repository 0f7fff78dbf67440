//! ccm-node - lifecycle management for one node of a local test cluster.
//!
//! A locally simulated Cassandra cluster is a directory with one
//! subdirectory per node. Each node directory holds a persisted descriptor
//! (`node.conf`), the node's configuration files and its runtime state. This
//! crate keeps that descriptor truthful with respect to the real server
//! process, rewrites the configuration before each launch and drives
//! start/stop/decommission.
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Tool configuration (TOML)
//! - [`core::error`] - Error types
//!
//! ## Node
//! - [`node::descriptor`] - Persisted node record and status
//! - [`node::store`] - Descriptor load/save
//! - [`node::probe`] - Process liveness and status reconciliation
//! - [`node::patch`] - Configuration rewriting
//! - [`node::launcher`] - Server spawn, pid capture, kill
//! - [`node::layout`] - Node directory layout
//!
//! ## CLI
//! - [`cli::commands`] - CLI command implementations
//!
//! # Key Invariants
//!
//! - A pid is tracked only while the process was last observed alive
//! - The descriptor is rewritten on every durable change, and only then
//! - Configuration patches are idempotent

// Core infrastructure
pub mod core;

// Cluster context seen by a node
pub mod cluster;

// Node lifecycle
pub mod node;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, error};
pub use cluster::ClusterContext;
pub use node::{Node, NodeDescriptor, NodeStatus};
