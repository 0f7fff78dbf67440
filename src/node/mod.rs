//! Single-node lifecycle.
//!
//! A [`Node`] binds a persisted [`NodeDescriptor`] to the cluster it belongs
//! to and drives the status state machine:
//!
//! ```text
//! UNINITIALIZED ──start + capture_pid──▶ UP
//! UP ──stop──▶ DOWN
//! UP ──probe finds process gone──▶ DOWN
//! UNINITIALIZED/DOWN/UP ──decommission──▶ DECOMMISSIONED
//! DECOMMISSIONED ──probe finds process gone──▶ DOWN
//! ```
//!
//! Each invocation of the managing program loads a fresh descriptor, acts and
//! persists; nothing durable lives only in memory.

pub mod descriptor;
pub mod launcher;
pub mod layout;
pub mod patch;
pub mod probe;
pub mod store;

use serde::Serialize;
use std::path::Path;
use std::process::{Child, ExitStatus};
use std::time::Duration;

pub use descriptor::{Interface, Interfaces, NodeDescriptor, NodeStatus};
pub use launcher::{AbortedStart, ProcessLauncher};
pub use layout::{DirectoryManager, NodeDir};
pub use patch::ConfigPatcher;
pub use probe::{Liveness, ProcessAliveChecker, ProcessSignaller, SignalChecker, StatusProber};
pub use store::PersistenceStore;

use crate::cluster::ClusterContext;
use crate::core::error::{NodeError, NodeResult};

/// One node of a cluster, with its descriptor loaded.
pub struct Node<'c> {
    descriptor: NodeDescriptor,
    cluster: &'c dyn ClusterContext,
    store: PersistenceStore,
    dirs: DirectoryManager,
    signaller: Box<dyn ProcessSignaller>,
}

/// Serializable view of a node for status output.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub cluster: String,
    pub status: NodeStatus,
    pub auto_bootstrap: bool,
    pub thrift: Interface,
    pub storage: Interface,
    pub jmx_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl<'c> Node<'c> {
    fn bind(cluster: &'c dyn ClusterContext, descriptor: NodeDescriptor) -> Self {
        Self {
            store: PersistenceStore::new(cluster.root_path()),
            dirs: DirectoryManager::new(cluster.node_path(descriptor.name())),
            descriptor,
            cluster,
            signaller: Box::new(SignalChecker),
        }
    }

    /// Add a new UNINITIALIZED node: create its directory tree and persist it.
    pub fn create(
        cluster: &'c dyn ClusterContext,
        name: &str,
        auto_bootstrap: bool,
        thrift: Interface,
        storage: Interface,
        jmx_port: u16,
    ) -> NodeResult<Self> {
        let descriptor = NodeDescriptor::new(name, auto_bootstrap, thrift, storage, jmx_port);
        let node = Self::bind(cluster, descriptor);
        node.dirs.create()?;
        node.store.save(&node.descriptor)?;
        tracing::info!(node = name, cluster = cluster.name(), "node created");
        Ok(node)
    }

    /// Load the named node from the cluster root.
    pub fn load(cluster: &'c dyn ClusterContext, name: &str) -> NodeResult<Self> {
        let descriptor = store::load_from(cluster.root_path(), name)?;
        Ok(Self::bind(cluster, descriptor))
    }

    /// Replace the OS process checker.
    pub fn with_signaller(mut self, signaller: Box<dyn ProcessSignaller>) -> Self {
        self.signaller = signaller;
        self
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    pub fn cluster(&self) -> &dyn ClusterContext {
        self.cluster
    }

    pub fn path(&self) -> &Path {
        self.dirs.root()
    }

    pub fn dirs(&self) -> &DirectoryManager {
        &self.dirs
    }

    fn launcher(&self) -> ProcessLauncher<'_> {
        ProcessLauncher::new(&self.dirs, &self.store, self.signaller.as_ref())
    }

    /// Reconcile the status with the process table, persisting on change.
    pub fn update_status(&mut self) -> NodeResult<NodeStatus> {
        StatusProber::new(self.signaller.as_ref()).refresh(&mut self.descriptor, &self.store)?;
        Ok(self.descriptor.status)
    }

    /// UP or DECOMMISSIONED after reconciliation.
    pub fn is_running(&mut self) -> NodeResult<bool> {
        Ok(self.update_status()?.claims_process())
    }

    /// UP after reconciliation.
    pub fn is_live(&mut self) -> NodeResult<bool> {
        Ok(self.update_status()? == NodeStatus::Up)
    }

    /// Status as shown to operators.
    pub fn status_string(&self) -> String {
        match self.descriptor.status {
            NodeStatus::Uninitialized => format!("{} (Not initialized)", NodeStatus::Down),
            other => other.to_string(),
        }
    }

    /// Rewrite the main configuration, logging configuration and environment script.
    pub fn update_configuration(&self) -> NodeResult<()> {
        ConfigPatcher::new(&self.descriptor, &self.dirs, self.cluster).update_all()
    }

    /// Change the root logger level. Returns `false` if the logging config has no root logger line.
    pub fn set_log_level(&self, level: &str) -> NodeResult<bool> {
        ConfigPatcher::new(&self.descriptor, &self.dirs, self.cluster).set_log_level(level)
    }

    /// Spawn the server from `install_dir`.
    ///
    /// Refused while a live process is tracked. A decommissioned node whose
    /// process has exited is reconciled to DOWN first and may be started again.
    pub fn start(&mut self, install_dir: &Path) -> NodeResult<Child> {
        self.ensure_stopped()?;
        self.launcher().start(install_dir)
    }

    /// Refuse with [`NodeError::AlreadyRunning`] while a live process is tracked.
    pub fn ensure_stopped(&mut self) -> NodeResult<()> {
        if self.is_running()? {
            if let Some(pid) = self.descriptor.pid {
                return Err(NodeError::AlreadyRunning {
                    node: self.name().to_string(),
                    pid,
                });
            }
        }
        Ok(())
    }

    /// Check the node is stopped, optionally rewrite its configuration, then spawn it.
    ///
    /// A refused start leaves the configuration files untouched.
    pub fn launch(&mut self, install_dir: &Path, update_config: bool) -> NodeResult<Child> {
        self.ensure_stopped()?;
        if update_config {
            self.update_configuration()?;
        }
        self.launcher().start(install_dir)
    }

    /// Kill and reap a child whose pid could not be captured.
    pub fn abort_start(&self, child: Child) -> NodeResult<AbortedStart> {
        self.launcher().abort_start(child)
    }

    /// Read the pidfile once and refresh the status.
    pub fn capture_pid(&mut self, child: Child) -> NodeResult<Child> {
        ProcessLauncher::new(&self.dirs, &self.store, self.signaller.as_ref())
            .capture_pid(&mut self.descriptor, child)
    }

    /// Read the pidfile up to `attempts` times, `interval` apart.
    pub fn capture_pid_polling(
        &mut self,
        child: Child,
        attempts: u32,
        interval: Duration,
    ) -> NodeResult<Child> {
        ProcessLauncher::new(&self.dirs, &self.store, self.signaller.as_ref())
            .capture_pid_polling(&mut self.descriptor, child, attempts, interval)
    }

    /// Kill the server if running. Returns whether a process was signalled.
    pub fn stop(&mut self) -> NodeResult<bool> {
        ProcessLauncher::new(&self.dirs, &self.store, self.signaller.as_ref())
            .stop(&mut self.descriptor)
    }

    /// Mark the node DECOMMISSIONED regardless of its current status.
    pub fn decommission(&mut self) -> NodeResult<()> {
        ProcessLauncher::new(&self.dirs, &self.store, self.signaller.as_ref())
            .decommission(&mut self.descriptor)
    }

    /// Reset data, commit logs, saved caches and logs.
    pub fn clear(&self) -> NodeResult<()> {
        self.dirs.clear()
    }

    /// Run one admin client command and wait for it.
    pub fn nodetool(&self, install_dir: &Path, cmd: &str) -> NodeResult<ExitStatus> {
        self.launcher().nodetool(install_dir, &self.descriptor, cmd)
    }

    /// Replace this process with the interactive client. Returns only on failure.
    pub fn run_cli(&self, install_dir: &Path) -> NodeError {
        self.launcher().run_cli(install_dir, &self.descriptor)
    }

    /// Reconciled snapshot for display.
    pub fn summary(&mut self) -> NodeResult<NodeSummary> {
        self.update_status()?;
        let d = &self.descriptor;
        Ok(NodeSummary {
            name: d.name().to_string(),
            cluster: self.cluster.name().to_string(),
            status: d.status,
            auto_bootstrap: d.auto_bootstrap,
            thrift: d.thrift().clone(),
            storage: d.storage().clone(),
            jmx_port: d.jmx_port,
            pid: d.pid,
        })
    }

    /// Text rendering: the status line, then indented properties unless `only_status`.
    pub fn show(&mut self, only_status: bool, show_cluster: bool) -> NodeResult<String> {
        let summary = self.summary()?;
        let indent = " ".repeat(summary.name.len() + 2);
        let mut out = format!("{}: {}\n", summary.name, self.status_string());
        if only_status {
            return Ok(out);
        }
        if show_cluster {
            out.push_str(&format!("{indent}cluster={}\n", summary.cluster));
        }
        out.push_str(&format!("{indent}auto_bootstrap={}\n", summary.auto_bootstrap));
        out.push_str(&format!("{indent}thrift={}\n", summary.thrift));
        out.push_str(&format!("{indent}storage={}\n", summary.storage));
        out.push_str(&format!("{indent}jmx_port={}\n", summary.jmx_port));
        if let Some(pid) = summary.pid {
            out.push_str(&format!("{indent}pid={pid}\n"));
        }
        Ok(out)
    }
}
