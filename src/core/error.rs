//! Error types for node lifecycle operations.
//!
//! Recoverable process conditions (the process is gone, or belongs to someone
//! else) never surface here; they are absorbed into a [`NodeStatus`] by the
//! status prober. Everything else is reported to the caller of the lifecycle
//! operation without retry.
//!
//! [`NodeStatus`]: crate::node::descriptor::NodeStatus

use std::path::PathBuf;
use std::process::Child;
use thiserror::Error;

/// Common node management error conditions.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Descriptor file is missing a required property.
    #[error("error loading {}, missing property: {field}", path.display())]
    Load { path: PathBuf, field: String },

    /// The server was spawned but its pidfile could not be read.
    ///
    /// The child is handed back so the caller can inspect its output and exit code.
    #[error("problem starting node {node}")]
    Start { node: String, child: Box<Child> },

    /// Pidfile exists but does not hold a process id.
    #[error("invalid pidfile {}: {contents:?}", path.display())]
    InvalidPidFile { path: PathBuf, contents: String },

    /// Liveness probe failed for a reason other than "no such process" or "not permitted".
    #[cfg(unix)]
    #[error("failed to probe process {pid}: {source}")]
    Probe {
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },

    /// Termination signal could not be delivered.
    #[cfg(unix)]
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },

    /// Process signalling is not available on this platform.
    #[error("process signalling is not supported on this platform")]
    Unsupported,

    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A YAML document could not be parsed or emitted.
    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The main configuration document lacks a key the patch needs.
    #[error("{} has no {key} entry", path.display())]
    MissingConfigKey { path: PathBuf, key: String },

    /// Start refused because a live process is already tracked.
    #[error("node {node} is already running (pid {pid})")]
    AlreadyRunning { node: String, pid: u32 },

    /// External binary could not be spawned.
    #[error("failed to spawn {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A spawned child could not be killed, waited for or read from.
    #[error("failed to reap process {pid}: {source}")]
    Reap {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    /// Replacing the current process image failed.
    #[error("failed to exec {}: {source}", program.display())]
    Exec {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NodeError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a Load error for a missing descriptor property.
    pub fn missing_field(path: impl Into<PathBuf>, field: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            field: field.into(),
        }
    }

    /// Check if this error reports a descriptor that could not be loaded.
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::Load { .. })
    }

    /// Check if this error reports a failed start.
    pub fn is_start_error(&self) -> bool {
        matches!(self, Self::Start { .. })
    }

    /// Recover the spawned process from a Start error.
    pub fn into_child(self) -> Option<Child> {
        match self {
            Self::Start { child, .. } => Some(*child),
            _ => None,
        }
    }
}

/// Result type using NodeError.
pub type NodeResult<T> = Result<T, NodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_names_field() {
        let err = NodeError::missing_field("/tmp/c/node1/node.conf", "jmx_port");
        assert!(err.is_load_error());
        assert!(!err.is_start_error());
        assert_eq!(
            err.to_string(),
            "error loading /tmp/c/node1/node.conf, missing property: jmx_port"
        );
    }

    #[test]
    fn test_into_child_only_for_start() {
        let err = NodeError::io("/nowhere", std::io::Error::other("boom"));
        assert!(err.into_child().is_none());
    }
}
