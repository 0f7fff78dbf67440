//! Fixed on-disk layout of a node directory.
//!
//! ```text
//! <cluster root>/<node>/
//!   node.conf          descriptor
//!   cassandra.pid      written by the server
//!   data/ commitlogs/ saved_caches/ logs/   runtime state, reset by clear()
//!   conf/ bin/                              configuration, preserved
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::error::{NodeError, NodeResult};

/// Descriptor file name inside the node directory.
pub const DESCRIPTOR_FILE: &str = "node.conf";
/// Pidfile the server is told to write.
pub const PID_FILE: &str = "cassandra.pid";
/// Main configuration document inside `conf/`.
pub const MAIN_CONFIG: &str = "cassandra.yaml";
/// Logging configuration inside `conf/`.
pub const LOG4J_CONFIG: &str = "log4j-server.properties";
/// Environment file inside `conf/`.
pub const ENV_FILE: &str = "cassandra-env.sh";
/// Launch include script inside `bin/`.
pub const INCLUDE_SCRIPT: &str = "cassandra.in.sh";

/// Subdirectories of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeDir {
    Data,
    CommitLogs,
    SavedCaches,
    Logs,
    Conf,
    Bin,
}

impl NodeDir {
    /// Every directory, in creation order.
    pub const ALL: [NodeDir; 6] = [
        NodeDir::Data,
        NodeDir::CommitLogs,
        NodeDir::SavedCaches,
        NodeDir::Logs,
        NodeDir::Conf,
        NodeDir::Bin,
    ];

    /// Directories holding runtime state.
    pub const RUNTIME: [NodeDir; 4] = [
        NodeDir::Data,
        NodeDir::CommitLogs,
        NodeDir::SavedCaches,
        NodeDir::Logs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::CommitLogs => "commitlogs",
            Self::SavedCaches => "saved_caches",
            Self::Logs => "logs",
            Self::Conf => "conf",
            Self::Bin => "bin",
        }
    }
}

/// Creates, resets and resolves paths in a node directory.
#[derive(Debug, Clone)]
pub struct DirectoryManager {
    root: PathBuf,
}

impl DirectoryManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The node directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, dir: NodeDir) -> PathBuf {
        self.root.join(dir.as_str())
    }

    pub fn conf_file(&self, name: &str) -> PathBuf {
        self.dir(NodeDir::Conf).join(name)
    }

    pub fn descriptor_file(&self) -> PathBuf {
        self.root.join(DESCRIPTOR_FILE)
    }

    pub fn pid_file(&self) -> PathBuf {
        self.root.join(PID_FILE)
    }

    /// Log file the server is configured to write.
    pub fn log_file(&self) -> PathBuf {
        self.dir(NodeDir::Logs).join("system.log")
    }

    /// Create the node directory and every subdirectory that is missing.
    pub fn create(&self) -> NodeResult<()> {
        for dir in NodeDir::ALL {
            let path = self.dir(dir);
            fs::create_dir_all(&path).map_err(|e| NodeError::io(&path, e))?;
        }
        Ok(())
    }

    /// Remove and recreate the runtime directories, leaving `conf` and `bin` alone.
    pub fn clear(&self) -> NodeResult<()> {
        for dir in NodeDir::RUNTIME {
            let path = self.dir(dir);
            if path.exists() {
                fs::remove_dir_all(&path).map_err(|e| NodeError::io(&path, e))?;
            }
            fs::create_dir(&path).map_err(|e| NodeError::io(&path, e))?;
        }
        debug!(root = %self.root.display(), "cleared runtime directories");
        Ok(())
    }

    /// Copy the installation's `conf/` files into the node, keeping files already present.
    ///
    /// Returns the number of files copied.
    pub fn import_conf(&self, install_dir: &Path) -> NodeResult<usize> {
        let source = install_dir.join("conf");
        let target = self.dir(NodeDir::Conf);
        fs::create_dir_all(&target).map_err(|e| NodeError::io(&target, e))?;

        let entries = fs::read_dir(&source).map_err(|e| NodeError::io(&source, e))?;
        let mut copied = 0;
        for entry in entries {
            let entry = entry.map_err(|e| NodeError::io(&source, e))?;
            let from = entry.path();
            if !from.is_file() {
                continue;
            }
            let to = target.join(entry.file_name());
            if to.exists() {
                continue;
            }
            fs::copy(&from, &to).map_err(|e| NodeError::io(&to, e))?;
            copied += 1;
        }
        debug!(from = %source.display(), copied, "imported configuration files");
        Ok(copied)
    }
}
