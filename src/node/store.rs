//! Descriptor persistence.
//!
//! Every durable mutation of a node goes through [`PersistenceStore::save`],
//! which rewrites the whole `node.conf` document via a temporary file and a
//! rename so a reader never observes a partial write.

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::descriptor::{Interface, NodeDescriptor, NodeStatus};
use super::layout::{DirectoryManager, DESCRIPTOR_FILE};
use crate::core::error::{NodeError, NodeResult};

/// On-disk shape of `node.conf`. Every field is optional so a missing
/// property can be reported by name.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DescriptorDocument {
    name: Option<String>,
    status: Option<NodeStatus>,
    auto_bootstrap: Option<bool>,
    interfaces: Option<InterfacesDocument>,
    jmx_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pid: Option<u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct InterfacesDocument {
    thrift: Option<Interface>,
    storage: Option<Interface>,
}

impl From<&NodeDescriptor> for DescriptorDocument {
    fn from(d: &NodeDescriptor) -> Self {
        Self {
            name: Some(d.name().to_string()),
            status: Some(d.status),
            auto_bootstrap: Some(d.auto_bootstrap),
            interfaces: Some(InterfacesDocument {
                thrift: Some(d.interfaces.thrift.clone()),
                storage: Some(d.interfaces.storage.clone()),
            }),
            jmx_port: Some(d.jmx_port),
            pid: d.pid,
        }
    }
}

impl DescriptorDocument {
    fn into_descriptor(self, path: &Path) -> NodeResult<NodeDescriptor> {
        let missing = |field: &str| NodeError::missing_field(path, field);

        let name = self.name.ok_or_else(|| missing("name"))?;
        let interfaces = self.interfaces.ok_or_else(|| missing("interfaces"))?;
        let thrift = interfaces
            .thrift
            .ok_or_else(|| missing("interfaces.thrift"))?;
        let storage = interfaces
            .storage
            .ok_or_else(|| missing("interfaces.storage"))?;
        let auto_bootstrap = self
            .auto_bootstrap
            .ok_or_else(|| missing("auto_bootstrap"))?;
        let jmx_port = self.jmx_port.ok_or_else(|| missing("jmx_port"))?;
        let status = self.status.ok_or_else(|| missing("status"))?;

        let mut descriptor = NodeDescriptor::new(name, auto_bootstrap, thrift, storage, jmx_port);
        descriptor.status = status;
        descriptor.pid = self.pid;
        Ok(descriptor)
    }
}

/// Loads and saves node descriptors below a cluster root.
#[derive(Debug, Clone)]
pub struct PersistenceStore {
    root: PathBuf,
}

impl PersistenceStore {
    /// Store for the nodes of the cluster rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the named node.
    pub fn node_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Write the descriptor, creating the node directory tree if it is absent.
    pub fn save(&self, descriptor: &NodeDescriptor) -> NodeResult<()> {
        let node_path = self.node_path(descriptor.name());
        if !node_path.exists() {
            DirectoryManager::new(&node_path).create()?;
        }

        let path = node_path.join(DESCRIPTOR_FILE);
        let document = DescriptorDocument::from(descriptor);
        let yaml = serde_yaml::to_string(&document).map_err(|source| NodeError::Yaml {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, yaml.as_bytes())?;

        debug!(
            node = descriptor.name(),
            status = %descriptor.status,
            pid = ?descriptor.pid,
            "saved node descriptor"
        );
        Ok(())
    }

    /// Read the descriptor of the named node.
    pub fn load(&self, name: &str) -> NodeResult<NodeDescriptor> {
        load_from(&self.root, name)
    }
}

/// Read `<path>/<name>/node.conf`.
pub fn load_from(path: &Path, name: &str) -> NodeResult<NodeDescriptor> {
    let file = path.join(name).join(DESCRIPTOR_FILE);
    let content = fs::read_to_string(&file).map_err(|e| NodeError::io(&file, e))?;
    let document: DescriptorDocument =
        serde_yaml::from_str(&content).map_err(|source| NodeError::Yaml {
            path: file.clone(),
            source,
        })?;
    document.into_descriptor(&file)
}

/// Replace `path` with `data` through a sibling temporary file.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> NodeResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{}.tmp", file_name));
    let written = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)
        .and_then(|mut f| {
            f.write_all(data)?;
            f.sync_all()
        })
        .map_err(|e| NodeError::io(&tmp, e))
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| NodeError::io(path, e)));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}
