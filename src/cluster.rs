//! Cluster context seen from a single node.
//!
//! Topology assignment (seed selection, port allocation) belongs to the
//! cluster. A node only reads the values it needs through [`ClusterContext`]
//! and never owns the cluster.

use std::path::{Path, PathBuf};

/// Cluster-wide values a node resolves through its back-reference.
pub trait ClusterContext {
    /// Cluster name.
    fn name(&self) -> &str;

    /// Directory holding one subdirectory per node.
    fn root_path(&self) -> &Path;

    /// Seed addresses for the generated node configuration.
    fn seed_addresses(&self) -> &[String];

    /// Non-default partitioner, if the cluster sets one.
    fn partitioner(&self) -> Option<&str>;

    /// Directory of the named node.
    fn node_path(&self, node: &str) -> PathBuf {
        self.root_path().join(node)
    }
}
