//! Common test utilities.
//!
//! Shared helpers for integration tests. Import with `mod common;`.

#![allow(dead_code)]

use ccm_node::config::ClusterConfig;
use ccm_node::error::NodeResult;
use ccm_node::node::{Interface, Liveness, Node, ProcessAliveChecker, ProcessSignaller};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Main configuration document using a flat `seeds` list.
pub const FLAT_SEEDS_YAML: &str = "\
cluster_name: Test Cluster
auto_bootstrap: true
seeds:
  - 10.0.0.1
listen_address: localhost
storage_port: 7000
rpc_address: localhost
rpc_port: 9160
data_file_directories:
  - /var/lib/cassandra/data
commitlog_directory: /var/lib/cassandra/commitlog
saved_caches_directory: /var/lib/cassandra/saved_caches
";

/// Main configuration document using the nested seed provider.
pub const SEED_PROVIDER_YAML: &str = "\
# Cassandra storage config YAML
cluster_name: 'Test Cluster'
initial_token:
auto_bootstrap: true
seed_provider:
  - class_name: org.apache.cassandra.locator.SimpleSeedProvider
    parameters:
      - seeds: \"127.0.0.1\"
listen_address: localhost
storage_port: 7000
rpc_address: localhost
rpc_port: 9160
data_file_directories:
  - /var/lib/cassandra/data
commitlog_directory: /var/lib/cassandra/commitlog
saved_caches_directory: /var/lib/cassandra/saved_caches
partitioner: org.apache.cassandra.dht.RandomPartitioner
";

pub const LOG4J_PROPERTIES: &str = "\
log4j.rootLogger=INFO,stdout,R
log4j.appender.stdout=org.apache.log4j.ConsoleAppender
log4j.appender.R=org.apache.log4j.RollingFileAppender
log4j.appender.R.maxFileSize=20MB
log4j.appender.R.File=/var/log/cassandra/system.log
";

pub const ENV_SCRIPT: &str = "\
#!/bin/sh
MAX_HEAP_SIZE=\"1G\"
# JMX_PORT=1234 is only a comment
JMX_PORT=\"7199\"
JVM_OPTS=\"$JVM_OPTS -Dcom.sun.management.jmxremote.port=$JMX_PORT\"
";

/// A cluster rooted in a temporary directory.
pub struct TestCluster {
    pub dir: TempDir,
    pub config: ClusterConfig,
}

impl TestCluster {
    pub fn new() -> Self {
        Self::with_seeds(&["127.0.0.1", "127.0.0.2"])
    }

    pub fn with_seeds(seeds: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let config = ClusterConfig {
            name: "test".to_string(),
            root: dir.path().join("test"),
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            partitioner: None,
            install_dir: dir.path().join("install"),
        };
        fs::create_dir_all(&config.root).expect("Failed to create cluster root");
        fs::create_dir_all(config.install_dir.join("bin")).expect("Failed to create install bin");
        fs::create_dir_all(config.install_dir.join("conf")).expect("Failed to create install conf");
        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn install_dir(&self) -> &Path {
        &self.config.install_dir
    }

    pub fn node_path(&self, name: &str) -> PathBuf {
        self.config.root.join(name)
    }

    /// Create node `name` with loopback endpoints derived from `index`.
    pub fn add_node(&self, name: &str, index: u8) -> Node<'_> {
        let address = format!("127.0.0.{}", index);
        Node::create(
            &self.config,
            name,
            false,
            Interface::new(address.clone(), 9160),
            Interface::new(address, 7000),
            7000 + 100 * u16::from(index),
        )
        .expect("Failed to create node")
    }

    /// Write the three configuration artifacts into the node's conf/.
    pub fn write_conf(&self, name: &str, main_yaml: &str) {
        let conf = self.node_path(name).join("conf");
        fs::write(conf.join("cassandra.yaml"), main_yaml).expect("Failed to write yaml");
        fs::write(conf.join("log4j-server.properties"), LOG4J_PROPERTIES)
            .expect("Failed to write log4j");
        fs::write(conf.join("cassandra-env.sh"), ENV_SCRIPT).expect("Failed to write env");
    }

    pub fn read_conf(&self, name: &str, file: &str) -> String {
        fs::read_to_string(self.node_path(name).join("conf").join(file))
            .expect("Failed to read conf file")
    }
}

/// Scripted process table shared between a test and the node under test.
#[derive(Clone, Default)]
pub struct FakeProcesses {
    state: Rc<RefCell<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    liveness: HashMap<u32, Liveness>,
    probes: usize,
    kills: Vec<u32>,
}

impl FakeProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, pid: u32, liveness: Liveness) {
        self.state.borrow_mut().liveness.insert(pid, liveness);
    }

    pub fn alive(&self, pid: u32) {
        self.set(pid, Liveness::Alive);
    }

    pub fn probes(&self) -> usize {
        self.state.borrow().probes
    }

    pub fn kills(&self) -> Vec<u32> {
        self.state.borrow().kills.clone()
    }

    pub fn boxed(&self) -> Box<dyn ProcessSignaller> {
        Box::new(self.clone())
    }
}

impl ProcessAliveChecker for FakeProcesses {
    fn is_alive(&self, pid: u32) -> NodeResult<Liveness> {
        let mut state = self.state.borrow_mut();
        state.probes += 1;
        Ok(state
            .liveness
            .get(&pid)
            .copied()
            .unwrap_or(Liveness::NotFound))
    }
}

impl ProcessSignaller for FakeProcesses {
    fn kill(&self, pid: u32) -> NodeResult<bool> {
        let mut state = self.state.borrow_mut();
        let alive = state.liveness.get(&pid) == Some(&Liveness::Alive);
        if alive {
            state.liveness.insert(pid, Liveness::NotFound);
            state.kills.push(pid);
        }
        Ok(alive)
    }
}

/// Write a pidfile as the server would.
pub fn write_pidfile(node_path: &Path, contents: &str) {
    fs::write(node_path.join("cassandra.pid"), contents).expect("Failed to write pidfile");
}

/// Remove the descriptor so a later save is observable by its reappearance.
pub fn remove_descriptor(node_path: &Path) {
    fs::remove_file(node_path.join("node.conf")).expect("Failed to remove descriptor");
}

pub fn descriptor_exists(node_path: &Path) -> bool {
    node_path.join("node.conf").exists()
}
