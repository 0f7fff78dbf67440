//! Node directory layout tests.

mod common;

use ccm_node::node::layout::{DirectoryManager, NodeDir};
use common::TestCluster;
use std::fs;

#[test]
fn clear_empties_runtime_dirs_and_keeps_conf() {
    let cluster = TestCluster::new();
    let node = cluster.add_node("node1", 1);
    let dirs = node.dirs();

    for dir in NodeDir::RUNTIME {
        let path = dirs.dir(dir);
        fs::create_dir_all(path.join("nested")).unwrap();
        fs::write(path.join("nested").join("file.db"), b"payload").unwrap();
        fs::write(path.join("top.log"), b"payload").unwrap();
    }
    fs::write(dirs.dir(NodeDir::Conf).join("cassandra.yaml"), "cluster_name: x\n").unwrap();
    fs::write(dirs.dir(NodeDir::Bin).join("cassandra.in.sh"), "#!/bin/sh\n").unwrap();

    node.clear().unwrap();

    for dir in NodeDir::RUNTIME {
        let path = dirs.dir(dir);
        assert!(path.is_dir(), "{} missing", dir.as_str());
        assert_eq!(fs::read_dir(&path).unwrap().count(), 0, "{} not empty", dir.as_str());
    }
    assert_eq!(
        fs::read_to_string(dirs.dir(NodeDir::Conf).join("cassandra.yaml")).unwrap(),
        "cluster_name: x\n"
    );
    assert!(dirs.dir(NodeDir::Bin).join("cassandra.in.sh").is_file());
    assert!(dirs.descriptor_file().is_file());
}

#[test]
fn clear_recreates_missing_runtime_dir() {
    let cluster = TestCluster::new();
    let node = cluster.add_node("node1", 1);
    fs::remove_dir_all(node.dirs().dir(NodeDir::Logs)).unwrap();

    node.clear().unwrap();
    assert!(node.dirs().dir(NodeDir::Logs).is_dir());
}

#[test]
fn create_is_idempotent() {
    let cluster = TestCluster::new();
    let dirs = DirectoryManager::new(cluster.node_path("solo"));
    dirs.create().unwrap();
    fs::write(dirs.dir(NodeDir::Data).join("keep"), b"x").unwrap();
    dirs.create().unwrap();
    assert!(dirs.dir(NodeDir::Data).join("keep").is_file());
}

#[test]
fn import_conf_copies_missing_files_only() {
    let cluster = TestCluster::new();
    let install_conf = cluster.install_dir().join("conf");
    fs::write(install_conf.join("cassandra.yaml"), "from: install\n").unwrap();
    fs::write(install_conf.join("cassandra-env.sh"), "JMX_PORT=7199\n").unwrap();
    fs::create_dir_all(install_conf.join("triggers")).unwrap();

    let node = cluster.add_node("node1", 1);
    let conf = node.dirs().dir(NodeDir::Conf);
    fs::write(conf.join("cassandra.yaml"), "from: node\n").unwrap();

    let copied = node.dirs().import_conf(cluster.install_dir()).unwrap();
    assert_eq!(copied, 1);
    assert_eq!(
        fs::read_to_string(conf.join("cassandra.yaml")).unwrap(),
        "from: node\n"
    );
    assert_eq!(
        fs::read_to_string(conf.join("cassandra-env.sh")).unwrap(),
        "JMX_PORT=7199\n"
    );
    assert!(!conf.join("triggers").exists());
}
