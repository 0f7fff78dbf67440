//! Tests against real OS processes.
//!
//! The server binary is replaced by a shell script installed under the test
//! cluster's install dir. Tests that write or spawn executables hold
//! `SPAWN_LOCK` so no concurrent fork can keep a script open for writing
//! while it is exec'd.

#![cfg(unix)]

mod common;

use ccm_node::node::{Liveness, NodeStatus, ProcessAliveChecker, ProcessSignaller, SignalChecker};
use ccm_node::node::store::load_from;
use common::TestCluster;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Server stand-in: writes its pid to the file after `-p`, then stays alive.
const SERVER_SCRIPT: &str = "#!/bin/sh\necho $$ > \"$2\"\nexec sleep 30\n";

/// Server stand-in that dies before writing a pidfile.
const FAILING_SCRIPT: &str = "#!/bin/sh\necho 'cannot start' >&2\nexit 3\n";

/// Server stand-in that takes a while to write its pidfile.
const SLOW_PIDFILE_SCRIPT: &str = "#!/bin/sh\nsleep 0.3\necho $$ > \"$2\"\nexec sleep 20\n";

/// Admin client stand-in that records its arguments next to the script.
const NODETOOL_SCRIPT: &str = "#!/bin/sh\necho \"$@\" > \"$(dirname \"$0\")/nodetool.args\"\necho \"$CASSANDRA_CONF\" >> \"$(dirname \"$0\")/nodetool.args\"\n";

fn install(bin_dir: &Path, name: &str, script: &str) {
    let path = bin_dir.join(name);
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
}

fn lock() -> std::sync::MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

#[test]
fn signal_checker_tracks_a_child() {
    let _guard = lock();
    let checker = SignalChecker;

    let mut child = Command::new("sleep").arg("30").spawn().unwrap();
    let pid = child.id();
    assert_eq!(checker.is_alive(pid).unwrap(), Liveness::Alive);

    assert!(checker.kill(pid).unwrap());
    let status = child.wait().unwrap();
    assert_eq!(status.signal(), Some(9));

    // Reaped: the pid no longer exists.
    assert_eq!(checker.is_alive(pid).unwrap(), Liveness::NotFound);
    assert!(!checker.kill(pid).unwrap());
}

#[test]
fn start_capture_stop_with_real_process() {
    let _guard = lock();
    let cluster = TestCluster::new();
    install(&cluster.install_dir().join("bin"), "cassandra", SERVER_SCRIPT);
    let mut node = cluster.add_node("node1", 1);

    let child = node.start(cluster.install_dir()).unwrap();
    let child_pid = child.id();
    let mut child = node
        .capture_pid_polling(child, 100, Duration::from_millis(50))
        .unwrap();

    assert_eq!(node.descriptor().pid, Some(child_pid));
    assert_eq!(node.descriptor().status, NodeStatus::Up);
    assert!(node.is_live().unwrap());
    assert_eq!(
        load_from(cluster.root(), "node1").unwrap().pid,
        Some(child_pid)
    );

    assert!(node.stop().unwrap());
    let status = child.wait().unwrap();
    assert_eq!(status.signal(), Some(9));

    assert_eq!(node.descriptor().pid, None);
    assert_eq!(node.update_status().unwrap(), NodeStatus::Down);
    assert!(!node.stop().unwrap());
}

#[test]
fn failed_start_hands_back_the_child() {
    let _guard = lock();
    let cluster = TestCluster::new();
    install(&cluster.install_dir().join("bin"), "cassandra", FAILING_SCRIPT);
    let mut node = cluster.add_node("node1", 1);

    let child = node.start(cluster.install_dir()).unwrap();
    let err = node.capture_pid(child).unwrap_err();
    assert!(err.is_start_error());

    let child = err.into_child().unwrap();
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "cannot start");
    assert_eq!(node.descriptor().status, NodeStatus::Uninitialized);
}

#[test]
fn abandoned_start_leaves_no_untracked_server() {
    let _guard = lock();
    let cluster = TestCluster::new();
    install(&cluster.install_dir().join("bin"), "cassandra", SLOW_PIDFILE_SCRIPT);
    let mut node = cluster.add_node("node1", 1);

    let child = node.launch(cluster.install_dir(), false).unwrap();
    let child_pid = child.id();
    let err = node.capture_pid(child).unwrap_err();
    assert!(err.is_start_error());

    let aborted = node.abort_start(err.into_child().unwrap()).unwrap();
    assert!(aborted.killed);
    assert_eq!(aborted.status.signal(), Some(9));

    // Past the point where the server would have written its pidfile.
    thread::sleep(Duration::from_millis(600));
    assert_eq!(SignalChecker.is_alive(child_pid).unwrap(), Liveness::NotFound);
    assert!(!node.path().join("cassandra.pid").exists());
    assert_eq!(node.update_status().unwrap(), NodeStatus::Uninitialized);
    assert_eq!(node.descriptor().pid, None);
}

#[test]
fn abandoned_start_reports_exited_server() {
    let _guard = lock();
    let cluster = TestCluster::new();
    install(&cluster.install_dir().join("bin"), "cassandra", FAILING_SCRIPT);
    let mut node = cluster.add_node("node1", 1);

    let child = node.launch(cluster.install_dir(), false).unwrap();
    let err = node.capture_pid(child).unwrap_err();
    thread::sleep(Duration::from_millis(300));

    let aborted = node.abort_start(err.into_child().unwrap()).unwrap();
    assert!(!aborted.killed);
    assert_eq!(aborted.status.code(), Some(3));
    assert_eq!(aborted.stderr.trim(), "cannot start");
}

#[test]
fn stale_pidfile_is_removed_before_start() {
    let _guard = lock();
    let cluster = TestCluster::new();
    install(&cluster.install_dir().join("bin"), "cassandra", FAILING_SCRIPT);
    let mut node = cluster.add_node("node1", 1);
    common::write_pidfile(node.path(), "1\n");

    let child = node.start(cluster.install_dir()).unwrap();
    let err = node.capture_pid(child).unwrap_err();
    assert!(err.is_start_error());
    let _ = err.into_child().map(|mut c| c.wait());
}

#[test]
fn launch_environment_pins_include_script() {
    let _guard = lock();
    let cluster = TestCluster::new();
    let bin = cluster.install_dir().join("bin");
    fs::write(
        bin.join("cassandra.in.sh"),
        "#!/bin/sh\nif [ \"x$CASSANDRA_HOME\" = \"x\" ]; then CASSANDRA_HOME=..; fi\n",
    )
    .unwrap();
    install(&bin, "nodetool", NODETOOL_SCRIPT);
    let node = cluster.add_node("node1", 1);

    let status = node.nodetool(cluster.install_dir(), "ring").unwrap();
    assert!(status.success());

    let args = fs::read_to_string(bin.join("nodetool.args")).unwrap();
    let mut lines = args.lines();
    assert_eq!(lines.next(), Some("-h 127.0.0.1 -p 7100 ring"));
    assert_eq!(
        lines.next().map(Path::new),
        Some(node.path().join("conf").as_path())
    );

    let local = fs::read_to_string(node.path().join("bin").join("cassandra.in.sh")).unwrap();
    assert!(local.starts_with("#!/bin/sh\nCASSANDRA_HOME="));
    assert!(local.contains(&format!(
        "CASSANDRA_CONF={}",
        node.path().join("conf").display()
    )));
}

#[test]
fn missing_binary_is_a_spawn_error() {
    let _guard = lock();
    let cluster = TestCluster::new();
    let mut node = cluster.add_node("node1", 1);
    let err = node.start(cluster.install_dir()).unwrap_err();
    assert!(matches!(err, ccm_node::error::NodeError::Spawn { .. }));
}
