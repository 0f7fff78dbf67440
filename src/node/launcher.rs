//! Spawning, tracking and terminating the server process.
//!
//! The server is launched with `-p <node>/cassandra.pid` and writes its own
//! pid there. [`ProcessLauncher::capture_pid`] reads that file once; if the
//! server has not written it yet the read fails and the spawned child is
//! handed back inside a Start error. [`ProcessLauncher::capture_pid_polling`]
//! retries a bounded number of times for callers that opt in.

use std::ffi::OsString;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::descriptor::{NodeDescriptor, NodeStatus};
use super::layout::{DirectoryManager, NodeDir, INCLUDE_SCRIPT};
use super::probe::{ProcessSignaller, StatusProber};
use super::store::{write_atomic, PersistenceStore};
use crate::core::error::{NodeError, NodeResult};

const SERVER_BIN: &str = "cassandra";
const ADMIN_BIN: &str = "nodetool";
const SHELL_BIN: &str = "cassandra-cli";

/// What became of a spawned server whose pid was never captured.
#[derive(Debug)]
pub struct AbortedStart {
    /// Exit status of the spawned process.
    pub status: ExitStatus,
    /// The process was still running and had to be killed.
    pub killed: bool,
    /// Error output; only collected when the process exited on its own.
    pub stderr: String,
}

/// Starts and stops one node's server process.
pub struct ProcessLauncher<'a> {
    dirs: &'a DirectoryManager,
    store: &'a PersistenceStore,
    signaller: &'a dyn ProcessSignaller,
}

impl<'a> ProcessLauncher<'a> {
    pub fn new(
        dirs: &'a DirectoryManager,
        store: &'a PersistenceStore,
        signaller: &'a dyn ProcessSignaller,
    ) -> Self {
        Self {
            dirs,
            store,
            signaller,
        }
    }

    fn prober(&self) -> StatusProber<'_, dyn ProcessSignaller + 'a> {
        StatusProber::new(self.signaller)
    }

    /// Environment for every binary of the installation run on behalf of this node.
    ///
    /// When the installation ships an include script, a node-local copy pinned
    /// to this node's configuration is written to `bin/` and exported as
    /// `CASSANDRA_INCLUDE`.
    pub fn environment(&self, install_dir: &Path) -> NodeResult<Vec<(&'static str, OsString)>> {
        let conf_dir = self.dirs.dir(NodeDir::Conf);
        let mut env = vec![
            ("CASSANDRA_HOME", install_dir.as_os_str().to_owned()),
            ("CASSANDRA_CONF", conf_dir.as_os_str().to_owned()),
        ];

        let include = install_dir.join("bin").join(INCLUDE_SCRIPT);
        if include.is_file() {
            let local = self.dirs.dir(NodeDir::Bin).join(INCLUDE_SCRIPT);
            let script = fs::read_to_string(&include).map_err(|e| NodeError::io(&include, e))?;
            let pinned = pin_include_script(&script, install_dir, &conf_dir);
            write_atomic(&local, pinned.as_bytes())?;
            env.push(("CASSANDRA_INCLUDE", local.into_os_string()));
        }
        Ok(env)
    }

    /// Spawn the server. Does not wait for it to become ready.
    ///
    /// A pidfile left over from a previous run is removed first so it cannot
    /// be mistaken for the new process.
    pub fn start(&self, install_dir: &Path) -> NodeResult<Child> {
        let program = binary(install_dir, SERVER_BIN);
        let pidfile = self.dirs.pid_file();
        if pidfile.exists() {
            fs::remove_file(&pidfile).map_err(|e| NodeError::io(&pidfile, e))?;
        }

        let child = Command::new(&program)
            .arg("-p")
            .arg(&pidfile)
            .envs(self.environment(install_dir)?)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| NodeError::Spawn {
                program: program.clone(),
                source,
            })?;

        info!(
            program = %program.display(),
            pidfile = %pidfile.display(),
            child = child.id(),
            "spawned server"
        );
        Ok(child)
    }

    /// Read the pidfile once. `Ok(None)` means it is absent or still empty.
    pub fn read_pid(&self) -> NodeResult<Option<u32>> {
        let path = self.dirs.pid_file();
        let Ok(content) = fs::read_to_string(&path) else {
            return Ok(None);
        };
        let first = content.lines().next().unwrap_or("").trim();
        if first.is_empty() {
            return Ok(None);
        }
        first
            .parse::<u32>()
            .map(Some)
            .map_err(|_| NodeError::InvalidPidFile {
                path,
                contents: content.clone(),
            })
    }

    /// Record the pid the server wrote and refresh the status.
    ///
    /// Single read, no wait. On success the child is returned to the caller.
    pub fn capture_pid(&self, descriptor: &mut NodeDescriptor, child: Child) -> NodeResult<Child> {
        match self.read_pid()? {
            Some(pid) => {
                self.record_pid(descriptor, pid)?;
                Ok(child)
            }
            None => Err(NodeError::Start {
                node: descriptor.name().to_string(),
                child: Box::new(child),
            }),
        }
    }

    /// Like [`capture_pid`](Self::capture_pid), reading up to `attempts` times.
    pub fn capture_pid_polling(
        &self,
        descriptor: &mut NodeDescriptor,
        child: Child,
        attempts: u32,
        interval: Duration,
    ) -> NodeResult<Child> {
        for attempt in 1..attempts.max(1) {
            if let Some(pid) = self.read_pid()? {
                self.record_pid(descriptor, pid)?;
                return Ok(child);
            }
            debug!(node = descriptor.name(), attempt, "pidfile not written yet");
            thread::sleep(interval);
        }
        self.capture_pid(descriptor, child)
    }

    /// Dispose of a child handed back by a failed pid capture.
    ///
    /// A child that is still running is killed and its stale pidfile removed,
    /// so no server outlives a start that the descriptor does not record.
    pub fn abort_start(&self, mut child: Child) -> NodeResult<AbortedStart> {
        let pid = child.id();
        let reap = |source: std::io::Error| NodeError::Reap { pid, source };

        let killed = match child.try_wait().map_err(reap)? {
            Some(_) => false,
            None => {
                child.kill().map_err(reap)?;
                true
            }
        };
        let status = child.wait().map_err(reap)?;

        let mut stderr = String::new();
        if killed {
            let pidfile = self.dirs.pid_file();
            if pidfile.exists() {
                fs::remove_file(&pidfile).map_err(|e| NodeError::io(&pidfile, e))?;
            }
        } else if let Some(mut pipe) = child.stderr.take() {
            pipe.read_to_string(&mut stderr).map_err(reap)?;
        }

        warn!(pid, killed, %status, "abandoned server start");
        Ok(AbortedStart {
            status,
            killed,
            stderr,
        })
    }

    fn record_pid(&self, descriptor: &mut NodeDescriptor, pid: u32) -> NodeResult<()> {
        descriptor.pid = Some(pid);
        if !self.prober().refresh(descriptor, self.store)? {
            self.store.save(descriptor)?;
        }
        info!(node = descriptor.name(), pid, status = %descriptor.status, "captured pid");
        Ok(())
    }

    /// Kill the process if it is running, then forget it.
    ///
    /// Returns whether a running process was found and signalled.
    pub fn stop(&self, descriptor: &mut NodeDescriptor) -> NodeResult<bool> {
        self.prober().refresh(descriptor, self.store)?;

        let mut signalled = false;
        if descriptor.status.claims_process() {
            if let Some(pid) = descriptor.pid {
                signalled = self.signaller.kill(pid)?;
                if signalled {
                    info!(node = descriptor.name(), pid, "killed server");
                } else {
                    warn!(node = descriptor.name(), pid, "process vanished before kill");
                }
            }
        }

        descriptor.pid = None;
        if descriptor.status.claims_process() {
            descriptor.status = NodeStatus::Down;
        }
        self.store.save(descriptor)?;
        Ok(signalled)
    }

    /// Mark the node decommissioned. The process, if any, keeps running.
    pub fn decommission(&self, descriptor: &mut NodeDescriptor) -> NodeResult<()> {
        descriptor.status = NodeStatus::Decommissioned;
        self.store.save(descriptor)?;
        info!(node = descriptor.name(), "node decommissioned");
        Ok(())
    }

    /// Run the admin client against this node and wait for it to exit.
    pub fn nodetool(
        &self,
        install_dir: &Path,
        descriptor: &NodeDescriptor,
        cmd: &str,
    ) -> NodeResult<ExitStatus> {
        let program = binary(install_dir, ADMIN_BIN);
        let status = Command::new(&program)
            .arg("-h")
            .arg(&descriptor.storage().address)
            .arg("-p")
            .arg(descriptor.jmx_port.to_string())
            .arg(cmd)
            .envs(self.environment(install_dir)?)
            .status()
            .map_err(|source| NodeError::Spawn {
                program: program.clone(),
                source,
            })?;
        debug!(node = descriptor.name(), cmd, %status, "admin client exited");
        Ok(status)
    }

    /// Replace the current process with the interactive client.
    ///
    /// Only returns if the exec failed.
    #[cfg(unix)]
    pub fn run_cli(&self, install_dir: &Path, descriptor: &NodeDescriptor) -> NodeError {
        use std::io::Write;
        use std::os::unix::process::CommandExt;

        let program = binary(install_dir, SHELL_BIN);
        let env = match self.environment(install_dir) {
            Ok(env) => env,
            Err(e) => return e,
        };
        let _ = std::io::stdout().flush();
        let source = Command::new(&program)
            .arg0(SHELL_BIN)
            .arg("-h")
            .arg(&descriptor.thrift().address)
            .arg("-p")
            .arg(descriptor.thrift().port.to_string())
            .arg("--jmxport")
            .arg(descriptor.jmx_port.to_string())
            .envs(env)
            .exec();
        NodeError::Exec { program, source }
    }

    #[cfg(not(unix))]
    pub fn run_cli(&self, _install_dir: &Path, _descriptor: &NodeDescriptor) -> NodeError {
        NodeError::Unsupported
    }
}

fn binary(install_dir: &Path, name: &str) -> PathBuf {
    install_dir.join("bin").join(name)
}

/// Prefix the include script with assignments pinning home and conf.
///
/// The stock script only derives these when unset, so assigning them first
/// wins. A shebang line stays on top.
fn pin_include_script(script: &str, install_dir: &Path, conf_dir: &Path) -> String {
    let header = format!(
        "CASSANDRA_HOME={}\nCASSANDRA_CONF={}\n",
        install_dir.display(),
        conf_dir.display()
    );
    match script.split_once('\n') {
        Some((first, rest)) if first.starts_with("#!") => format!("{first}\n{header}{rest}"),
        _ => format!("{header}{script}"),
    }
}
