//! Process liveness and status reconciliation.
//!
//! The descriptor's status is a cached belief about an OS process. The
//! [`StatusProber`] re-derives it from a zero-effect signal probe on every
//! status query and writes the descriptor back only when the belief changed.

use tracing::{debug, info};

use super::descriptor::{NodeDescriptor, NodeStatus};
use super::store::PersistenceStore;
use crate::core::error::{NodeError, NodeResult};

/// Outcome of a liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Process exists and may be signalled.
    Alive,
    /// No such process.
    NotFound,
    /// Process exists but belongs to someone else.
    Denied,
}

impl Liveness {
    /// `Denied` counts as dead: a recycled pid owned by another user is not our node.
    pub fn is_alive(self) -> bool {
        matches!(self, Self::Alive)
    }
}

/// Answers whether a process id refers to a live, signallable process.
pub trait ProcessAliveChecker {
    /// Probe `pid` without affecting it.
    ///
    /// Only "no such process" and "not permitted" are folded into [`Liveness`];
    /// any other failure is returned as an error.
    fn is_alive(&self, pid: u32) -> NodeResult<Liveness>;
}

/// A checker that can also terminate the processes it probes.
pub trait ProcessSignaller: ProcessAliveChecker {
    /// Forcefully terminate `pid`.
    ///
    /// Returns `false` if the process was already gone.
    fn kill(&self, pid: u32) -> NodeResult<bool>;
}

/// Probes with signal 0 and terminates with SIGKILL.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalChecker;

#[cfg(unix)]
impl SignalChecker {
    /// Pid 0 and values above `i32::MAX` would address process groups, not a process.
    fn to_pid(pid: u32) -> Option<nix::unistd::Pid> {
        i32::try_from(pid)
            .ok()
            .filter(|p| *p > 0)
            .map(nix::unistd::Pid::from_raw)
    }
}

#[cfg(unix)]
impl ProcessAliveChecker for SignalChecker {
    fn is_alive(&self, pid: u32) -> NodeResult<Liveness> {
        use nix::errno::Errno;
        use nix::sys::signal::kill;

        let Some(target) = Self::to_pid(pid) else {
            return Ok(Liveness::NotFound);
        };
        match kill(target, None) {
            Ok(()) => Ok(Liveness::Alive),
            Err(Errno::ESRCH) => Ok(Liveness::NotFound),
            Err(Errno::EPERM) => Ok(Liveness::Denied),
            Err(source) => Err(NodeError::Probe { pid, source }),
        }
    }
}

#[cfg(unix)]
impl ProcessSignaller for SignalChecker {
    fn kill(&self, pid: u32) -> NodeResult<bool> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};

        let Some(target) = Self::to_pid(pid) else {
            return Ok(false);
        };
        match kill(target, Signal::SIGKILL) {
            Ok(()) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            Err(source) => Err(NodeError::Signal { pid, source }),
        }
    }
}

#[cfg(not(unix))]
impl ProcessAliveChecker for SignalChecker {
    fn is_alive(&self, _pid: u32) -> NodeResult<Liveness> {
        Err(NodeError::Unsupported)
    }
}

#[cfg(not(unix))]
impl ProcessSignaller for SignalChecker {
    fn kill(&self, _pid: u32) -> NodeResult<bool> {
        Err(NodeError::Unsupported)
    }
}

/// Keeps a descriptor's status truthful with respect to its process.
pub struct StatusProber<'a, C: ProcessAliveChecker + ?Sized> {
    checker: &'a C,
}

impl<'a, C: ProcessAliveChecker + ?Sized> StatusProber<'a, C> {
    pub fn new(checker: &'a C) -> Self {
        Self { checker }
    }

    /// Compute the reconciled status and pid without touching the descriptor.
    pub fn observe(&self, descriptor: &NodeDescriptor) -> NodeResult<(NodeStatus, Option<u32>)> {
        let current = descriptor.status;
        let Some(pid) = descriptor.pid else {
            return Ok((demote(current), None));
        };

        let liveness = self.checker.is_alive(pid)?;
        debug!(node = descriptor.name(), pid, ?liveness, "probed process");
        if liveness.is_alive() {
            let status = match current {
                NodeStatus::Down | NodeStatus::Uninitialized => NodeStatus::Up,
                other => other,
            };
            Ok((status, Some(pid)))
        } else {
            Ok((demote(current), None))
        }
    }

    /// Reconcile the descriptor in place, persisting only when something changed.
    ///
    /// Returns whether the descriptor was rewritten.
    pub fn refresh(
        &self,
        descriptor: &mut NodeDescriptor,
        store: &PersistenceStore,
    ) -> NodeResult<bool> {
        let (status, pid) = self.observe(descriptor)?;
        if status == descriptor.status && pid == descriptor.pid {
            return Ok(false);
        }

        if status != descriptor.status {
            info!(
                node = descriptor.name(),
                from = %descriptor.status,
                to = %status,
                "node status changed"
            );
        }
        descriptor.status = status;
        descriptor.pid = pid;
        store.save(descriptor)?;
        Ok(true)
    }
}

fn demote(status: NodeStatus) -> NodeStatus {
    if status.claims_process() {
        NodeStatus::Down
    } else {
        status
    }
}
