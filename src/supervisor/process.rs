//! POSIX signal delivery and liveness checks for daemon processes.

use std::time::Duration;
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// How long to wait for the kernel to reap a process after SIGKILL.
const KILL_SETTLE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGTERM
    Terminate,
    /// SIGKILL
    Kill,
}

/// Pids that must never be signalled: 0 and 1 address groups/init, larger values wrap negative.
fn signallable(pid: u32) -> bool {
    pid > 1 && pid <= i32::MAX as u32
}

/// Check whether a process with `pid` exists.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    if !signallable(pid) {
        return false;
    }
    let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
    rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn is_process_running(_pid: u32) -> bool {
    false
}

/// Deliver `signal` to `pid`. Returns false if the process does not exist or cannot be signalled.
#[cfg(unix)]
pub fn send_signal(pid: u32, signal: Signal) -> bool {
    if !signallable(pid) {
        return false;
    }
    let sig = match signal {
        Signal::Terminate => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };
    let rc = unsafe { libc::kill(pid as libc::pid_t, sig) };
    if rc != 0 {
        tracing::debug!(pid, ?signal, error = %std::io::Error::last_os_error(), "Signal not delivered");
    }
    rc == 0
}

#[cfg(not(unix))]
pub fn send_signal(_pid: u32, _signal: Signal) -> bool {
    false
}

/// Refresh a single process from the OS table and read something from it.
fn inspect<T>(pid: u32, read: impl FnOnce(&sysinfo::Process) -> T) -> Option<T> {
    use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::new(),
    );
    system.process(pid).map(read)
}

/// Process start time (seconds since the epoch), used to detect pid reuse.
pub fn start_time(pid: u32) -> Option<u64> {
    inspect(pid, |p| p.start_time())
}

/// Exited but not yet reaped by its parent.
fn is_zombie(pid: u32) -> bool {
    inspect(pid, |p| p.status() == sysinfo::ProcessStatus::Zombie).unwrap_or(false)
}

/// Poll until `pid` disappears or `timeout` elapses. Returns true if it exited.
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !is_process_running(pid) || is_zombie(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// SIGTERM, wait up to `grace`, then SIGKILL. Returns true once the process is gone.
pub async fn terminate(pid: u32, grace: Duration) -> bool {
    if !send_signal(pid, Signal::Terminate) {
        return !is_process_running(pid);
    }
    if wait_for_exit(pid, grace).await {
        tracing::debug!(pid, "Process exited after SIGTERM");
        return true;
    }

    tracing::warn!(pid, grace = ?grace, "Process ignored SIGTERM, sending SIGKILL");
    send_signal(pid, Signal::Kill);
    wait_for_exit(pid, KILL_SETTLE).await
}
