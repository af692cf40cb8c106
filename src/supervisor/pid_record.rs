use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::process;
use crate::error::{io_err, Result};
use crate::fs_util;

/// Tracked daemon process: pid on the first line, start time on the optional second line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub started_at: Option<u64>,
}

impl ProcessRecord {
    /// Record for a freshly spawned `pid`, fingerprinted with its start time.
    pub fn capture(pid: u32) -> Self {
        Self {
            pid,
            started_at: process::start_time(pid),
        }
    }

    pub fn parse(content: &str) -> Option<Self> {
        let mut lines = content.lines().map(str::trim);
        let pid = lines.next()?.parse().ok()?;
        let started_at = lines.next().and_then(|l| l.parse().ok());
        Some(Self { pid, started_at })
    }

    pub fn render(&self) -> String {
        match self.started_at {
            Some(started_at) => format!("{}\n{}\n", self.pid, started_at),
            None => format!("{}\n", self.pid),
        }
    }

    /// True when `pid` is alive and, if fingerprinted, is still the same process.
    pub fn matches_live_process(&self) -> bool {
        if !process::is_process_running(self.pid) {
            return false;
        }
        match self.started_at {
            Some(expected) => process::start_time(self.pid) == Some(expected),
            None => true,
        }
    }
}

/// The crash-recovery ledger (`xray.pid`).
#[derive(Debug, Clone)]
pub struct PidRecordFile {
    path: PathBuf,
}

impl PidRecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record. A missing file is `None`; an unparseable one is logged and treated as `None`.
    pub fn read(&self) -> Result<Option<ProcessRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&self.path, e)),
        };

        let record = ProcessRecord::parse(&content);
        if record.is_none() {
            tracing::warn!(path = %self.path.display(), "Ignoring malformed pid record");
        }
        Ok(record)
    }

    pub fn write(&self, record: &ProcessRecord) -> Result<()> {
        fs_util::write_atomic(&self.path, record.render().as_bytes())?;
        tracing::debug!(pid = record.pid, path = %self.path.display(), "Pid record written");
        Ok(())
    }

    /// Remove the record. Clearing an absent record is a no-op.
    pub fn clear(&self) -> Result<()> {
        fs_util::remove_if_exists(&self.path)
    }
}

/// What startup reconciliation found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanOutcome {
    NoRecord,
    /// The recorded process was already gone.
    NotRunning { pid: u32 },
    /// The pid is alive but belongs to a different process now.
    PidReused { pid: u32 },
    Terminated { pid: u32 },
    /// Signals were sent but the process outlived the kill wait.
    Survived { pid: u32 },
}

/// Terminate a daemon left running by a previous instance, then drop the record.
pub async fn reconcile_orphan(records: &PidRecordFile, grace: Duration) -> Result<OrphanOutcome> {
    let outcome = match records.read()? {
        None => OrphanOutcome::NoRecord,
        Some(record) if !process::is_process_running(record.pid) => {
            tracing::debug!(pid = record.pid, "Recorded daemon is no longer running");
            OrphanOutcome::NotRunning { pid: record.pid }
        }
        Some(record) if !record.matches_live_process() => {
            tracing::warn!(pid = record.pid, "Pid was reused by another process, leaving it alone");
            OrphanOutcome::PidReused { pid: record.pid }
        }
        Some(record) => {
            tracing::info!(pid = record.pid, "Terminating orphaned Xray process");
            if process::terminate(record.pid, grace).await {
                OrphanOutcome::Terminated { pid: record.pid }
            } else {
                tracing::warn!(pid = record.pid, "Orphaned Xray process survived SIGKILL");
                OrphanOutcome::Survived { pid: record.pid }
            }
        }
    };

    records.clear()?;
    Ok(outcome)
}
