use serde::Serialize;

/// Lifecycle state of the supervised daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// No daemon process is tracked
    Stopped,
    /// Log file created, process being spawned
    Starting,
    /// Daemon process is alive
    Running,
    /// Termination signalled, waiting for exit
    Stopping,
}

impl ServiceState {
    pub fn is_running(&self) -> bool {
        matches!(self, ServiceState::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, ServiceState::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Stopped => "stopped",
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Stopping => "stopping",
        }
    }
}

/// Snapshot of supervisor state published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub state: ServiceState,
    pub active_config: String,
    pub current_log: Option<String>,
    pub pid: Option<u32>,
}

impl ServiceStatus {
    pub fn stopped(active_config: impl Into<String>) -> Self {
        Self {
            state: ServiceState::Stopped,
            active_config: active_config.into(),
            current_log: None,
            pid: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }
}
