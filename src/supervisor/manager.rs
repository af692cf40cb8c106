use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use super::configs::{ConfigCatalog, DEFAULT_CONFIG_NAME};
use super::logs::LogDirectory;
use super::pid_record::{reconcile_orphan, OrphanOutcome, PidRecordFile, ProcessRecord};
use super::process::{self, Signal};
use super::state::{ServiceState, ServiceStatus};
use crate::clienv;
use crate::error::{ManagerError, Result};
use crate::layout::SupportLayout;
use crate::user_config::UserConfig;

/// Extra wait after SIGKILL before giving up on a stop.
const KILL_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Upper bound on waiting for SIGTERM to take effect in `stop()`
    pub stop_timeout: Duration,
    /// Grace period between SIGTERM and SIGKILL for orphans found at startup
    pub grace_period: Duration,
    /// Config used when nothing has been selected yet
    pub default_config: String,
}

impl SupervisorOptions {
    pub fn from_env() -> Self {
        Self {
            stop_timeout: clienv::stop_timeout(),
            grace_period: clienv::grace_period(),
            ..Self::default()
        }
    }
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(5),
            grace_period: Duration::from_millis(500),
            default_config: DEFAULT_CONFIG_NAME.to_string(),
        }
    }
}

/// The process currently owned by the supervisor.
struct ActiveRun {
    generation: u64,
    pid: u32,
    /// Flips to true once the exit reactor has reaped the process.
    exited: watch::Receiver<bool>,
}

struct Inner {
    state: ServiceState,
    active_config: String,
    current_log: Option<String>,
    run: Option<ActiveRun>,
    next_generation: u64,
}

impl Inner {
    fn snapshot(&self) -> ServiceStatus {
        ServiceStatus {
            state: self.state,
            active_config: self.active_config.clone(),
            current_log: self.current_log.clone(),
            pid: self.run.as_ref().map(|run| run.pid),
        }
    }
}

/// State shared with exit reactor tasks.
struct Shared {
    inner: Mutex<Inner>,
    records: PidRecordFile,
    status: watch::Sender<ServiceStatus>,
}

impl Shared {
    fn publish(&self, inner: &Inner) {
        self.status.send_replace(inner.snapshot());
    }

    /// Common cleanup for explicit stops and self-exits. Only the run identified by
    /// `generation` is torn down; repeated calls are no-ops.
    fn finish_run(&self, inner: &mut Inner, generation: u64) {
        if !inner
            .run
            .as_ref()
            .is_some_and(|run| run.generation == generation)
        {
            return;
        }

        inner.run = None;
        inner.state = ServiceState::Stopped;
        inner.current_log = None;
        if let Err(e) = self.records.clear() {
            warn!(error = %e, "Failed to clear pid record");
        }
        self.publish(inner);
    }
}

/// Owns the Xray daemon process: start, stop, restart-on-switch, crash recovery.
pub struct Supervisor {
    layout: Arc<SupportLayout>,
    options: SupervisorOptions,
    configs: ConfigCatalog,
    logs: LogDirectory,
    recovery: OrphanOutcome,
    shared: Arc<Shared>,
}

impl Supervisor {
    /// Reconcile any orphan from a previous run, then load the persisted selection.
    ///
    /// No other operation is possible until this returns.
    pub async fn new(layout: Arc<SupportLayout>, options: SupervisorOptions) -> Result<Self> {
        let records = PidRecordFile::new(layout.pid_file());
        let recovery = reconcile_orphan(&records, options.grace_period).await?;
        if recovery != OrphanOutcome::NoRecord {
            info!(outcome = ?recovery, "Startup reconciliation finished");
        }

        let settings = UserConfig::load(&layout.settings_file()).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load settings, using defaults");
            UserConfig::default()
        });
        let active_config = settings
            .selected_config
            .unwrap_or_else(|| options.default_config.clone());

        let inner = Inner {
            state: ServiceState::Stopped,
            active_config,
            current_log: None,
            run: None,
            next_generation: 0,
        };
        let (status, _) = watch::channel(inner.snapshot());

        Ok(Self {
            configs: ConfigCatalog::new(layout.configs_dir()),
            logs: LogDirectory::new(layout.logs_dir()),
            layout,
            options,
            recovery,
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                records,
                status,
            }),
        })
    }

    /// What startup reconciliation did.
    pub fn recovery(&self) -> OrphanOutcome {
        self.recovery
    }

    pub fn configs(&self) -> &ConfigCatalog {
        &self.configs
    }

    pub fn logs(&self) -> &LogDirectory {
        &self.logs
    }

    pub async fn status(&self) -> ServiceStatus {
        self.shared.inner.lock().await.snapshot()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<ServiceStatus> {
        self.shared.status.subscribe()
    }

    pub fn list_configs(&self) -> Result<Vec<String>> {
        self.configs.list()
    }

    pub fn list_logs(&self) -> Result<Vec<String>> {
        self.logs.list()
    }

    pub fn generate_example_config(&self) -> Result<String> {
        self.configs.generate_example()
    }

    /// Start the daemon with `config`, or the active selection when `None`.
    ///
    /// No-op unless stopped, and when the config does not exist.
    pub async fn start(&self, config: Option<&str>) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;
        self.start_locked(&mut inner, config)
    }

    /// Stop the daemon. No-op when already stopped.
    ///
    /// Fails with `StopTimeout` if the process is not reaped even after SIGKILL; the
    /// supervisor then stays `Stopping` and keeps the pid record.
    pub async fn stop(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;
        self.stop_locked(&mut inner).await
    }

    /// Persist `name` as the selected config, restarting the daemon if it is running.
    ///
    /// Unknown names are ignored.
    pub async fn select_config(&self, name: &str) -> Result<()> {
        if !self.configs.contains(name) {
            warn!(config = %name, "Ignoring selection of unknown config");
            return Ok(());
        }

        let mut inner = self.shared.inner.lock().await;
        UserConfig {
            selected_config: Some(name.to_string()),
        }
        .save(&self.layout.settings_file())?;

        if inner.active_config == name {
            debug!(config = %name, "Config already active");
            return Ok(());
        }

        let restart = inner.state.is_running();
        inner.active_config = name.to_string();
        self.shared.publish(&inner);
        info!(config = %name, restart, "Config selected");

        if restart {
            self.stop_locked(&mut inner).await?;
            self.start_locked(&mut inner, None)?;
        }
        Ok(())
    }

    fn start_locked(&self, inner: &mut Inner, config: Option<&str>) -> Result<()> {
        if !inner.state.is_stopped() {
            debug!(state = inner.state.as_str(), "Start ignored, daemon not stopped");
            return Ok(());
        }

        let binary = self.layout.binary_path();
        if !binary.is_file() {
            return Err(ManagerError::BinaryMissing(binary));
        }

        let config_name = config.unwrap_or(&inner.active_config).to_string();
        let Ok(config_path) = self.configs.resolve(&config_name) else {
            warn!(config = %config_name, "Start ignored, config not found");
            return Ok(());
        };

        inner.state = ServiceState::Starting;
        self.shared.publish(inner);

        match self.spawn_daemon(&binary, &config_path) {
            Ok((child, log_name)) => {
                self.track(inner, child, config_name, log_name);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, config = %config_name, "Failed to start Xray");
                inner.state = ServiceState::Stopped;
                self.shared.publish(inner);
                Err(e)
            }
        }
    }

    /// Create the run log and spawn `xray -c <config>` with output redirected into it.
    fn spawn_daemon(
        &self,
        binary: &std::path::Path,
        config_path: &std::path::Path,
    ) -> Result<(Child, String)> {
        let (log_name, log_file) = self.logs.create_run_log()?;
        let log_path = self.logs.path(&log_name);

        let spawned = log_file.try_clone().and_then(|stderr| {
            let mut cmd = Command::new(binary);
            cmd.arg("-c")
                .arg(config_path)
                .current_dir(self.layout.bin_dir())
                .stdin(Stdio::null())
                .stdout(Stdio::from(log_file))
                .stderr(Stdio::from(stderr));
            cmd.spawn()
        });

        match spawned {
            Ok(child) => Ok((child, log_name)),
            Err(e) => {
                let _ = std::fs::remove_file(&log_path);
                Err(ManagerError::Spawn(format!("{}: {}", binary.display(), e)))
            }
        }
    }

    /// Record a freshly spawned child and hand it to an exit reactor.
    fn track(&self, inner: &mut Inner, child: Child, config_name: String, log_name: String) {
        let pid = child.id().unwrap_or_default();
        let generation = inner.next_generation;
        inner.next_generation += 1;

        if let Err(e) = self.shared.records.write(&ProcessRecord::capture(pid)) {
            warn!(pid, error = %e, "Failed to persist pid record");
        }

        let (exited_tx, exited_rx) = watch::channel(false);
        spawn_exit_reactor(Arc::clone(&self.shared), generation, pid, child, exited_tx);

        inner.run = Some(ActiveRun {
            generation,
            pid,
            exited: exited_rx,
        });
        inner.state = ServiceState::Running;
        inner.active_config = config_name;
        inner.current_log = Some(log_name);
        self.shared.publish(inner);

        info!(pid, config = %inner.active_config, log = ?inner.current_log, "Xray started");
    }

    async fn stop_locked(&self, inner: &mut Inner) -> Result<()> {
        let Some(run) = inner.run.as_ref() else {
            debug!("Stop ignored, daemon not running");
            return Ok(());
        };
        let pid = run.pid;
        let generation = run.generation;
        let mut exited = run.exited.clone();

        inner.state = ServiceState::Stopping;
        self.shared.publish(inner);
        info!(pid, "Stopping Xray");

        if !*exited.borrow() {
            process::send_signal(pid, Signal::Terminate);
            if !wait_exited(&mut exited, self.options.stop_timeout).await {
                warn!(pid, timeout = ?self.options.stop_timeout, "Xray did not stop in time, force killing");
                process::send_signal(pid, Signal::Kill);
                if !wait_exited(&mut exited, KILL_WAIT).await {
                    // The exit reactor finishes the run once the process is reaped.
                    warn!(pid, "Xray still not reaped after SIGKILL");
                    return Err(ManagerError::StopTimeout { pid });
                }
            }
        }

        self.shared.finish_run(inner, generation);
        info!(pid, "Xray stopped");
        Ok(())
    }
}

async fn wait_exited(exited: &mut watch::Receiver<bool>, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, exited.wait_for(|done| *done)).await,
        Ok(Ok(_))
    )
}

/// Await the child's exit, signal it, then run the shared cleanup for its run.
fn spawn_exit_reactor(
    shared: Arc<Shared>,
    generation: u64,
    pid: u32,
    mut child: Child,
    exited: watch::Sender<bool>,
) {
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => info!(pid, %status, "Xray exited"),
            Err(e) => warn!(pid, error = %e, "Failed to wait for Xray"),
        }
        let _ = exited.send(true);

        let mut inner = shared.inner.lock().await;
        shared.finish_run(&mut inner, generation);
    });
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::SPAWN_LOCK;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const LONG_RUNNING: &str = "#!/bin/sh\necho \"xray $@\"\nexec sleep 30\n";
    const EXITS_AT_ONCE: &str = "#!/bin/sh\necho \"xray $@\"\nexit 3\n";
    const IGNORES_TERM: &str =
        "#!/bin/sh\ntrap '' TERM\necho \"xray $@\"\nwhile :; do sleep 1; done\n";

    fn install_stub(layout: &SupportLayout, script: &str) {
        let path = layout.binary_path();
        fs::write(&path, script).unwrap();
        crate::fs_util::set_executable(&path).unwrap();
    }

    fn add_config(layout: &SupportLayout, name: &str) {
        fs::write(layout.configs_dir().join(name), "{}").unwrap();
    }

    fn options() -> SupervisorOptions {
        SupervisorOptions {
            stop_timeout: Duration::from_millis(500),
            grace_period: Duration::from_millis(200),
            ..SupervisorOptions::default()
        }
    }

    async fn supervisor(script: Option<&str>) -> (TempDir, Arc<SupportLayout>, Supervisor) {
        let dir = TempDir::new().unwrap();
        let layout = Arc::new(SupportLayout::prepare(dir.path()).unwrap());
        if let Some(script) = script {
            install_stub(&layout, script);
        }
        add_config(&layout, "config.json");
        let supervisor = Supervisor::new(layout.clone(), options()).await.unwrap();
        (dir, layout, supervisor)
    }

    async fn wait_for_state(supervisor: &Supervisor, state: ServiceState) {
        let mut rx = supervisor.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.state == state))
            .await
            .expect("timed out waiting for state")
            .unwrap();
    }

    fn read_log(layout: &SupportLayout, name: &str) -> String {
        fs::read_to_string(layout.logs_dir().join(name)).unwrap()
    }

    async fn wait_for_log_line(layout: &SupportLayout, name: &str) -> String {
        for _ in 0..100 {
            let content = read_log(layout, name);
            if content.contains('\n') {
                return content;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        read_log(layout, name)
    }

    #[tokio::test]
    async fn start_and_stop_lifecycle() {
        let _guard = SPAWN_LOCK.lock().await;
        let (_dir, layout, supervisor) = supervisor(Some(LONG_RUNNING)).await;

        supervisor.start(None).await.unwrap();
        let status = supervisor.status().await;
        assert_eq!(status.state, ServiceState::Running);
        assert_eq!(status.active_config, "config.json");
        let pid = status.pid.unwrap();
        let log_name = status.current_log.clone().unwrap();
        let stem = log_name.strip_suffix(".log").unwrap();
        assert!(
            chrono::NaiveDateTime::parse_from_str(stem, super::super::logs::LOG_TIMESTAMP_FORMAT)
                .is_ok(),
            "log {log_name} is not named by its start time"
        );

        let record = PidRecordFile::new(layout.pid_file()).read().unwrap().unwrap();
        assert_eq!(record.pid, pid);

        let content = wait_for_log_line(&layout, &log_name).await;
        let config_path = layout.configs_dir().join("config.json");
        assert!(content.contains(&format!("-c {}", config_path.display())));

        supervisor.stop().await.unwrap();
        let status = supervisor.status().await;
        assert_eq!(status.state, ServiceState::Stopped);
        assert!(status.pid.is_none());
        assert!(!layout.pid_file().exists());
        assert!(!process::is_process_running(pid));
        assert_eq!(read_log(&layout, &log_name), content, "stop must not truncate the log");
        assert_eq!(supervisor.list_logs().unwrap(), vec![log_name]);
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let _guard = SPAWN_LOCK.lock().await;
        let (_dir, _layout, supervisor) = supervisor(Some(LONG_RUNNING)).await;

        supervisor.stop().await.unwrap();
        assert_eq!(supervisor.status().await, ServiceStatus::stopped("config.json"));

        supervisor.start(None).await.unwrap();
        let running = supervisor.status().await;
        supervisor.start(None).await.unwrap();
        supervisor.start(Some("config.json")).await.unwrap();
        assert_eq!(supervisor.status().await, running);
        assert_eq!(supervisor.list_logs().unwrap().len(), 1);

        supervisor.stop().await.unwrap();
        supervisor.stop().await.unwrap();
        assert_eq!(supervisor.status().await.state, ServiceState::Stopped);
    }

    #[tokio::test]
    async fn concurrent_starts_spawn_one_process() {
        let _guard = SPAWN_LOCK.lock().await;
        let (_dir, _layout, supervisor) = supervisor(Some(LONG_RUNNING)).await;
        let supervisor = Arc::new(supervisor);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let supervisor = Arc::clone(&supervisor);
                tokio::spawn(async move { supervisor.start(None).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(supervisor.list_logs().unwrap().len(), 1);
        assert!(supervisor.status().await.is_running());
        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn select_config_while_running_restarts() {
        let _guard = SPAWN_LOCK.lock().await;
        let (_dir, layout, supervisor) = supervisor(Some(LONG_RUNNING)).await;
        add_config(&layout, "work.json");

        supervisor.start(None).await.unwrap();
        let first_pid = supervisor.status().await.pid.unwrap();

        supervisor.select_config("work.json").await.unwrap();

        let status = supervisor.status().await;
        assert_eq!(status.state, ServiceState::Running);
        assert_eq!(status.active_config, "work.json");
        assert_ne!(status.pid, Some(first_pid));
        assert!(!process::is_process_running(first_pid));
        assert_eq!(supervisor.list_logs().unwrap().len(), 2);

        let log = wait_for_log_line(&layout, status.current_log.as_deref().unwrap()).await;
        assert!(log.contains("work.json"));
        let settings = UserConfig::load(&layout.settings_file()).unwrap();
        assert_eq!(settings.selected_config.as_deref(), Some("work.json"));

        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn select_config_while_stopped_only_persists() {
        let (_dir, layout, supervisor) = supervisor(Some(LONG_RUNNING)).await;
        add_config(&layout, "work.json");

        supervisor.select_config("work.json").await.unwrap();
        supervisor.select_config("missing.json").await.unwrap();

        let status = supervisor.status().await;
        assert_eq!(status.state, ServiceState::Stopped);
        assert_eq!(status.active_config, "work.json");
        assert!(supervisor.list_logs().unwrap().is_empty());

        let reloaded = Supervisor::new(layout.clone(), options()).await.unwrap();
        assert_eq!(reloaded.status().await.active_config, "work.json");
    }

    #[tokio::test]
    async fn self_exit_runs_cleanup() {
        let _guard = SPAWN_LOCK.lock().await;
        let (_dir, layout, supervisor) = supervisor(Some(EXITS_AT_ONCE)).await;

        supervisor.start(None).await.unwrap();
        wait_for_state(&supervisor, ServiceState::Stopped).await;

        let status = supervisor.status().await;
        assert!(status.pid.is_none());
        assert!(status.current_log.is_none());
        assert!(!layout.pid_file().exists());

        supervisor.stop().await.unwrap();
        assert_eq!(supervisor.status().await.state, ServiceState::Stopped);
    }

    #[tokio::test]
    async fn stop_escalates_when_term_is_ignored() {
        let _guard = SPAWN_LOCK.lock().await;
        let (_dir, layout, supervisor) = supervisor(Some(IGNORES_TERM)).await;

        supervisor.start(None).await.unwrap();
        let status = supervisor.status().await;
        wait_for_log_line(&layout, status.current_log.as_deref().unwrap()).await;

        let started = std::time::Instant::now();
        supervisor.stop().await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(supervisor.status().await.state, ServiceState::Stopped);
        assert!(!process::is_process_running(status.pid.unwrap()));
    }

    #[tokio::test]
    async fn start_without_binary_fails() {
        let (_dir, _layout, supervisor) = supervisor(None).await;

        let result = supervisor.start(None).await;

        assert!(matches!(result, Err(ManagerError::BinaryMissing(_))));
        assert_eq!(supervisor.status().await.state, ServiceState::Stopped);
    }

    #[tokio::test]
    async fn start_with_unknown_config_is_ignored() {
        let (_dir, _layout, supervisor) = supervisor(Some(LONG_RUNNING)).await;
        let before = supervisor.status().await;

        supervisor.start(Some("nope.json")).await.unwrap();

        assert_eq!(supervisor.status().await, before);
        assert!(supervisor.list_logs().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_from_relative_support_dir() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::Builder::new()
            .prefix("relative-support")
            .tempdir_in(".")
            .unwrap();
        let relative = PathBuf::from(dir.path().file_name().unwrap());
        let layout = Arc::new(SupportLayout::prepare(&relative).unwrap());
        install_stub(&layout, LONG_RUNNING);
        add_config(&layout, "config.json");
        let supervisor = Supervisor::new(layout.clone(), options()).await.unwrap();

        supervisor.start(None).await.unwrap();
        let status = supervisor.status().await;
        assert!(status.is_running());

        let log = wait_for_log_line(&layout, status.current_log.as_deref().unwrap()).await;
        let config_path = layout.configs_dir().join("config.json");
        assert!(config_path.is_absolute());
        assert!(log.contains(&format!("-c {}", config_path.display())));

        supervisor.stop().await.unwrap();
        assert_eq!(supervisor.status().await.state, ServiceState::Stopped);
    }

    #[tokio::test]
    async fn stop_keeps_record_until_process_is_reaped() {
        let _guard = SPAWN_LOCK.lock().await;
        let (_dir, layout, supervisor) = supervisor(None).await;
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        PidRecordFile::new(layout.pid_file())
            .write(&ProcessRecord {
                pid,
                started_at: None,
            })
            .unwrap();

        // A run whose exit is never reported, as with a process stuck in the kernel.
        let (exited_tx, exited_rx) = watch::channel(false);
        {
            let mut inner = supervisor.shared.inner.lock().await;
            inner.run = Some(ActiveRun {
                generation: 7,
                pid,
                exited: exited_rx,
            });
            inner.state = ServiceState::Running;
            inner.next_generation = 8;
        }

        let result = supervisor.stop().await;

        assert!(matches!(result, Err(ManagerError::StopTimeout { pid: p }) if p == pid));
        let status = supervisor.status().await;
        assert_eq!(status.state, ServiceState::Stopping);
        assert_eq!(status.pid, Some(pid));
        assert!(layout.pid_file().exists());

        supervisor.start(None).await.unwrap();
        assert!(supervisor.list_logs().unwrap().is_empty(), "no second daemon while stopping");

        child.wait().unwrap();
        exited_tx.send(true).unwrap();
        {
            let mut inner = supervisor.shared.inner.lock().await;
            supervisor.shared.finish_run(&mut inner, 7);
        }
        assert_eq!(supervisor.status().await.state, ServiceState::Stopped);
        assert!(!layout.pid_file().exists());
    }

    #[tokio::test]
    async fn spawn_failure_leaves_no_trace() {
        let (_dir, layout, supervisor) = supervisor(None).await;
        fs::write(layout.binary_path(), "not executable").unwrap();

        let result = supervisor.start(None).await;

        assert!(matches!(result, Err(ManagerError::Spawn(_))));
        assert_eq!(supervisor.status().await.state, ServiceState::Stopped);
        assert!(supervisor.list_logs().unwrap().is_empty());
        assert!(!layout.pid_file().exists());
    }

    #[tokio::test]
    async fn construction_kills_orphan() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = TempDir::new().unwrap();
        let layout = Arc::new(SupportLayout::prepare(dir.path()).unwrap());
        let mut orphan = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        PidRecordFile::new(layout.pid_file())
            .write(&ProcessRecord::capture(orphan.id()))
            .unwrap();

        let supervisor = Supervisor::new(layout.clone(), options()).await.unwrap();

        assert_eq!(
            supervisor.recovery(),
            OrphanOutcome::Terminated { pid: orphan.id() }
        );
        assert!(orphan.try_wait().unwrap().is_some(), "orphan must be dead");
        assert!(!layout.pid_file().exists());
    }

    #[tokio::test]
    async fn construction_clears_stale_record() {
        let dir = TempDir::new().unwrap();
        let layout = Arc::new(SupportLayout::prepare(dir.path()).unwrap());
        let mut exited = std::process::Command::new("true").spawn().unwrap();
        let pid = exited.id();
        exited.wait().unwrap();
        // Fingerprint 0 never matches a live process, so a recycled pid is left alone.
        fs::write(layout.pid_file(), format!("{pid}\n0\n")).unwrap();

        let supervisor = Supervisor::new(layout.clone(), options()).await.unwrap();

        assert!(matches!(
            supervisor.recovery(),
            OrphanOutcome::NotRunning { .. } | OrphanOutcome::PidReused { .. }
        ));
        assert!(!layout.pid_file().exists());
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let _guard = SPAWN_LOCK.lock().await;
        let (_dir, _layout, supervisor) = supervisor(Some(LONG_RUNNING)).await;
        let mut rx = supervisor.subscribe();

        supervisor.start(None).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_running());

        supervisor.stop().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().state, ServiceState::Stopped);
    }

    #[test]
    fn default_options() {
        let options = SupervisorOptions::default();
        assert_eq!(options.default_config, "config.json");
        assert!(options.stop_timeout > options.grace_period);
    }
}
