use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::clienv;
use crate::error::{ManagerError, Result};
use crate::installer::{InstallEvent, InstallOutcome, Installer};
use crate::layout::SupportLayout;
use crate::project_config::ProjectConfig;
use crate::release_installer::{GitHubReleases, ReleaseSource};
use crate::supervisor::{ServiceStatus, Supervisor, SupervisorOptions};

/// Wires the installer and the supervisor together in startup order:
/// orphan reconciliation, then install check, then start requests are accepted.
pub struct XrayManager {
    layout: Arc<SupportLayout>,
    installer: Installer,
    supervisor: Supervisor,
    ready: AtomicBool,
}

impl XrayManager {
    /// Build from the environment: support dir, release index, supervisor timeouts.
    pub async fn from_env() -> Result<Self> {
        Self::new(
            layout_from_env()?,
            release_source_from_env()?,
            SupervisorOptions::from_env(),
        )
        .await
    }

    pub async fn new(
        layout: Arc<SupportLayout>,
        source: Arc<dyn ReleaseSource>,
        options: SupervisorOptions,
    ) -> Result<Self> {
        let supervisor = Supervisor::new(Arc::clone(&layout), options).await?;
        let installer = Installer::new(Arc::clone(&layout), source);

        Ok(Self {
            layout,
            installer,
            supervisor,
            ready: AtomicBool::new(false),
        })
    }

    pub fn layout(&self) -> &SupportLayout {
        &self.layout
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Run the update check. Start requests are accepted once a binary is in place.
    pub async fn ensure_installed(
        &self,
        events: &mpsc::UnboundedSender<InstallEvent>,
    ) -> Result<InstallOutcome> {
        let result = self.installer.check_and_install(events).await;
        self.ready
            .store(self.installer.installed_binary().is_some(), Ordering::SeqCst);
        result
    }

    /// Skip the update check and accept starts if a binary is already installed.
    pub fn use_existing_installation(&self) -> bool {
        let ready = self.installer.installed_binary().is_some();
        self.ready.store(ready, Ordering::SeqCst);
        ready
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub async fn start(&self, config: Option<&str>) -> Result<()> {
        if !self.is_ready() {
            return Err(ManagerError::BinaryMissing(self.layout.binary_path()));
        }
        self.supervisor.start(config).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.supervisor.stop().await
    }

    pub async fn select_config(&self, name: &str) -> Result<()> {
        self.supervisor.select_config(name).await
    }

    pub async fn status(&self) -> ServiceStatus {
        self.supervisor.status().await
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceStatus> {
        self.supervisor.subscribe()
    }
}

/// The support directory named by the environment, created if needed.
pub fn layout_from_env() -> Result<Arc<SupportLayout>> {
    Ok(Arc::new(SupportLayout::prepare(clienv::support_dir())?))
}

/// Release index from the override variable, else the project repository's latest release.
pub fn release_source_from_env() -> Result<Arc<dyn ReleaseSource>> {
    let url = clienv::release_url_override()
        .or_else(|| ProjectConfig::get().latest_release_url())
        .ok_or_else(|| ManagerError::Network("No release index configured".to_string()))?;
    tracing::debug!(url = %url, "Using release index");
    Ok(Arc::new(GitHubReleases::new(url)?))
}
