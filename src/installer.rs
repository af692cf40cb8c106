use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::error::{io_err, ManagerError, Result};
use crate::fs_util;
use crate::layout::SupportLayout;
use crate::release_installer::{find_file, platform_asset_name, Extractor, ReleaseSource};

/// Status stream of one `check_and_install` call: zero or more `Progress`, then one `Finished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    Progress(String),
    Finished { success: bool, message: String },
}

/// Successful result of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Installed tag already matches the latest release.
    UpToDate { tag: String },
    /// A new release was downloaded and installed.
    Installed { tag: String, previous: Option<String> },
    /// The index was unreachable but a binary is already installed.
    UsingExisting { reason: String },
}

impl InstallOutcome {
    pub fn message(&self) -> String {
        match self {
            InstallOutcome::UpToDate { tag } => format!("Xray {} is up to date", tag),
            InstallOutcome::Installed { tag, previous: Some(prev) } => {
                format!("Updated Xray {} -> {}", prev, tag)
            }
            InstallOutcome::Installed { tag, previous: None } => {
                format!("Installed Xray {}", tag)
            }
            InstallOutcome::UsingExisting { .. } => "Using existing installation".to_string(),
        }
    }
}

/// Keeps the daemon binary in `bin/` current with the release index.
pub struct Installer {
    layout: Arc<SupportLayout>,
    source: Arc<dyn ReleaseSource>,
    extractor: Extractor,
    asset_name: String,
    in_flight: Mutex<()>,
}

impl Installer {
    pub fn new(layout: Arc<SupportLayout>, source: Arc<dyn ReleaseSource>) -> Self {
        Self {
            layout,
            source,
            extractor: Extractor::platform_default(),
            asset_name: platform_asset_name(),
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_asset_name(mut self, asset_name: impl Into<String>) -> Self {
        self.asset_name = asset_name.into();
        self
    }

    /// Path of the installed binary, if one is present.
    pub fn installed_binary(&self) -> Option<PathBuf> {
        let path = self.layout.binary_path();
        path.is_file().then_some(path)
    }

    /// Tag recorded by the last successful install.
    pub fn installed_version(&self) -> Option<String> {
        let path = self.layout.version_file();
        fs::read_to_string(&path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Bring the installed binary up to date, reporting progress on `events`.
    ///
    /// Exactly one `InstallEvent::Finished` is sent per call. A call made while another
    /// is in flight is rejected with `ManagerError::Busy`.
    pub async fn check_and_install(
        &self,
        events: &mpsc::UnboundedSender<InstallEvent>,
    ) -> Result<InstallOutcome> {
        let result = match self.in_flight.try_lock() {
            Ok(guard) => {
                let result = self.run_check(events).await;
                drop(guard);
                result
            }
            Err(_) => Err(ManagerError::Busy),
        };

        let finished = match &result {
            Ok(outcome) => InstallEvent::Finished {
                success: true,
                message: outcome.message(),
            },
            Err(e) => InstallEvent::Finished {
                success: false,
                message: e.to_string(),
            },
        };
        let _ = events.send(finished);

        result
    }

    async fn run_check(
        &self,
        events: &mpsc::UnboundedSender<InstallEvent>,
    ) -> Result<InstallOutcome> {
        let progress = |msg: String| {
            tracing::debug!(status = %msg, "Install progress");
            let _ = events.send(InstallEvent::Progress(msg));
        };

        progress("Checking for updates...".to_string());
        let installed = self.installed_binary().is_some();
        let previous = self.installed_version();

        let release = match self.source.latest_release().await {
            Ok(release) => release,
            Err(e) if installed => {
                tracing::warn!(error = %e, "Release check failed, keeping existing installation");
                return Ok(InstallOutcome::UsingExisting {
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        if installed && previous.as_deref() == Some(release.tag_name.as_str()) {
            tracing::info!(tag = %release.tag_name, "Xray is up to date");
            return Ok(InstallOutcome::UpToDate {
                tag: release.tag_name,
            });
        }

        let asset = release
            .asset(&self.asset_name)
            .ok_or_else(|| ManagerError::AssetNotFound {
                tag: release.tag_name.clone(),
                asset: self.asset_name.clone(),
            })?;

        // Dropping the work dir removes everything downloaded or extracted on every path out.
        let workdir = tempfile::Builder::new()
            .prefix(".update-")
            .tempdir_in(self.layout.root())
            .map_err(|e| io_err(self.layout.root(), e))?;
        let archive = workdir.path().join(&asset.name);

        progress(format!("Downloading {} ({})...", asset.name, release.tag_name));
        let total = asset.size;
        let last_decile = std::sync::atomic::AtomicU64::new(0);
        let on_bytes = |received: u64| {
            if total == 0 {
                return;
            }
            let decile = (received.min(total) * 10 / total).min(10);
            if decile > last_decile.swap(decile, std::sync::atomic::Ordering::Relaxed) {
                let _ = events.send(InstallEvent::Progress(format!(
                    "Downloading {}: {}%",
                    asset.name,
                    decile * 10
                )));
            }
        };
        self.source.download(asset, &archive, &on_bytes).await?;

        progress("Extracting...".to_string());
        let extracted = workdir.path().join("extracted");
        self.extractor.extract(&archive, &extracted).await?;

        let binary = find_file(&extracted, self.layout.binary_name()).ok_or_else(|| {
            ManagerError::Extraction(format!(
                "'{}' not found in {}",
                self.layout.binary_name(),
                asset.name
            ))
        })?;

        progress("Installing...".to_string());
        fs_util::replace_file(&binary, &self.layout.binary_path(), true)
            .map_err(|e| ManagerError::Install(e.to_string()))?;

        for data_file in self.layout.data_files() {
            match find_file(&extracted, data_file) {
                Some(source) => {
                    let target = self.layout.bin_dir().join(data_file);
                    fs_util::replace_file(&source, &target, false)
                        .map_err(|e| ManagerError::Install(e.to_string()))?;
                }
                None => tracing::debug!(file = %data_file, "Auxiliary file not in archive"),
            }
        }

        fs_util::write_atomic(&self.layout.version_file(), release.tag_name.as_bytes())?;
        tracing::info!(tag = %release.tag_name, previous = ?previous, "Xray installed");

        Ok(InstallOutcome::Installed {
            tag: release.tag_name,
            previous,
        })
    }
}
