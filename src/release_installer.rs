use async_trait::async_trait;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::{io_err, ManagerError, Result};

const USER_AGENT: &str = concat!("xray-manager/", env!("CARGO_PKG_VERSION"));
const GITHUB_JSON: &str = "application/vnd.github+json";

/// One published release of the daemon, as returned by the release index.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseDescriptor {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

impl ReleaseDescriptor {
    /// Asset whose name is exactly `name`.
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// Where release metadata and archives come from.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch the latest release descriptor.
    async fn latest_release(&self) -> Result<ReleaseDescriptor>;

    /// Download `asset` to `dest`, reporting the running byte count through `progress`.
    async fn download(
        &self,
        asset: &ReleaseAsset,
        dest: &Path,
        progress: &(dyn Fn(u64) + Send + Sync),
    ) -> Result<()>;
}

/// Release index served by the GitHub REST API.
pub struct GitHubReleases {
    client: reqwest::Client,
    url: String,
}

impl GitHubReleases {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ManagerError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    async fn latest_release(&self) -> Result<ReleaseDescriptor> {
        tracing::debug!(url = %self.url, "Fetching latest release");

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, GITHUB_JSON)
            .send()
            .await
            .map_err(|e| ManagerError::Network(format!("Failed to fetch release info: {}", e)))?;

        if !response.status().is_success() {
            return Err(ManagerError::Network(format!(
                "Release index returned status: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ManagerError::Network(format!("Failed to parse release JSON: {}", e)))
    }

    async fn download(
        &self,
        asset: &ReleaseAsset,
        dest: &Path,
        progress: &(dyn Fn(u64) + Send + Sync),
    ) -> Result<()> {
        tracing::debug!(url = %asset.browser_download_url, dest = %dest.display(), "Downloading asset");

        let mut response = self
            .client
            .get(&asset.browser_download_url)
            .send()
            .await
            .map_err(|e| ManagerError::Network(format!("Failed to download asset: {}", e)))?;

        if !response.status().is_success() {
            return Err(ManagerError::Network(format!(
                "Asset download returned status: {}",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| io_err(dest, e))?;
        let mut received = 0u64;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ManagerError::Network(format!("Failed to read response bytes: {}", e)))?
        {
            file.write_all(&chunk).await.map_err(|e| io_err(dest, e))?;
            received += chunk.len() as u64;
            progress(received);
        }
        file.flush().await.map_err(|e| io_err(dest, e))?;

        Ok(())
    }
}

/// Name of the release asset for the host platform, e.g. `Xray-macos-arm64-v8a.zip`.
pub fn platform_asset_name() -> String {
    let os = if cfg!(target_os = "macos") {
        "macos"
    } else {
        "linux"
    };

    let arch = if cfg!(target_arch = "aarch64") {
        "arm64-v8a"
    } else {
        "64"
    };

    format!("Xray-{}-{}.zip", os, arch)
}

/// How a downloaded archive is unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extractor {
    /// Run `<program> -xk <archive> <dest>`; non-zero exit is a failure.
    External { program: String },
    /// Unpack in-process with the `zip` crate.
    Builtin,
}

impl Extractor {
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Extractor::External {
                program: "ditto".to_string(),
            }
        } else {
            Extractor::Builtin
        }
    }

    pub async fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        fs::create_dir_all(dest).map_err(|e| io_err(dest, e))?;

        match self {
            Extractor::External { program } => {
                let output = Command::new(program)
                    .arg("-xk")
                    .arg(archive)
                    .arg(dest)
                    .output()
                    .await
                    .map_err(|e| {
                        ManagerError::Extraction(format!("Failed to run {}: {}", program, e))
                    })?;

                if !output.status.success() {
                    return Err(ManagerError::Extraction(format!(
                        "{} exited with {}: {}",
                        program,
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    )));
                }
                Ok(())
            }
            Extractor::Builtin => {
                let archive = archive.to_path_buf();
                let dest = dest.to_path_buf();
                tokio::task::spawn_blocking(move || extract_zip(&archive, &dest))
                    .await
                    .map_err(|e| ManagerError::Extraction(format!("Extraction task failed: {}", e)))?
            }
        }
    }
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive_path).map_err(|e| io_err(archive_path, e))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| ManagerError::Extraction(format!("Failed to read zip archive: {}", e)))?;

    archive
        .extract(dest)
        .map_err(|e| ManagerError::Extraction(format!("Failed to unpack zip archive: {}", e)))
}

/// Find a regular file called `name` anywhere under `root`, shallowest match first.
pub fn find_file(root: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .min_by_key(|entry| entry.depth())
        .map(|entry| entry.into_path())
}
