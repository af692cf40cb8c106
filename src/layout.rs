//! On-disk layout of the application support directory.
//!
//! ```text
//! <support>/
//! ├── bin/           xray, geoip.dat, geosite.dat
//! ├── configs/       *.json
//! ├── logs/          <timestamp>.log
//! ├── settings.toml  persisted selection
//! ├── xray-version   installed release tag
//! └── xray.pid       tracked daemon pid
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{io_err, Result};
use crate::project_config::ProjectConfig;

const BIN_DIR: &str = "bin";
const CONFIGS_DIR: &str = "configs";
const LOGS_DIR: &str = "logs";
const VERSION_FILE: &str = "xray-version";
const PID_FILE: &str = "xray.pid";
const SETTINGS_FILE: &str = "settings.toml";

/// Resolved paths shared by the installer and the supervisor.
///
/// Directories are created once, in [`SupportLayout::prepare`]; accessors never touch disk.
#[derive(Debug, Clone)]
pub struct SupportLayout {
    root: PathBuf,
    binary_name: String,
    data_files: Vec<String>,
}

impl SupportLayout {
    /// Build the layout under `root`, creating `bin/`, `configs/` and `logs/`.
    ///
    /// A relative `root` is made absolute, since the daemon runs with `bin/` as its
    /// working directory.
    pub fn prepare(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [BIN_DIR, CONFIGS_DIR, LOGS_DIR].map(|name| root.join(name)) {
            fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }
        let root = std::path::absolute(&root).map_err(|e| io_err(&root, e))?;

        let daemon = &ProjectConfig::get().daemon;
        let layout = Self {
            root,
            binary_name: daemon.binary.clone(),
            data_files: daemon.data_files.clone(),
        };
        tracing::debug!(root = %layout.root.display(), "Support directory prepared");

        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.root.join(CONFIGS_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    pub fn binary_path(&self) -> PathBuf {
        self.bin_dir().join(&self.binary_name)
    }

    /// Auxiliary data file names (geoip/geosite) installed next to the binary.
    pub fn data_files(&self) -> &[String] {
        &self.data_files
    }

    pub fn version_file(&self) -> PathBuf {
        self.root.join(VERSION_FILE)
    }

    pub fn pid_file(&self) -> PathBuf {
        self.root.join(PID_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }
}
