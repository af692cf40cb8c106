use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManagerError {
    /// Release index fetch or asset download failed.
    #[error("network error: {0}")]
    Network(String),

    #[error("no release asset named '{asset}' in release {tag}")]
    AssetNotFound { tag: String, asset: String },

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("install failed: {0}")]
    Install(String),

    #[error("failed to spawn daemon: {0}")]
    Spawn(String),

    #[error("config not found: {0}")]
    ConfigNotFound(String),

    #[error("daemon binary is not installed at {}", .0.display())]
    BinaryMissing(PathBuf),

    #[error("daemon (pid {pid}) did not exit after SIGKILL")]
    StopTimeout { pid: u32 },

    #[error("an update check is already in progress")]
    Busy,

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("settings error: {0}")]
    Toml(String),
}

impl ManagerError {
    /// Whether this failure should be surfaced to the end user rather than just logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Spawn(_) | Self::Extraction(_) | Self::Install(_) | Self::AssetNotFound { .. }
        )
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManagerError {
    ManagerError::Io {
        path: path.into(),
        source,
    }
}

pub type Result<T> = std::result::Result<T, ManagerError>;
