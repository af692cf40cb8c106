use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{io_err, ManagerError, Result};

pub const CONFIG_EXTENSION: &str = "json";
pub const DEFAULT_CONFIG_NAME: &str = "config.json";

/// Daemon configuration files in `configs/`. Always re-read; never cached.
#[derive(Debug, Clone)]
pub struct ConfigCatalog {
    dir: PathBuf,
}

impl ConfigCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Config file names, sorted lexicographically.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.dir, e)),
        };

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| has_extension(name, CONFIG_EXTENSION))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        is_plain_name(name) && has_extension(name, CONFIG_EXTENSION) && self.path(name).is_file()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Resolve `name` to a path, failing if it is not a listed config.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        if self.contains(name) {
            Ok(self.path(name))
        } else {
            Err(ManagerError::ConfigNotFound(name.to_string()))
        }
    }

    /// Write a minimal config skeleton under a free name and return that name.
    pub fn generate_example(&self) -> Result<String> {
        let body = serde_json::to_string_pretty(&example_config())?;
        let stem = DEFAULT_CONFIG_NAME
            .strip_suffix(".json")
            .unwrap_or(DEFAULT_CONFIG_NAME);

        let mut suffix = 0u32;
        loop {
            let name = match suffix {
                0 => DEFAULT_CONFIG_NAME.to_string(),
                n => format!("{}-{}.{}", stem, n, CONFIG_EXTENSION),
            };
            let path = self.path(&name);

            let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    suffix += 1;
                    continue;
                }
                Err(e) => return Err(io_err(&path, e)),
            };
            file.write_all(body.as_bytes())
                .and_then(|_| file.write_all(b"\n"))
                .map_err(|e| io_err(&path, e))?;

            tracing::info!(name = %name, "Example config written");
            return Ok(name);
        }
    }
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Reject anything that would escape the directory.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().is_some_and(|f| f == name)
}

/// Local SOCKS + HTTP inbounds with a direct outbound.
fn example_config() -> serde_json::Value {
    serde_json::json!({
        "log": { "loglevel": "warning" },
        "inbounds": [
            {
                "tag": "socks-in",
                "listen": "127.0.0.1",
                "port": 10808,
                "protocol": "socks",
                "settings": { "udp": true }
            },
            {
                "tag": "http-in",
                "listen": "127.0.0.1",
                "port": 10809,
                "protocol": "http"
            }
        ],
        "outbounds": [
            { "tag": "direct", "protocol": "freedom" },
            { "tag": "block", "protocol": "blackhole" }
        ]
    })
}
