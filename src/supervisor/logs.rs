use std::collections::VecDeque;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{io_err, ManagerError, Result};

pub const LOG_EXTENSION: &str = "log";
pub(crate) const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S-%3f";

/// One log file per daemon run in `logs/`, named by creation time.
#[derive(Debug, Clone)]
pub struct LogDirectory {
    dir: PathBuf,
}

impl LogDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Create a fresh, empty log file for a new run.
    pub fn create_run_log(&self) -> Result<(String, fs::File)> {
        self.create_log_at(chrono::Local::now())
    }

    /// Never reuses an existing file: runs started within the same millisecond get
    /// `_01`, `_02`, ... which still sort after the plain name.
    fn create_log_at(
        &self,
        started: chrono::DateTime<chrono::Local>,
    ) -> Result<(String, fs::File)> {
        let stem = started.format(LOG_TIMESTAMP_FORMAT).to_string();

        let mut suffix = 0u32;
        loop {
            let name = match suffix {
                0 => format!("{}.{}", stem, LOG_EXTENSION),
                n => format!("{}_{:02}.{}", stem, n, LOG_EXTENSION),
            };
            let path = self.path(&name);

            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    tracing::debug!(path = %path.display(), "Run log created");
                    return Ok((name, file));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(io_err(&path, e)),
            }
        }
    }

    /// Log file names, newest first.
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
            .filter(|name| {
                Path::new(name)
                    .extension()
                    .is_some_and(|ext| ext == LOG_EXTENSION)
            })
            .collect();
        names.sort_by(|a, b| b.cmp(a));
        Ok(names)
    }

    pub fn latest(&self) -> Result<Option<String>> {
        Ok(self.list()?.into_iter().next())
    }

    /// Last `lines` lines of log `name`. Tolerates files truncated or deleted out from under us.
    pub fn tail(&self, name: &str, lines: usize) -> Result<Vec<String>> {
        if !Path::new(name).file_name().is_some_and(|f| f == name) {
            return Err(ManagerError::Io {
                path: PathBuf::from(name),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "log name must be a plain file name",
                ),
            });
        }

        let path = self.path(name);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&path, e)),
        };

        let mut tail = VecDeque::with_capacity(lines.min(1024));
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| io_err(&path, e))?;
            if tail.len() == lines {
                tail.pop_front();
            }
            if lines > 0 {
                tail.push_back(line);
            }
        }
        Ok(tail.into())
    }
}
