use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{io_err, Result};

/// Sibling path used while staging a replacement for `path`.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

/// Write `contents` to `path` via a temp file + rename so readers never see a partial record.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = staging_path(path);
    let result = (|| {
        let mut file = fs::File::create(&tmp).map_err(|e| io_err(&tmp, e))?;
        file.write_all(contents).map_err(|e| io_err(&tmp, e))?;
        file.sync_all().map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| io_err(path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(path, e)),
    }
}

pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path).map_err(|e| io_err(path, e))?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).map_err(|e| io_err(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Replace `target` with `source` by staging a copy next to the target and renaming it over.
///
/// `source` may live on another filesystem; the final rename is always same-directory.
pub fn replace_file(source: &Path, target: &Path, executable: bool) -> Result<()> {
    let staged = staging_path(target);
    let result = (|| {
        fs::copy(source, &staged).map_err(|e| io_err(&staged, e))?;
        if executable {
            set_executable(&staged)?;
        }
        fs::rename(&staged, target).map_err(|e| io_err(target, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&staged);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_atomic_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("xray-version");
        write_atomic(&path, b"v1.7.0").unwrap();
        write_atomic(&path, b"v1.8.0").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v1.8.0");

        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "staging file must not survive");
    }

    #[test]
    fn remove_if_exists_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("xray.pid");
        fs::write(&path, "42").unwrap();
        remove_if_exists(&path).unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn replace_file_overwrites_and_marks_executable() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("new-xray");
        let target = dir.path().join("xray");
        fs::write(&source, "new").unwrap();
        fs::write(&target, "old").unwrap();

        replace_file(&source, &target, true).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&target).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn replace_file_missing_source_leaves_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("xray");
        fs::write(&target, "old").unwrap();

        let result = replace_file(&dir.path().join("absent"), &target, true);

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    }
}
