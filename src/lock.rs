//! Site-scoped advisory lock
//!
//! Two provisioning runs against the same site would race on installation
//! and import. The lock is an exclusive `flock` on a per-site file, taken
//! without blocking and released when the guard drops (or the process dies).

use crate::error::{ProvisionError, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Held for the lifetime of a provisioning run
#[derive(Debug)]
pub struct SiteLock {
    file: File,
    path: PathBuf,
}

impl SiteLock {
    /// Take the lock for `site_id` at `path`, failing fast if another run holds it
    pub fn acquire(site_id: &str, path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| ProvisionError::resource(dir, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| ProvisionError::resource(path, e))?;

        if !try_lock_exclusive(&file).map_err(|e| ProvisionError::resource(path, e))? {
            return Err(ProvisionError::Locked {
                site: site_id.to_string(),
                path: path.to_path_buf(),
            });
        }

        // Record the holder for humans inspecting a stuck lock
        file.set_len(0)
            .and_then(|()| writeln!(file, "{}", std::process::id()))
            .map_err(|e| ProvisionError::resource(path, e))?;

        log::debug!("Acquired site lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SiteLock {
    fn drop(&mut self) {
        unlock(&self.file);
        log::debug!("Released site lock {}", self.path.display());
    }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> std::io::Result<bool> {
    use std::os::fd::AsRawFd;

    // SAFETY: the descriptor is owned by `file` and valid for this call
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
        Ok(false)
    } else {
        Err(err)
    }
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::fd::AsRawFd;

    // SAFETY: the descriptor is owned by `file` and valid for this call
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
fn try_lock_exclusive(_file: &File) -> std::io::Result<bool> {
    Ok(true)
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".siteup-blog.lock");

        let first = SiteLock::acquire("blog", &path).unwrap();
        let err = SiteLock::acquire("blog", &path).unwrap_err();
        assert!(matches!(err, ProvisionError::Locked { .. }));

        drop(first);
        assert!(SiteLock::acquire("blog", &path).is_ok());
    }

    #[test]
    fn test_different_sites_do_not_conflict() {
        let dir = TempDir::new().unwrap();
        let _a = SiteLock::acquire("a", &dir.path().join(".siteup-a.lock")).unwrap();
        let _b = SiteLock::acquire("b", &dir.path().join(".siteup-b.lock")).unwrap();
    }

    #[test]
    fn test_lock_file_records_pid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(".siteup-blog.lock");
        let lock = SiteLock::acquire("blog", &path).unwrap();
        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }
}
