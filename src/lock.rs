use anyhow::{anyhow, Result};
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Exclusive lock that keeps a second installation loop from driving the same lines
pub struct InstanceLock {
    path: PathBuf,
    _guard: RwLockWriteGuard<'static, File>,
}

impl InstanceLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let lock_file = File::create(path)?;
        let lock = Box::leak(Box::new(RwLock::new(lock_file)));
        let guard = lock.try_write().map_err(|_| {
            anyhow!(
                "Another oracle-phone instance holds {}. Only one can drive the hardware at a time.",
                path.display()
            )
        })?;

        info!(path = ?path, "Instance lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
            _guard: guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
