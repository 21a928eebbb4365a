//! Cooldown marker: the quiet period after each workflow run.
//!
//! The marker is a single decimal unix timestamp on disk so that a restart in
//! the middle of a cooldown window still honours it. Everything here fails
//! open: a marker that cannot be read never blocks the installation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error on cooldown marker {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cooldown marker is corrupt: {reason}")]
    Corrupt { reason: String },
}

/// Storage for the last-run timestamp, in unix seconds
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn load(&self) -> Result<Option<f64>, PersistenceError>;

    async fn store(&self, timestamp: f64) -> Result<(), PersistenceError>;

    async fn clear(&self) -> Result<(), PersistenceError>;
}

pub struct FileMarkerStore {
    path: PathBuf,
}

impl FileMarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl MarkerStore for FileMarkerStore {
    async fn load(&self) -> Result<Option<f64>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let value: f64 = raw.trim().parse().map_err(|_| PersistenceError::Corrupt {
            reason: format!("'{}' is not a number", raw.trim()),
        })?;
        if !value.is_finite() {
            return Err(PersistenceError::Corrupt {
                reason: format!("'{value}' is not a finite timestamp"),
            });
        }
        Ok(Some(value))
    }

    async fn store(&self, timestamp: f64) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
            }
        }
        // Write to temporary file first, then rename (atomic operation)
        let temp = self.path.with_extension("tmp");
        fs::write(&temp, format!("{timestamp:.3}"))
            .await
            .map_err(|e| self.io_error(e))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

/// Suppresses triggers for a fixed window after each run
#[derive(Clone)]
pub struct CooldownGuard {
    store: Arc<dyn MarkerStore>,
    window: Duration,
}

impl CooldownGuard {
    pub fn new(store: Arc<dyn MarkerStore>, window: Duration) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Time since the last mark, or `None` when there is no usable marker
    async fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        let marker = match self.store.load().await {
            Ok(Some(marker)) => marker,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Cooldown marker unreadable, treating as expired");
                return None;
            }
        };
        let elapsed = unix_seconds(now) - marker;
        if elapsed < 0.0 {
            warn!(marker, "Cooldown marker lies in the future, treating as expired");
            return None;
        }
        match Duration::try_from_secs_f64(elapsed) {
            Ok(elapsed) => Some(elapsed),
            Err(_) => {
                warn!(marker, "Cooldown marker out of range, treating as expired");
                None
            }
        }
    }

    /// True iff the last mark is less than one window ago
    pub async fn within_cooldown(&self, now: DateTime<Utc>) -> bool {
        matches!(self.elapsed(now).await, Some(elapsed) if elapsed < self.window)
    }

    /// Rest of the current window, if one is open
    pub async fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let elapsed = self.elapsed(now).await?;
        self.window.checked_sub(elapsed).filter(|rest| !rest.is_zero())
    }

    /// Record a finished run. Failures are logged and swallowed.
    pub async fn mark(&self, now: DateTime<Utc>) {
        match self.store.store(unix_seconds(now)).await {
            Ok(()) => debug!(at = %now, window_secs = self.window.as_secs(), "Cooldown marked"),
            Err(e) => warn!(error = %e, "Failed to persist cooldown marker"),
        }
    }

    pub async fn reset(&self) -> Result<(), PersistenceError> {
        self.store.clear().await?;
        info!("Cooldown marker cleared");
        Ok(())
    }
}
