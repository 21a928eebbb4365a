//! GPIO line access
//!
//! The installation only needs three boolean lines, so the backend is a small
//! trait with a Linux sysfs implementation behind it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("GPIO line {line} is not accessible: {message}")]
    LineUnavailable { line: u32, message: String },
    #[error("GPIO line {line} was not claimed as {expected}")]
    NotClaimed { line: u32, expected: Direction },
    #[error("GPIO line {line} returned unexpected value '{raw}'")]
    BadValue { line: u32, raw: String },
    #[error("IO error on GPIO line {line}: {source}")]
    Io {
        line: u32,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Raw boolean line access. Levels are electrical: `true` means high.
pub trait GpioBackend: Send + Sync {
    /// Claim a line as input
    fn claim_input(&self, line: u32) -> Result<(), HardwareError>;

    /// Claim a line as output, driven low
    fn claim_output(&self, line: u32) -> Result<(), HardwareError>;

    fn read(&self, line: u32) -> Result<bool, HardwareError>;

    fn write(&self, line: u32, high: bool) -> Result<(), HardwareError>;

    /// Drive outputs low and give every claimed line back to the kernel
    fn release(&self) -> Result<(), HardwareError>;
}

/// sysfs backend (`/sys/class/gpio`)
pub struct SysfsGpio {
    root: PathBuf,
    chip_base: u32,
    claimed: Mutex<BTreeMap<u32, Direction>>,
}

impl SysfsGpio {
    pub fn new(root: impl Into<PathBuf>, chip_base: u32) -> Self {
        Self {
            root: root.into(),
            chip_base,
            claimed: Mutex::new(BTreeMap::new()),
        }
    }

    fn kernel_number(&self, line: u32) -> u32 {
        self.chip_base + line
    }

    fn line_dir(&self, line: u32) -> PathBuf {
        self.root.join(format!("gpio{}", self.kernel_number(line)))
    }

    fn write_attr(&self, line: u32, path: &Path, value: &str) -> Result<(), HardwareError> {
        std::fs::write(path, value).map_err(|source| HardwareError::Io { line, source })
    }

    fn export(&self, line: u32) -> Result<(), HardwareError> {
        let dir = self.line_dir(line);
        if dir.exists() {
            debug!(line, path = ?dir, "GPIO line already exported");
            return Ok(());
        }
        let export = self.root.join("export");
        std::fs::write(&export, self.kernel_number(line).to_string()).map_err(|e| {
            HardwareError::LineUnavailable {
                line,
                message: format!("export via {} failed: {}", export.display(), e),
            }
        })?;

        // udev needs a moment to fix up permissions on the new line directory
        for _ in 0..20 {
            if dir.join("direction").exists() {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Err(HardwareError::LineUnavailable {
            line,
            message: format!("{} did not appear after export", dir.display()),
        })
    }

    fn claim(&self, line: u32, direction: Direction) -> Result<(), HardwareError> {
        self.export(line)?;
        let value = match direction {
            Direction::Input => "in",
            // "low" configures the line as output and drives it low in one write
            Direction::Output => "low",
        };
        self.write_attr(line, &self.line_dir(line).join("direction"), value)?;
        self.claimed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(line, direction);
        info!(line, kernel_line = self.kernel_number(line), %direction, "GPIO line claimed");
        Ok(())
    }

    fn ensure_claimed(&self, line: u32, expected: Direction) -> Result<(), HardwareError> {
        let claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        match claimed.get(&line) {
            Some(direction) if *direction == expected => Ok(()),
            _ => Err(HardwareError::NotClaimed { line, expected }),
        }
    }
}

impl GpioBackend for SysfsGpio {
    fn claim_input(&self, line: u32) -> Result<(), HardwareError> {
        self.claim(line, Direction::Input)
    }

    fn claim_output(&self, line: u32) -> Result<(), HardwareError> {
        self.claim(line, Direction::Output)
    }

    fn read(&self, line: u32) -> Result<bool, HardwareError> {
        self.ensure_claimed(line, Direction::Input)?;
        let raw = std::fs::read_to_string(self.line_dir(line).join("value"))
            .map_err(|source| HardwareError::Io { line, source })?;
        match raw.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(HardwareError::BadValue {
                line,
                raw: other.to_string(),
            }),
        }
    }

    fn write(&self, line: u32, high: bool) -> Result<(), HardwareError> {
        self.ensure_claimed(line, Direction::Output)?;
        self.write_attr(
            line,
            &self.line_dir(line).join("value"),
            if high { "1" } else { "0" },
        )
    }

    fn release(&self) -> Result<(), HardwareError> {
        let claimed: Vec<(u32, Direction)> = {
            let mut guard = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard).into_iter().collect()
        };

        let mut first_error = None;
        for (line, direction) in claimed {
            if direction == Direction::Output {
                if let Err(e) = self.write_attr(line, &self.line_dir(line).join("value"), "0") {
                    warn!(line, error = %e, "Failed to drive output low during release");
                    first_error.get_or_insert(e);
                }
            }
            let unexport = self.root.join("unexport");
            if let Err(e) = self.write_attr(line, &unexport, &self.kernel_number(line).to_string()) {
                warn!(line, error = %e, "Failed to unexport GPIO line");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("GPIO lines released");
                Ok(())
            }
        }
    }
}
