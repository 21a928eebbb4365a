//! Blocking audio playback through an external player.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::config::AudioConfig;

#[derive(Debug, Error, Clone)]
pub enum PlaybackError {
    #[error("Audio artifact not found: {path}")]
    MissingArtifact { path: PathBuf },
    #[error("Audio player not found: {program}")]
    PlayerNotFound { program: String },
    #[error("Player exited with status {status_code} for {path}: {stderr}")]
    PlayerFailed {
        path: PathBuf,
        status_code: i32,
        stderr: String,
    },
    #[error("IO error while playing {path}: {message}")]
    Io { path: PathBuf, message: String },
}

/// Plays one artifact and returns once playback has finished or failed
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, artifact: &Path) -> Result<(), PlaybackError>;
}

/// `aplay`-style player invoked as `<program> [-D <device>] <file>`
pub struct CommandAudioPlayer {
    program: String,
    device: Option<String>,
    audio_dir: PathBuf,
}

impl CommandAudioPlayer {
    pub fn new(program: impl Into<String>, device: Option<String>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            device,
            audio_dir: audio_dir.into(),
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(&config.player, config.device.clone(), &config.audio_dir)
    }

    /// Bare names resolve against the audio directory
    pub fn resolve(&self, artifact: &Path) -> PathBuf {
        if artifact.is_absolute() {
            artifact.to_path_buf()
        } else {
            self.audio_dir.join(artifact)
        }
    }

    fn args(&self, path: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(device) = &self.device {
            args.push("-D".to_string());
            args.push(device.clone());
        }
        args.push(path.to_string_lossy().to_string());
        args
    }
}

#[async_trait]
impl AudioPlayer for CommandAudioPlayer {
    async fn play(&self, artifact: &Path) -> Result<(), PlaybackError> {
        let path = self.resolve(artifact);
        if !path.is_file() {
            return Err(PlaybackError::MissingArtifact { path });
        }

        debug!(path = ?path, program = %self.program, "Playing artifact");
        let output = Command::new(&self.program)
            .args(self.args(&path))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PlaybackError::PlayerNotFound {
                        program: self.program.clone(),
                    }
                } else {
                    PlaybackError::Io {
                        path: path.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(PlaybackError::PlayerFailed {
                path,
                status_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
