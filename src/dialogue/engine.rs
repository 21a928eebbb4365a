use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::steps::{Artifact, DialogueSequence, DialogueStep, Pause, StepAudio};
use crate::audio::{AudioPlayer, PlaybackError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueOutcome {
    Completed,
    /// `should_continue` turned false; `before_step` never started
    Aborted { before_step: usize, step: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackFailure {
    pub step: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueReport {
    pub outcome: DialogueOutcome,
    /// Names of the steps that were started, in order
    pub started: Vec<String>,
    pub failures: Vec<PlaybackFailure>,
    /// Labels of labelled artifacts that were played
    pub labels: Vec<String>,
}

impl DialogueReport {
    fn new() -> Self {
        Self {
            outcome: DialogueOutcome::Completed,
            started: Vec::new(),
            failures: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, DialogueOutcome::Aborted { .. })
    }
}

/// Plays a dialogue sequence step by step.
///
/// The continuation predicate is checked before every step. Playback of an
/// artifact is never interrupted; a step that has started runs to its end,
/// only its trailing pause is cut short.
pub struct DialogueEngine {
    player: Arc<dyn AudioPlayer>,
    rng: Mutex<StdRng>,
    pause_poll: Duration,
}

impl DialogueEngine {
    pub fn new(player: Arc<dyn AudioPlayer>, pause_poll: Duration) -> Self {
        Self::with_rng(player, pause_poll, StdRng::from_os_rng())
    }

    pub fn with_rng(player: Arc<dyn AudioPlayer>, pause_poll: Duration, rng: StdRng) -> Self {
        Self {
            player,
            rng: Mutex::new(rng),
            pause_poll,
        }
    }

    pub async fn run<F>(&self, sequence: &DialogueSequence, mut should_continue: F) -> DialogueReport
    where
        F: FnMut() -> bool + Send,
    {
        let mut report = DialogueReport::new();

        for (index, step) in sequence.steps().iter().enumerate() {
            if !should_continue() {
                info!(before_step = index, step = step.name(), "Dialogue aborted, caller hung up");
                report.outcome = DialogueOutcome::Aborted {
                    before_step: index,
                    step: step.name().to_string(),
                };
                return report;
            }

            debug!(index, step = step.name(), "Dialogue step started");
            report.started.push(step.name().to_string());

            for artifact in self.pick(step) {
                if let Some(label) = &artifact.label {
                    info!(step = step.name(), label = %label, "Playing labelled artifact");
                    report.labels.push(label.clone());
                }
                if let Err(e) = self.player.play(&artifact.file).await {
                    self.record_failure(&mut report, step, e);
                }
            }

            if let Some(pause) = step.pause() {
                let duration = self.pause_length(pause);
                self.wait_out(duration, &mut should_continue).await;
            }
        }

        info!(steps = report.started.len(), failures = report.failures.len(), "Dialogue completed");
        report
    }

    fn record_failure(&self, report: &mut DialogueReport, step: &DialogueStep, error: PlaybackError) {
        warn!(step = step.name(), error = %error, "Playback failed, continuing with next artifact");
        report.failures.push(PlaybackFailure {
            step: step.name().to_string(),
            error: error.to_string(),
        });
    }

    fn pick(&self, step: &DialogueStep) -> Vec<Artifact> {
        match step.audio() {
            StepAudio::Single(artifact) => vec![artifact.clone()],
            StepAudio::All(artifacts) => artifacts.clone(),
            StepAudio::OneOf(artifacts) => {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                artifacts.choose(&mut *rng).cloned().into_iter().collect()
            }
        }
    }

    fn pause_length(&self, pause: Pause) -> Duration {
        match pause {
            Pause::Fixed(duration) => duration,
            Pause::Between { min, max } if min >= max => min,
            Pause::Between { min, max } => {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                let millis = rng.random_range(min.as_millis() as u64..=max.as_millis() as u64);
                Duration::from_millis(millis)
            }
        }
    }

    /// Sleep until the deadline, returning early once the caller is gone
    async fn wait_out<F>(&self, duration: Duration, should_continue: &mut F)
    where
        F: FnMut() -> bool + Send,
    {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            if !should_continue() {
                return;
            }
            let left = deadline.saturating_duration_since(Instant::now());
            sleep(left.min(self.pause_poll)).await;
        }
    }
}
