use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dialogue::{DialogueOutcome, DialogueReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The bell call could not be placed
    SessionFailed { reason: String },
    /// Nobody lifted the handset before the ring timeout
    Unanswered,
    Completed,
    /// The caller hung up; `before_step` never started
    HungUp { before_step: usize },
}

/// Summary of one trigger→dialogue→cooldown cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub run_id: String,
    pub triggered_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub suspense_ms: u64,
    pub outcome: RunOutcome,
    pub steps_started: Vec<String>,
    pub playback_failures: usize,
    pub point_of_interest: Option<String>,
}

impl WorkflowRun {
    pub fn new(run_id: String, triggered_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            triggered_at,
            finished_at: None,
            suspense_ms: 0,
            outcome: RunOutcome::Unanswered,
            steps_started: Vec::new(),
            playback_failures: 0,
            point_of_interest: None,
        }
    }

    pub fn was_answered(&self) -> bool {
        matches!(
            self.outcome,
            RunOutcome::Completed | RunOutcome::HungUp { .. }
        )
    }

    pub fn absorb_dialogue(&mut self, report: DialogueReport) {
        self.outcome = match report.outcome {
            DialogueOutcome::Completed => RunOutcome::Completed,
            DialogueOutcome::Aborted { before_step, .. } => RunOutcome::HungUp { before_step },
        };
        self.playback_failures = report.failures.len();
        self.point_of_interest = report.labels.last().cloned();
        self.steps_started = report.started;
    }

    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.finished_at = Some(at);
    }
}
