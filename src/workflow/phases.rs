use serde::{Deserialize, Serialize};
use statig::prelude::*;

/// Events the controller feeds into the phase machine as a run progresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    Triggered { run_id: String },
    DelayElapsed,
    PickedUp,
    /// Ring timeout or a session that could not be placed
    Unanswered,
    DialogueFinished { aborted: bool },
    HandsetSettled,
}

/// Public view of where the controller is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowPhase {
    Armed,
    SuspenseDelay,
    Ringing,
    Dialogue,
    CooldownWait,
}

#[derive(Debug, Default)]
pub struct WorkflowPhases {
    pub run_id: Option<String>,
    pub runs_started: u64,
    pub runs_answered: u64,
}

#[state_machine(initial = "State::armed()", state(derive(Debug, Clone, PartialEq, Eq)))]
impl WorkflowPhases {
    #[state]
    fn armed(&mut self, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::Triggered { run_id } => {
                self.run_id = Some(run_id.clone());
                self.runs_started += 1;
                tracing::info!(run_id = %run_id, runs_started = self.runs_started, "Trigger accepted");
                Transition(State::suspense_delay())
            }
            _ => self.ignore("armed", event),
        }
    }

    #[state]
    fn suspense_delay(&mut self, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::DelayElapsed => {
                tracing::info!(run_id = ?self.run_id, "Suspense over, ringing");
                Transition(State::ringing())
            }
            _ => self.ignore("suspense_delay", event),
        }
    }

    #[state]
    fn ringing(&mut self, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::PickedUp => {
                self.runs_answered += 1;
                tracing::info!(run_id = ?self.run_id, "Handset lifted");
                Transition(State::dialogue())
            }
            WorkflowEvent::Unanswered => {
                tracing::info!(run_id = ?self.run_id, "Nobody answered, re-arming after cooldown");
                self.run_id = None;
                Transition(State::armed())
            }
            _ => self.ignore("ringing", event),
        }
    }

    #[state]
    fn dialogue(&mut self, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::DialogueFinished { aborted } => {
                tracing::info!(run_id = ?self.run_id, aborted, "Dialogue finished");
                Transition(State::cooldown_wait())
            }
            _ => self.ignore("dialogue", event),
        }
    }

    #[state]
    fn cooldown_wait(&mut self, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::HandsetSettled => {
                tracing::info!(run_id = ?self.run_id, "Run finished, armed again");
                self.run_id = None;
                Transition(State::armed())
            }
            _ => self.ignore("cooldown_wait", event),
        }
    }
}

impl WorkflowPhases {
    fn ignore(&self, phase: &'static str, event: &WorkflowEvent) -> Outcome<State> {
        tracing::warn!(phase, event = ?event, "Event not valid in this phase, ignored");
        Handled
    }
}

/// Map the generated state onto the public phase enum
pub fn phase_of(state: &State) -> WorkflowPhase {
    match state {
        State::Armed { .. } => WorkflowPhase::Armed,
        State::SuspenseDelay { .. } => WorkflowPhase::SuspenseDelay,
        State::Ringing { .. } => WorkflowPhase::Ringing,
        State::Dialogue { .. } => WorkflowPhase::Dialogue,
        State::CooldownWait { .. } => WorkflowPhase::CooldownWait,
    }
}
