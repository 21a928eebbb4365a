use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statig::prelude::*;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn, Instrument};

use super::phases::{phase_of, WorkflowEvent, WorkflowPhase, WorkflowPhases};
use super::run::{RunOutcome, WorkflowRun};
use crate::call::{CallSession, CallSessionFactory, CallState};
use crate::config::TimingConfig;
use crate::cooldown::CooldownGuard;
use crate::dialogue::{DialogueEngine, DialogueSequence};
use crate::hardware::{Indicator, SensorGate};
use crate::telemetry::{create_workflow_span, generate_run_id};

/// Timing the controller runs with
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub suspense_min: Duration,
    pub suspense_max: Duration,
    pub ring_timeout: Duration,
    pub handset_wait: Duration,
    pub poll_interval: Duration,
    pub cooldown_poll_interval: Duration,
    pub handset_poll_interval: Duration,
    pub confirm_samples: u32,
}

impl From<&TimingConfig> for WorkflowSettings {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            suspense_min: Duration::from_millis(timing.suspense_min_ms),
            suspense_max: Duration::from_millis(timing.suspense_max_ms),
            ring_timeout: timing.ring_timeout(),
            handset_wait: timing.handset_wait(),
            poll_interval: timing.poll_interval(),
            cooldown_poll_interval: timing.cooldown_poll_interval(),
            handset_poll_interval: timing.handset_poll_interval(),
            confirm_samples: timing.confirm_samples.max(1),
        }
    }
}

#[derive(Debug)]
pub enum TriggerOutcome {
    Completed(WorkflowRun),
    /// The cooldown window is still open
    CoolingDown,
    /// Another run is active
    Busy,
}

/// How the ring phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pickup {
    Lifted,
    TimedOut,
    /// The bell call ended on its own, e.g. the dialer was rejected
    CallDropped,
}

/// Arbitrates between the sensors, the bell call and the dialogue.
///
/// Runs are strictly sequential: the run lock is held from trigger to
/// re-arming, and a trigger that finds it taken is dropped.
pub struct WorkflowController {
    settings: WorkflowSettings,
    sensors: SensorGate,
    indicator: Indicator,
    calls: CallSessionFactory,
    dialogue: DialogueEngine,
    sequence: DialogueSequence,
    cooldown: CooldownGuard,
    phases: Mutex<StateMachine<WorkflowPhases>>,
    run_lock: tokio::sync::Mutex<()>,
    rng: Mutex<StdRng>,
}

impl WorkflowController {
    pub fn new(
        settings: WorkflowSettings,
        sensors: SensorGate,
        indicator: Indicator,
        calls: CallSessionFactory,
        dialogue: DialogueEngine,
        sequence: DialogueSequence,
        cooldown: CooldownGuard,
    ) -> Self {
        Self {
            settings,
            sensors,
            indicator,
            calls,
            dialogue,
            sequence,
            cooldown,
            phases: Mutex::new(WorkflowPhases::default().state_machine()),
            run_lock: tokio::sync::Mutex::new(()),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_rng(self, rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            ..self
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        let phases = self.phases.lock().unwrap_or_else(|e| e.into_inner());
        phase_of(phases.state())
    }

    pub fn calls(&self) -> &CallSessionFactory {
        &self.calls
    }

    pub fn indicator(&self) -> &Indicator {
        &self.indicator
    }

    fn advance(&self, event: WorkflowEvent) {
        let mut phases = self.phases.lock().unwrap_or_else(|e| e.into_inner());
        phases.handle(&event);
    }

    /// Idle poll loop. Returns once `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            ring_timeout_ms = self.settings.ring_timeout.as_millis() as u64,
            cooldown_secs = self.cooldown.window().as_secs(),
            "Oracle phone armed"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let pause = if self.cooldown.within_cooldown(Utc::now()).await {
                self.settings.cooldown_poll_interval
            } else if self.confirmed(|| self.sensors.sample_trigger()).await {
                match self.handle_trigger().await {
                    TriggerOutcome::Completed(run) => {
                        debug!(run_id = %run.run_id, outcome = ?run.outcome, "Back to idle polling")
                    }
                    TriggerOutcome::CoolingDown => debug!("Trigger ignored, cooling down"),
                    TriggerOutcome::Busy => debug!("Trigger ignored, run in progress"),
                }
                continue;
            } else {
                self.settings.poll_interval
            };

            tokio::select! {
                _ = sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Oracle phone disarmed");
    }

    /// Start a run for a trigger, unless one is active or cooldown applies
    pub async fn handle_trigger(&self) -> TriggerOutcome {
        let Ok(_active) = self.run_lock.try_lock() else {
            return TriggerOutcome::Busy;
        };
        if self.cooldown.within_cooldown(Utc::now()).await {
            return TriggerOutcome::CoolingDown;
        }

        let run_id = generate_run_id();
        let span = create_workflow_span(&run_id);
        TriggerOutcome::Completed(self.run_once(run_id).instrument(span).await)
    }

    async fn run_once(&self, run_id: String) -> WorkflowRun {
        let mut run = WorkflowRun::new(run_id.clone(), Utc::now());
        self.advance(WorkflowEvent::Triggered { run_id });

        let suspense = self.suspense_delay();
        run.suspense_ms = suspense.as_millis() as u64;
        debug!(suspense_ms = run.suspense_ms, "Suspense delay");
        sleep(suspense).await;
        self.advance(WorkflowEvent::DelayElapsed);

        self.indicator.on();
        let mut session = match self.calls.start().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Bell call failed, treating trigger as unanswered");
                run.outcome = RunOutcome::SessionFailed {
                    reason: e.to_string(),
                };
                self.indicator.off();
                self.cooldown.mark(Utc::now()).await;
                self.advance(WorkflowEvent::Unanswered);
                return self.finish(run);
            }
        };

        let missed = match self.wait_for_pickup(&session).await {
            Pickup::Lifted => None,
            Pickup::TimedOut => {
                let stopped = self.calls.stop(&mut session).await;
                info!(?stopped, "Ring timeout, nobody picked up");
                Some(RunOutcome::Unanswered)
            }
            Pickup::CallDropped => {
                let stopped = self.calls.stop(&mut session).await;
                warn!(?stopped, "Bell call ended before pickup");
                Some(RunOutcome::SessionFailed {
                    reason: "call ended before pickup".to_string(),
                })
            }
        };
        if let Some(outcome) = missed {
            self.indicator.off();
            self.cooldown.mark(Utc::now()).await;
            self.advance(WorkflowEvent::Unanswered);
            run.outcome = outcome;
            return self.finish(run);
        }

        let silenced = self.calls.answer(&mut session).await;
        debug!(?silenced, "Bells silenced, spotlight stays on");
        self.advance(WorkflowEvent::PickedUp);

        let report = self
            .dialogue
            .run(&self.sequence, || self.caller_present(&session))
            .await;
        self.calls.stop(&mut session).await;
        self.advance(WorkflowEvent::DialogueFinished {
            aborted: report.is_aborted(),
        });
        run.absorb_dialogue(report);

        self.cooldown.mark(Utc::now()).await;
        self.indicator.off();
        if !self.wait_for_handset_replaced().await {
            warn!(
                waited_ms = self.settings.handset_wait.as_millis() as u64,
                "Handset still off hook, re-arming anyway"
            );
        }
        self.advance(WorkflowEvent::HandsetSettled);

        self.finish(run)
    }

    fn finish(&self, mut run: WorkflowRun) -> WorkflowRun {
        run.finish(Utc::now());
        match serde_json::to_string(&run) {
            Ok(record) => info!(record = %record, "Workflow run finished"),
            Err(e) => warn!(error = %e, "Failed to serialize run record"),
        }
        run
    }

    /// The dialogue continues only while the session is answered and the handset is up
    fn caller_present(&self, session: &CallSession) -> bool {
        self.calls.state(session) == CallState::Answered && self.sensors.sample_hook()
    }

    fn suspense_delay(&self) -> Duration {
        let min = self.settings.suspense_min.as_millis() as u64;
        let max = self.settings.suspense_max.as_millis() as u64;
        if min >= max {
            return Duration::from_millis(min);
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Duration::from_millis(rng.random_range(min..=max))
    }

    /// A reading only counts once it has held for `confirm_samples` polls
    async fn confirmed<F>(&self, sample: F) -> bool
    where
        F: Fn() -> bool,
    {
        if !sample() {
            return false;
        }
        for _ in 1..self.settings.confirm_samples {
            sleep(self.settings.poll_interval).await;
            if !sample() {
                return false;
            }
        }
        true
    }

    async fn wait_for_pickup(&self, session: &CallSession) -> Pickup {
        let deadline = Instant::now() + self.settings.ring_timeout;
        while Instant::now() < deadline {
            if self.confirmed(|| self.sensors.sample_hook()).await {
                return Pickup::Lifted;
            }
            if self.calls.state(session) == CallState::Ended {
                return Pickup::CallDropped;
            }
            sleep(self.settings.poll_interval).await;
        }
        Pickup::TimedOut
    }

    async fn wait_for_handset_replaced(&self) -> bool {
        let deadline = Instant::now() + self.settings.handset_wait;
        while self.sensors.sample_hook() {
            if Instant::now() >= deadline {
                return false;
            }
            sleep(self.settings.handset_poll_interval).await;
        }
        true
    }
}
