//! Wiring: turns configuration into the collaborators the workflow needs.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::audio::CommandAudioPlayer;
use crate::call::{CallSessionFactory, CallTransport, CommandCallTransport, SimulatedCallTransport};
use crate::config::OraclePhoneConfig;
use crate::cooldown::{CooldownGuard, FileMarkerStore};
use crate::dialogue::{DialogueEngine, DialogueSequence};
use crate::hardware::{self, GpioBackend, HardwareError, Indicator, SensorGate, SysfsGpio};
use crate::workflow::{WorkflowController, WorkflowSettings};

pub struct Installation {
    config: OraclePhoneConfig,
    simulate_call: bool,
}

impl Installation {
    pub fn new(config: OraclePhoneConfig, simulate_call: bool) -> Self {
        Self {
            config,
            simulate_call,
        }
    }

    pub fn config(&self) -> &OraclePhoneConfig {
        &self.config
    }

    /// Claim the GPIO lines. A failure here means the installation cannot run.
    pub fn open_hardware(&self) -> Result<(SensorGate, Indicator), HardwareError> {
        let gpio = &self.config.gpio;
        let backend: Arc<dyn GpioBackend> =
            Arc::new(SysfsGpio::new(&gpio.sysfs_root, gpio.chip_base));
        hardware::open_lines(backend, gpio)
    }

    pub fn call_factory(&self) -> CallSessionFactory {
        let call = &self.config.call;
        let transport: Arc<dyn CallTransport> = if self.simulate_call {
            info!("Using simulated call transport");
            Arc::new(SimulatedCallTransport::new())
        } else {
            Arc::new(CommandCallTransport::new(&call.dialer, call.dialer_args.clone()))
        };
        CallSessionFactory::new(transport, &call.target)
    }

    pub fn cooldown_guard(&self) -> CooldownGuard {
        let cooldown = &self.config.cooldown;
        CooldownGuard::new(
            Arc::new(FileMarkerStore::new(&cooldown.marker_path)),
            cooldown.window(),
        )
    }

    pub fn dialogue_engine(&self) -> DialogueEngine {
        DialogueEngine::new(
            Arc::new(CommandAudioPlayer::from_config(&self.config.audio)),
            Duration::from_millis(self.config.dialogue.pause_poll_interval_ms),
        )
    }

    pub fn sequence(&self) -> DialogueSequence {
        DialogueSequence::oracle(&self.config.dialogue)
    }

    pub fn build_controller(&self) -> Result<WorkflowController, HardwareError> {
        let (sensors, indicator) = self.open_hardware()?;
        Ok(WorkflowController::new(
            WorkflowSettings::from(&self.config.timing),
            sensors,
            indicator,
            self.call_factory(),
            self.dialogue_engine(),
            self.sequence(),
            self.cooldown_guard(),
        ))
    }
}
