use std::sync::Arc;

use tracing::warn;

use super::gpio::{GpioBackend, HardwareError};

/// Logical view of one input line: which pin, and which level means "active".
#[derive(Debug, Clone, Copy)]
pub struct InputLine {
    pub pin: u32,
    pub active_low: bool,
}

impl InputLine {
    pub fn active_high(pin: u32) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    pub fn active_low(pin: u32) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    fn is_active(&self, level: bool) -> bool {
        level != self.active_low
    }
}

/// Samples the motion trigger and the hook switch.
///
/// Reads carry no state and no filtering; callers own poll cadence and debounce.
#[derive(Clone)]
pub struct SensorGate {
    backend: Arc<dyn GpioBackend>,
    trigger: InputLine,
    hook: InputLine,
}

impl SensorGate {
    /// Claims both input lines. Failure here is fatal for the installation.
    pub fn new(
        backend: Arc<dyn GpioBackend>,
        trigger: InputLine,
        hook: InputLine,
    ) -> Result<Self, HardwareError> {
        backend.claim_input(trigger.pin)?;
        backend.claim_input(hook.pin)?;
        Ok(Self {
            backend,
            trigger,
            hook,
        })
    }

    /// True while the motion sensor reports activity
    pub fn sample_trigger(&self) -> bool {
        self.sample(self.trigger, "trigger")
    }

    /// True while the handset is lifted
    pub fn sample_hook(&self) -> bool {
        self.sample(self.hook, "hook")
    }

    fn sample(&self, line: InputLine, name: &'static str) -> bool {
        match self.backend.read(line.pin) {
            Ok(level) => line.is_active(level),
            Err(e) => {
                warn!(line = name, pin = line.pin, error = %e, "Input read failed, sampling as inactive");
                false
            }
        }
    }
}

/// The spotlight relay
#[derive(Clone)]
pub struct Indicator {
    backend: Arc<dyn GpioBackend>,
    pin: u32,
}

impl Indicator {
    pub fn new(backend: Arc<dyn GpioBackend>, pin: u32) -> Result<Self, HardwareError> {
        backend.claim_output(pin)?;
        Ok(Self { backend, pin })
    }

    pub fn on(&self) {
        self.set(true);
    }

    pub fn off(&self) {
        self.set(false);
    }

    /// Output failures are logged; a dark spotlight never stops a run
    fn set(&self, lit: bool) {
        if let Err(e) = self.backend.write(self.pin, lit) {
            warn!(pin = self.pin, lit, error = %e, "Failed to switch indicator");
        }
    }

    /// Switch off and hand every claimed line back
    pub fn release_lines(&self) -> Result<(), HardwareError> {
        self.off();
        self.backend.release()
    }
}
