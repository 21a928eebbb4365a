//! Hardware lines of the installation: motion sensor, hook switch and spotlight.

pub mod gpio;
pub mod sensor;

use std::sync::Arc;

pub use gpio::{GpioBackend, HardwareError, SysfsGpio};
pub use sensor::{Indicator, InputLine, SensorGate};

use crate::config::GpioConfig;

/// Claims every line the installation uses
pub fn open_lines(
    backend: Arc<dyn GpioBackend>,
    config: &GpioConfig,
) -> Result<(SensorGate, Indicator), HardwareError> {
    let line = |pin, active_low| InputLine { pin, active_low };
    let sensors = SensorGate::new(
        backend.clone(),
        line(config.motion_pin, config.motion_active_low),
        line(config.hook_pin, config.hook_active_low),
    )?;
    let indicator = Indicator::new(backend, config.light_pin)?;
    Ok((sensors, indicator))
}
