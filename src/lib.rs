// Oracle Phone - motion-triggered telephone installation
// This exposes the core components for testing and integration

pub mod audio;
pub mod call;
pub mod cli;
pub mod config;
pub mod cooldown;
pub mod dialogue;
pub mod hardware;
pub mod installation;
pub mod lock;
pub mod shutdown;
pub mod telemetry;
pub mod workflow;

#[cfg(test)]
pub mod mocks;

// Re-export key types for easy access
pub use audio::{AudioPlayer, CommandAudioPlayer, PlaybackError};
pub use call::{
    CallSession, CallSessionFactory, CallState, CallTransport, CommandCallTransport,
    SessionError, SimulatedCallTransport, StopOutcome, TransportError,
};
pub use config::OraclePhoneConfig;
pub use cooldown::{CooldownGuard, FileMarkerStore, MarkerStore, PersistenceError};
pub use dialogue::{DialogueEngine, DialogueOutcome, DialogueReport, DialogueSequence};
pub use hardware::{GpioBackend, HardwareError, Indicator, SensorGate, SysfsGpio};
pub use installation::Installation;
pub use lock::InstanceLock;
pub use shutdown::ShutdownCoordinator;
pub use telemetry::{create_workflow_span, generate_run_id, init_telemetry, shutdown_telemetry};
pub use workflow::{RunOutcome, TriggerOutcome, WorkflowController, WorkflowPhase, WorkflowRun};
