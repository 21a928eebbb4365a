//! Scripted dialogue played to whoever picks up the handset.

pub mod engine;
pub mod steps;

pub use engine::{DialogueEngine, DialogueOutcome, DialogueReport, PlaybackFailure};
pub use steps::{Artifact, DialogueSequence, DialogueStep, Pause, StepAudio};
