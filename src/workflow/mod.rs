// Workflow Module - trigger → suspense → ring → dialogue → cooldown
//
// The controller owns the sequencing; the phase machine keeps the bookkeeping
// honest and rejects events that make no sense in the current phase.

pub mod controller;
pub mod phases;
pub mod run;


pub use controller::{TriggerOutcome, WorkflowController, WorkflowSettings};
pub use phases::{WorkflowEvent, WorkflowPhase, WorkflowPhases};
pub use run::{RunOutcome, WorkflowRun};
