//! Bell call sessions
//!
//! The installation rings its mechanical bells by placing an internal call.
//! The SIP side is delegated to an external dialer; this module only
//! sequences start, observe and stop around it.

pub mod command;
pub mod session;
pub mod simulated;

pub use command::CommandCallTransport;
pub use session::{
    CallId, CallSession, CallSessionFactory, CallState, CallTransport, SessionError, StopOutcome,
    TransportError,
};
pub use simulated::SimulatedCallTransport;
