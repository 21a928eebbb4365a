use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallState {
    Idle,
    Calling,
    Ringing,
    Answered,
    Ended,
}

impl CallState {
    /// States a hang-up can still act on
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            CallState::Calling | CallState::Ringing | CallState::Answered
        )
    }
}

/// Transport-level handle for one dialled call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub u64);

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "call-{}", self.0)
    }
}

#[derive(Debug, Error, Clone)]
pub enum TransportError {
    #[error("Call subsystem unreachable: {message}")]
    Unreachable { message: String },
    #[error("Call {id} is not in a state that allows {operation}")]
    InvalidState { id: CallId, operation: String },
    #[error("Call subsystem fault: {message}")]
    Fault { message: String },
}

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("Failed to place call to {target}: {source}")]
    Transport {
        target: String,
        #[source]
        source: TransportError,
    },
    #[error("A call session is already live ({id})")]
    AlreadyActive { id: CallId },
}

/// What a stop request actually did
#[derive(Debug, Clone)]
pub enum StopOutcome {
    HungUp,
    /// The call had already ended; nothing to do
    AlreadyEnded,
    /// The session never placed a call
    NotStarted,
    /// The transport failed while hanging up; the session is considered ended
    Faulted(TransportError),
}

/// The opaque "place call, observe, hang up" capability of the call subsystem
#[async_trait]
pub trait CallTransport: Send + Sync {
    async fn dial(&self, target: &str) -> Result<CallId, TransportError>;

    fn state(&self, id: CallId) -> CallState;

    /// Returns `InvalidState` when the call is not in a stoppable state
    async fn hangup(&self, id: CallId) -> Result<(), TransportError>;

    /// Hang up everything still open; used on process shutdown
    async fn shutdown(&self);
}

/// One bell call, owned by the workflow run that placed it
#[derive(Debug)]
pub struct CallSession {
    id: Option<CallId>,
    target: String,
    answered: bool,
    ended: bool,
}

impl CallSession {
    /// A session that never placed a call
    pub fn unstarted(target: impl Into<String>) -> Self {
        Self {
            id: None,
            target: target.into(),
            answered: false,
            ended: false,
        }
    }

    pub fn id(&self) -> Option<CallId> {
        self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Places bell calls through a transport and keeps at most one of them live
pub struct CallSessionFactory {
    transport: Arc<dyn CallTransport>,
    target: String,
    live: Mutex<Option<CallId>>,
}

impl CallSessionFactory {
    pub fn new(transport: Arc<dyn CallTransport>, target: impl Into<String>) -> Self {
        Self {
            transport,
            target: target.into(),
            live: Mutex::new(None),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn live_slot(&self) -> std::sync::MutexGuard<'_, Option<CallId>> {
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn release_slot(&self, id: CallId) {
        let mut live = self.live_slot();
        if *live == Some(id) {
            *live = None;
        }
    }

    /// Dial the bell target
    pub async fn start(&self) -> Result<CallSession, SessionError> {
        let live = *self.live_slot();
        if let Some(id) = live {
            if self.transport.state(id).is_live() {
                return Err(SessionError::AlreadyActive { id });
            }
        }

        let id = self
            .transport
            .dial(&self.target)
            .await
            .map_err(|source| SessionError::Transport {
                target: self.target.clone(),
                source,
            })?;
        *self.live_slot() = Some(id);
        info!(call = %id, target = %self.target, "Bell call placed");

        Ok(CallSession {
            id: Some(id),
            target: self.target.clone(),
            answered: false,
            ended: false,
        })
    }

    /// Non-blocking state read
    pub fn state(&self, session: &CallSession) -> CallState {
        if session.ended {
            return CallState::Ended;
        }
        if session.answered {
            return CallState::Answered;
        }
        match session.id {
            Some(id) => self.transport.state(id),
            None => CallState::Idle,
        }
    }

    /// The handset was lifted: silence the bells and treat the call as answered.
    pub async fn answer(&self, session: &mut CallSession) -> StopOutcome {
        if session.ended || session.id.is_none() {
            return self.stop(session).await;
        }
        let outcome = self.hang_up_transport(session).await;
        session.answered = true;
        debug!(call = ?session.id, ?outcome, "Bells stopped on pickup");
        outcome
    }

    /// Terminate the session. Idempotent and never fails.
    pub async fn stop(&self, session: &mut CallSession) -> StopOutcome {
        if session.id.is_none() {
            session.ended = true;
            return StopOutcome::NotStarted;
        }
        if session.ended {
            return StopOutcome::AlreadyEnded;
        }
        let outcome = if session.answered {
            // bells were silenced on pickup; only the local session remains
            StopOutcome::HungUp
        } else {
            self.hang_up_transport(session).await
        };
        session.ended = true;
        outcome
    }

    async fn hang_up_transport(&self, session: &CallSession) -> StopOutcome {
        let Some(id) = session.id else {
            return StopOutcome::NotStarted;
        };
        let outcome = if !self.transport.state(id).is_live() {
            StopOutcome::AlreadyEnded
        } else {
            match self.transport.hangup(id).await {
                Ok(()) => StopOutcome::HungUp,
                Err(TransportError::InvalidState { .. }) => StopOutcome::AlreadyEnded,
                Err(e) => {
                    warn!(call = %id, error = %e, "Transport fault while hanging up");
                    StopOutcome::Faulted(e)
                }
            }
        };
        self.release_slot(id);
        outcome
    }

    /// Shutdown path: hang up whatever the transport still holds
    pub async fn terminate_all(&self) {
        self.live_slot().take();
        self.transport.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FakeTransport;

    fn factory() -> (Arc<FakeTransport>, CallSessionFactory) {
        let transport = Arc::new(FakeTransport::new());
        let factory = CallSessionFactory::new(transport.clone(), "**1");
        (transport, factory)
    }

    #[tokio::test]
    async fn test_start_dials_target_and_rings() {
        let (transport, factory) = factory();

        let session = factory.start().await.unwrap();

        assert_eq!(transport.dialled(), vec!["**1".to_string()]);
        assert_eq!(factory.state(&session), CallState::Ringing);
    }

    #[tokio::test]
    async fn test_start_failure_is_session_error() {
        let (transport, factory) = factory();
        transport.fail_dial(true);

        let err = factory.start().await.unwrap_err();
        assert!(matches!(err, SessionError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_second_live_session_is_refused() {
        let (_transport, factory) = factory();

        let mut first = factory.start().await.unwrap();
        assert!(matches!(
            factory.start().await,
            Err(SessionError::AlreadyActive { .. })
        ));

        factory.stop(&mut first).await;
        assert!(factory.start().await.is_ok());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (transport, factory) = factory();
        let mut session = factory.start().await.unwrap();

        assert!(matches!(factory.stop(&mut session).await, StopOutcome::HungUp));
        assert!(matches!(
            factory.stop(&mut session).await,
            StopOutcome::AlreadyEnded
        ));
        assert_eq!(factory.state(&session), CallState::Ended);
        assert_eq!(transport.hangups(), 1);
    }

    #[tokio::test]
    async fn test_stop_never_started_session_is_noop() {
        let (transport, factory) = factory();
        let mut session = CallSession::unstarted("**1");

        assert!(matches!(
            factory.stop(&mut session).await,
            StopOutcome::NotStarted
        ));
        assert!(matches!(
            factory.stop(&mut session).await,
            StopOutcome::NotStarted
        ));
        assert_eq!(transport.hangups(), 0);
    }

    #[tokio::test]
    async fn test_invalid_state_on_hangup_is_already_ended() {
        let (transport, factory) = factory();
        let mut session = factory.start().await.unwrap();
        transport.reject_hangup_as_invalid(true);

        assert!(matches!(
            factory.stop(&mut session).await,
            StopOutcome::AlreadyEnded
        ));
    }

    #[tokio::test]
    async fn test_transport_fault_on_hangup_is_reported_not_raised() {
        let (transport, factory) = factory();
        let mut session = factory.start().await.unwrap();
        transport.fault_hangup(true);

        assert!(matches!(
            factory.stop(&mut session).await,
            StopOutcome::Faulted(TransportError::Fault { .. })
        ));
        assert_eq!(factory.state(&session), CallState::Ended);
    }

    #[tokio::test]
    async fn test_answer_silences_bells_and_reports_answered() {
        let (transport, factory) = factory();
        let mut session = factory.start().await.unwrap();

        factory.answer(&mut session).await;

        assert_eq!(factory.state(&session), CallState::Answered);
        assert_eq!(transport.hangups(), 1);

        assert!(matches!(factory.stop(&mut session).await, StopOutcome::HungUp));
        assert_eq!(transport.hangups(), 1);
        assert_eq!(factory.state(&session), CallState::Ended);
    }
}
