use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use super::session::{CallId, CallState, CallTransport, TransportError};

/// In-memory transport for rehearsals without a phone system: calls ring
/// until they are hung up.
#[derive(Default)]
pub struct SimulatedCallTransport {
    next_id: AtomicU64,
    calls: Mutex<HashMap<CallId, CallState>>,
}

impl SimulatedCallTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, HashMap<CallId, CallState>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CallTransport for SimulatedCallTransport {
    async fn dial(&self, target: &str) -> Result<CallId, TransportError> {
        let id = CallId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.calls().insert(id, CallState::Ringing);
        info!(call = %id, target, "Simulated bells ringing");
        Ok(id)
    }

    fn state(&self, id: CallId) -> CallState {
        self.calls().get(&id).copied().unwrap_or(CallState::Ended)
    }

    async fn hangup(&self, id: CallId) -> Result<(), TransportError> {
        match self.calls().remove(&id) {
            Some(state) if state.is_live() => {
                info!(call = %id, "Simulated bells stopped");
                Ok(())
            }
            _ => Err(TransportError::InvalidState {
                id,
                operation: "hangup".to_string(),
            }),
        }
    }

    async fn shutdown(&self) {
        self.calls().clear();
    }
}
