//! Call transport backed by an external SIP dialer process.
//!
//! One dialer process per call: the call is live while the process runs and
//! hanging up kills it. Registration and the SIP dialog stay inside the dialer.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::session::{CallId, CallState, CallTransport, TransportError};

const REAP_TIMEOUT: Duration = Duration::from_secs(2);

pub struct CommandCallTransport {
    program: String,
    args: Vec<String>,
    next_id: AtomicU64,
    calls: Mutex<HashMap<CallId, Child>>,
}

impl CommandCallTransport {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            next_id: AtomicU64::new(1),
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn render_args(&self, target: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{target}", target))
            .collect()
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, HashMap<CallId, Child>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn kill(id: CallId, mut child: Child) {
        if let Err(e) = child.start_kill() {
            debug!(call = %id, error = %e, "Dialer already gone");
            return;
        }
        match tokio::time::timeout(REAP_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => debug!(call = %id, %status, "Dialer exited"),
            Ok(Err(e)) => warn!(call = %id, error = %e, "Failed to reap dialer"),
            Err(_) => warn!(call = %id, "Dialer did not exit after kill"),
        }
    }
}

#[async_trait]
impl CallTransport for CommandCallTransport {
    async fn dial(&self, target: &str) -> Result<CallId, TransportError> {
        let args = self.render_args(target);
        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::Unreachable {
                message: format!("cannot start dialer '{}': {}", self.program, e),
            })?;

        let id = CallId(self.next_id.fetch_add(1, Ordering::Relaxed));
        info!(call = %id, program = %self.program, pid = ?child.id(), "Dialer started");
        self.calls().insert(id, child);
        Ok(id)
    }

    fn state(&self, id: CallId) -> CallState {
        let mut calls = self.calls();
        match calls.get_mut(&id) {
            Some(child) => match child.try_wait() {
                Ok(None) => CallState::Ringing,
                Ok(Some(_)) | Err(_) => CallState::Ended,
            },
            None => CallState::Ended,
        }
    }

    async fn hangup(&self, id: CallId) -> Result<(), TransportError> {
        let child = self.calls().remove(&id);
        let Some(mut child) = child else {
            return Err(TransportError::InvalidState {
                id,
                operation: "hangup".to_string(),
            });
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(call = %id, %status, "Dialer had already exited");
                Err(TransportError::InvalidState {
                    id,
                    operation: "hangup".to_string(),
                })
            }
            Ok(None) => {
                Self::kill(id, child).await;
                Ok(())
            }
            Err(e) => Err(TransportError::Fault {
                message: format!("cannot inspect dialer for {id}: {e}"),
            }),
        }
    }

    async fn shutdown(&self) {
        let open: Vec<(CallId, Child)> = self.calls().drain().collect();
        for (id, child) in open {
            Self::kill(id, child).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_placeholder_is_substituted() {
        let transport = CommandCallTransport::new(
            "pjsua",
            vec!["--null-audio".to_string(), "sip:{target}@fritz.box".to_string()],
        );
        assert_eq!(
            transport.render_args("**1"),
            vec!["--null-audio".to_string(), "sip:**1@fritz.box".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_dialer_is_unreachable() {
        let transport = CommandCallTransport::new("nonexistent_dialer_xyz", vec![]);
        let result = transport.dial("**1").await;
        assert!(matches!(result, Err(TransportError::Unreachable { .. })));
    }

    #[tokio::test]
    async fn test_dialer_lifecycle() {
        let transport = CommandCallTransport::new("sleep", vec!["30".to_string()]);

        let id = transport.dial("**1").await.unwrap();
        assert_eq!(transport.state(id), CallState::Ringing);

        transport.hangup(id).await.unwrap();
        assert_eq!(transport.state(id), CallState::Ended);
        assert!(matches!(
            transport.hangup(id).await,
            Err(TransportError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_kills_open_calls() {
        let transport = CommandCallTransport::new("sleep", vec!["30".to_string()]);
        let id = transport.dial("**1").await.unwrap();

        transport.shutdown().await;

        assert_eq!(transport.state(id), CallState::Ended);
    }
}
