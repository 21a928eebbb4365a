use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::call::CallSessionFactory;
use crate::hardware::Indicator;

/// Graceful shutdown coordinator.
///
/// SIGINT and SIGTERM are normal ways to stop the installation; both end in
/// the same cleanup and a zero exit code.
pub struct ShutdownCoordinator {
    tx: Arc<watch::Sender<bool>>,
    step_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(step_timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            step_timeout,
        }
    }

    /// Receiver that flips to `true` once shutdown was requested
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn request_shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.tx.borrow()
    }

    /// Install signal handlers for graceful shutdown
    pub fn install_signal_handlers(&self) -> Result<()> {
        let tx = self.tx.clone();
        #[cfg(unix)]
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        tokio::spawn(async move {
            #[cfg(unix)]
            let signal = tokio::select! {
                _ = tokio::signal::ctrl_c() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            };
            #[cfg(not(unix))]
            let signal = {
                let _ = tokio::signal::ctrl_c().await;
                "ctrl-c"
            };
            info!(signal, "Shutdown signal received");
            tx.send_replace(true);
        });

        info!("Shutdown coordinator ready - will shutdown gracefully on SIGINT/SIGTERM");
        Ok(())
    }

    /// Resolve once shutdown was requested
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.subscribe();
        // the sender lives in self, so wait_for cannot observe a closed channel
        let _ = rx.wait_for(|requested| *requested).await;
    }

    /// Release everything that must not outlive the process.
    ///
    /// Open calls are hung up first so the bells stop, then the spotlight is
    /// switched off and every GPIO line handed back.
    pub async fn shutdown_all_services(
        &self,
        calls: &CallSessionFactory,
        indicator: &Indicator,
    ) -> Result<()> {
        info!("Initiating graceful shutdown of all services...");

        if timeout(self.step_timeout, calls.terminate_all()).await.is_err() {
            warn!(
                timeout_secs = self.step_timeout.as_secs(),
                "Timeout waiting for call sessions to terminate"
            );
        } else {
            info!("Call sessions terminated");
        }

        if let Err(e) = indicator.release_lines() {
            warn!(error = %e, "Failed to release GPIO lines cleanly");
        }

        info!("Graceful shutdown completed successfully");
        Ok(())
    }
}
