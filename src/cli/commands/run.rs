use anyhow::Result;
use std::time::Duration;
use tracing::info;

use crate::installation::Installation;
use crate::lock::InstanceLock;
use crate::shutdown::ShutdownCoordinator;

pub struct RunCommand {
    installation: Installation,
}

impl RunCommand {
    pub fn new(installation: Installation) -> Self {
        Self { installation }
    }

    pub async fn execute(&self) -> Result<()> {
        let runtime = &self.installation.config().runtime;
        let lock = InstanceLock::acquire(&runtime.lock_file)?;
        let controller = self.installation.build_controller()?;

        let shutdown = ShutdownCoordinator::new(Duration::from_secs(runtime.shutdown_step_timeout_secs));
        shutdown.install_signal_handlers()?;

        info!(lock = ?lock.path(), "Oracle phone ready");
        tokio::select! {
            _ = controller.run(shutdown.subscribe()) => {}
            _ = shutdown.wait_for_shutdown() => {
                info!(phase = ?controller.phase(), "Shutdown requested, abandoning current run");
            }
        }

        shutdown
            .shutdown_all_services(controller.calls(), controller.indicator())
            .await
    }
}
