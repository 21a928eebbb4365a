use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.log_level, e))?;

    if config.json_logs {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .with(filter)
            .try_init()?;
    }

    tracing::info!(json = config.json_logs, "Oracle phone telemetry initialized");
    Ok(())
}

/// Generate an id that ties together everything one workflow run logs
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one trigger→dialogue→cooldown cycle
pub fn create_workflow_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("workflow_run", run.id = run_id, otel.kind = "internal")
}

/// Shutdown hook. Logs go straight to stdout, so there is nothing to flush.
pub fn shutdown_telemetry() {
    tracing::info!("Oracle phone telemetry shutdown complete");
}
