use anyhow::Result;
use clap::Parser;

use oracle_phone::cli::commands::{
    LightCommand, RehearseCommand, ResetCooldownCommand, RingCommand, RunCommand, StatusCommand,
    WatchMotionCommand,
};
use oracle_phone::cli::{Cli, Commands};
use oracle_phone::{init_telemetry, shutdown_telemetry, Installation, OraclePhoneConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    OraclePhoneConfig::load_env_file()?;
    let config = OraclePhoneConfig::load(cli.config.as_deref())?;
    init_telemetry(&config.observability)?;

    let installation = Installation::new(config, cli.simulate_call);
    let result = tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command {
            // Default behavior: no subcommand runs the installation
            None | Some(Commands::Run) => RunCommand::new(installation).execute().await,
            Some(Commands::Status) => StatusCommand::new(installation).execute().await,
            Some(Commands::Ring { seconds }) => {
                RingCommand::new(installation, seconds).execute().await
            }
            Some(Commands::Light { seconds }) => {
                LightCommand::new(installation, seconds).execute().await
            }
            Some(Commands::WatchMotion) => WatchMotionCommand::new(installation).execute().await,
            Some(Commands::Rehearse { use_hook }) => {
                RehearseCommand::new(installation, use_hook).execute().await
            }
            Some(Commands::ResetCooldown) => {
                ResetCooldownCommand::new(installation).execute().await
            }
        }
    });

    shutdown_telemetry();
    result
}
