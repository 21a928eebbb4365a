use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "oracle-phone")]
#[command(about = "Motion-triggered oracle telephone installation")]
#[command(long_about = "Rings an old telephone when somebody walks by, plays a scripted dialogue \
                       once the handset is lifted, and rests for a cooldown before re-arming. \
                       Run without a subcommand to start the installation loop.")]
pub struct Cli {
    /// Configuration file layered over oracle-phone.toml and the defaults
    #[arg(long, global = true, help = "Path to an additional TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Ring a simulated phone instead of dialling out
    #[arg(long, global = true, help = "Use the in-memory call transport instead of the SIP dialer")]
    pub simulate_call: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the installation loop (default)
    Run,
    /// Show configuration, cooldown state and live sensor readings
    Status,
    /// Ring the bells for a few seconds
    Ring {
        #[arg(long, default_value = "5", help = "Seconds to ring before hanging up")]
        seconds: u64,
    },
    /// Switch the spotlight on for a few seconds
    Light {
        #[arg(long, default_value = "5", help = "Seconds to keep the spotlight on")]
        seconds: u64,
    },
    /// Log every motion-sensor activation until interrupted
    WatchMotion,
    /// Play the dialogue through the speaker without a call
    Rehearse {
        #[arg(long, help = "Abort when the handset goes back on hook, like a real call")]
        use_hook: bool,
    },
    /// Delete the cooldown marker so the next trigger rings immediately
    ResetCooldown,
}
