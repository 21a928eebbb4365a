use anyhow::Result;

pub mod light;
pub mod rehearse;
pub mod reset_cooldown;
pub mod ring;
pub mod run;
pub mod status;
pub mod watch_motion;

pub use light::LightCommand;
pub use rehearse::RehearseCommand;
pub use reset_cooldown::ResetCooldownCommand;
pub use ring::RingCommand;
pub use run::RunCommand;
pub use status::StatusCommand;
pub use watch_motion::WatchMotionCommand;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

macro_rules! impl_command {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Command for $ty {
                async fn execute(&self) -> Result<()> {
                    <$ty>::execute(self).await
                }
            }
        )*
    };
}

impl_command!(
    LightCommand,
    RehearseCommand,
    ResetCooldownCommand,
    RingCommand,
    RunCommand,
    StatusCommand,
    WatchMotionCommand,
);
