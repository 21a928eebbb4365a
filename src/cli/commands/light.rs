use anyhow::Result;
use std::time::Duration;

use crate::installation::Installation;

/// Manual spotlight test. The relay is always switched off again before exit.
pub struct LightCommand {
    installation: Installation,
    seconds: u64,
}

impl LightCommand {
    pub fn new(installation: Installation, seconds: u64) -> Self {
        Self {
            installation,
            seconds,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let (_sensors, indicator) = self.installation.open_hardware()?;

        println!("💡 Spotlight on for {}s", self.seconds);
        indicator.on();
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(self.seconds)) => {}
            _ = tokio::signal::ctrl_c() => println!("⏹️  Interrupted"),
        }
        indicator.release_lines()?;
        println!("🌑 Spotlight off");
        Ok(())
    }
}
