use anyhow::Result;
use std::time::Duration;

use crate::installation::Installation;

/// Manual bell test: dial the bell target, ring, hang up
pub struct RingCommand {
    installation: Installation,
    seconds: u64,
}

impl RingCommand {
    pub fn new(installation: Installation, seconds: u64) -> Self {
        Self {
            installation,
            seconds,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let calls = self.installation.call_factory();
        println!("🔔 Ringing {} for {}s...", calls.target(), self.seconds);

        let mut session = calls.start().await?;
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(self.seconds)) => {}
            _ = tokio::signal::ctrl_c() => println!("⏹️  Interrupted"),
        }
        let outcome = calls.stop(&mut session).await;
        calls.terminate_all().await;

        println!("✅ Bells stopped ({outcome:?})");
        Ok(())
    }
}
