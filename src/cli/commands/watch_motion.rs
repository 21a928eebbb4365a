use anyhow::Result;
use chrono::Local;
use std::time::Duration;
use tokio::time::sleep;

use crate::installation::Installation;

/// Sensor check: print a timestamp for every rising edge of the motion input
pub struct WatchMotionCommand {
    installation: Installation,
}

impl WatchMotionCommand {
    pub fn new(installation: Installation) -> Self {
        Self { installation }
    }

    pub async fn execute(&self) -> Result<()> {
        let (sensors, indicator) = self.installation.open_hardware()?;
        let poll = Duration::from_millis(self.installation.config().timing.poll_interval_ms);

        println!("👀 Watching motion sensor (Ctrl+C to exit)");
        let watch = async {
            let mut was_active = sensors.sample_trigger();
            loop {
                let active = sensors.sample_trigger();
                if active && !was_active {
                    println!("   {}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"));
                }
                was_active = active;
                sleep(poll).await;
            }
        };
        tokio::select! {
            _ = watch => {}
            _ = tokio::signal::ctrl_c() => println!("⏹️  Quit"),
        }

        indicator.release_lines()?;
        Ok(())
    }
}
