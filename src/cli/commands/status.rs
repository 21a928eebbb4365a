use anyhow::Result;
use chrono::Utc;

use crate::installation::Installation;

pub struct StatusCommand {
    installation: Installation,
}

impl StatusCommand {
    pub fn new(installation: Installation) -> Self {
        Self { installation }
    }

    pub async fn execute(&self) -> Result<()> {
        let config = self.installation.config();

        println!("☎️  ORACLE PHONE STATUS");
        println!("======================");
        println!();

        println!("🔧 CONFIGURATION:");
        println!("────────────────");
        println!(
            "   Pins: motion={} hook={} light={} (chip base {})",
            config.gpio.motion_pin, config.gpio.hook_pin, config.gpio.light_pin, config.gpio.chip_base
        );
        println!(
            "   Suspense: {}-{} ms, ring timeout {} ms",
            config.timing.suspense_min_ms, config.timing.suspense_max_ms, config.timing.ring_timeout_ms
        );
        println!("   Bell target: {} via {}", config.call.target, config.call.dialer);
        println!("   Audio: {} ({})", config.audio.audio_dir.display(), config.audio.player);
        println!();

        println!("⏳ COOLDOWN:");
        println!("───────────");
        let guard = self.installation.cooldown_guard();
        match guard.remaining(Utc::now()).await {
            Some(rest) => println!("   🔴 Cooling down, {}s left of {}s", rest.as_secs(), guard.window().as_secs()),
            None => println!("   🟢 Armed (window {}s)", guard.window().as_secs()),
        }
        println!("   Marker: {}", config.cooldown.marker_path.display());
        println!();

        println!("📡 SENSORS:");
        println!("──────────");
        match self.installation.open_hardware() {
            Ok((sensors, indicator)) => {
                println!(
                    "   Motion: {}",
                    if sensors.sample_trigger() { "ACTIVE" } else { "quiet" }
                );
                println!(
                    "   Handset: {}",
                    if sensors.sample_hook() { "lifted" } else { "on hook" }
                );
                indicator.release_lines()?;
            }
            Err(e) => println!("   ❌ GPIO unavailable: {e}"),
        }

        Ok(())
    }
}
