use anyhow::Result;

use crate::installation::Installation;

/// Play the dialogue locally, e.g. to check levels and artifact paths
pub struct RehearseCommand {
    installation: Installation,
    use_hook: bool,
}

impl RehearseCommand {
    pub fn new(installation: Installation, use_hook: bool) -> Self {
        Self {
            installation,
            use_hook,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let engine = self.installation.dialogue_engine();
        let sequence = self.installation.sequence();
        let hardware = if self.use_hook {
            Some(self.installation.open_hardware()?)
        } else {
            None
        };

        println!("🎭 Rehearsing {} dialogue steps", sequence.len());
        let rehearsal = engine.run(&sequence, || match &hardware {
            Some((sensors, _)) => sensors.sample_hook(),
            None => true,
        });
        let report = tokio::select! {
            report = rehearsal => Some(report),
            _ = tokio::signal::ctrl_c() => None,
        };

        if let Some((_, indicator)) = &hardware {
            indicator.release_lines()?;
        }

        let Some(report) = report else {
            println!("⏹️  Interrupted");
            return Ok(());
        };
        println!("📋 Outcome: {:?}", report.outcome);
        println!("   Steps started: {}", report.started.join(", "));
        for label in &report.labels {
            println!("   📍 {label}");
        }
        for failure in &report.failures {
            println!("   ❌ {}: {}", failure.step, failure.error);
        }
        Ok(())
    }
}
