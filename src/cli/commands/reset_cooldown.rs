use anyhow::Result;

use crate::installation::Installation;

pub struct ResetCooldownCommand {
    installation: Installation,
}

impl ResetCooldownCommand {
    pub fn new(installation: Installation) -> Self {
        Self { installation }
    }

    pub async fn execute(&self) -> Result<()> {
        self.installation.cooldown_guard().reset().await?;
        println!(
            "✅ Cooldown cleared ({})",
            self.installation.config().cooldown.marker_path.display()
        );
        Ok(())
    }
}
