use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for the oracle phone installation
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OraclePhoneConfig {
    /// GPIO line assignments
    pub gpio: GpioConfig,
    /// Workflow timing
    pub timing: TimingConfig,
    /// Audio player settings
    pub audio: AudioConfig,
    /// Dialogue artifacts
    pub dialogue: DialogueConfig,
    /// Bell call settings
    pub call: CallConfig,
    /// Cooldown marker settings
    pub cooldown: CooldownConfig,
    /// Process-level settings
    pub runtime: RuntimeConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GpioConfig {
    /// sysfs GPIO root
    pub sysfs_root: PathBuf,
    /// Offset added to BCM numbers (newer kernels number the header chip from 512)
    pub chip_base: u32,
    /// Motion sensor input (BCM)
    pub motion_pin: u32,
    /// Hook switch input (BCM)
    pub hook_pin: u32,
    /// Spotlight relay output (BCM)
    pub light_pin: u32,
    /// Hook switch pulls the line low when the handset is lifted
    pub hook_active_low: bool,
    /// Motion sensor pulls the line low when it fires
    pub motion_active_low: bool,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys/class/gpio"),
            chip_base: 0,
            motion_pin: 17,
            hook_pin: 23,
            light_pin: 27,
            hook_active_low: true,
            motion_active_low: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub suspense_min_ms: u64,
    pub suspense_max_ms: u64,
    pub ring_timeout_ms: u64,
    /// Upper bound on waiting for the handset to go back on hook after a dialogue
    pub handset_wait_ms: u64,
    /// Idle poll interval while armed
    pub poll_interval_ms: u64,
    /// Idle poll interval while the cooldown window is open
    pub cooldown_poll_interval_ms: u64,
    /// Poll interval while waiting for the handset to be replaced
    pub handset_poll_interval_ms: u64,
    /// Consecutive samples required before a trigger or pickup is believed
    pub confirm_samples: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            suspense_min_ms: 3_000,
            suspense_max_ms: 15_000,
            ring_timeout_ms: 30_000,
            handset_wait_ms: 60_000,
            poll_interval_ms: 50,
            cooldown_poll_interval_ms: 200,
            handset_poll_interval_ms: 100,
            confirm_samples: 2,
        }
    }
}

impl TimingConfig {
    pub fn ring_timeout(&self) -> Duration {
        Duration::from_millis(self.ring_timeout_ms)
    }

    pub fn handset_wait(&self) -> Duration {
        Duration::from_millis(self.handset_wait_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cooldown_poll_interval(&self) -> Duration {
        Duration::from_millis(self.cooldown_poll_interval_ms)
    }

    pub fn handset_poll_interval(&self) -> Duration {
        Duration::from_millis(self.handset_poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Directory that relative artifact names resolve against
    pub audio_dir: PathBuf,
    /// Player binary
    pub player: String,
    /// ALSA device passed as `-D`, e.g. "plughw:1,0"; default device when unset
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("/home/pi/hacklabgarage/audio"),
            player: "aplay".to_string(),
            device: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PointOfInterest {
    pub name: String,
    pub file: String,
}

impl PointOfInterest {
    fn new(name: &str, file: &str) -> Self {
        Self {
            name: name.to_string(),
            file: file.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub greeting: String,
    pub ask_name: String,
    pub ask_month: String,
    pub goodbye: String,
    /// Fake-interactive pause after the name question
    pub name_pause_ms: u64,
    /// Fake-interactive pause after the month question
    pub month_pause_ms: u64,
    pub device_stories: Vec<String>,
    /// Play every device story in order instead of one at random
    pub play_all_device_stories: bool,
    pub points_of_interest: Vec<PointOfInterest>,
    /// Poll interval used while waiting out a pause
    pub pause_poll_interval_ms: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            greeting: "greeting.wav".to_string(),
            ask_name: "ask_name.wav".to_string(),
            ask_month: "ask_month.wav".to_string(),
            goodbye: "bye.wav".to_string(),
            name_pause_ms: 7_000,
            month_pause_ms: 10_000,
            device_stories: vec![
                "device_radio.wav".to_string(),
                "device_mixer.wav".to_string(),
                "device_table.wav".to_string(),
                "device_erika.wav".to_string(),
            ],
            play_all_device_stories: true,
            points_of_interest: vec![
                PointOfInterest::new("Bagaklut Garage", "poi_bagaklut_garage.wav"),
                PointOfInterest::new("Viadukt with Park & TableTennis", "poi_viadukt_park_tt.wav"),
                PointOfInterest::new("Fablab Chemnitz", "poi_fablab_chemnitz.wav"),
                PointOfInterest::new("Chaostreff Chemnitz", "poi_chaostreff_chemnitz.wav"),
                PointOfInterest::new("Zietenaugust Community Garden", "poi_zietenaugust_garden.wav"),
                PointOfInterest::new("Hochgarage (exhibition)", "poi_hochgarage_exhibition.wav"),
                PointOfInterest::new("Repair Café Sonnenberg", "poi_repaircafe_sonnenberg.wav"),
            ],
            pause_poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CallConfig {
    /// Internal dial string that drives the bells
    pub target: String,
    /// External SIP dialer binary
    pub dialer: String,
    /// Dialer arguments; `{target}` is substituted
    pub dialer_args: Vec<String>,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            target: "**1".to_string(),
            dialer: "pjsua".to_string(),
            dialer_args: vec![
                "--config-file".to_string(),
                "/etc/oracle-phone/pjsua.cfg".to_string(),
                "--null-audio".to_string(),
                "sip:{target}@192.168.188.1".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub window_secs: u64,
    pub marker_path: PathBuf,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            window_secs: 90,
            marker_path: PathBuf::from("/tmp/oracle-phone.cooldown"),
        }
    }
}

impl CooldownConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Exclusive lock held for the lifetime of the installation loop
    pub lock_file: PathBuf,
    /// Seconds each shutdown step may take before it is abandoned
    pub shutdown_step_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            lock_file: PathBuf::from("/tmp/oracle-phone.lock"),
            shutdown_step_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

impl OraclePhoneConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. oracle-phone.toml in the working directory
    /// 3. An explicit configuration file
    /// 4. Environment variables (prefixed with ORACLE_PHONE__)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("oracle-phone.toml").exists() {
            builder = builder.add_source(File::with_name("oracle-phone"));
        }

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("ORACLE_PHONE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: OraclePhoneConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the workflow cannot run with
    pub fn validate(&self) -> Result<()> {
        let timing = &self.timing;
        if timing.suspense_min_ms > timing.suspense_max_ms {
            bail!(
                "timing.suspense_min_ms ({}) exceeds timing.suspense_max_ms ({})",
                timing.suspense_min_ms,
                timing.suspense_max_ms
            );
        }
        if timing.poll_interval_ms == 0
            || timing.cooldown_poll_interval_ms == 0
            || timing.handset_poll_interval_ms == 0
            || self.dialogue.pause_poll_interval_ms == 0
        {
            bail!("poll intervals must be greater than zero");
        }
        if timing.confirm_samples == 0 {
            bail!("timing.confirm_samples must be at least 1");
        }
        if self.dialogue.device_stories.is_empty() {
            bail!("dialogue.device_stories must name at least one artifact");
        }
        if self.dialogue.points_of_interest.is_empty() {
            bail!("dialogue.points_of_interest must name at least one artifact");
        }
        if self.call.target.trim().is_empty() {
            bail!("call.target must not be empty");
        }
        let pins = [self.gpio.motion_pin, self.gpio.hook_pin, self.gpio.light_pin];
        if pins[0] == pins[1] || pins[0] == pins[2] || pins[1] == pins[2] {
            bail!("gpio pins must be distinct, got {:?}", pins);
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
