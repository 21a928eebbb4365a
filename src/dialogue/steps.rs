use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::DialogueConfig;

/// One playable audio file, optionally with a human-readable label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub file: PathBuf,
    pub label: Option<String>,
}

impl Artifact {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            label: None,
        }
    }

    pub fn labelled(file: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            label: Some(label.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepAudio {
    Single(Artifact),
    /// Every artifact, in order
    All(Vec<Artifact>),
    /// One artifact picked at random per run
    OneOf(Vec<Artifact>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pause {
    Fixed(Duration),
    Between { min: Duration, max: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueStep {
    name: String,
    audio: StepAudio,
    pause: Option<Pause>,
}

impl DialogueStep {
    pub fn new(name: impl Into<String>, audio: StepAudio) -> Self {
        Self {
            name: name.into(),
            audio,
            pause: None,
        }
    }

    pub fn play(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self::new(name, StepAudio::Single(Artifact::new(file)))
    }

    pub fn followed_by(mut self, pause: Pause) -> Self {
        self.pause = Some(pause);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn audio(&self) -> &StepAudio {
        &self.audio
    }

    pub fn pause(&self) -> Option<Pause> {
        self.pause
    }
}

/// Ordered, immutable list of steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueSequence {
    steps: Vec<DialogueStep>,
}

impl DialogueSequence {
    pub fn new(steps: Vec<DialogueStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[DialogueStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The oracle dialogue: greeting, two fake-interactive questions, device
    /// stories, one point of interest and a goodbye.
    pub fn oracle(config: &DialogueConfig) -> Self {
        let stories: Vec<Artifact> = config.device_stories.iter().map(Artifact::new).collect();
        let stories = if config.play_all_device_stories {
            StepAudio::All(stories)
        } else {
            StepAudio::OneOf(stories)
        };
        let places = config
            .points_of_interest
            .iter()
            .map(|poi| Artifact::labelled(&poi.file, &poi.name))
            .collect();

        Self::new(vec![
            DialogueStep::play("greeting", &config.greeting),
            DialogueStep::play("ask_name", &config.ask_name)
                .followed_by(Pause::Fixed(Duration::from_millis(config.name_pause_ms))),
            DialogueStep::play("ask_month", &config.ask_month)
                .followed_by(Pause::Fixed(Duration::from_millis(config.month_pause_ms))),
            DialogueStep::new("device_stories", stories),
            DialogueStep::new("point_of_interest", StepAudio::OneOf(places)),
            DialogueStep::play("goodbye", &config.goodbye),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_sequence_order() {
        let sequence = DialogueSequence::oracle(&DialogueConfig::default());
        let names: Vec<&str> = sequence.steps().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "greeting",
                "ask_name",
                "ask_month",
                "device_stories",
                "point_of_interest",
                "goodbye"
            ]
        );
        assert_eq!(
            sequence.steps()[1].pause(),
            Some(Pause::Fixed(Duration::from_secs(7)))
        );
        assert_eq!(
            sequence.steps()[2].pause(),
            Some(Pause::Fixed(Duration::from_secs(10)))
        );
    }

    #[test]
    fn test_device_story_toggle() {
        let mut config = DialogueConfig::default();
        assert!(matches!(
            DialogueSequence::oracle(&config).steps()[3].audio(),
            StepAudio::All(stories) if stories.len() == 4
        ));

        config.play_all_device_stories = false;
        assert!(matches!(
            DialogueSequence::oracle(&config).steps()[3].audio(),
            StepAudio::OneOf(_)
        ));
    }

    #[test]
    fn test_points_of_interest_carry_labels() {
        let sequence = DialogueSequence::oracle(&DialogueConfig::default());
        match sequence.steps()[4].audio() {
            StepAudio::OneOf(places) => {
                assert_eq!(places.len(), 7);
                assert_eq!(places[2].label.as_deref(), Some("Fablab Chemnitz"));
            }
            other => panic!("unexpected audio {other:?}"),
        }
    }
}
