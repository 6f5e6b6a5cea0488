//! Spoken workout cues
//!
//! An [`Announcer`] is built explicitly with its enabled flag and an output
//! sink. Callers own it and pass it where it is needed.

use crate::records::NewPersonalRecord;
use crate::streak::StreakSummary;
use serde::{Deserialize, Serialize};

/// Cue settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    pub enabled: bool,
}

impl Default for CueConfig {
    fn default() -> Self {
        CueConfig { enabled: false }
    }
}

/// Destination for spoken text (speech engine, terminal, test recorder)
pub trait CueSink {
    fn speak(&mut self, text: &str);
}

/// Writes cues to stdout, for the CLI
#[derive(Debug, Default)]
pub struct StdoutSink;

impl CueSink for StdoutSink {
    fn speak(&mut self, text: &str) {
        println!("🔊 {}", text);
    }
}

/// Keeps every cue in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub spoken: Vec<String>,
}

impl CueSink for RecordingSink {
    fn speak(&mut self, text: &str) {
        self.spoken.push(text.to_string());
    }
}

pub struct Announcer<S: CueSink> {
    enabled: bool,
    sink: S,
}

impl<S: CueSink> Announcer<S> {
    pub fn new(enabled: bool, sink: S) -> Self {
        Announcer { enabled, sink }
    }

    pub fn from_config(config: &CueConfig, sink: S) -> Self {
        Self::new(config.enabled, sink)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Speak `text` if enabled. Returns whether anything was spoken.
    pub fn announce(&mut self, text: &str) -> bool {
        if !self.enabled || text.trim().is_empty() {
            return false;
        }
        tracing::trace!(text, "Announcing cue");
        self.sink.speak(text);
        true
    }

    pub fn announce_new_prs(&mut self, prs: &[NewPersonalRecord]) -> usize {
        prs.iter()
            .filter(|pr| self.announce(&format!("New personal record on {}!", pr.exercise)))
            .count()
    }

    pub fn announce_streak(&mut self, streak: &StreakSummary) -> bool {
        match streak.current_streak {
            0 => false,
            1 => self.announce("Day one. Let's build a streak."),
            days => self.announce(&format!("{} day streak. Keep it going!", days)),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pr(exercise: &str) -> NewPersonalRecord {
        NewPersonalRecord {
            exercise: exercise.to_string(),
            weight: Some(dec!(100)),
            reps: None,
            estimated_1rm: None,
        }
    }

    #[test]
    fn test_disabled_announcer_is_silent() {
        let mut announcer = Announcer::new(false, RecordingSink::default());
        assert!(!announcer.announce("Set complete"));
        assert_eq!(announcer.announce_new_prs(&[pr("Squat")]), 0);
        assert!(announcer.sink().spoken.is_empty());
    }

    #[test]
    fn test_toggle_enabled() {
        let mut announcer = Announcer::new(false, RecordingSink::default());
        announcer.set_enabled(true);
        assert!(announcer.is_enabled());
        assert!(announcer.announce("Rest over"));
        assert!(!announcer.announce("   "));

        assert_eq!(announcer.into_sink().spoken, vec!["Rest over".to_string()]);
    }

    #[test]
    fn test_instances_do_not_share_state() {
        let mut first = Announcer::new(true, RecordingSink::default());
        let mut second = Announcer::new(true, RecordingSink::default());
        first.set_enabled(false);

        assert!(!first.announce("one"));
        assert!(second.announce("two"));
        assert_eq!(second.sink().spoken.len(), 1);
    }

    #[test]
    fn test_announce_prs_and_streak() {
        let mut announcer = Announcer::from_config(&CueConfig { enabled: true }, RecordingSink::default());
        assert_eq!(announcer.announce_new_prs(&[pr("Squat"), pr("Deadlift")]), 2);

        let streak = StreakSummary {
            current_streak: 5,
            longest_streak: 5,
            last_workout_date: None,
        };
        assert!(announcer.announce_streak(&streak));
        assert!(!announcer.announce_streak(&StreakSummary::default()));

        let spoken = &announcer.sink().spoken;
        assert_eq!(spoken[0], "New personal record on Squat!");
        assert_eq!(spoken[2], "5 day streak. Keep it going!");
    }
}
