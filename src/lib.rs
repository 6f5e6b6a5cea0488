// Library interface for fittrack modules
// Integration tests and the CLI both go through these exports

pub mod adherence;
pub mod config;
pub mod cues;
pub mod error;
pub mod history;
pub mod logging;
pub mod models;
pub mod records;
pub mod reminders;
pub mod streak;
pub mod volume;
pub mod weeks;

// Re-export commonly used types for convenience
pub use models::*;
pub use adherence::{AdherenceCalculator, AdherenceConfig, AdherenceReport};
pub use config::AppConfig;
pub use cues::{Announcer, CueSink};
pub use error::{FitTrackError, HistoryError, Result};
pub use history::{HistoryLoader, LoadedHistory};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use records::{NewPersonalRecord, PersonalRecord, PersonalRecordDetector};
pub use reminders::{ProgressSnapshot, Reminder, ReminderComposer, ReminderKind};
pub use streak::{StreakCalculator, StreakConfig, StreakSummary};
pub use volume::VolumeAggregator;
pub use weeks::{is_date_in_deload_week, WeekBlock, WeekSummary};
