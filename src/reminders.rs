//! Reminder text composition
//!
//! Turns aggregated progress into the title/body pairs that the
//! notification layer sends. Delivery itself happens elsewhere.

use crate::adherence::AdherenceCalculator;
use crate::models::{ActivePlan, WorkoutRecord};
use crate::records::{NewPersonalRecord, PersonalRecordDetector};
use crate::streak::{StreakCalculator, StreakSummary};
use crate::weeks::{self, WeekBlock, WeekSummary};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reminder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub enabled: bool,

    /// Hour (0-23) quiet time starts; may wrap past midnight
    pub quiet_start_hour: u32,

    /// Hour (0-23) quiet time ends
    pub quiet_end_hour: u32,

    /// Send hydration / stretching nudges
    pub wellness: bool,

    /// Send the Sunday recap of the week just finished
    pub weekly_summary: bool,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        ReminderConfig {
            enabled: true,
            quiet_start_hour: 22,
            quiet_end_hour: 7,
            wellness: true,
            weekly_summary: true,
        }
    }
}

impl ReminderConfig {
    pub fn is_quiet_hour(&self, hour: u32) -> bool {
        if self.quiet_start_hour == self.quiet_end_hour {
            return false;
        }
        if self.quiet_start_hour > self.quiet_end_hour {
            hour >= self.quiet_start_hour || hour < self.quiet_end_hour
        } else {
            hour >= self.quiet_start_hour && hour < self.quiet_end_hour
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Workout,
    StreakAtRisk,
    PersonalRecord,
    Wellness,
    WeeklySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub kind: ReminderKind,
    pub title: String,
    pub body: String,
}

/// Everything the composer needs to know about one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub as_of: NaiveDate,
    pub streak: StreakSummary,
    pub adherence: u32,
    /// Records set by sessions on `as_of`
    pub new_prs: Vec<NewPersonalRecord>,
    pub in_deload_week: bool,
    pub trained_today: bool,
    /// Totals for the week block before the one containing `as_of`
    pub last_week: Option<WeekSummary>,
}

impl ProgressSnapshot {
    /// Build a snapshot from history using the given calculators
    pub fn build(
        history: &[WorkoutRecord],
        plan: Option<&ActivePlan>,
        as_of: NaiveDate,
        streaks: &StreakCalculator,
        adherence: &AdherenceCalculator,
    ) -> Self {
        let before: Vec<WorkoutRecord> = history
            .iter()
            .filter(|record| record.calendar_date() < as_of)
            .cloned()
            .collect();
        let previous = PersonalRecordDetector::personal_records(&before);

        let mut merged: BTreeMap<String, NewPersonalRecord> = BTreeMap::new();
        for record in history.iter().filter(|r| r.calendar_date() == as_of) {
            for pr in PersonalRecordDetector::detect_new_prs(record, &previous) {
                merged
                    .entry(pr.exercise.clone())
                    .and_modify(|existing| {
                        existing.weight = existing.weight.max(pr.weight);
                        existing.reps = existing.reps.max(pr.reps);
                        existing.estimated_1rm = existing.estimated_1rm.max(pr.estimated_1rm);
                    })
                    .or_insert(pr);
            }
        }

        let trained_today = history
            .iter()
            .any(|record| record.is_qualifying() && record.calendar_date() == as_of);

        let previous_week_start = WeekBlock::containing(as_of)
            .start
            .checked_sub_days(Days::new(7));
        let last_week = previous_week_start.and_then(|start| {
            weeks::weekly_summaries(history)
                .into_iter()
                .find(|summary| summary.week.start == start)
        });

        ProgressSnapshot {
            as_of,
            streak: streaks.calculate(history, as_of),
            adherence: adherence.calculate(history, plan, as_of),
            new_prs: merged.into_values().collect(),
            in_deload_week: weeks::is_date_in_deload_week(as_of, history),
            trained_today,
            last_week,
        }
    }
}

/// Chooses which reminders to send and words them
pub struct ReminderComposer {
    config: ReminderConfig,
}

impl ReminderComposer {
    pub fn new(config: ReminderConfig) -> Self {
        ReminderComposer { config }
    }

    /// Reminders for `snapshot` at local `hour`. Celebrations ignore quiet hours.
    pub fn compose(&self, snapshot: &ProgressSnapshot, hour: u32) -> Vec<Reminder> {
        if !self.config.enabled {
            return Vec::new();
        }

        let mut reminders = Vec::new();

        if !snapshot.new_prs.is_empty() {
            reminders.push(Self::personal_record(&snapshot.new_prs));
        }

        if self.config.is_quiet_hour(hour) {
            return reminders;
        }

        if !snapshot.trained_today {
            if snapshot.streak.is_at_risk(snapshot.as_of) {
                reminders.push(Reminder {
                    kind: ReminderKind::StreakAtRisk,
                    title: format!("Keep your {}-day streak alive", snapshot.streak.current_streak),
                    body: "You've used your rest day. Log a workout today to keep the streak going."
                        .to_string(),
                });
            } else {
                reminders.push(Reminder {
                    kind: ReminderKind::Workout,
                    title: "Time to train".to_string(),
                    body: format!(
                        "You're at {}% of your planned sessions this month. Today's workout is waiting.",
                        snapshot.adherence
                    ),
                });
            }
        }

        if self.config.wellness {
            reminders.push(if snapshot.in_deload_week {
                Reminder {
                    kind: ReminderKind::Wellness,
                    title: "Deload week".to_string(),
                    body: "Keep the loads light, sleep well and give your joints a break.".to_string(),
                }
            } else {
                Reminder {
                    kind: ReminderKind::Wellness,
                    title: "Stay hydrated".to_string(),
                    body: "Grab a glass of water and take two minutes to stretch.".to_string(),
                }
            });
        }

        if self.config.weekly_summary && snapshot.as_of.weekday() == Weekday::Sun {
            if let Some(week) = &snapshot.last_week {
                reminders.push(Reminder {
                    kind: ReminderKind::WeeklySummary,
                    title: "Your week in review".to_string(),
                    body: format!(
                        "{} workouts, {} total volume{}. Longest streak: {} days.",
                        week.workout_count,
                        week.total_volume.normalize(),
                        if week.is_deload_week { " (deload week)" } else { "" },
                        snapshot.streak.longest_streak
                    ),
                });
            }
        }

        reminders
    }

    fn personal_record(prs: &[NewPersonalRecord]) -> Reminder {
        let title = if prs.len() == 1 {
            format!("New PR: {}", prs[0].exercise)
        } else {
            format!("{} new personal records", prs.len())
        };
        let body = prs
            .iter()
            .map(|pr| format!("{}: {}", pr.exercise, pr.describe()))
            .collect::<Vec<_>>()
            .join("; ");

        Reminder {
            kind: ReminderKind::PersonalRecord,
            title,
            body,
        }
    }
}

impl Default for ReminderComposer {
    fn default() -> Self {
        Self::new(ReminderConfig::default())
    }
}
