use crate::models::WorkoutRecord;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Streak calculation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    /// How many calendar days (ending at the reference date) are scanned
    pub lookback_days: u32,

    /// Consecutive empty days that end a run. One empty day is tolerated.
    pub max_gap_days: u32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        StreakConfig {
            lookback_days: 90,
            max_gap_days: 1,
        }
    }
}

/// Current and best training streaks, in qualifying days
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    /// Run still alive at the reference date
    pub current_streak: u32,

    /// Best run found anywhere in the lookback window
    pub longest_streak: u32,

    /// Most recent qualifying day in the window
    pub last_workout_date: Option<NaiveDate>,
}

impl StreakSummary {
    /// The run is alive only because the reference day is the tolerated gap
    pub fn is_at_risk(&self, as_of: NaiveDate) -> bool {
        self.current_streak > 0 && self.last_workout_date != Some(as_of)
    }
}

/// Consecutive-day streak scanner with rest-day tolerance
pub struct StreakCalculator {
    config: StreakConfig,
}

impl StreakCalculator {
    /// Create new streak calculator with default configuration
    pub fn new() -> Self {
        StreakCalculator {
            config: StreakConfig::default(),
        }
    }

    /// Create new streak calculator with custom configuration
    pub fn with_config(config: StreakConfig) -> Self {
        StreakCalculator { config }
    }

    /// Compute the streaks as seen on `as_of`.
    ///
    /// Days are walked forward through the window. A qualifying day extends
    /// the run; an empty day is tolerated unless it follows another empty
    /// day, in which case the run ends. Records after `as_of` are ignored.
    pub fn calculate(&self, history: &[WorkoutRecord], as_of: NaiveDate) -> StreakSummary {
        if self.config.lookback_days == 0 {
            return StreakSummary::default();
        }

        let window_start = as_of
            .checked_sub_days(Days::new(u64::from(self.config.lookback_days - 1)))
            .unwrap_or(NaiveDate::MIN);

        let training_days: BTreeSet<NaiveDate> = history
            .iter()
            .filter(|record| record.is_qualifying())
            .map(WorkoutRecord::calendar_date)
            .filter(|date| *date >= window_start && *date <= as_of)
            .collect();

        if training_days.is_empty() {
            return StreakSummary::default();
        }

        let mut run = 0u32;
        let mut longest = 0u32;
        let mut gap = 0u32;

        for day in window_start.iter_days().take_while(|day| *day <= as_of) {
            if training_days.contains(&day) {
                run += 1;
                gap = 0;
                longest = longest.max(run);
            } else {
                gap += 1;
                if gap > self.config.max_gap_days {
                    run = 0;
                }
            }
        }

        let summary = StreakSummary {
            current_streak: run,
            longest_streak: longest,
            last_workout_date: training_days.iter().next_back().copied(),
        };

        debug!(
            %as_of,
            current = summary.current_streak,
            longest = summary.longest_streak,
            training_days = training_days.len(),
            "Calculated streaks"
        );

        summary
    }
}

impl Default for StreakCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn workout_on(day: NaiveDate) -> WorkoutRecord {
        WorkoutRecord::new(day.and_hms_opt(7, 30, 0).unwrap(), WorkoutType::FullBody)
    }

    // Sunday 2024-01-07 through Saturday 2024-01-13
    fn full_week() -> Vec<WorkoutRecord> {
        (7..=13).map(|d| workout_on(date(2024, 1, d))).collect()
    }

    #[test]
    fn test_empty_history() {
        let summary = StreakCalculator::new().calculate(&[], date(2024, 1, 13));
        assert_eq!(summary, StreakSummary::default());
    }

    #[test]
    fn test_consecutive_week() {
        let summary = StreakCalculator::new().calculate(&full_week(), date(2024, 1, 13));
        assert_eq!(summary.current_streak, 7);
        assert_eq!(summary.longest_streak, 7);
        assert_eq!(summary.last_workout_date, Some(date(2024, 1, 13)));
    }

    #[test]
    fn test_single_rest_day_keeps_streak() {
        let history: Vec<_> = full_week()
            .into_iter()
            .filter(|r| r.calendar_date() != date(2024, 1, 10))
            .collect();

        let summary = StreakCalculator::new().calculate(&history, date(2024, 1, 13));
        assert_eq!(summary.current_streak, 6);
        assert_eq!(summary.longest_streak, 6);
    }

    #[test]
    fn test_two_consecutive_gaps_break_streak() {
        let history: Vec<_> = full_week()
            .into_iter()
            .filter(|r| {
                let d = r.calendar_date();
                d != date(2024, 1, 9) && d != date(2024, 1, 10)
            })
            .collect();

        let summary = StreakCalculator::new().calculate(&history, date(2024, 1, 13));
        // Thu, Fri, Sat after the break; Sun + Mon before it was shorter
        assert_eq!(summary.current_streak, 3);
        assert_eq!(summary.longest_streak, 3);
    }

    #[test]
    fn test_separated_single_gaps_are_each_tolerated() {
        // Gaps on Mon and Thu only
        let history: Vec<_> = full_week()
            .into_iter()
            .filter(|r| {
                let d = r.calendar_date();
                d != date(2024, 1, 8) && d != date(2024, 1, 11)
            })
            .collect();

        let summary = StreakCalculator::new().calculate(&history, date(2024, 1, 13));
        assert_eq!(summary.current_streak, 5);
    }

    #[test]
    fn test_today_not_trained_yet() {
        let calculator = StreakCalculator::new();

        let sunday = calculator.calculate(&full_week(), date(2024, 1, 14));
        assert_eq!(sunday.current_streak, 7);
        assert!(sunday.is_at_risk(date(2024, 1, 14)));

        let monday = calculator.calculate(&full_week(), date(2024, 1, 15));
        assert_eq!(monday.current_streak, 0);
        assert_eq!(monday.longest_streak, 7);
    }

    #[test]
    fn test_multiple_records_same_day_count_once() {
        let mut history = full_week();
        history.push(workout_on(date(2024, 1, 13)));
        history.push(workout_on(date(2024, 1, 13)));

        let summary = StreakCalculator::new().calculate(&history, date(2024, 1, 13));
        assert_eq!(summary.current_streak, 7);
    }

    #[test]
    fn test_rest_entries_do_not_count() {
        let mut history = full_week();
        history.push(WorkoutRecord::new(
            date(2024, 1, 14).and_hms_opt(10, 0, 0).unwrap(),
            WorkoutType::Rest,
        ));
        history.push(WorkoutRecord::new(
            date(2024, 1, 15).and_hms_opt(10, 0, 0).unwrap(),
            WorkoutType::Rest,
        ));

        let summary = StreakCalculator::new().calculate(&history, date(2024, 1, 15));
        assert_eq!(summary.current_streak, 0);
    }

    #[test]
    fn test_longest_from_past_run() {
        let mut history: Vec<_> = (1..=10).map(|d| workout_on(date(2024, 3, d))).collect();
        history.push(workout_on(date(2024, 3, 20)));
        history.push(workout_on(date(2024, 3, 21)));

        let summary = StreakCalculator::new().calculate(&history, date(2024, 3, 21));
        assert_eq!(summary.current_streak, 2);
        assert_eq!(summary.longest_streak, 10);
    }

    #[test]
    fn test_lookback_window_limits_scan() {
        let history: Vec<_> = (1..=20).map(|d| workout_on(date(2024, 3, d))).collect();
        let calculator = StreakCalculator::with_config(StreakConfig {
            lookback_days: 5,
            ..StreakConfig::default()
        });

        let summary = calculator.calculate(&history, date(2024, 3, 20));
        assert_eq!(summary.current_streak, 5);
        assert_eq!(summary.longest_streak, 5);
    }

    #[test]
    fn test_future_records_ignored() {
        let history = full_week();
        let summary = StreakCalculator::new().calculate(&history, date(2024, 1, 9));
        assert_eq!(summary.current_streak, 3);
        assert_eq!(summary.last_workout_date, Some(date(2024, 1, 9)));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_streak_properties(days in proptest::collection::vec(0u64..60, 0..40)) {
            let as_of = date(2024, 6, 30);
            let history: Vec<_> = days
                .iter()
                .map(|offset| workout_on(as_of.checked_sub_days(Days::new(*offset)).unwrap()))
                .collect();

            let calculator = StreakCalculator::new();
            let first = calculator.calculate(&history, as_of);
            let second = calculator.calculate(&history, as_of);

            prop_assert_eq!(&first, &second);
            prop_assert!(first.longest_streak >= first.current_streak);
            prop_assert!(first.longest_streak as usize <= history.len());
        }
    }
}
