//! Sunday–Saturday week blocks
//!
//! Week blocks drive deload highlighting in calendar views and the
//! weekly progression summaries. Everything here is recomputed per query.

use crate::models::WorkoutRecord;
use crate::volume::VolumeAggregator;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The Sunday 00:00:00 through Saturday 23:59:59 span containing a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekBlock {
    /// Sunday anchor
    pub start: NaiveDate,
    /// Saturday
    pub end: NaiveDate,
}

impl WeekBlock {
    /// Block containing `date`: Sunday = date - weekday index (Sunday = 0)
    pub fn containing(date: NaiveDate) -> Self {
        let offset = u64::from(date.weekday().num_days_from_sunday());
        let start = date.checked_sub_days(Days::new(offset)).unwrap_or(date);
        let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
        WeekBlock { start, end }
    }

    pub fn start_datetime(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Last instant of the Saturday
    pub fn end_datetime(&self) -> NaiveDateTime {
        let end_of_day =
            NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
        self.end.and_time(end_of_day)
    }

    /// Inclusive range test on both ends
    pub fn contains(&self, moment: NaiveDateTime) -> bool {
        moment >= self.start_datetime() && moment <= self.end_datetime()
    }

    /// Two dates share a block iff their Sunday anchors match
    pub fn same_week(a: NaiveDate, b: NaiveDate) -> bool {
        Self::containing(a).start == Self::containing(b).start
    }
}

/// Per-week totals for progression charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub week: WeekBlock,
    /// Qualifying sessions in the week
    pub workout_count: u32,
    pub total_volume: Decimal,
    pub total_duration_seconds: u64,
    pub is_deload_week: bool,
}

/// Does the week block containing `reference` hold a deload session?
pub fn is_date_in_deload_week(reference: NaiveDate, history: &[WorkoutRecord]) -> bool {
    let block = WeekBlock::containing(reference);
    history
        .iter()
        .any(|record| record.is_deload && block.contains(record.date))
}

/// Sunday anchors of every week containing a deload session
pub fn deload_week_starts(history: &[WorkoutRecord]) -> BTreeSet<NaiveDate> {
    history
        .iter()
        .filter(|record| record.is_deload)
        .map(|record| WeekBlock::containing(record.calendar_date()).start)
        .collect()
}

/// Weekly totals in ascending week order. Weeks without any record are omitted.
pub fn weekly_summaries(history: &[WorkoutRecord]) -> Vec<WeekSummary> {
    let mut weeks: BTreeMap<NaiveDate, WeekSummary> = BTreeMap::new();

    for record in history {
        let block = WeekBlock::containing(record.calendar_date());
        let summary = weeks.entry(block.start).or_insert(WeekSummary {
            week: block,
            workout_count: 0,
            total_volume: Decimal::ZERO,
            total_duration_seconds: 0,
            is_deload_week: false,
        });

        if record.is_qualifying() {
            summary.workout_count += 1;
        }
        summary.total_volume = summary
            .total_volume
            .saturating_add(VolumeAggregator::record_volume(record));
        summary.total_duration_seconds += u64::from(record.duration_seconds);
        summary.is_deload_week |= record.is_deload;
    }

    weeks.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseSet, WorkoutType};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn deload_wednesday() -> Vec<WorkoutRecord> {
        vec![
            WorkoutRecord::new(date(2024, 1, 10).and_hms_opt(12, 0, 0).unwrap(), WorkoutType::Upper)
                .deload(),
        ]
    }

    #[test]
    fn test_week_block_anchors() {
        let block = WeekBlock::containing(date(2024, 1, 10));
        assert_eq!(block.start, date(2024, 1, 7));
        assert_eq!(block.end, date(2024, 1, 13));

        // Sunday is its own anchor
        assert_eq!(WeekBlock::containing(date(2024, 1, 7)).start, date(2024, 1, 7));
        // Saturday belongs to the preceding Sunday
        assert_eq!(WeekBlock::containing(date(2024, 1, 13)).start, date(2024, 1, 7));
        // Across a month boundary
        assert_eq!(WeekBlock::containing(date(2024, 3, 1)).start, date(2024, 2, 25));
    }

    #[test]
    fn test_block_bounds_inclusive() {
        let block = WeekBlock::containing(date(2024, 1, 10));
        assert!(block.contains(date(2024, 1, 7).and_hms_opt(0, 0, 0).unwrap()));
        assert!(block.contains(date(2024, 1, 13).and_hms_opt(23, 59, 59).unwrap()));
        assert!(!block.contains(date(2024, 1, 6).and_hms_opt(23, 59, 59).unwrap()));
        assert!(!block.contains(date(2024, 1, 14).and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn test_deload_week_highlight_scenario() {
        let history = deload_wednesday();

        for day in 7..=13 {
            assert!(is_date_in_deload_week(date(2024, 1, day), &history), "Jan {day}");
        }
        assert!(!is_date_in_deload_week(date(2024, 1, 6), &history));
        assert!(!is_date_in_deload_week(date(2024, 1, 14), &history));
    }

    #[test]
    fn test_non_deload_records_do_not_highlight() {
        let history = vec![WorkoutRecord::new(
            date(2024, 1, 10).and_hms_opt(12, 0, 0).unwrap(),
            WorkoutType::Upper,
        )];
        assert!(!is_date_in_deload_week(date(2024, 1, 10), &history));
        assert!(!is_date_in_deload_week(date(2024, 1, 10), &[]));
    }

    #[test]
    fn test_same_week() {
        assert!(WeekBlock::same_week(date(2024, 1, 7), date(2024, 1, 13)));
        assert!(!WeekBlock::same_week(date(2024, 1, 13), date(2024, 1, 14)));
    }

    #[test]
    fn test_deload_week_starts() {
        let mut history = deload_wednesday();
        history.push(
            WorkoutRecord::new(date(2024, 2, 3).and_hms_opt(9, 0, 0).unwrap(), WorkoutType::Legs)
                .deload(),
        );
        history.push(
            WorkoutRecord::new(date(2024, 1, 12).and_hms_opt(9, 0, 0).unwrap(), WorkoutType::Legs)
                .deload(),
        );

        let starts: Vec<_> = deload_week_starts(&history).into_iter().collect();
        assert_eq!(starts, vec![date(2024, 1, 7), date(2024, 1, 28)]);
    }

    #[test]
    fn test_weekly_summaries() {
        let history = vec![
            WorkoutRecord::new(date(2024, 1, 8).and_hms_opt(18, 0, 0).unwrap(), WorkoutType::Push)
                .with_exercise("Bench Press", vec![ExerciseSet::new(dec!(100), 10); 3])
                .with_duration(3600),
            WorkoutRecord::new(date(2024, 1, 10).and_hms_opt(18, 0, 0).unwrap(), WorkoutType::Cardio)
                .with_duration(1800),
            WorkoutRecord::new(date(2024, 1, 11).and_hms_opt(18, 0, 0).unwrap(), WorkoutType::Rest),
            WorkoutRecord::new(date(2024, 1, 16).and_hms_opt(18, 0, 0).unwrap(), WorkoutType::Legs)
                .with_exercise("Squat", vec![ExerciseSet::new(dec!(80), 8); 3])
                .with_duration(2700)
                .deload(),
        ];

        let summaries = weekly_summaries(&history);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].week.start, date(2024, 1, 7));
        assert_eq!(summaries[0].workout_count, 2);
        assert_eq!(summaries[0].total_volume, dec!(3000));
        assert_eq!(summaries[0].total_duration_seconds, 5400);
        assert!(!summaries[0].is_deload_week);

        assert_eq!(summaries[1].week.start, date(2024, 1, 14));
        assert_eq!(summaries[1].total_volume, dec!(1920));
        assert!(summaries[1].is_deload_week);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_deload_lookup_repeatable(
            records in proptest::collection::vec(
                (0u64..90, any::<bool>(), any::<u32>(), any::<u32>(), any::<u32>(), 1i32..50),
                0..30,
            ),
            reference in 0u64..90,
        ) {
            let start = date(2024, 1, 1);
            let history: Vec<WorkoutRecord> = records
                .into_iter()
                .map(|(offset, deload, lo, mid, hi, reps)| {
                    let day = start.checked_add_days(chrono::Days::new(offset)).unwrap();
                    let weight = Decimal::from_parts(lo, mid, hi, false, 0);
                    let record = WorkoutRecord::new(day.and_hms_opt(6, 0, 0).unwrap(), WorkoutType::Legs)
                        .with_exercise("Squat", vec![ExerciseSet::new(weight, reps)]);
                    if deload { record.deload() } else { record }
                })
                .collect();
            let reference = start.checked_add_days(chrono::Days::new(reference)).unwrap();

            let highlighted = is_date_in_deload_week(reference, &history);
            prop_assert_eq!(highlighted, is_date_in_deload_week(reference, &history));
            prop_assert_eq!(
                highlighted,
                deload_week_starts(&history).contains(&WeekBlock::containing(reference).start)
            );

            let summaries = weekly_summaries(&history);
            prop_assert_eq!(&summaries, &weekly_summaries(&history));
            prop_assert_eq!(
                summaries.iter().map(|s| s.workout_count as usize).sum::<usize>(),
                history.len()
            );
        }
    }
}
