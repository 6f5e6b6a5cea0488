use crate::models::{ActivePlan, WorkoutRecord};
use chrono::{Days, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Adherence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdherenceConfig {
    /// Trailing window in days
    pub period_days: u32,

    /// Expected sessions per week when no plan is active
    pub default_weekly_sessions: u32,
}

impl Default for AdherenceConfig {
    fn default() -> Self {
        AdherenceConfig {
            period_days: 30,
            default_weekly_sessions: 3,
        }
    }
}

/// Breakdown behind an adherence percentage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceReport {
    /// Qualifying sessions inside the window
    pub completed: u32,

    /// Sessions the plan expected inside the window
    pub planned: Decimal,

    /// min(100, round(100 × completed / planned)); 0 when nothing was planned
    pub percentage: u32,

    pub period_days: u32,
}

/// Completed-vs-planned session ratio over a trailing window
pub struct AdherenceCalculator {
    config: AdherenceConfig,
}

impl AdherenceCalculator {
    pub fn new() -> Self {
        AdherenceCalculator {
            config: AdherenceConfig::default(),
        }
    }

    pub fn with_config(config: AdherenceConfig) -> Self {
        AdherenceCalculator { config }
    }

    /// Adherence percentage over the configured period
    pub fn calculate(
        &self,
        history: &[WorkoutRecord],
        plan: Option<&ActivePlan>,
        as_of: NaiveDate,
    ) -> u32 {
        self.report(history, plan, self.config.period_days, as_of)
            .percentage
    }

    /// Full adherence breakdown for an explicit period length.
    ///
    /// A plan `start_date` inside the period shortens the window to begin
    /// there; the reported `period_days` is the shortened length.
    pub fn report(
        &self,
        history: &[WorkoutRecord],
        plan: Option<&ActivePlan>,
        period_days: u32,
        as_of: NaiveDate,
    ) -> AdherenceReport {
        let window = Self::window(plan, period_days, as_of);
        let window_days = window.map_or(0, |(_, days)| days);
        let completed = window.map_or(0, |(start, _)| Self::completed_sessions(history, start, as_of));

        let weekly = plan
            .map(|p| p.sessions_per_week)
            .unwrap_or(self.config.default_weekly_sessions);
        let planned = Decimal::from(window_days) / Decimal::from(7) * Decimal::from(weekly);

        let percentage = if planned.is_zero() {
            0
        } else {
            (Decimal::from(100) * Decimal::from(completed) / planned)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .min(Decimal::from(100))
                .to_u32()
                .unwrap_or(0)
        };

        debug!(
            %as_of,
            period_days,
            completed,
            planned = %planned.round_dp(2),
            percentage,
            plan = plan.map(|p| p.name.as_str()),
            "Calculated adherence"
        );

        AdherenceReport {
            completed,
            planned,
            percentage,
            period_days: window_days,
        }
    }

    /// First day and length of the trailing window, or `None` when it is empty
    fn window(plan: Option<&ActivePlan>, period_days: u32, as_of: NaiveDate) -> Option<(NaiveDate, u32)> {
        if period_days == 0 {
            return None;
        }

        let mut start = as_of
            .checked_sub_days(Days::new(u64::from(period_days - 1)))
            .unwrap_or(NaiveDate::MIN);

        if let Some(plan_start) = plan.and_then(|p| p.start_date) {
            if plan_start > as_of {
                return None;
            }
            start = start.max(plan_start);
        }

        let days = u32::try_from((as_of - start).num_days() + 1).unwrap_or(period_days);
        Some((start, days))
    }

    /// Qualifying records dated in `[period_start, as_of]`
    fn completed_sessions(history: &[WorkoutRecord], period_start: NaiveDate, as_of: NaiveDate) -> u32 {
        history
            .iter()
            .filter(|record| record.is_qualifying())
            .filter(|record| {
                let day = record.calendar_date();
                day >= period_start && day <= as_of
            })
            .count() as u32
    }
}

impl Default for AdherenceCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutType;
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    fn sessions(count: u64) -> Vec<WorkoutRecord> {
        (0..count)
            .map(|i| {
                let day = as_of().checked_sub_days(Days::new(i * 2)).unwrap();
                WorkoutRecord::new(day.and_hms_opt(18, 0, 0).unwrap(), WorkoutType::Upper)
            })
            .collect()
    }

    #[test]
    fn test_default_plan_adherence() {
        let calculator = AdherenceCalculator::new();
        let report = calculator.report(&sessions(10), None, 30, as_of());

        assert_eq!(report.completed, 10);
        assert_eq!(report.planned.round_dp(2), dec!(12.86));
        assert_eq!(report.percentage, 78);
    }

    #[test]
    fn test_capped_at_100() {
        let calculator = AdherenceCalculator::new();
        assert_eq!(calculator.calculate(&sessions(15), None, as_of()), 100);
    }

    #[test]
    fn test_active_plan_changes_expectation() {
        let plan = ActivePlan {
            name: "PPL".to_string(),
            sessions_per_week: 6,
            start_date: None,
        };
        let calculator = AdherenceCalculator::new();
        // planned = 30/7 × 6 ≈ 25.71, 10 / 25.71 ≈ 38.9%
        assert_eq!(calculator.calculate(&sessions(10), Some(&plan), as_of()), 39);
    }

    #[test]
    fn test_zero_planned_sessions() {
        let plan = ActivePlan {
            name: "Off season".to_string(),
            sessions_per_week: 0,
            start_date: None,
        };
        let calculator = AdherenceCalculator::new();
        assert_eq!(calculator.calculate(&sessions(5), Some(&plan), as_of()), 0);
        assert_eq!(calculator.report(&sessions(5), None, 0, as_of()).percentage, 0);
    }

    #[test]
    fn test_records_outside_window_ignored() {
        let mut history = sessions(3);
        history.push(WorkoutRecord::new(
            NaiveDate::from_ymd_opt(2023, 12, 1).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            WorkoutType::Legs,
        ));
        history.push(WorkoutRecord::new(
            NaiveDate::from_ymd_opt(2024, 2, 2).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            WorkoutType::Legs,
        ));

        let report = AdherenceCalculator::new().report(&history, None, 30, as_of());
        assert_eq!(report.completed, 3);
    }

    #[test]
    fn test_rest_days_not_completed_sessions() {
        let history = vec![WorkoutRecord::new(
            as_of().and_hms_opt(8, 0, 0).unwrap(),
            WorkoutType::Rest,
        )];
        assert_eq!(AdherenceCalculator::new().calculate(&history, None, as_of()), 0);
    }

    #[test]
    fn test_midpoint_rounds_up() {
        let config = AdherenceConfig {
            period_days: 7,
            default_weekly_sessions: 8,
        };
        let calculator = AdherenceCalculator::with_config(config);
        // 1 of 8 = 12.5% -> 13
        assert_eq!(calculator.calculate(&sessions(1), None, as_of()), 13);
    }

    #[test]
    fn test_plan_start_clamps_window() {
        let mut plan = ActivePlan {
            name: "PPL".to_string(),
            sessions_per_week: 6,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 25),
        };
        let calculator = AdherenceCalculator::new();

        // Jan 25..=31: sessions on 25, 27, 29, 31 against 6 planned
        let report = calculator.report(&sessions(10), Some(&plan), 30, as_of());
        assert_eq!(report.period_days, 7);
        assert_eq!(report.completed, 4);
        assert_eq!(report.planned, dec!(6));
        assert_eq!(report.percentage, 67);

        plan.start_date = NaiveDate::from_ymd_opt(2023, 6, 1);
        assert_eq!(calculator.calculate(&sessions(10), Some(&plan), as_of()), 39);

        plan.start_date = NaiveDate::from_ymd_opt(2024, 2, 5);
        let report = calculator.report(&sessions(10), Some(&plan), 30, as_of());
        assert_eq!(report.completed, 0);
        assert_eq!(report.percentage, 0);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_adherence_bounded_and_repeatable(
            days in proptest::collection::vec((0u64..120, any::<bool>()), 0..60),
            weekly in 0u32..14,
            period in 0u32..120,
        ) {
            let mut history: Vec<WorkoutRecord> = days
                .into_iter()
                .map(|(offset, rest)| {
                    let day = as_of().checked_sub_days(Days::new(offset)).unwrap();
                    let kind = if rest { WorkoutType::Rest } else { WorkoutType::Pull };
                    WorkoutRecord::new(day.and_hms_opt(7, 0, 0).unwrap(), kind)
                })
                .collect();
            let plan = ActivePlan {
                name: "generated".to_string(),
                sessions_per_week: weekly,
                start_date: None,
            };
            let calculator = AdherenceCalculator::new();

            let first = calculator.report(&history, Some(&plan), period, as_of());
            prop_assert!(first.percentage <= 100);
            prop_assert_eq!(&first, &calculator.report(&history, Some(&plan), period, as_of()));

            history.reverse();
            prop_assert_eq!(first, calculator.report(&history, Some(&plan), period, as_of()));
        }
    }
}
