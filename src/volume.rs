use crate::models::WorkoutRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Training volume (Σ weight × reps over valid sets)
pub struct VolumeAggregator;

impl VolumeAggregator {
    /// Volume of a single session. Sessions without exercises are zero.
    pub fn record_volume(record: &WorkoutRecord) -> Decimal {
        record
            .sets()
            .map(|(_, set)| set.volume())
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Volume across the whole history
    pub fn total_volume(history: &[WorkoutRecord]) -> Decimal {
        history
            .iter()
            .map(Self::record_volume)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Volume of sessions dated within `from..=to`. An inverted range is empty.
    pub fn volume_in_period(history: &[WorkoutRecord], from: NaiveDate, to: NaiveDate) -> Decimal {
        history
            .iter()
            .filter(|record| {
                let day = record.calendar_date();
                day >= from && day <= to
            })
            .map(Self::record_volume)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Per-exercise volume, for progress charts
    pub fn volume_by_exercise(history: &[WorkoutRecord]) -> BTreeMap<String, Decimal> {
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();

        for (name, set) in history.iter().flat_map(|record| record.sets()) {
            if set.is_valid() {
                let total = totals.entry(name.to_string()).or_insert(Decimal::ZERO);
                *total = total.saturating_add(set.volume());
            }
        }

        totals
    }
}
