use crate::models::WorkoutRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// All-time bests for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    /// Heaviest valid set
    pub max_weight: Decimal,

    /// Most reps in a valid set
    pub max_reps: u32,

    /// Best Epley estimate across valid sets, rounded to 2 places
    pub estimated_1rm: Decimal,

    /// Day the most recent of these bests was set
    pub date_of_record: NaiveDate,
}

/// Best values reached for one exercise within a single session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBest {
    pub weight: Decimal,
    pub reps: u32,
    pub estimated_1rm: Decimal,
}

/// Metrics of one exercise that beat the previous records.
/// `None` means that metric did not improve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPersonalRecord {
    pub exercise: String,
    pub weight: Option<Decimal>,
    pub reps: Option<u32>,
    pub estimated_1rm: Option<Decimal>,
}

impl NewPersonalRecord {
    /// Short human readable list of what improved, e.g. "225 weight, 12 reps"
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(weight) = self.weight {
            parts.push(format!("{} weight", weight.normalize()));
        }
        if let Some(reps) = self.reps {
            parts.push(format!("{} reps", reps));
        }
        if let Some(one_rm) = self.estimated_1rm {
            parts.push(format!("{} est. 1RM", one_rm.normalize()));
        }
        parts.join(", ")
    }
}

/// Per-exercise personal-record tracking
pub struct PersonalRecordDetector;

impl PersonalRecordDetector {
    /// Epley estimate: weight × (1 + reps / 30), rounded to 2 places.
    ///
    /// Evaluated as weight × (30 + reps) / 30 so equivalent lifts compare equal.
    pub fn epley_one_rep_max(weight: Decimal, reps: u32) -> Decimal {
        (weight.saturating_mul(Decimal::from(30 + u64::from(reps))) / Decimal::from(30)).round_dp(2)
    }

    /// Best weight, reps and 1RM per exercise in one session (valid sets only)
    pub fn session_bests(record: &WorkoutRecord) -> BTreeMap<String, SessionBest> {
        let mut bests: BTreeMap<String, SessionBest> = BTreeMap::new();

        for (name, set) in record.sets() {
            let Some((weight, reps)) = set.valid_values() else {
                continue;
            };
            let one_rm = Self::epley_one_rep_max(weight, reps);

            bests
                .entry(name.to_string())
                .and_modify(|best| {
                    best.weight = best.weight.max(weight);
                    best.reps = best.reps.max(reps);
                    best.estimated_1rm = best.estimated_1rm.max(one_rm);
                })
                .or_insert(SessionBest {
                    weight,
                    reps,
                    estimated_1rm: one_rm,
                });
        }

        bests
    }

    /// All-time records per exercise across the history.
    ///
    /// Sessions are visited in date order regardless of input order.
    /// `date_of_record` is the day of the latest strict improvement on any metric.
    pub fn personal_records(history: &[WorkoutRecord]) -> BTreeMap<String, PersonalRecord> {
        let mut ordered: Vec<&WorkoutRecord> = history.iter().collect();
        ordered.sort_by_key(|record| record.date);

        let mut records: BTreeMap<String, PersonalRecord> = BTreeMap::new();

        for record in ordered {
            let day = record.calendar_date();

            for (exercise, best) in Self::session_bests(record) {
                match records.get_mut(&exercise) {
                    Some(pr) => {
                        let mut improved = false;
                        if best.weight > pr.max_weight {
                            pr.max_weight = best.weight;
                            improved = true;
                        }
                        if best.reps > pr.max_reps {
                            pr.max_reps = best.reps;
                            improved = true;
                        }
                        if best.estimated_1rm > pr.estimated_1rm {
                            pr.estimated_1rm = best.estimated_1rm;
                            improved = true;
                        }
                        if improved {
                            pr.date_of_record = day;
                        }
                    }
                    None => {
                        records.insert(
                            exercise,
                            PersonalRecord {
                                max_weight: best.weight,
                                max_reps: best.reps,
                                estimated_1rm: best.estimated_1rm,
                                date_of_record: day,
                            },
                        );
                    }
                }
            }
        }

        debug!(exercises = records.len(), "Computed personal records");
        records
    }

    /// Exercises in `new_record` that strictly beat `previous` on weight,
    /// reps or estimated 1RM. Each metric is compared independently; ties
    /// are not records. An exercise with no previous entry is new on every
    /// metric it has a valid set for.
    pub fn detect_new_prs(
        new_record: &WorkoutRecord,
        previous: &BTreeMap<String, PersonalRecord>,
    ) -> Vec<NewPersonalRecord> {
        Self::session_bests(new_record)
            .into_iter()
            .filter_map(|(exercise, best)| {
                let found = match previous.get(&exercise) {
                    Some(pr) => NewPersonalRecord {
                        weight: (best.weight > pr.max_weight).then_some(best.weight),
                        reps: (best.reps > pr.max_reps).then_some(best.reps),
                        estimated_1rm: (best.estimated_1rm > pr.estimated_1rm)
                            .then_some(best.estimated_1rm),
                        exercise,
                    },
                    None => NewPersonalRecord {
                        weight: Some(best.weight),
                        reps: Some(best.reps),
                        estimated_1rm: Some(best.estimated_1rm),
                        exercise,
                    },
                };

                let any = found.weight.is_some() || found.reps.is_some() || found.estimated_1rm.is_some();
                any.then_some(found)
            })
            .collect()
    }
}
