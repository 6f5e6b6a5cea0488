use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Session categories logged by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Push,
    Pull,
    Legs,
    Upper,
    Lower,
    FullBody,
    Strength,
    Cardio,
    Hiit,
    Mobility,
    Rest,
    Other,
}

impl WorkoutType {
    /// Parse a loosely formatted label ("Full Body", "full-body", "PUSH").
    /// Unknown labels map to `Other` rather than failing.
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "push" => Self::Push,
            "pull" => Self::Pull,
            "legs" | "leg" => Self::Legs,
            "upper" | "upperbody" => Self::Upper,
            "lower" | "lowerbody" => Self::Lower,
            "fullbody" | "full" => Self::FullBody,
            "strength" | "weights" | "lifting" => Self::Strength,
            "cardio" | "run" | "running" | "cycling" | "bike" => Self::Cardio,
            "hiit" | "intervals" => Self::Hiit,
            "mobility" | "stretch" | "stretching" | "yoga" => Self::Mobility,
            "rest" | "restday" | "off" => Self::Rest,
            _ => Self::Other,
        }
    }

    /// Strength sessions carry exercise/set data
    pub fn is_strength(&self) -> bool {
        matches!(
            self,
            Self::Push | Self::Pull | Self::Legs | Self::Upper | Self::Lower | Self::FullBody | Self::Strength
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Push => "Push",
            Self::Pull => "Pull",
            Self::Legs => "Legs",
            Self::Upper => "Upper",
            Self::Lower => "Lower",
            Self::FullBody => "Full Body",
            Self::Strength => "Strength",
            Self::Cardio => "Cardio",
            Self::Hiit => "HIIT",
            Self::Mobility => "Mobility",
            Self::Rest => "Rest",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One resistance-exercise set.
///
/// Both fields stay optional so that malformed history survives loading;
/// aggregation only ever looks at sets where `is_valid()` holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExerciseSet {
    /// Load lifted, in the user's preferred units
    #[serde(default)]
    pub weight: Option<Decimal>,

    /// Completed repetitions
    #[serde(default)]
    pub reps: Option<i32>,
}

impl ExerciseSet {
    pub fn new(weight: Decimal, reps: i32) -> Self {
        ExerciseSet {
            weight: Some(weight),
            reps: Some(reps),
        }
    }

    /// A set counts only when weight > 0 and reps > 0
    pub fn is_valid(&self) -> bool {
        self.valid_values().is_some()
    }

    /// Weight and reps of a valid set
    pub fn valid_values(&self) -> Option<(Decimal, u32)> {
        let weight = self.weight.filter(|w| *w > Decimal::ZERO)?;
        let reps = self.reps.filter(|r| *r > 0)?;
        Some((weight, reps as u32))
    }

    /// weight × reps, or zero for invalid sets. Saturates at `Decimal::MAX`.
    pub fn volume(&self) -> Decimal {
        self.valid_values()
            .map(|(weight, reps)| weight.saturating_mul(Decimal::from(reps)))
            .unwrap_or(Decimal::ZERO)
    }
}

/// One completed (or planned) training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Local date and time the session is anchored to
    pub date: NaiveDateTime,

    /// Session category
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,

    /// Duration in seconds
    #[serde(default)]
    pub duration_seconds: u32,

    /// Exercise name -> sets; absent for non-strength sessions
    #[serde(default)]
    pub exercises: Option<BTreeMap<String, Vec<ExerciseSet>>>,

    /// Deliberately reduced-intensity session
    #[serde(default)]
    pub is_deload: bool,
}

impl WorkoutRecord {
    pub fn new(date: NaiveDateTime, workout_type: WorkoutType) -> Self {
        WorkoutRecord {
            date,
            workout_type,
            duration_seconds: 0,
            exercises: None,
            is_deload: false,
        }
    }

    pub fn with_exercise(mut self, name: impl Into<String>, sets: Vec<ExerciseSet>) -> Self {
        self.exercises
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), sets);
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn deload(mut self) -> Self {
        self.is_deload = true;
        self
    }

    /// Calendar day of the session
    pub fn calendar_date(&self) -> NaiveDate {
        self.date.date()
    }

    /// Rest-day entries are logged but never count as training
    pub fn is_qualifying(&self) -> bool {
        self.workout_type != WorkoutType::Rest
    }

    /// Iterate (exercise name, set) pairs; empty when no exercises were logged
    pub fn sets(&self) -> impl Iterator<Item = (&str, &ExerciseSet)> {
        self.exercises
            .iter()
            .flat_map(|exercises| exercises.iter())
            .flat_map(|(name, sets)| sets.iter().map(move |set| (name.as_str(), set)))
    }
}

/// Training plan currently followed by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePlan {
    /// Plan display name
    pub name: String,

    /// Sessions the plan expects per week
    pub sessions_per_week: u32,

    /// First day of the plan
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Unit preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn weight_label(&self) -> &'static str {
        match self {
            Units::Metric => "kg",
            Units::Imperial => "lb",
        }
    }
}
