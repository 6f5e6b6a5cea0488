//! Workout history loading
//!
//! Stored history comes in several legacy shapes: dates as ISO strings,
//! epoch seconds or milliseconds, or `{seconds, nanoseconds}` timestamp
//! objects; weights and reps as numbers or numeric strings; exercises as a
//! name → sets map or as a list of `{name, sets}` entries. Everything is
//! normalized here into [`WorkoutRecord`] so the calculators only ever see
//! one shape. Records whose date cannot be read are skipped, not fatal.

use crate::error::{HistoryError, Result};
use crate::models::{ExerciseSet, WorkoutRecord, WorkoutType};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use csv::ReaderBuilder;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Epoch values above this are treated as milliseconds
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Normalized history plus a count of records that had to be dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedHistory {
    /// Records sorted by date ascending
    pub records: Vec<WorkoutRecord>,
    pub skipped: usize,
}

impl LoadedHistory {
    fn from_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut records = Vec::new();
        let mut skipped = 0;

        for (index, value) in values.into_iter().enumerate() {
            match normalize_record(value) {
                Some(record) => records.push(record),
                None => {
                    skipped += 1;
                    warn!(index, "Skipping workout record without a readable date");
                }
            }
        }

        records.sort_by_key(|record| record.date);
        LoadedHistory { records, skipped }
    }
}

/// Reads workout history files (.json, .csv)
pub struct HistoryLoader;

impl HistoryLoader {
    /// Load a history file, choosing the parser from the extension
    pub fn load_file(path: &Path) -> Result<LoadedHistory> {
        if !path.exists() {
            return Err(HistoryError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let loaded = match extension.as_str() {
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?)?,
            "csv" => Self::from_csv_reader(std::fs::File::open(path)?)?,
            other => {
                return Err(HistoryError::UnsupportedFormat {
                    format: other.to_string(),
                }
                .into())
            }
        };

        info!(
            path = %path.display(),
            loaded = loaded.records.len(),
            skipped = loaded.skipped,
            "Loaded workout history"
        );

        Ok(loaded)
    }

    /// Parse a JSON document: either an array of records or an object
    /// holding the array under `workouts` or `history`
    pub fn from_json_str(content: &str) -> Result<LoadedHistory> {
        let document: Value = serde_json::from_str(content)?;

        let items = match &document {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("workouts").or_else(|| map.get("history")) {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(HistoryError::InvalidStructure {
                        reason: "expected a `workouts` array".to_string(),
                    }
                    .into())
                }
            },
            _ => {
                return Err(HistoryError::InvalidStructure {
                    reason: "expected an array of workouts".to_string(),
                }
                .into())
            }
        };

        Ok(LoadedHistory::from_values(items))
    }

    /// Parse a CSV export with one row per set.
    ///
    /// Columns: `date` (required), `type`, `exercise`, `weight`, `reps`,
    /// `duration`, `deload`. Consecutive rows sharing `date` and `type`
    /// form one session.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<LoadedHistory> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_lowercase().replace([' ', '-'], "_"))
            .collect();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let date_col = column("date").ok_or_else(|| HistoryError::MissingData {
            field: "date".to_string(),
        })?;
        let type_col = column("type").or_else(|| column("workout_type"));
        let exercise_col = column("exercise").or_else(|| column("exercise_name"));
        let weight_col = column("weight");
        let reps_col = column("reps");
        let duration_col = column("duration").or_else(|| column("duration_seconds"));
        let deload_col = column("deload").or_else(|| column("is_deload"));

        let mut sessions: Vec<Map<String, Value>> = Vec::new();
        let mut current_key: Option<(String, String)> = None;

        for row in csv_reader.records() {
            let row = row?;
            let field = |col: Option<usize>| col.and_then(|c| row.get(c)).unwrap_or("");

            let key = (
                row.get(date_col).unwrap_or("").to_string(),
                field(type_col).to_string(),
            );

            if current_key.as_ref() != Some(&key) {
                let mut session = Map::new();
                session.insert("date".to_string(), Value::String(key.0.clone()));
                if !key.1.is_empty() {
                    session.insert("type".to_string(), Value::String(key.1.clone()));
                }
                session.insert("exercises".to_string(), Value::Object(Map::new()));
                sessions.push(session);
                current_key = Some(key);
            }

            let Some(session) = sessions.last_mut() else {
                continue;
            };

            let duration = field(duration_col);
            if !duration.is_empty() && !session.contains_key("duration") {
                session.insert("duration".to_string(), Value::String(duration.to_string()));
            }

            if parse_flag(&Value::String(field(deload_col).to_string())) {
                session.insert("isDeload".to_string(), Value::Bool(true));
            }

            let exercise = field(exercise_col);
            if !exercise.is_empty() {
                let mut set = Map::new();
                set.insert("weight".to_string(), Value::String(field(weight_col).to_string()));
                set.insert("reps".to_string(), Value::String(field(reps_col).to_string()));

                if let Some(Value::Object(exercises)) = session.get_mut("exercises") {
                    let sets = exercises
                        .entry(exercise.to_string())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(sets) = sets {
                        sets.push(Value::Object(set));
                    }
                }
            }
        }

        let values: Vec<Value> = sessions
            .into_iter()
            .map(|mut session| {
                let empty = matches!(session.get("exercises"), Some(Value::Object(m)) if m.is_empty());
                if empty {
                    session.remove("exercises");
                }
                Value::Object(session)
            })
            .collect();

        Ok(LoadedHistory::from_values(&values))
    }
}

/// Normalize one stored record. Returns `None` only when no date can be read.
pub fn normalize_record(value: &Value) -> Option<WorkoutRecord> {
    let object = value.as_object()?;

    let date = ["date", "timestamp", "createdAt", "created_at"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(parse_timestamp)?;

    let exercises = ["exercises", "exerciseLog"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(parse_exercises);

    let workout_type = ["type", "workoutType", "workout_type"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(Value::as_str)
        .map(WorkoutType::from_label)
        .unwrap_or(if exercises.is_some() {
            WorkoutType::Strength
        } else {
            WorkoutType::Other
        });

    let duration_seconds = ["duration", "durationSeconds", "duration_seconds"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(parse_number)
        .filter(|d| *d > Decimal::ZERO)
        .and_then(|d| d.trunc().to_u32())
        .unwrap_or(0);

    let is_deload = ["isDeload", "is_deload", "deload"]
        .iter()
        .filter_map(|key| object.get(*key))
        .any(parse_flag);

    Some(WorkoutRecord {
        date,
        workout_type,
        duration_seconds,
        exercises,
        is_deload,
    })
}

/// Read a timestamp in any of the stored shapes, as local time
pub fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(text) => parse_timestamp_str(text.trim()),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64))
            .and_then(from_epoch),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = match map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
            {
                Some(nanos) => u32::try_from(nanos).ok()?,
                None => 0,
            };
            local_from_utc_seconds(seconds, nanos)
        }
        _ => None,
    }
}

fn parse_timestamp_str(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.with_timezone(&Local).naive_local());
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for format in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive);
        }
    }

    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(day) = NaiveDate::parse_from_str(text, format) {
            return day.and_hms_opt(0, 0, 0);
        }
    }

    text.parse::<i64>().ok().and_then(from_epoch)
}

fn from_epoch(value: i64) -> Option<NaiveDateTime> {
    if value.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD.unsigned_abs() {
        let seconds = value.div_euclid(1000);
        let nanos = (value.rem_euclid(1000) * 1_000_000) as u32;
        local_from_utc_seconds(seconds, nanos)
    } else {
        local_from_utc_seconds(value, 0)
    }
}

fn local_from_utc_seconds(seconds: i64, nanos: u32) -> Option<NaiveDateTime> {
    Local
        .timestamp_opt(seconds, nanos)
        .earliest()
        .map(|moment| moment.naive_local())
}

/// Exercises as `{name: [sets]}` or `[{name, sets: [...]}]`
fn parse_exercises(value: &Value) -> Option<BTreeMap<String, Vec<ExerciseSet>>> {
    let mut exercises = BTreeMap::new();

    match value {
        Value::Object(map) => {
            for (name, sets) in map {
                exercises.insert(name.clone(), parse_sets(sets));
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                let Some(name) = entry.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let sets = entry.get("sets").map(parse_sets).unwrap_or_default();
                exercises
                    .entry(name.to_string())
                    .or_insert_with(Vec::new)
                    .extend(sets);
            }
        }
        _ => return None,
    }

    Some(exercises)
}

fn parse_sets(value: &Value) -> Vec<ExerciseSet> {
    value
        .as_array()
        .map(|sets| {
            sets.iter()
                .map(|set| ExerciseSet {
                    weight: set.get("weight").and_then(parse_number),
                    reps: set.get("reps").and_then(parse_reps),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Numbers or numeric strings; anything else is missing
fn parse_number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .ok()
            .or_else(|| number.as_f64().and_then(Decimal::from_f64_retain)),
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

fn parse_reps(value: &Value) -> Option<i32> {
    parse_number(value).and_then(|reps| reps.trunc().to_i32())
}

fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_i64() == Some(1),
        Value::String(text) => matches!(
            text.trim().to_lowercase().as_str(),
            "true" | "yes" | "1" | "deload"
        ),
        _ => false,
    }
}
