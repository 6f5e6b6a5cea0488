use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::adherence::AdherenceConfig;
use crate::cues::CueConfig;
use crate::error::{FitTrackError, Result};
use crate::logging::LogConfig;
use crate::models::{ActivePlan, Units};
use crate::reminders::ReminderConfig;
use crate::streak::StreakConfig;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,

    /// Streak scan settings
    #[serde(default)]
    pub streak: StreakConfig,

    /// Adherence window settings
    #[serde(default)]
    pub adherence: AdherenceConfig,

    /// Plan currently being followed
    #[serde(default)]
    pub active_plan: Option<ActivePlan>,

    /// Reminder composition settings
    #[serde(default)]
    pub reminders: ReminderConfig,

    /// Spoken cue settings
    #[serde(default)]
    pub cues: CueConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Workout history file (.json or .csv)
    pub history_file: Option<PathBuf>,

    /// Weight units for display
    pub units: Units,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            streak: StreakConfig::default(),
            adherence: AdherenceConfig::default(),
            active_plan: None,
            reminders: ReminderConfig::default(),
            cues: CueConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            history_file: None,
            units: Units::Metric,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_content = toml::to_string_pretty(self)?;
        fs::write(&path, toml_content)?;

        tracing::debug!(path = %path.as_ref().display(), "Saved configuration");
        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fittrack")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %err,
                    "Config not loaded, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Flattened `section.key = value` pairs, for listing
    pub fn list_values(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self)?;
        let mut pairs = Vec::new();
        flatten("", &value, &mut pairs);
        Ok(pairs)
    }

    /// Read a dotted key such as `adherence.period_days`
    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = toml::Value::try_from(self)?;
        let found = key
            .split('.')
            .try_fold(&value, |current, part| current.get(part))
            .ok_or_else(|| FitTrackError::Configuration(format!("Unknown key: {}", key)))?;

        Ok(match found {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a dotted key from its textual form. The result must still
    /// deserialize into a valid configuration.
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut root = toml::Value::try_from(&*self)?;
        let parts: Vec<&str> = key.split('.').collect();
        let (last, parents) = parts
            .split_last()
            .ok_or_else(|| FitTrackError::Configuration("Empty key".to_string()))?;

        let mut table = &mut root;
        for part in parents {
            table = table
                .as_table_mut()
                .ok_or_else(|| FitTrackError::Configuration(format!("Not a section: {}", part)))?
                .entry(part.to_string())
                .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        }

        table
            .as_table_mut()
            .ok_or_else(|| FitTrackError::Configuration(format!("Not a section: {}", key)))?
            .insert(last.to_string(), parse_scalar(raw));

        let updated: AppConfig = root
            .try_into()
            .map_err(|e: toml::de::Error| FitTrackError::Configuration(format!("{}: {}", key, e)))?;

        *self = updated;
        self.metadata.updated_at = Utc::now();
        Ok(())
    }
}

fn parse_scalar(raw: &str) -> toml::Value {
    let trimmed = raw.trim();
    if let Ok(b) = trimmed.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = trimmed.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = trimmed.parse::<f64>() {
        toml::Value::Float(f)
    } else {
        toml::Value::String(trimmed.to_string())
    }
}

fn flatten(prefix: &str, value: &toml::Value, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, out);
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}
