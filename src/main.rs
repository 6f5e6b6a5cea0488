use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Timelike};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

use fittrack::config::AppConfig;
use fittrack::cues::{Announcer, StdoutSink};
use fittrack::error::ErrorSeverity;
use fittrack::logging::{init_logging, LogLevel};
use fittrack::weeks::{self, WeekBlock};
use fittrack::{
    AdherenceCalculator, HistoryLoader, PersonalRecordDetector, ProgressSnapshot,
    ReminderComposer, StreakCalculator, StreakConfig, VolumeAggregator, WorkoutRecord,
};

/// fittrack - Workout history metrics
///
/// Streaks, plan adherence, training volume, personal records and
/// deload weeks computed from a workout history export.
#[derive(Parser)]
#[command(name = "fittrack")]
#[command(version)]
#[command(about = "Workout history metrics", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Workout history file (.json or .csv); overrides the config
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today
    #[arg(long, value_name = "DATE")]
    as_of: Option<NaiveDate>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Streak, adherence, volume and personal records at a glance
    Summary,

    /// Current and longest training streak
    Streak {
        /// Days to look back (default from config: 90)
        #[arg(short, long)]
        lookback: Option<u32>,
    },

    /// Completed vs planned sessions over a trailing window
    Adherence {
        /// Period in days (default from config: 30)
        #[arg(short, long)]
        period: Option<u32>,

        /// Expected sessions per week, overriding the active plan
        #[arg(short, long)]
        weekly: Option<u32>,
    },

    /// Total training volume (weight x reps)
    Volume {
        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        from: Option<NaiveDate>,

        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        to: Option<NaiveDate>,

        /// Break the total down per exercise
        #[arg(long)]
        by_exercise: bool,
    },

    /// Personal records per exercise
    Records,

    /// Is a date inside a deload week?
    Deload {
        /// Date to check (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,
    },

    /// Weekly totals (Sunday-Saturday)
    Weeks {
        /// Number of most recent weeks to show
        #[arg(short, long, default_value = "8")]
        limit: usize,
    },

    /// Compose today's reminders
    Remind {
        /// Local hour to compose for (default: now)
        #[arg(long)]
        hour: Option<u32>,

        /// Speak celebratory cues
        #[arg(long)]
        speak: bool,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (key=value)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "Max weight")]
    max_weight: String,
    #[tabled(rename = "Max reps")]
    max_reps: u32,
    #[tabled(rename = "Est. 1RM")]
    estimated_1rm: String,
    #[tabled(rename = "Date")]
    date: NaiveDate,
}

#[derive(Tabled)]
struct WeekRow {
    #[tabled(rename = "Week of")]
    week_start: NaiveDate,
    #[tabled(rename = "Workouts")]
    workouts: u32,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Minutes")]
    minutes: u64,
    #[tabled(rename = "Deload")]
    deload: &'static str,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(Some(&config_path));

    let mut log_config = config.logging.clone();
    log_config.level = LogLevel::from_verbosity(log_config.level, cli.verbose);
    init_logging(&log_config)?;

    let as_of = cli.as_of.unwrap_or_else(|| Local::now().date_naive());
    let weight_unit = config.settings.units.weight_label();

    if let Commands::Config { list, set, get, init } = &cli.command {
        return run_config(&mut config, &config_path, *list, set.as_deref(), get.as_deref(), *init);
    }

    let history = load_history(&cli, &config)?;

    match cli.command {
        Commands::Summary => {
            let streak = StreakCalculator::with_config(config.streak.clone()).calculate(&history, as_of);
            let adherence = AdherenceCalculator::with_config(config.adherence.clone()).report(
                &history,
                config.active_plan.as_ref(),
                config.adherence.period_days,
                as_of,
            );
            let volume = VolumeAggregator::total_volume(&history);

            println!("{}", format!("Progress as of {}", as_of).green().bold());
            println!("  Current streak:  {} days", streak.current_streak.to_string().bold());
            println!("  Longest streak:  {} days", streak.longest_streak);
            println!(
                "  Adherence:       {}% ({} of {} planned, last {} days)",
                adherence.percentage.to_string().bold(),
                adherence.completed,
                adherence.planned.round_dp(1),
                adherence.period_days
            );
            println!("  Total volume:    {} {}", volume.normalize(), weight_unit);
            if weeks::is_date_in_deload_week(as_of, &history) {
                println!("  {}", "This is a deload week".yellow());
            }
            print_records(&history);
        }

        Commands::Streak { lookback } => {
            let streak_config = StreakConfig {
                lookback_days: lookback.unwrap_or(config.streak.lookback_days),
                ..config.streak.clone()
            };
            let streak = StreakCalculator::with_config(streak_config).calculate(&history, as_of);

            println!("{}", "Training streak".cyan().bold());
            println!("  Current: {} days", streak.current_streak.to_string().bold());
            println!("  Longest: {} days", streak.longest_streak);
            if let Some(last) = streak.last_workout_date {
                println!("  Last workout: {}", last);
            }
            if streak.is_at_risk(as_of) {
                println!("  {}", "Rest day used - train today to keep the streak".yellow());
            }
        }

        Commands::Adherence { period, weekly } => {
            let period_days = period.unwrap_or(config.adherence.period_days);
            let override_plan = weekly.map(|sessions_per_week| fittrack::ActivePlan {
                name: "command line".to_string(),
                sessions_per_week,
                start_date: None,
            });
            let plan = override_plan.as_ref().or(config.active_plan.as_ref());

            let report = AdherenceCalculator::with_config(config.adherence.clone())
                .report(&history, plan, period_days, as_of);

            println!("{}", "Plan adherence".blue().bold());
            if let Some(plan) = plan {
                println!("  Plan: {} ({} sessions/week)", plan.name, plan.sessions_per_week);
            }
            println!("  Completed: {}", report.completed);
            println!("  Planned:   {}", report.planned.round_dp(2));
            println!("  Adherence: {}%", report.percentage.to_string().bold());
        }

        Commands::Volume { from, to, by_exercise } => {
            let in_range: Vec<WorkoutRecord> = history
                .iter()
                .filter(|r| from.map_or(true, |f| r.calendar_date() >= f))
                .filter(|r| to.map_or(true, |t| r.calendar_date() <= t))
                .cloned()
                .collect();

            println!("{}", "Training volume".magenta().bold());
            println!(
                "  Total: {} {}",
                VolumeAggregator::total_volume(&in_range).normalize(),
                weight_unit
            );
            if by_exercise {
                for (exercise, volume) in VolumeAggregator::volume_by_exercise(&in_range) {
                    println!("  {:<24} {}", exercise, volume.normalize());
                }
            }
        }

        Commands::Records => print_records(&history),

        Commands::Deload { date } => {
            let block = WeekBlock::containing(date);
            if weeks::is_date_in_deload_week(date, &history) {
                println!(
                    "{}",
                    format!("{} is in a deload week ({} - {})", date, block.start, block.end).yellow()
                );
            } else {
                println!("{} is not in a deload week ({} - {})", date, block.start, block.end);
            }
        }

        Commands::Weeks { limit } => {
            let summaries = weeks::weekly_summaries(&history);
            let skip = summaries.len().saturating_sub(limit);
            let rows: Vec<WeekRow> = summaries
                .into_iter()
                .skip(skip)
                .map(|s| WeekRow {
                    week_start: s.week.start,
                    workouts: s.workout_count,
                    volume: s.total_volume.normalize().to_string(),
                    minutes: s.total_duration_seconds / 60,
                    deload: if s.is_deload_week { "yes" } else { "" },
                })
                .collect();

            if rows.is_empty() {
                println!("No workouts recorded");
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Commands::Remind { hour, speak } => {
            let snapshot = ProgressSnapshot::build(
                &history,
                config.active_plan.as_ref(),
                as_of,
                &StreakCalculator::with_config(config.streak.clone()),
                &AdherenceCalculator::with_config(config.adherence.clone()),
            );
            let hour = hour.unwrap_or_else(|| Local::now().hour());
            let reminders = ReminderComposer::new(config.reminders.clone()).compose(&snapshot, hour);

            if reminders.is_empty() {
                println!("No reminders to send");
            }
            for reminder in &reminders {
                println!("{} {}", reminder.title.bold(), format!("[{:?}]", reminder.kind).dimmed());
                println!("  {}", reminder.body);
            }

            let mut announcer = Announcer::new(speak || config.cues.enabled, StdoutSink);
            announcer.announce_new_prs(&snapshot.new_prs);
            announcer.announce_streak(&snapshot.streak);
        }

        Commands::Config { .. } => unreachable!("handled before loading history"),
    }

    Ok(())
}

fn load_history(cli: &Cli, config: &AppConfig) -> Result<Vec<WorkoutRecord>> {
    let path = cli
        .history
        .clone()
        .or_else(|| config.settings.history_file.clone())
        .context("No history file given. Pass --history or set settings.history_file")?;

    let loaded = HistoryLoader::load_file(&path).map_err(|e| {
        match e.severity() {
            ErrorSeverity::Warning => tracing::warn!(error = %e, "History not loaded"),
            ErrorSeverity::Error => tracing::error!(error = %e, "History not loaded"),
        }
        anyhow::anyhow!(e.user_message())
    })?;
    if loaded.skipped > 0 {
        eprintln!(
            "{}",
            format!("Skipped {} records with unreadable dates", loaded.skipped).dimmed()
        );
    }
    Ok(loaded.records)
}

fn print_records(history: &[WorkoutRecord]) {
    let records = PersonalRecordDetector::personal_records(history);
    if records.is_empty() {
        println!("No personal records yet");
        return;
    }

    let rows: Vec<RecordRow> = records
        .into_iter()
        .map(|(exercise, pr)| RecordRow {
            exercise,
            max_weight: pr.max_weight.normalize().to_string(),
            max_reps: pr.max_reps,
            estimated_1rm: pr.estimated_1rm.normalize().to_string(),
            date: pr.date_of_record,
        })
        .collect();

    println!("{}", Table::new(rows));
}

fn run_config(
    config: &mut AppConfig,
    path: &Path,
    list: bool,
    set: Option<&str>,
    get: Option<&str>,
    init: bool,
) -> Result<()> {
    if init {
        let mut fresh = AppConfig::default();
        fresh
            .save_to_file(path)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        println!("{}", format!("✓ Wrote default configuration to {}", path.display()).green());
    } else if list {
        for (key, value) in config.list_values()? {
            println!("{} = {}", key.bold(), value);
        }
    } else if let Some(key_value) = set {
        let (key, value) = key_value
            .split_once('=')
            .context("Expected KEY=VALUE")?;
        config.set_value(key.trim(), value)?;
        config
            .save_to_file(path)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        println!("{}", format!("✓ {} updated", key.trim()).green());
    } else if let Some(key) = get {
        println!("{}", config.get_value(key)?);
    } else {
        println!("Config file: {}", path.display());
    }

    Ok(())
}
