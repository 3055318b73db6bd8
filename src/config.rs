// src/config.rs

use std::{env, path::PathBuf, time::Duration};

use dotenvy::dotenv;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of labeled options (A-E) on every question.
pub const OPTION_COUNT: usize = 5;

pub const SECONDS_PER_MINUTE: u32 = 60;

/// Database connection attempts made by the binary before giving up.
pub const DB_CONNECT_RETRIES: u32 = 5;

/// Basis for the percentage of a finalized attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// correct_count / total_questions. Point values are recorded but ignored.
    #[default]
    Unweighted,
    /// points_earned / points_possible.
    PointWeighted,
}

impl ScoringPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringPolicy::Unweighted => "unweighted",
            ScoringPolicy::PointWeighted => "point_weighted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unweighted" => Some(ScoringPolicy::Unweighted),
            "weighted" | "point_weighted" => Some(ScoringPolicy::PointWeighted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub log_dir: String,
    pub scoring_policy: ScoringPolicy,
    pub tick_interval: Duration,
    pub seed_exams_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://cbt.db".to_string(),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            scoring_policy: ScoringPolicy::Unweighted,
            tick_interval: Duration::from_secs(1),
            seed_exams_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);

        let rust_log = lookup("RUST_LOG").unwrap_or(defaults.rust_log);

        let log_dir = lookup("LOG_DIR").unwrap_or(defaults.log_dir);

        let scoring_policy = match lookup("SCORING_POLICY") {
            Some(raw) => ScoringPolicy::parse(&raw).ok_or_else(|| {
                AppError::Config(format!(
                    "SCORING_POLICY must be 'unweighted' or 'weighted', got '{}'",
                    raw
                ))
            })?,
            None => defaults.scoring_policy,
        };

        let tick_interval = match lookup("TICK_INTERVAL_MS") {
            Some(raw) => {
                let millis = raw.trim().parse::<u64>().map_err(|e| {
                    AppError::Config(format!("TICK_INTERVAL_MS is not a number: {}", e))
                })?;
                if millis == 0 {
                    return Err(AppError::Config(
                        "TICK_INTERVAL_MS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_millis(millis)
            }
            None => defaults.tick_interval,
        };

        let seed_exams_path = lookup("SEED_EXAMS_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            database_url,
            rust_log,
            log_dir,
            scoring_policy,
            tick_interval,
            seed_exams_path,
        })
    }
}
