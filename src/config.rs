//! Engine configuration
//!
//! A closed set of knobs, read from the environment once at startup and
//! validated before anything downstream sees it.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::CoachError;
use crate::one_rep_max::{OneRmFormula, DEFAULT_BODYWEIGHT, DEFAULT_WEIGHT_INCREMENT};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const DEFAULT_LOOKBACK_WEEKS: u32 = 8;
pub const DEFAULT_LOOKBACK_MONTHS: u32 = 6;
const MAX_LOOKBACK_WEEKS: u32 = 52;
const MAX_LOOKBACK_MONTHS: u32 = 24;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://coach-metrics.db?mode=rwc";

const ENV_ONE_RM_FORMULA: &str = "COACH_ONE_RM_FORMULA";
const ENV_VOLUME_MODE: &str = "COACH_VOLUME_MODE";
const ENV_INCLUDE_WARMUPS: &str = "COACH_INCLUDE_WARMUPS";
const ENV_LOOKBACK_WEEKS: &str = "COACH_LOOKBACK_WEEKS";
const ENV_LOOKBACK_MONTHS: &str = "COACH_LOOKBACK_MONTHS";

/// ---------------------------------------------------------------------------
/// Volume Display
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VolumeDisplayMode {
  /// Raw weight × reps
  #[default]
  KgTotal,
  /// Thousands of units
  Tonnage,
}

impl VolumeDisplayMode {
  pub fn display(&self, volume: f64) -> f64 {
    match self {
      VolumeDisplayMode::KgTotal => volume,
      VolumeDisplayMode::Tonnage => volume / 1000.0,
    }
  }
}

impl std::str::FromStr for VolumeDisplayMode {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "kg_total" => Ok(Self::KgTotal),
      "tonnage" => Ok(Self::Tonnage),
      other => Err(format!("Unknown volume display mode: {}", other)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Metrics Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
  pub one_rm_formula: OneRmFormula,
  pub volume_mode: VolumeDisplayMode,
  pub include_warmups: bool,
  pub lookback_weeks: u32,
  pub lookback_months: u32,
  pub default_bodyweight: f64,
  pub weight_increment: f64,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      one_rm_formula: OneRmFormula::Brzycki,
      volume_mode: VolumeDisplayMode::KgTotal,
      include_warmups: false,
      lookback_weeks: DEFAULT_LOOKBACK_WEEKS,
      lookback_months: DEFAULT_LOOKBACK_MONTHS,
      default_bodyweight: DEFAULT_BODYWEIGHT,
      weight_increment: DEFAULT_WEIGHT_INCREMENT,
    }
  }
}

impl MetricsConfig {
  /// Load `.env` (if any) then read the environment
  pub fn load() -> Result<Self, CoachError> {
    dotenvy::dotenv().ok();
    Self::from_env()
  }

  /// Read overrides from the environment; unset variables keep defaults
  pub fn from_env() -> Result<Self, CoachError> {
    let mut config = Self::default();

    if let Some(raw) = read_var(ENV_ONE_RM_FORMULA) {
      config.one_rm_formula = raw.parse().map_err(CoachError::Config)?;
    }
    if let Some(raw) = read_var(ENV_VOLUME_MODE) {
      config.volume_mode = raw.parse().map_err(CoachError::Config)?;
    }
    if let Some(raw) = read_var(ENV_INCLUDE_WARMUPS) {
      config.include_warmups = parse_bool(ENV_INCLUDE_WARMUPS, &raw)?;
    }
    if let Some(raw) = read_var(ENV_LOOKBACK_WEEKS) {
      config.lookback_weeks = parse_u32(ENV_LOOKBACK_WEEKS, &raw)?;
    }
    if let Some(raw) = read_var(ENV_LOOKBACK_MONTHS) {
      config.lookback_months = parse_u32(ENV_LOOKBACK_MONTHS, &raw)?;
    }

    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), CoachError> {
    if !(1..=MAX_LOOKBACK_WEEKS).contains(&self.lookback_weeks) {
      return Err(CoachError::Config(format!(
        "lookback_weeks must be between 1 and {}, got {}",
        MAX_LOOKBACK_WEEKS, self.lookback_weeks
      )));
    }
    if !(1..=MAX_LOOKBACK_MONTHS).contains(&self.lookback_months) {
      return Err(CoachError::Config(format!(
        "lookback_months must be between 1 and {}, got {}",
        MAX_LOOKBACK_MONTHS, self.lookback_months
      )));
    }
    if !(self.weight_increment > 0.0) {
      return Err(CoachError::Config("weight_increment must be positive".into()));
    }
    if !(self.default_bodyweight > 0.0) {
      return Err(CoachError::Config("default_bodyweight must be positive".into()));
    }
    Ok(())
  }
}

/// Database location, `DATABASE_URL` or a local file
pub fn database_url() -> String {
  read_var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

fn read_var(key: &str) -> Option<String> {
  env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, CoachError> {
  match raw.trim().to_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Ok(true),
    "0" | "false" | "no" | "off" => Ok(false),
    other => Err(CoachError::Config(format!("{} is not a boolean: {}", key, other))),
  }
}

fn parse_u32(key: &str, raw: &str) -> Result<u32, CoachError> {
  raw
    .trim()
    .parse()
    .map_err(|_| CoachError::Config(format!("{} is not a positive integer: {}", key, raw)))
}
