pub mod adherence;
pub mod aggregate;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod one_rep_max;
pub mod recorder;
pub mod set_metrics;
pub mod sync;
pub mod time_series;
pub mod trends;

#[cfg(test)]
mod test_utils;

use config::{database_url, MetricsConfig};
use db::AppState;
use error::CoachError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Half-up rounding: 2.5 -> 3, -2.5 -> -2
pub(crate) fn round_half_up(value: f64) -> f64 {
  (value + 0.5).floor()
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the `info` default.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
  let _ = tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with(tracing_subscriber::fmt::layer())
    .try_init();
}

/// Load config (including `.env`), open the store and build the app state
pub async fn bootstrap() -> Result<AppState, CoachError> {
  init_logging();

  let config = MetricsConfig::load()?;
  let pool = db::initialize_db(&database_url()).await?;
  info!(
    formula = %config.one_rm_formula,
    lookback_weeks = config.lookback_weeks,
    "Metrics engine ready"
  );

  Ok(AppState::new(pool, config))
}
