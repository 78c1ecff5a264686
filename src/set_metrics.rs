//! Per-set volume, intensity and fatigue
//!
//! Every other module resolves set effort through [`set_intensity`] and
//! [`target_intensity`]; nothing else reads the raw RPE/RIR/intensity fields.

use crate::models::SetEntry;

/// Fallback effort when a set carries no RPE, intensity or RIR
pub const DEFAULT_INTENSITY: f64 = 7.0;

const MIN_INTENSITY: f64 = 1.0;
const MAX_INTENSITY: f64 = 10.0;

/// Load normalization baseline for the fatigue heuristic
const FATIGUE_LOAD_BASELINE: f64 = 100.0;

/// Load factor for sets without external weight
const UNLOADED_FATIGUE_FACTOR: f64 = 0.5;

/// weight × reps for completed sets, 0 otherwise
pub fn set_volume(set: &SetEntry) -> f64 {
  if !set.is_completed {
    return 0.0;
  }
  match (set.actual_weight, set.actual_reps) {
    (Some(weight), Some(reps)) if weight > 0.0 && reps > 0 => weight * reps as f64,
    _ => 0.0,
  }
}

/// Performed reps, 0 for uncompleted sets
pub fn set_reps(set: &SetEntry) -> u32 {
  if set.is_completed {
    set.actual_reps.unwrap_or(0)
  } else {
    0
  }
}

/// Effort of a set on a 1-10 scale.
///
/// Precedence: RPE, then the explicit intensity field, then `10 - RIR`,
/// then [`DEFAULT_INTENSITY`].
pub fn set_intensity(set: &SetEntry) -> f64 {
  resolve_intensity(set.rpe, set.intensity, set.rir)
}

/// Prescribed effort of a planned set: target RPE takes the place of RPE
pub fn target_intensity(set: &SetEntry) -> f64 {
  resolve_intensity(set.target_rpe, set.intensity, set.rir)
}

fn resolve_intensity(rpe: Option<f64>, intensity: Option<f64>, rir: Option<f64>) -> f64 {
  let raw = rpe
    .or(intensity)
    .or_else(|| rir.map(|r| 10.0 - r))
    .filter(|v| v.is_finite())
    .unwrap_or(DEFAULT_INTENSITY);

  raw.clamp(MIN_INTENSITY, MAX_INTENSITY)
}

/// Fatigue contribution: `intensity × ln(1 + reps) × load_factor`.
///
/// `load_factor = sqrt(weight / 100)` for loaded sets, 0.5 otherwise.
/// Uncompleted sets contribute nothing.
pub fn set_fatigue(set: &SetEntry) -> f64 {
  if !set.is_completed {
    return 0.0;
  }

  let reps = set.actual_reps.unwrap_or(0) as f64;
  let load_factor = match set.actual_weight {
    Some(weight) if weight > 0.0 => (weight / FATIGUE_LOAD_BASELINE).sqrt(),
    _ => UNLOADED_FATIGUE_FACTOR,
  };

  set_intensity(set) * reps.ln_1p() * load_factor
}

/// Whether a set participates in aggregates under the warmup toggle
pub fn counts_toward_totals(set: &SetEntry, include_warmups: bool) -> bool {
  include_warmups || !set.is_warmup()
}
