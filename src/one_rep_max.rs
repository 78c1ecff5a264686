//! Estimated one-rep max (e1RM)
//!
//! Epley, Brzycki and Lombardi estimates with a rep cap. Above the cap the
//! formulas stop being trustworthy, so the raw weight is returned unchanged
//! instead of an extrapolated number.

use serde::{Deserialize, Serialize};

use crate::models::{Exercise, SetEntry};

/// Default rep cap for every formula
pub const DEFAULT_REP_CAP: u32 = 10;

/// Upper bound for exercise-specific rep caps
pub const MAX_REP_CAP: u32 = 12;

/// Bodyweight used when the athlete's weight is unknown
pub const DEFAULT_BODYWEIGHT: f64 = 70.0;

/// Smallest practical plate increment
pub const DEFAULT_WEIGHT_INCREMENT: f64 = 2.5;

// ---------------------------------------------------------------------------
/// Formula choice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OneRmFormula {
    Epley,
    #[default]
    Brzycki,
    Lombardi,
}

impl std::fmt::Display for OneRmFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Epley => write!(f, "epley"),
            Self::Brzycki => write!(f, "brzycki"),
            Self::Lombardi => write!(f, "lombardi"),
        }
    }
}

impl std::str::FromStr for OneRmFormula {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "epley" => Ok(Self::Epley),
            "brzycki" => Ok(Self::Brzycki),
            "lombardi" => Ok(Self::Lombardi),
            other => Err(format!("Unknown 1RM formula: {}", other)),
        }
    }
}

impl OneRmFormula {
    /// Raw formula, no cap handling
    fn apply(&self, weight: f64, reps: f64) -> f64 {
        match self {
            Self::Epley => weight * (1.0 + reps / 30.0),
            Self::Brzycki => weight * 36.0 / (37.0 - reps),
            Self::Lombardi => weight * reps.powf(0.10),
        }
    }

    /// Inverse of [`Self::apply`]: working weight for a rep count
    fn invert(&self, one_rm: f64, reps: f64) -> f64 {
        match self {
            Self::Epley => one_rm / (1.0 + reps / 30.0),
            Self::Brzycki => one_rm * (37.0 - reps) / 36.0,
            Self::Lombardi => one_rm / reps.powf(0.10),
        }
    }
}

// ---------------------------------------------------------------------------
/// Estimates
// ---------------------------------------------------------------------------

/// e1RM with the default rep cap
pub fn estimate_one_rm(weight: f64, reps: u32, formula: OneRmFormula) -> f64 {
    estimate_one_rm_capped(weight, reps, formula, DEFAULT_REP_CAP)
}

/// e1RM with an exercise-specific rep cap (clamped to [1, 12]).
///
/// Zero reps or non-positive weight give 0. One rep is the weight itself.
/// Reps beyond the cap pass the weight through unmodified.
pub fn estimate_one_rm_capped(weight: f64, reps: u32, formula: OneRmFormula, rep_cap: u32) -> f64 {
    if !weight.is_finite() || weight <= 0.0 || reps == 0 {
        return 0.0;
    }
    if reps == 1 {
        return weight;
    }

    let cap = rep_cap.clamp(1, MAX_REP_CAP);
    if reps > cap {
        return weight;
    }

    formula.apply(weight, reps as f64)
}

/// Lower of Epley and Brzycki
pub fn conservative_estimate(weight: f64, reps: u32) -> f64 {
    let epley = estimate_one_rm(weight, reps, OneRmFormula::Epley);
    let brzycki = estimate_one_rm(weight, reps, OneRmFormula::Brzycki);
    epley.min(brzycki)
}

/// Every formula's estimate plus their mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneRmBreakdown {
    pub epley: f64,
    pub brzycki: f64,
    pub lombardi: f64,
    pub average: f64,
}

pub fn average_estimate(weight: f64, reps: u32) -> OneRmBreakdown {
    let epley = estimate_one_rm(weight, reps, OneRmFormula::Epley);
    let brzycki = estimate_one_rm(weight, reps, OneRmFormula::Brzycki);
    let lombardi = estimate_one_rm(weight, reps, OneRmFormula::Lombardi);

    OneRmBreakdown {
        epley,
        brzycki,
        lombardi,
        average: (epley + brzycki + lombardi) / 3.0,
    }
}

/// Best e1RM across the completed sets of one exercise, using actual weight
pub fn best_e1rm<'a>(
    sets: impl IntoIterator<Item = &'a SetEntry>,
    formula: OneRmFormula,
    rep_cap: u32,
) -> f64 {
    sets.into_iter()
        .filter(|s| s.is_completed)
        .map(|s| {
            estimate_one_rm_capped(
                s.actual_weight.unwrap_or(0.0),
                s.actual_reps.unwrap_or(0),
                formula,
                rep_cap,
            )
        })
        .fold(0.0, f64::max)
}

// ---------------------------------------------------------------------------
/// Load helpers
// ---------------------------------------------------------------------------

/// Load that actually moved: bodyweight + added load for bodyweight exercises.
///
/// Falls back to `default_bodyweight` when the athlete's weight is unknown.
pub fn effective_load(
    exercise: &Exercise,
    added_load: f64,
    athlete_bodyweight: Option<f64>,
    default_bodyweight: f64,
) -> f64 {
    let added = added_load.max(0.0);
    if !exercise.is_bodyweight {
        return added;
    }

    let bodyweight = athlete_bodyweight
        .filter(|bw| *bw > 0.0)
        .unwrap_or(default_bodyweight);
    bodyweight + added
}

/// Rep cap for an exercise, catalog override or the default
pub fn rep_cap_for(exercise: Option<&Exercise>) -> u32 {
    exercise
        .and_then(|e| e.rep_cap)
        .unwrap_or(DEFAULT_REP_CAP)
        .clamp(1, MAX_REP_CAP)
}

/// Working weight for `reps` given a target 1RM, rounded to `increment`
pub fn working_weight_for_reps(
    target_one_rm: f64,
    reps: u32,
    formula: OneRmFormula,
    increment: f64,
) -> f64 {
    if !target_one_rm.is_finite() || target_one_rm <= 0.0 || reps == 0 {
        return 0.0;
    }

    let raw = if reps == 1 || reps > DEFAULT_REP_CAP {
        target_one_rm
    } else {
        formula.invert(target_one_rm, reps as f64)
    };

    round_to_increment(raw, increment)
}

pub fn round_to_increment(value: f64, increment: f64) -> f64 {
    if increment <= 0.0 || !increment.is_finite() {
        return value;
    }
    (value / increment).round() * increment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_single_rep_is_its_own_max() {
        for formula in [OneRmFormula::Epley, OneRmFormula::Brzycki, OneRmFormula::Lombardi] {
            assert_eq!(estimate_one_rm(100.0, 1, formula), 100.0);
        }
    }

    #[test]
    fn test_beyond_cap_passes_weight_through() {
        assert_eq!(estimate_one_rm(100.0, 11, OneRmFormula::Epley), 100.0);
        assert_eq!(estimate_one_rm(100.0, 11, OneRmFormula::Brzycki), 100.0);
        assert_eq!(estimate_one_rm(100.0, 40, OneRmFormula::Brzycki), 100.0);
    }

    #[test]
    fn test_exercise_specific_cap() {
        // Cap of 12 lets 11 reps through the formula
        let e1rm = estimate_one_rm_capped(100.0, 11, OneRmFormula::Epley, 12);
        assert_approx_eq!(e1rm, 100.0 * (1.0 + 11.0 / 30.0), 1e-9);

        // Caps above 12 are clamped
        assert_eq!(estimate_one_rm_capped(100.0, 13, OneRmFormula::Epley, 20), 100.0);
    }

    #[test]
    fn test_formulas_at_five_reps() {
        assert_approx_eq!(estimate_one_rm(100.0, 5, OneRmFormula::Epley), 116.6667, 1e-3);
        assert_approx_eq!(estimate_one_rm(100.0, 5, OneRmFormula::Brzycki), 112.5, 1e-9);
        assert_approx_eq!(
            estimate_one_rm(100.0, 5, OneRmFormula::Lombardi),
            100.0 * 5f64.powf(0.1),
            1e-9
        );
    }

    #[test]
    fn test_zero_inputs() {
        assert_eq!(estimate_one_rm(100.0, 0, OneRmFormula::Epley), 0.0);
        assert_eq!(estimate_one_rm(0.0, 5, OneRmFormula::Epley), 0.0);
        assert_eq!(estimate_one_rm(-50.0, 5, OneRmFormula::Brzycki), 0.0);
    }

    #[test]
    fn test_conservative_and_average() {
        assert_approx_eq!(conservative_estimate(100.0, 5), 112.5, 1e-9);

        let breakdown = average_estimate(100.0, 5);
        let mean = (breakdown.epley + breakdown.brzycki + breakdown.lombardi) / 3.0;
        assert_approx_eq!(breakdown.average, mean, 1e-9);
    }

    #[test]
    fn test_bodyweight_load() {
        let mut pull_up = Exercise::new("pull_up", "Pull-Up", &["lats"]);
        pull_up.is_bodyweight = true;

        assert_eq!(effective_load(&pull_up, 10.0, Some(80.0), DEFAULT_BODYWEIGHT), 90.0);
        assert_eq!(effective_load(&pull_up, 0.0, None, DEFAULT_BODYWEIGHT), 70.0);

        let bench = Exercise::new("bench", "Bench Press", &["chest"]);
        assert_eq!(effective_load(&bench, 100.0, Some(80.0), DEFAULT_BODYWEIGHT), 100.0);
    }

    #[test]
    fn test_working_weight_reverse() {
        // Brzycki: 112.5 × 32 / 36 = 100
        let weight = working_weight_for_reps(112.5, 5, OneRmFormula::Brzycki, 2.5);
        assert_eq!(weight, 100.0);

        // 140 / (1 + 8/30) = 110.5 → 110.0
        let weight = working_weight_for_reps(140.0, 8, OneRmFormula::Epley, 2.5);
        assert_eq!(weight, 110.0);

        assert_eq!(working_weight_for_reps(0.0, 5, OneRmFormula::Epley, 2.5), 0.0);
    }

    #[test]
    fn test_best_e1rm_ignores_planned_sets() {
        let mut planned = SetEntry::planned(2, 3, 200.0);
        planned.actual_weight = Some(200.0);
        planned.actual_reps = Some(3);
        let done = crate::test_utils::mock_set(100.0, 5, Some(8.0));

        let best = best_e1rm([&done, &planned], OneRmFormula::Brzycki, DEFAULT_REP_CAP);
        assert_approx_eq!(best, 112.5, 1e-9);
    }

    #[test]
    fn test_formula_parse() {
        assert_eq!("Epley".parse::<OneRmFormula>(), Ok(OneRmFormula::Epley));
        assert!("wathan".parse::<OneRmFormula>().is_err());
    }
}
