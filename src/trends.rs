//! Trend detection, movement-pattern balance and coaching recommendations
//!
//! Deterministic rules only. Recommendations come from a fixed ordered rule
//! list; several rules can fire at once and none suppresses another.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::adherence::WeeklyAdherence;
use crate::aggregate::compute_session_stats;
use crate::config::MetricsConfig;
use crate::models::{Exercise, TrainingPlan, WorkoutSession};
use crate::round_half_up;
use crate::set_metrics::{counts_toward_totals, set_volume};
use crate::time_series::week_start;

/// Minimum |% change| for volume and session-count trends
pub const MIN_TREND_CHANGE_PCT: f64 = 5.0;

/// Session adherence below this suggests the plan is too ambitious
pub const LOW_ADHERENCE_PCT: f64 = 70.0;

/// |volume deviation| above this triggers a volume recommendation
pub const VOLUME_DEVIATION_LIMIT_PCT: f64 = 20.0;

const PUSH_PULL_UPPER: f64 = 1.5;
const PUSH_PULL_LOWER: f64 = 0.67;

// ---------------------------------------------------------------------------
/// Period-over-period trends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub metric: String,
    pub direction: TrendDirection,
    pub percent_change: f64,
    pub description: String,
}

/// Totals for one comparison period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PeriodMetrics {
    pub volume: f64,
    pub sessions: u32,
    pub avg_intensity: f64,
}

impl PeriodMetrics {
    /// Completed sessions whose effective date falls in `[start, end)`
    pub fn from_sessions(
        sessions: &[WorkoutSession],
        start: NaiveDate,
        end: NaiveDate,
        config: &MetricsConfig,
    ) -> Self {
        let mut metrics = PeriodMetrics::default();
        let mut intensity_sum = 0.0;
        let mut sets = 0u32;

        for session in sessions.iter().filter(|s| s.is_completed()) {
            let date = session.effective_date();
            if date < start || date >= end {
                continue;
            }
            let stats = compute_session_stats(session, config);
            metrics.volume += stats.total_volume;
            metrics.sessions += 1;
            intensity_sum += stats.avg_intensity * stats.total_sets as f64;
            sets += stats.total_sets;
        }

        if sets > 0 {
            metrics.avg_intensity = intensity_sum / sets as f64;
        }
        metrics
    }
}

/// `round((current - previous) / previous × 100)`, None without a baseline
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if !(previous > 0.0) || !current.is_finite() {
        return None;
    }
    Some(round_half_up((current - previous) / previous * 100.0))
}

/// Classify one metric. Changes smaller than `threshold` are `Stable`.
pub fn compare_periods(metric: &str, current: f64, previous: f64, threshold: f64) -> Option<Trend> {
    let change = percent_change(current, previous)?;

    let direction = if change.abs() < threshold {
        TrendDirection::Stable
    } else if change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    let description = match direction {
        TrendDirection::Up => format!("{} up {}% vs previous period", metric, change),
        TrendDirection::Down => format!("{} down {}% vs previous period", metric, change.abs()),
        TrendDirection::Stable => format!("{} stable vs previous period", metric),
    };

    Some(Trend {
        metric: metric.to_string(),
        direction,
        percent_change: change,
        description,
    })
}

/// Volume and session-count trends that clear the noise threshold
pub fn detect_trends(current: &PeriodMetrics, previous: &PeriodMetrics) -> Vec<Trend> {
    [
        compare_periods("volume", current.volume, previous.volume, MIN_TREND_CHANGE_PCT),
        compare_periods(
            "sessions",
            current.sessions as f64,
            previous.sessions as f64,
            MIN_TREND_CHANGE_PCT,
        ),
    ]
    .into_iter()
    .flatten()
    .filter(|t| t.direction != TrendDirection::Stable)
    .collect()
}

// ---------------------------------------------------------------------------
/// Movement patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    Push,
    Pull,
    Hinge,
    Squat,
    Carry,
    Core,
    Other,
}

/// Exercise-name keywords, checked in this order; first match wins
const NAME_KEYWORDS: &[(MovementPattern, &[&str])] = &[
    (
        MovementPattern::Hinge,
        &[
            "deadlift", "rdl", "good morning", "hip thrust", "swing", "hinge", "glute bridge",
            "leg curl", "hamstring curl", "nordic", "glute ham", "back extension", "hyperextension",
        ],
    ),
    (
        MovementPattern::Squat,
        &[
            "squat", "lunge", "leg press", "step-up", "step up", "split", "leg extension",
            "calf raise",
        ],
    ),
    (MovementPattern::Carry, &["carry", "farmer", "suitcase", "yoke"]),
    (
        MovementPattern::Core,
        &["plank", "crunch", "sit-up", "situp", "rollout", "pallof", "twist", "leg raise"],
    ),
    (
        MovementPattern::Pull,
        &["row", "pull", "chin", "lat ", "pulldown", "curl", "face pull"],
    ),
    (
        MovementPattern::Push,
        &["press", "bench", "push", "dip", "fly", "raise", "extension"],
    ),
];

/// Muscle-group fallback when the name says nothing
const MUSCLE_KEYWORDS: &[(MovementPattern, &[&str])] = &[
    (MovementPattern::Hinge, &["hamstring", "glute", "lower back", "erector"]),
    (MovementPattern::Squat, &["quad"]),
    (MovementPattern::Carry, &["grip", "forearm", "trap"]),
    (MovementPattern::Pull, &["back", "lat", "bicep", "rear delt"]),
    (MovementPattern::Push, &["chest", "pec", "shoulder", "delt", "tricep"]),
    (MovementPattern::Core, &["abs", "abdominal", "core", "oblique"]),
];

fn match_keywords(text: &str, table: &[(MovementPattern, &[&str])]) -> Option<MovementPattern> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(pattern, _)| *pattern)
}

pub fn classify_exercise(name: &str, muscle_groups: &[String]) -> MovementPattern {
    let name = format!("{} ", name.to_lowercase());
    if let Some(pattern) = match_keywords(&name, NAME_KEYWORDS) {
        return pattern;
    }

    muscle_groups
        .iter()
        .find_map(|m| match_keywords(&m.to_lowercase(), MUSCLE_KEYWORDS))
        .unwrap_or(MovementPattern::Other)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PatternVolume {
    pub exercises: u32,
    pub sets: u32,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Imbalance {
    PushDominant,
    PullDominant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PatternBalance {
    pub patterns: BTreeMap<MovementPattern, PatternVolume>,
    /// Push sets / pull sets; None when no pull work was done
    pub push_pull_ratio: Option<f64>,
    pub imbalance: Option<Imbalance>,
}

/// Completed-set distribution across movement patterns.
///
/// Entries missing from the catalog are classified by their exercise id.
pub fn pattern_balance(
    sessions: &[&WorkoutSession],
    catalog: &HashMap<String, Exercise>,
    config: &MetricsConfig,
) -> PatternBalance {
    let mut patterns: BTreeMap<MovementPattern, PatternVolume> = BTreeMap::new();

    for entry in sessions.iter().flat_map(|s| s.exercises.iter()) {
        let sets: Vec<_> = entry
            .completed_sets()
            .filter(|s| counts_toward_totals(s, config.include_warmups))
            .collect();
        if sets.is_empty() {
            continue;
        }

        let pattern = match catalog.get(&entry.exercise_id) {
            Some(exercise) => classify_exercise(&exercise.name, &exercise.muscle_groups),
            None => classify_exercise(&entry.exercise_id.replace('_', " "), &[]),
        };

        let bucket = patterns.entry(pattern).or_default();
        bucket.exercises += 1;
        bucket.sets += sets.len() as u32;
        bucket.volume += sets.iter().map(|s| set_volume(s)).sum::<f64>();
    }

    let push = patterns.get(&MovementPattern::Push).map_or(0, |p| p.sets);
    let pull = patterns.get(&MovementPattern::Pull).map_or(0, |p| p.sets);

    let push_pull_ratio = (pull > 0).then(|| push as f64 / pull as f64);
    let imbalance = match push_pull_ratio {
        Some(r) if r > PUSH_PULL_UPPER => Some(Imbalance::PushDominant),
        Some(r) if r < PUSH_PULL_LOWER => Some(Imbalance::PullDominant),
        Some(_) => None,
        None if push > 0 => Some(Imbalance::PushDominant),
        None => None,
    };

    PatternBalance {
        patterns,
        push_pull_ratio,
        imbalance,
    }
}

// ---------------------------------------------------------------------------
/// Recommendations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ReduceFrequency,
    MonitorRecovery,
    IncreaseIntensity,
    CorrectImbalance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
}

pub fn generate_recommendations(
    adherence: &WeeklyAdherence,
    balance: &PatternBalance,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if adherence.planned > 0 && adherence.percentage < LOW_ADHERENCE_PCT {
        recs.push(Recommendation {
            kind: RecommendationKind::ReduceFrequency,
            message: format!(
                "Only {} of {} planned sessions completed ({}%). Consider reducing weekly frequency to a sustainable level.",
                adherence.completed, adherence.planned, adherence.percentage
            ),
        });
    }

    if adherence.volume_deviation > VOLUME_DEVIATION_LIMIT_PCT {
        recs.push(Recommendation {
            kind: RecommendationKind::MonitorRecovery,
            message: format!(
                "Volume is {}% above target. Monitor recovery and fatigue before adding more work.",
                adherence.volume_deviation
            ),
        });
    } else if adherence.volume_deviation < -VOLUME_DEVIATION_LIMIT_PCT {
        recs.push(Recommendation {
            kind: RecommendationKind::IncreaseIntensity,
            message: format!(
                "Volume is {}% below target. Increase load or add working sets to close the gap.",
                adherence.volume_deviation.abs()
            ),
        });
    }

    match balance.imbalance {
        Some(Imbalance::PushDominant) => recs.push(Recommendation {
            kind: RecommendationKind::CorrectImbalance,
            message: "Pressing volume outweighs pulling. Add rows or pull-ups to balance the shoulders."
                .to_string(),
        }),
        Some(Imbalance::PullDominant) => recs.push(Recommendation {
            kind: RecommendationKind::CorrectImbalance,
            message: "Pulling volume outweighs pressing. Add a horizontal or vertical press.".to_string(),
        }),
        None => {}
    }

    recs
}

// ---------------------------------------------------------------------------
/// Weekly insights bundle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyInsights {
    pub adherence: WeeklyAdherence,
    pub current: PeriodMetrics,
    pub previous: PeriodMetrics,
    pub trends: Vec<Trend>,
    pub balance: PatternBalance,
    pub recommendations: Vec<Recommendation>,
}

impl WeeklyInsights {
    /// This week vs. last week for the plan's athlete
    pub fn build(
        sessions: &[WorkoutSession],
        plan: &TrainingPlan,
        catalog: &HashMap<String, Exercise>,
        week_of: NaiveDate,
        config: &MetricsConfig,
    ) -> Self {
        let athlete_sessions: Vec<WorkoutSession> = sessions
            .iter()
            .filter(|s| s.athlete_id == plan.athlete_id)
            .cloned()
            .collect();

        let start = week_start(week_of);
        let end = start + Duration::weeks(1);
        let prev_start = start - Duration::weeks(1);

        let adherence = WeeklyAdherence::compute(&athlete_sessions, plan, start, config);
        let current = PeriodMetrics::from_sessions(&athlete_sessions, start, end, config);
        let previous = PeriodMetrics::from_sessions(&athlete_sessions, prev_start, start, config);
        let trends = detect_trends(&current, &previous);

        let this_week: Vec<&WorkoutSession> = athlete_sessions
            .iter()
            .filter(|s| s.is_completed() && week_start(s.effective_date()) == start)
            .collect();
        let balance = pattern_balance(&this_week, catalog, config);
        let recommendations = generate_recommendations(&adherence, &balance);

        Self {
            adherence,
            current,
            previous,
            trends,
            balance,
            recommendations,
        }
    }

    /// Advisory strings for the presentation layer
    pub fn to_string_list(&self) -> Vec<String> {
        self.trends
            .iter()
            .map(|t| t.description.clone())
            .chain(self.recommendations.iter().map(|r| r.message.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStatus;
    use crate::test_utils::*;
    use chrono::{TimeZone, Utc};

    fn catalog() -> HashMap<String, Exercise> {
        [
            Exercise::new("bench", "Bench Press", &["chest", "triceps"]),
            Exercise::new("ohp", "Overhead Press", &["shoulders"]),
            Exercise::new("row", "Barbell Row", &["back"]),
            Exercise::new("squat", "Back Squat", &["quads", "glutes"]),
        ]
        .into_iter()
        .map(|e| (e.id.clone(), e))
        .collect()
    }

    #[test]
    fn test_percent_change_guards() {
        assert_eq!(percent_change(100.0, 0.0), None);
        assert_eq!(percent_change(110.0, 100.0), Some(10.0));
        assert_eq!(percent_change(50.0, 100.0), Some(-50.0));
    }

    #[test]
    fn test_small_changes_are_suppressed() {
        let current = PeriodMetrics { volume: 10_300.0, sessions: 4, avg_intensity: 8.0 };
        let previous = PeriodMetrics { volume: 10_000.0, sessions: 4, avg_intensity: 7.0 };
        assert!(detect_trends(&current, &previous).is_empty());

        let stable = compare_periods("volume", 10_300.0, 10_000.0, MIN_TREND_CHANGE_PCT).unwrap();
        assert_eq!(stable.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_trends_detected() {
        let current = PeriodMetrics { volume: 12_000.0, sessions: 3, avg_intensity: 8.0 };
        let previous = PeriodMetrics { volume: 10_000.0, sessions: 4, avg_intensity: 8.0 };

        let trends = detect_trends(&current, &previous);
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].metric, "volume");
        assert_eq!(trends[0].direction, TrendDirection::Up);
        assert_eq!(trends[0].percent_change, 20.0);
        assert_eq!(trends[1].direction, TrendDirection::Down);
        assert_eq!(trends[1].percent_change, -25.0);
        assert_eq!(trends[1].description, "sessions down 25% vs previous period");
    }

    #[test]
    fn test_no_trend_without_baseline() {
        let current = PeriodMetrics { volume: 5_000.0, sessions: 2, avg_intensity: 7.0 };
        assert!(detect_trends(&current, &PeriodMetrics::default()).is_empty());
    }

    #[test]
    fn test_classify_by_name_then_muscle() {
        let none: Vec<String> = vec![];
        assert_eq!(classify_exercise("Romanian Deadlift", &none), MovementPattern::Hinge);
        assert_eq!(classify_exercise("Leg Press", &none), MovementPattern::Squat);
        assert_eq!(classify_exercise("Pull-Up", &none), MovementPattern::Pull);
        assert_eq!(classify_exercise("Push Press", &none), MovementPattern::Push);
        assert_eq!(classify_exercise("Farmer Walk", &none), MovementPattern::Carry);
        assert_eq!(classify_exercise("Plank", &none), MovementPattern::Core);

        let chest = vec!["Chest".to_string()];
        assert_eq!(classify_exercise("Pec Deck", &chest), MovementPattern::Push);
        assert_eq!(classify_exercise("Mystery Machine", &none), MovementPattern::Other);
    }

    #[test]
    fn test_leg_isolation_lifts_are_lower_body() {
        let quads = vec!["quads".to_string()];
        let hamstrings = vec!["hamstrings".to_string()];
        let none: Vec<String> = vec![];
        assert_eq!(classify_exercise("Leg Extension", &quads), MovementPattern::Squat);
        assert_eq!(classify_exercise("Seated Leg Curl", &hamstrings), MovementPattern::Hinge);
        assert_eq!(classify_exercise("Back Extension", &none), MovementPattern::Hinge);
        assert_eq!(classify_exercise("Hyperextension", &none), MovementPattern::Hinge);
        assert_eq!(classify_exercise("Standing Calf Raise", &none), MovementPattern::Squat);

        // Generic words still mean upper body elsewhere
        assert_eq!(classify_exercise("Triceps Extension", &none), MovementPattern::Push);
        assert_eq!(classify_exercise("Lateral Raise", &none), MovementPattern::Push);
        assert_eq!(classify_exercise("Hammer Curl", &none), MovementPattern::Pull);
    }

    #[test]
    fn test_leg_day_has_no_push_pull_imbalance() {
        let mut catalog = catalog();
        for exercise in [
            Exercise::new("leg_ext", "Leg Extension", &["quads"]),
            Exercise::new("leg_curl", "Lying Leg Curl", &["hamstrings"]),
            Exercise::new("calf", "Calf Raise", &["calves"]),
        ] {
            catalog.insert(exercise.id.clone(), exercise);
        }

        let session = mock_session("s1", SessionStatus::Completed, 0, vec![
            mock_exercise_entry("squat", vec![mock_set(120.0, 5, None); 3]),
            mock_exercise_entry("leg_ext", vec![mock_set(50.0, 12, None); 3]),
            mock_exercise_entry("leg_curl", vec![mock_set(40.0, 12, None); 3]),
            mock_exercise_entry("calf", vec![mock_set(60.0, 15, None); 3]),
        ]);

        let balance = pattern_balance(&[&session], &catalog, &MetricsConfig::default());
        assert!(!balance.patterns.contains_key(&MovementPattern::Push));
        assert!(!balance.patterns.contains_key(&MovementPattern::Pull));
        assert_eq!(balance.patterns[&MovementPattern::Squat].sets, 9);
        assert_eq!(balance.imbalance, None);
    }

    #[test]
    fn test_push_dominant_week() {
        let session = mock_session("s1", SessionStatus::Completed, 0, vec![
            mock_exercise_entry("bench", vec![mock_set(80.0, 5, None); 4]),
            mock_exercise_entry("ohp", vec![mock_set(50.0, 5, None); 2]),
            mock_exercise_entry("row", vec![mock_set(70.0, 8, None); 3]),
            mock_exercise_entry("squat", vec![mock_set(120.0, 5, None); 3]),
        ]);

        let balance = pattern_balance(&[&session], &catalog(), &MetricsConfig::default());

        assert_eq!(balance.patterns[&MovementPattern::Push].sets, 6);
        assert_eq!(balance.patterns[&MovementPattern::Push].exercises, 2);
        assert_eq!(balance.patterns[&MovementPattern::Pull].sets, 3);
        assert_eq!(balance.patterns[&MovementPattern::Squat].volume, 1800.0);
        assert_eq!(balance.push_pull_ratio, Some(2.0));
        assert_eq!(balance.imbalance, Some(Imbalance::PushDominant));
    }

    #[test]
    fn test_balanced_and_pull_dominant() {
        let balanced = mock_session("s1", SessionStatus::Completed, 0, vec![
            mock_exercise_entry("bench", vec![mock_set(80.0, 5, None); 3]),
            mock_exercise_entry("row", vec![mock_set(70.0, 8, None); 3]),
        ]);
        let balance = pattern_balance(&[&balanced], &catalog(), &MetricsConfig::default());
        assert_eq!(balance.imbalance, None);

        let pulling = mock_session("s2", SessionStatus::Completed, 0, vec![
            mock_exercise_entry("bench", vec![mock_set(80.0, 5, None); 1]),
            mock_exercise_entry("row", vec![mock_set(70.0, 8, None); 4]),
        ]);
        let balance = pattern_balance(&[&pulling], &catalog(), &MetricsConfig::default());
        assert_eq!(balance.imbalance, Some(Imbalance::PullDominant));
    }

    #[test]
    fn test_uncatalogued_exercise_uses_id() {
        let session = mock_session("s1", SessionStatus::Completed, 0, vec![
            mock_exercise_entry("farmer_carry", vec![mock_set(40.0, 1, None)]),
        ]);
        let balance = pattern_balance(&[&session], &HashMap::new(), &MetricsConfig::default());
        assert!(balance.patterns.contains_key(&MovementPattern::Carry));
    }

    #[test]
    fn test_all_rules_fire_together() {
        let adherence = WeeklyAdherence::from_counts(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            4,
            2,
            8_000.0,
            4_000.0,
        );
        let balance = PatternBalance {
            imbalance: Some(Imbalance::PushDominant),
            ..Default::default()
        };

        let recs = generate_recommendations(&adherence, &balance);
        let kinds: Vec<_> = recs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationKind::ReduceFrequency,
                RecommendationKind::IncreaseIntensity,
                RecommendationKind::CorrectImbalance,
            ]
        );
    }

    #[test]
    fn test_over_target_volume_recommends_recovery() {
        let adherence = WeeklyAdherence::from_counts(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            4,
            4,
            8_000.0,
            10_000.0,
        );
        let recs = generate_recommendations(&adherence, &PatternBalance::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::MonitorRecovery);
    }

    #[test]
    fn test_weekly_insights() {
        let this_week = Utc.with_ymd_and_hms(2025, 3, 12, 18, 0, 0).unwrap();
        let last_week = this_week - Duration::weeks(1);
        let plan = mock_plan("athlete-1", 2, 2_000.0);

        let make = |id: &str, at, weight| {
            let mut s = mock_session(id, SessionStatus::Completed, 0, vec![
                mock_exercise_entry("bench", vec![mock_set(weight, 5, Some(8.0)); 2]),
            ]);
            s.scheduled_at = at;
            s.completed_at = Some(at);
            s
        };

        let sessions = vec![
            make("prev", last_week, 100.0),
            make("now1", this_week, 100.0),
            make("now2", this_week, 100.0),
        ];

        let insights = WeeklyInsights::build(
            &sessions,
            &plan,
            &catalog(),
            this_week.date_naive(),
            &MetricsConfig::default(),
        );

        assert_eq!(insights.adherence.completed, 2);
        assert_eq!(insights.current.volume, 2_000.0);
        assert_eq!(insights.previous.volume, 1_000.0);
        assert_eq!(insights.trends.len(), 2);
        assert_eq!(insights.balance.imbalance, Some(Imbalance::PushDominant));
        assert_eq!(insights.recommendations.len(), 1);
        assert_eq!(insights.to_string_list().len(), 3);
    }
}
