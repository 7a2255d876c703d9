//! Monte Carlo projection of long-run enhancement prospects.

use rand::Rng;

use crate::core::stats::StatsDocument;

/// Default target level for projections.
pub const DEFAULT_GOAL: u32 = 20;

/// Default number of simulated walks per projection.
pub const DEFAULT_TRIALS: u32 = 10_000;

/// Steps after which a single walk is abandoned as unsuccessful.
const STEP_CAP: u64 = 100_000;

/// Result of a projection run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Fraction of walks that reached the target within the step cap.
    pub reach_probability: f64,
    /// Mean attempts among the walks that reached the target, when any did.
    pub mean_attempts: Option<f64>,
}

/// Project the probability of climbing from level 0 to `target`.
///
/// Each walk starts at level 0; every step either advances one level or
/// resets to 0, using the recorded empirical rate for that level when one
/// exists and is non-zero, and the default curve `max(0.1, 1 - level*0.04)`
/// otherwise. Returns `None` when no statistics have been recorded at all:
/// a default-only projection would carry no information about this item.
pub fn simulate_to_target<R: Rng>(
    stats: &StatsDocument,
    target: u32,
    trials: u32,
    rng: &mut R,
) -> Option<Projection> {
    if stats.level_stats.is_empty() || trials == 0 {
        return None;
    }

    let success_chances: Vec<f64> = (0..target)
        .map(|level| match stats.success_rate(level) {
            Some(rate) if rate > 0.0 => rate,
            _ => default_success_chance(level),
        })
        .collect();

    let mut reached = 0u32;
    let mut attempts_among_reached = 0u64;
    for _ in 0..trials {
        let mut level = 0u32;
        let mut attempts = 0u64;
        while level < target && attempts < STEP_CAP {
            attempts += 1;
            if rng.gen_range(0.0..1.0) < success_chances[level as usize] {
                level += 1;
            } else {
                level = 0;
            }
        }
        if level >= target {
            reached += 1;
            attempts_among_reached += attempts;
        }
    }

    let reach_probability = f64::from(reached) / f64::from(trials);
    let mean_attempts =
        (reached > 0).then(|| attempts_among_reached as f64 / f64::from(reached));
    Some(Projection {
        reach_probability,
        mean_attempts,
    })
}

/// Assumed success chance for levels without recorded data.
fn default_success_chance(level: u32) -> f64 {
    (1.0 - f64::from(level) * 0.04).max(0.1)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::core::stats::StatsDocument;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn empty_stats_project_nothing() {
        let stats = StatsDocument::default();
        assert!(simulate_to_target(&stats, 20, 100, &mut seeded()).is_none());
    }

    #[test]
    fn default_curve_shape() {
        assert!((default_success_chance(0) - 1.0).abs() < 1e-9);
        assert!((default_success_chance(10) - 0.6).abs() < 1e-9);
        // Floor kicks in from level 23 on.
        assert!((default_success_chance(23) - 0.1).abs() < 1e-9);
        assert!((default_success_chance(40) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn certain_success_reaches_target_in_exactly_target_steps() {
        let mut stats = StatsDocument::default();
        for level in 0..5 {
            for _ in 0..10 {
                stats.record_success(level, level + 1);
            }
        }

        let projection =
            simulate_to_target(&stats, 5, 50, &mut seeded()).expect("projection");
        assert!((projection.reach_probability - 1.0).abs() < 1e-9);
        assert_eq!(projection.mean_attempts, Some(5.0));
    }

    #[test]
    fn recorded_zero_rate_falls_back_to_default_curve() {
        // A level with only failures must not make the target unreachable;
        // the default curve stands in for its zero empirical rate.
        let mut stats = StatsDocument::default();
        stats.record_destroy(0);

        let projection =
            simulate_to_target(&stats, 3, 200, &mut seeded()).expect("projection");
        assert!(projection.reach_probability > 0.0);
    }

    #[test]
    fn hopeless_levels_are_capped_not_endless() {
        // With data present but a target far beyond the default curve's
        // reach, walks terminate via the step cap and report zero or near
        // zero probability instead of hanging.
        let mut stats = StatsDocument::default();
        stats.record_success(0, 1);

        let projection =
            simulate_to_target(&stats, 100, 5, &mut seeded()).expect("projection");
        assert!(projection.reach_probability < 1.0);
        if projection.reach_probability == 0.0 {
            assert_eq!(projection.mean_attempts, None);
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut stats = StatsDocument::default();
        stats.record_success(0, 1);
        stats.record_destroy(1);

        let a = simulate_to_target(&stats, 6, 500, &mut seeded()).expect("projection");
        let b = simulate_to_target(&stats, 6, 500, &mut seeded()).expect("projection");
        assert_eq!(a, b);
    }
}
