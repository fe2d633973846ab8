//! Accuracy estimation and the staircase visibility update.

use imadet_core::TrialOutcome;
use serde::{Deserialize, Serialize};

/// Accuracy points per unit of visibility. Maps the accuracy error onto the
/// `[0, 1]` visibility scale.
pub const STEP_DIVISOR: f64 = 500.0;

/// Rounds to two decimals, halves away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Correct responses over one block of trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleResult {
    pub trials_in_cycle: usize,
    pub correct_count: usize,
}

impl CycleResult {
    pub fn from_outcomes(outcomes: &[TrialOutcome]) -> Self {
        Self {
            trials_in_cycle: outcomes.len(),
            correct_count: outcomes.iter().filter(|o| o.correct).count(),
        }
    }

    /// `round(correct / trials * 100)`. Empty blocks are rejected by config
    /// validation and report 0 here.
    pub fn accuracy_percent(&self) -> u32 {
        if self.trials_in_cycle == 0 {
            return 0;
        }
        (self.correct_count as f64 / self.trials_in_cycle as f64 * 100.0).round() as u32
    }
}

/// Accuracy band the staircase aims for. Inside `[lower, upper]` nothing
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyBand {
    pub target: u32,
    pub lower: u32,
    pub upper: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityRule {
    pub band: AccuracyBand,
    pub max_visibility: f64,
    pub min_visibility: Option<f64>,
}

impl VisibilityRule {
    /// Visibility for the next cycle given the accuracy of the last one.
    pub fn next_visibility(&self, current: f64, accuracy_percent: u32) -> f64 {
        let target = self.band.target as f64;
        let accuracy = accuracy_percent as f64;

        let next = if accuracy_percent > self.band.upper {
            // too easy: fade the grating
            round2(current - (accuracy - target) / STEP_DIVISOR)
        } else if accuracy_percent < self.band.lower {
            round2(current + (target - accuracy) / STEP_DIVISOR)
        } else {
            current
        };

        let next = next.min(self.max_visibility);
        match self.min_visibility {
            Some(min) => next.max(min),
            None => next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imadet_core::{ResponseMapping, TrialKind, TrialResponse};
    use proptest::prelude::*;
    use std::time::Duration;

    fn default_rule() -> VisibilityRule {
        VisibilityRule {
            band: AccuracyBand {
                target: 70,
                lower: 65,
                upper: 75,
            },
            max_visibility: 1.0,
            min_visibility: None,
        }
    }

    #[test]
    fn accuracy_above_band_lowers_visibility() {
        assert_eq!(default_rule().next_visibility(0.8, 80), 0.78);
    }

    #[test]
    fn accuracy_below_band_raises_visibility() {
        assert_eq!(default_rule().next_visibility(0.5, 60), 0.52);
    }

    #[test]
    fn dead_band_keeps_visibility() {
        let rule = default_rule();
        for accuracy in 65..=75 {
            assert_eq!(rule.next_visibility(0.437, accuracy), 0.437);
        }
    }

    #[test]
    fn raising_clamps_at_max_visibility() {
        // 0.99 + 20/500 would overshoot
        assert_eq!(default_rule().next_visibility(0.99, 50), 1.0);
    }

    #[test]
    fn no_lower_clamp_unless_configured() {
        let rule = default_rule();
        assert!(rule.next_visibility(0.02, 100) < 0.0);

        let clamped = VisibilityRule {
            min_visibility: Some(0.0),
            ..rule
        };
        assert_eq!(clamped.next_visibility(0.02, 100), 0.0);
    }

    #[test]
    fn accuracy_is_rounded_percentage() {
        let mapping = ResponseMapping::default();
        let hit = TrialOutcome::score(
            TrialKind::Signal,
            TrialResponse::pressed('f', Duration::from_millis(300)),
            &mapping,
        );
        let miss = TrialOutcome::score(TrialKind::Noise, TrialResponse::timed_out(), &mapping);

        let result = CycleResult::from_outcomes(&[hit, hit, miss]);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.accuracy_percent(), 67);
        assert_eq!(CycleResult::from_outcomes(&[]).accuracy_percent(), 0);
    }

    #[test]
    fn half_percent_rounds_up() {
        let result = CycleResult {
            trials_in_cycle: 8,
            correct_count: 5,
        };
        assert_eq!(result.accuracy_percent(), 63);
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(0.125), 0.13);
    }

    proptest! {
        #[test]
        fn round2_is_idempotent(x in -10.0f64..10.0) {
            prop_assert_eq!(round2(round2(x)), round2(x));
        }

        #[test]
        fn high_accuracy_strictly_decreases(current in 0.0f64..=1.0, accuracy in 76u32..=100) {
            prop_assert!(default_rule().next_visibility(current, accuracy) < current);
        }

        #[test]
        fn low_accuracy_strictly_increases(current in 0.0f64..=0.9, accuracy in 0u32..65) {
            prop_assert!(default_rule().next_visibility(current, accuracy) > current);
        }

        #[test]
        fn never_exceeds_max_visibility(current in 0.0f64..=1.0, accuracy in 0u32..=100) {
            prop_assert!(default_rule().next_visibility(current, accuracy) <= 1.0);
        }
    }
}
