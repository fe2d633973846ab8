//! Main-experiment blocks built from the calibrated thresholds.

use imadet_core::{ResponseKey, ResponseMapping, StimulusConfig, ThresholdStore, TiltClass, TrialKind};
use serde::{Deserialize, Serialize};

use crate::config::MainConfig;
use crate::order::TrialOrder;
use crate::trial::{TrialSpec, balanced_kinds};

/// What the participant is asked to imagine during a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Imagery {
    Nothing,
    Left,
    Right,
}

impl Imagery {
    /// Key expected in the imagery check after the block
    pub fn check_key(self) -> ResponseKey {
        match self {
            Imagery::Nothing => ResponseKey('n'),
            Imagery::Left => ResponseKey('l'),
            Imagery::Right => ResponseKey('r'),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Imagery::Nothing => "nothing",
            Imagery::Left => "left",
            Imagery::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    /// Tilt of the gratings actually shown
    pub display: TiltClass,
    pub imagine: Imagery,
}

impl Condition {
    pub const ALL: [Condition; 6] = [
        Condition::new(TiltClass::Left, Imagery::Nothing),
        Condition::new(TiltClass::Left, Imagery::Left),
        Condition::new(TiltClass::Left, Imagery::Right),
        Condition::new(TiltClass::Right, Imagery::Nothing),
        Condition::new(TiltClass::Right, Imagery::Left),
        Condition::new(TiltClass::Right, Imagery::Right),
    ];

    pub const fn new(display: TiltClass, imagine: Imagery) -> Self {
        Self { display, imagine }
    }

    /// e.g. `display_left_imagine_nothing`
    pub fn name(&self) -> String {
        format!("display_{}_imagine_{}", self.display.label(), self.imagine.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainBlock {
    pub index: usize,
    pub condition: Condition,
    pub trials: Vec<TrialSpec>,
}

impl MainBlock {
    pub fn score_imagery_check(&self, response: Option<ResponseKey>) -> bool {
        response == Some(self.condition.imagine.check_key())
    }
}

/// Every condition `condition_repetitions` times in shuffled order. Gratings
/// are shown at the participant's threshold for the displayed tilt; noise
/// trials carry no rotation.
pub fn plan_main_experiment<O: TrialOrder>(
    config: &MainConfig,
    thresholds: &ThresholdStore,
    mapping: ResponseMapping,
    order: &mut O,
) -> Vec<MainBlock> {
    let mut conditions: Vec<Condition> = (0..config.condition_repetitions)
        .flat_map(|_| Condition::ALL)
        .collect();
    order.permute(&mut conditions);

    conditions
        .into_iter()
        .enumerate()
        .map(|(index, condition)| {
            let opacity = thresholds.get(condition.display);
            let trials = balanced_kinds(config.trials_per_condition, &mut *order)
                .into_iter()
                .enumerate()
                .map(|(i, kind)| TrialSpec {
                    index: i,
                    kind,
                    stimulus: match kind {
                        TrialKind::Signal => {
                            StimulusConfig::grating(condition.display, opacity, mapping)
                        }
                        TrialKind::Noise => StimulusConfig::noise(0.0, mapping),
                    },
                })
                .collect();
            MainBlock {
                index,
                condition,
                trials,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{FixedOrder, ShuffledOrder};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    #[test]
    fn signal_opacity_comes_from_threshold_store() {
        let store = ThresholdStore::new(Some(0.41), Some(0.63));
        let blocks = plan_main_experiment(
            &MainConfig::default(),
            &store,
            ResponseMapping::default(),
            &mut FixedOrder,
        );
        assert_eq!(blocks.len(), 12);

        for block in &blocks {
            let expected = store.get(block.condition.display);
            assert_eq!(block.trials.len(), 50);
            for trial in &block.trials {
                match trial.kind {
                    TrialKind::Signal => {
                        assert_eq!(trial.stimulus.opacity, expected);
                        assert_eq!(trial.stimulus.rotation_deg, block.condition.display.rotation_deg());
                    }
                    TrialKind::Noise => {
                        assert_eq!(trial.stimulus.opacity, 0.0);
                        assert_eq!(trial.stimulus.rotation_deg, 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn each_condition_appears_once_per_repetition() {
        let mut order = ShuffledOrder::new(ChaCha8Rng::seed_from_u64(11));
        let blocks = plan_main_experiment(
            &MainConfig {
                condition_repetitions: 3,
                trials_per_condition: 4,
            },
            &ThresholdStore::default(),
            ResponseMapping::default(),
            &mut order,
        );
        let mut counts: HashMap<Condition, usize> = HashMap::new();
        for block in &blocks {
            *counts.entry(block.condition).or_default() += 1;
            let signals = block
                .trials
                .iter()
                .filter(|t| t.kind == TrialKind::Signal)
                .count();
            assert_eq!(signals, 2);
        }
        assert_eq!(counts.len(), 6);
        assert!(counts.values().all(|&n| n == 3));
    }

    #[test]
    fn imagery_check_expects_condition_key() {
        let block = MainBlock {
            index: 0,
            condition: Condition::new(TiltClass::Right, Imagery::Left),
            trials: Vec::new(),
        };
        assert_eq!(block.condition.name(), "display_right_imagine_left");
        assert!(block.score_imagery_check(Some(ResponseKey('L'))));
        assert!(!block.score_imagery_check(Some(ResponseKey('n'))));
        assert!(!block.score_imagery_check(None));
    }
}
