//! Imagination practice: noise-only animations while the participant imagines
//! a grating of one tilt, each followed by a vividness rating.

use std::time::Duration;

use imadet_core::{ResponseKey, ResponseMapping, StimulusConfig, TiltClass};
use serde::{Deserialize, Serialize};

use crate::config::ImaginationConfig;
use crate::order::TrialOrder;

/// Vividness on the 1 (not vivid at all) to 5 (as vivid as real) scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VividnessRating(u8);

impl VividnessRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Digit keys `1`-`5` rate; any other key or no key at all leaves the
    /// trial unrated.
    pub fn from_response(response: Option<ResponseKey>) -> Option<Self> {
        let digit = response?.0.to_digit(10)?;
        Self::new(u8::try_from(digit).ok()?)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImaginationBlock {
    pub index: usize,
    /// Tilt the participant is asked to imagine
    pub imagine: TiltClass,
    pub trials: Vec<StimulusConfig>,
    pub animation: Duration,
}

/// One rated animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VividnessRecord {
    pub block_index: usize,
    pub trial_index: usize,
    pub imagine: TiltClass,
    pub rating: Option<VividnessRating>,
    pub reaction_time: Option<Duration>,
}

/// One block per tilt class in shuffled order, each `trials_per_tilt`
/// noise-only animations.
pub fn plan_imagination_practice<O: TrialOrder>(
    config: &ImaginationConfig,
    mapping: ResponseMapping,
    order: &mut O,
) -> Vec<ImaginationBlock> {
    let mut tilts = TiltClass::ALL;
    order.permute(&mut tilts);

    tilts
        .into_iter()
        .enumerate()
        .map(|(index, imagine)| ImaginationBlock {
            index,
            imagine,
            trials: vec![StimulusConfig::noise(0.0, mapping); config.trials_per_tilt],
            animation: Duration::from_millis(config.animation_ms),
        })
        .collect()
}

/// Mean of the rated trials, `None` when nothing was rated.
pub fn mean_vividness(records: &[VividnessRecord]) -> Option<f64> {
    let rated: Vec<f64> = records
        .iter()
        .filter_map(|r| r.rating.map(|v| f64::from(v.value())))
        .collect();
    if rated.is_empty() {
        return None;
    }
    Some(rated.iter().sum::<f64>() / rated.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{FixedOrder, ShuffledOrder};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn one_noise_block_per_tilt() {
        let blocks = plan_imagination_practice(
            &ImaginationConfig::default(),
            ResponseMapping::default(),
            &mut FixedOrder,
        );
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].imagine, TiltClass::Left);
        assert_eq!(blocks[1].imagine, TiltClass::Right);
        for block in &blocks {
            assert_eq!(block.trials.len(), 10);
            assert_eq!(block.animation, Duration::from_millis(2000));
            assert!(block.trials.iter().all(|s| !s.has_grating()));
        }
    }

    #[test]
    fn shuffled_order_still_covers_both_tilts() {
        for seed in 0..16 {
            let mut order = ShuffledOrder::new(ChaCha8Rng::seed_from_u64(seed));
            let blocks = plan_imagination_practice(
                &ImaginationConfig {
                    trials_per_tilt: 3,
                    ..Default::default()
                },
                ResponseMapping::default(),
                &mut order,
            );
            let mut tilts: Vec<TiltClass> = blocks.iter().map(|b| b.imagine).collect();
            assert_ne!(tilts[0], tilts[1]);
            tilts.sort_by_key(|t| t.label());
            assert_eq!(tilts, vec![TiltClass::Left, TiltClass::Right]);
            assert_eq!(blocks.iter().map(|b| b.index).collect::<Vec<_>>(), vec![0, 1]);
        }
    }

    #[test]
    fn rating_keys_map_onto_the_scale() {
        assert_eq!(
            VividnessRating::from_response(Some(ResponseKey('1'))),
            VividnessRating::new(1)
        );
        assert_eq!(
            VividnessRating::from_response(Some(ResponseKey('5'))).map(VividnessRating::value),
            Some(5)
        );
        assert_eq!(VividnessRating::from_response(Some(ResponseKey('0'))), None);
        assert_eq!(VividnessRating::from_response(Some(ResponseKey('6'))), None);
        assert_eq!(VividnessRating::from_response(Some(ResponseKey('f'))), None);
        assert_eq!(VividnessRating::from_response(None), None);
    }

    #[test]
    fn mean_skips_unrated_trials() {
        let record = |rating| VividnessRecord {
            block_index: 0,
            trial_index: 0,
            imagine: TiltClass::Left,
            rating: VividnessRating::new(rating),
            reaction_time: None,
        };
        assert_eq!(mean_vividness(&[]), None);
        assert_eq!(mean_vividness(&[record(0)]), None);
        assert_eq!(mean_vividness(&[record(2), record(0), record(5)]), Some(3.5));
    }
}
