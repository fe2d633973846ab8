use serde::{Deserialize, Serialize};

use crate::stimulus::TiltClass;

/// Starting grating visibility before any calibration
pub const DEFAULT_INITIAL_VISIBILITY: f64 = 0.8;

/// Per-participant detection thresholds, one per tilt class.
///
/// One instance lives for the whole session. The staircase writes each class
/// once when its run completes; the main experiment reads them afterwards.
/// Values are stored as given: bounding them to `[0, 1]` is up to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStore {
    left: f64,
    right: f64,
}

impl ThresholdStore {
    /// `None` falls back to [`DEFAULT_INITIAL_VISIBILITY`].
    pub fn new(initial_left: Option<f64>, initial_right: Option<f64>) -> Self {
        Self {
            left: initial_left.unwrap_or(DEFAULT_INITIAL_VISIBILITY),
            right: initial_right.unwrap_or(DEFAULT_INITIAL_VISIBILITY),
        }
    }

    pub fn get(&self, tilt: TiltClass) -> f64 {
        match tilt {
            TiltClass::Left => self.left,
            TiltClass::Right => self.right,
        }
    }

    pub fn set(&mut self, tilt: TiltClass, value: f64) {
        match tilt {
            TiltClass::Left => self.left = value,
            TiltClass::Right => self.right = value,
        }
    }
}

impl Default for ThresholdStore {
    fn default() -> Self {
        Self::new(None, None)
    }
}
