use serde::{Deserialize, Serialize};

use crate::trial::ResponseMapping;

/// The two grating categories calibrated independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TiltClass {
    Left,
    Right,
}

impl TiltClass {
    pub const ALL: [TiltClass; 2] = [TiltClass::Left, TiltClass::Right];

    /// Grating rotation in degrees
    pub fn rotation_deg(self) -> f64 {
        match self {
            TiltClass::Left => 45.0,
            TiltClass::Right => 135.0,
        }
    }

    pub fn from_rotation(rotation_deg: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tilt| tilt.rotation_deg() == rotation_deg)
    }

    pub fn label(self) -> &'static str {
        match self {
            TiltClass::Left => "left",
            TiltClass::Right => "right",
        }
    }
}

impl std::fmt::Display for TiltClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What the trial runner needs to present one noise animation.
///
/// `opacity` is the grating opacity as a fraction of the maximum; noise-only
/// trials carry `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusConfig {
    pub opacity: f64,
    pub rotation_deg: f64,
    pub choices: ResponseMapping,
}

impl StimulusConfig {
    pub fn grating(tilt: TiltClass, opacity: f64, choices: ResponseMapping) -> Self {
        Self {
            opacity,
            rotation_deg: tilt.rotation_deg(),
            choices,
        }
    }

    pub fn noise(rotation_deg: f64, choices: ResponseMapping) -> Self {
        Self {
            opacity: 0.0,
            rotation_deg,
            choices,
        }
    }

    pub fn has_grating(&self) -> bool {
        self.opacity > 0.0
    }
}
