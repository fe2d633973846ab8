use imadet_core::DEFAULT_INITIAL_VISIBILITY;
use serde::{Deserialize, Serialize};

use crate::accuracy::{AccuracyBand, VisibilityRule};
use crate::error::ConfigError;

/// Staircase parameters for one tilt-class run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaircaseConfig {
    pub initial_visibility: f64,
    pub max_visibility: f64,
    /// Optional lower clamp. Unset by default, so visibility is only bounded
    /// from above.
    pub min_visibility: Option<f64>,
    /// Must be even: half signal, half noise.
    pub trials_per_cycle: usize,
    pub cycles: u32,
    pub accuracy_target: u32,
    pub accuracy_upper_bound: u32,
    pub accuracy_lower_bound: u32,
}

impl Default for StaircaseConfig {
    fn default() -> Self {
        Self {
            initial_visibility: DEFAULT_INITIAL_VISIBILITY,
            max_visibility: 1.0,
            min_visibility: None,
            trials_per_cycle: 10,
            cycles: 12,
            accuracy_target: 70,
            accuracy_upper_bound: 75,
            accuracy_lower_bound: 65,
        }
    }
}

impl StaircaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials_per_cycle == 0 {
            return Err(ConfigError::EmptyBlock("trials_per_cycle"));
        }
        if self.trials_per_cycle % 2 != 0 {
            return Err(ConfigError::OddTrialCount {
                field: "trials_per_cycle",
                value: self.trials_per_cycle,
            });
        }
        if self.cycles == 0 {
            return Err(ConfigError::EmptyBlock("cycles"));
        }
        for (field, value) in [
            ("accuracy_target", self.accuracy_target),
            ("accuracy_upper_bound", self.accuracy_upper_bound),
            ("accuracy_lower_bound", self.accuracy_lower_bound),
        ] {
            check_percent(field, value)?;
        }
        if self.accuracy_lower_bound > self.accuracy_target
            || self.accuracy_target > self.accuracy_upper_bound
        {
            return Err(ConfigError::TargetOutsideBand {
                lower: self.accuracy_lower_bound,
                target: self.accuracy_target,
                upper: self.accuracy_upper_bound,
            });
        }
        check_fraction("max_visibility", self.max_visibility)?;
        if self.max_visibility == 0.0 {
            return Err(ConfigError::VisibilityOutOfRange {
                field: "max_visibility",
                value: self.max_visibility,
            });
        }
        check_fraction("initial_visibility", self.initial_visibility)?;
        if self.initial_visibility > self.max_visibility {
            return Err(ConfigError::VisibilityOutOfRange {
                field: "initial_visibility",
                value: self.initial_visibility,
            });
        }
        if let Some(min) = self.min_visibility {
            check_fraction("min_visibility", min)?;
            if min > self.initial_visibility {
                return Err(ConfigError::VisibilityOutOfRange {
                    field: "min_visibility",
                    value: min,
                });
            }
        }
        Ok(())
    }

    pub fn band(&self) -> AccuracyBand {
        AccuracyBand {
            target: self.accuracy_target,
            lower: self.accuracy_lower_bound,
            upper: self.accuracy_upper_bound,
        }
    }

    pub fn update_rule(&self) -> VisibilityRule {
        VisibilityRule {
            band: self.band(),
            max_visibility: self.max_visibility,
            min_visibility: self.min_visibility,
        }
    }
}

/// Detection practice before calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    /// Copies of {left grating, right grating, noise} per block
    pub repetitions: usize,
    pub initial_visibility: f64,
    pub max_visibility: f64,
    /// Added to the grating visibility after every failed block
    pub increment: f64,
    /// Block accuracy (percent) at which practice ends
    pub pass_accuracy: u32,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            repetitions: 2,
            initial_visibility: DEFAULT_INITIAL_VISIBILITY,
            max_visibility: 1.0,
            increment: 0.02,
            pass_accuracy: 75,
        }
    }
}

impl PracticeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repetitions == 0 {
            return Err(ConfigError::EmptyBlock("repetitions"));
        }
        check_fraction("initial_visibility", self.initial_visibility)?;
        check_fraction("max_visibility", self.max_visibility)?;
        if !self.increment.is_finite() || self.increment <= 0.0 {
            return Err(ConfigError::NonPositiveIncrement(self.increment));
        }
        check_percent("pass_accuracy", self.pass_accuracy)
    }

    pub fn passes(&self, accuracy_percent: u32) -> bool {
        accuracy_percent >= self.pass_accuracy
    }
}

/// Main experiment block layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainConfig {
    /// How often each of the six conditions is run
    pub condition_repetitions: usize,
    /// Must be even: half signal, half noise.
    pub trials_per_condition: usize,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            condition_repetitions: 2,
            trials_per_condition: 50,
        }
    }
}

impl MainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.condition_repetitions == 0 {
            return Err(ConfigError::EmptyBlock("condition_repetitions"));
        }
        if self.trials_per_condition == 0 {
            return Err(ConfigError::EmptyBlock("trials_per_condition"));
        }
        if self.trials_per_condition % 2 != 0 {
            return Err(ConfigError::OddTrialCount {
                field: "trials_per_condition",
                value: self.trials_per_condition,
            });
        }
        Ok(())
    }
}

/// Imagination practice: one block per tilt class of noise-only animations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImaginationConfig {
    pub trials_per_tilt: usize,
    /// How long each noise animation runs
    pub animation_ms: u64,
}

impl Default for ImaginationConfig {
    fn default() -> Self {
        Self {
            trials_per_tilt: 10,
            animation_ms: 2000,
        }
    }
}

impl ImaginationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials_per_tilt == 0 {
            return Err(ConfigError::EmptyBlock("trials_per_tilt"));
        }
        if self.animation_ms == 0 {
            return Err(ConfigError::EmptyBlock("animation_ms"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub practice: PracticeConfig,
    pub staircase: StaircaseConfig,
    pub imagination: ImaginationConfig,
    pub main: MainConfig,
}

impl ExperimentConfig {
    /// Parses a (possibly partial) JSON document; missing fields keep their
    /// defaults. The result is validated.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.practice.validate()?;
        self.staircase.validate()?;
        self.imagination.validate()?;
        self.main.validate()
    }
}

fn check_percent(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value > 100 {
        return Err(ConfigError::PercentOutOfRange { field, value });
    }
    Ok(())
}

fn check_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::VisibilityOutOfRange { field, value });
    }
    Ok(())
}
