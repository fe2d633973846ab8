use imadet_core::SessionPhase;
use thiserror::Error;

/// Rejected configuration, raised before any trial runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    EmptyBlock(&'static str),

    #[error("{field} must be even to split signal and noise trials, got {value}")]
    OddTrialCount { field: &'static str, value: usize },

    #[error("{field} must be a percentage in 0..=100, got {value}")]
    PercentOutOfRange { field: &'static str, value: u32 },

    #[error("accuracy target {target} must lie within [{lower}, {upper}]")]
    TargetOutsideBand { lower: u32, target: u32, upper: u32 },

    #[error("{field} must be a visibility fraction in [0, 1], got {value}")]
    VisibilityOutOfRange { field: &'static str, value: f64 },

    #[error("practice increment must be positive, got {0}")]
    NonPositiveIncrement(f64),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Reported by a trial runner when the participant quits mid-session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("participant aborted the session")]
pub struct SessionAborted;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExperimentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A state machine method was called out of order.
    #[error("cannot {action} in state {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("{source} during {phase:?}")]
    Aborted {
        phase: SessionPhase,
        #[source]
        source: SessionAborted,
    },
}

impl ExperimentError {
    pub(crate) fn aborted(phase: SessionPhase) -> impl FnOnce(SessionAborted) -> Self {
        move |source| Self::Aborted { phase, source }
    }
}
