pub mod phase;
pub mod stimulus;
pub mod threshold;
pub mod trial;

pub use phase::{Phase, SessionPhase};
pub use stimulus::{StimulusConfig, TiltClass};
pub use threshold::{DEFAULT_INITIAL_VISIBILITY, ThresholdStore};
pub use trial::{ResponseKey, ResponseMapping, TrialKind, TrialOutcome, TrialResponse};
