pub mod accuracy;
pub mod config;
pub mod error;
pub mod imagination;
pub mod main_plan;
pub mod order;
pub mod practice;
pub mod runner;
pub mod session;
pub mod staircase;
pub mod trial;

pub use accuracy::{AccuracyBand, CycleResult, VisibilityRule, round2};
pub use config::{ExperimentConfig, ImaginationConfig, MainConfig, PracticeConfig, StaircaseConfig};
pub use error::{ConfigError, ExperimentError, SessionAborted};
pub use imagination::{
    ImaginationBlock, VividnessRating, VividnessRecord, mean_vividness, plan_imagination_practice,
};
pub use main_plan::{Condition, Imagery, MainBlock, plan_main_experiment};
pub use order::{FixedOrder, ShuffledOrder, TrialOrder};
pub use practice::{BlockRecord, PracticeGate, PracticeState};
pub use runner::TrialRunner;
pub use session::{
    CalibrationReport, CalibrationSession, ImaginationReport, PracticeReport, StaircaseRunReport,
};
pub use staircase::{CycleRecord, StaircaseController, StaircaseState};
pub use trial::{TrialSpec, TrialStep};
