use imadet_core::{ResponseMapping, SessionPhase, ThresholdStore, TiltClass};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ExperimentConfig;
use crate::error::{ConfigError, ExperimentError};
use crate::imagination::{VividnessRating, VividnessRecord, mean_vividness, plan_imagination_practice};
use crate::main_plan::{MainBlock, plan_main_experiment};
use crate::order::TrialOrder;
use crate::practice::{BlockRecord, PracticeGate};
use crate::runner::TrialRunner;
use crate::staircase::{CycleRecord, StaircaseController};
use crate::trial::TrialStep;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeReport {
    pub blocks: Vec<BlockRecord>,
    pub final_visibility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaircaseRunReport {
    pub tilt_class: TiltClass,
    pub cycles: Vec<CycleRecord>,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub order: [TiltClass; 2],
    pub runs: Vec<StaircaseRunReport>,
    pub thresholds: ThresholdStore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImaginationReport {
    pub order: [TiltClass; 2],
    pub ratings: Vec<VividnessRecord>,
    pub mean_vividness: Option<f64>,
}

/// One participant session: a validated configuration and a fixed response
/// mapping. The threshold store is owned by the caller and lent to the
/// calibration (writer) and the main plan (reader).
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    config: ExperimentConfig,
    mapping: ResponseMapping,
}

impl CalibrationSession {
    pub fn new(config: ExperimentConfig, mapping: ResponseMapping) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, mapping })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn mapping(&self) -> ResponseMapping {
        self.mapping
    }

    /// Order in which the two tilt classes are calibrated
    pub fn tilt_order<O: TrialOrder>(&self, order: &mut O) -> [TiltClass; 2] {
        let mut tilts = TiltClass::ALL;
        order.permute(&mut tilts);
        tilts
    }

    pub fn run_practice<R, O>(&self, runner: &mut R, order: &mut O) -> Result<PracticeReport, ExperimentError>
    where
        R: TrialRunner,
        O: TrialOrder,
    {
        let mut gate = PracticeGate::new(self.config.practice.clone(), self.mapping, order)?;
        while !gate.is_done() {
            while let Some(trial) = gate.next_trial() {
                let response = runner
                    .run_trial(&trial.stimulus)
                    .map_err(ExperimentError::aborted(SessionPhase::PracticeDetection))?;
                if gate.record_response(response)? == TrialStep::BlockComplete {
                    break;
                }
            }
            gate.evaluate(order)?;
        }
        Ok(PracticeReport {
            blocks: gate.records().to_vec(),
            final_visibility: gate.visibility(),
        })
    }

    /// Runs one full staircase. The store is only written once every cycle
    /// of the run has completed.
    pub fn run_staircase<R, O>(
        &self,
        tilt: TiltClass,
        store: &mut ThresholdStore,
        runner: &mut R,
        order: &mut O,
    ) -> Result<StaircaseRunReport, ExperimentError>
    where
        R: TrialRunner,
        O: TrialOrder,
    {
        let mut staircase = StaircaseController::new(tilt, self.config.staircase.clone(), self.mapping)?;
        staircase.begin(order)?;
        while !staircase.is_done() {
            while let Some(trial) = staircase.next_trial() {
                let response = runner
                    .run_trial(&trial.stimulus)
                    .map_err(ExperimentError::aborted(SessionPhase::Staircase))?;
                if staircase.record_response(response)? == TrialStep::BlockComplete {
                    break;
                }
            }
            staircase.evaluate(store, order)?;
        }
        Ok(StaircaseRunReport {
            tilt_class: tilt,
            cycles: staircase.records().to_vec(),
            threshold: store.get(tilt),
        })
    }

    /// Calibrates both tilt classes in randomized order.
    pub fn run_calibration<R, O>(
        &self,
        store: &mut ThresholdStore,
        runner: &mut R,
        order: &mut O,
    ) -> Result<CalibrationReport, ExperimentError>
    where
        R: TrialRunner,
        O: TrialOrder,
    {
        let tilts = self.tilt_order(order);
        info!(first = %tilts[0], second = %tilts[1], "calibration order drawn");

        let mut runs = Vec::with_capacity(tilts.len());
        for tilt in tilts {
            runs.push(self.run_staircase(tilt, store, runner, order)?);
        }
        Ok(CalibrationReport {
            order: tilts,
            runs,
            thresholds: *store,
        })
    }

    /// Noise animations while the participant imagines each tilt in turn,
    /// rated after every animation.
    pub fn run_imagination_practice<R, O>(
        &self,
        runner: &mut R,
        order: &mut O,
    ) -> Result<ImaginationReport, ExperimentError>
    where
        R: TrialRunner,
        O: TrialOrder,
    {
        let blocks = plan_imagination_practice(&self.config.imagination, self.mapping, order);
        let aborted = || ExperimentError::aborted(SessionPhase::PracticeImagination);

        let mut ratings = Vec::with_capacity(blocks.iter().map(|b| b.trials.len()).sum());
        for block in &blocks {
            info!(block = block.index, imagine = %block.imagine, "imagination block started");
            for (trial_index, stimulus) in block.trials.iter().enumerate() {
                runner.present(stimulus, block.animation).map_err(aborted())?;
                let response = runner.rate_vividness(block.imagine).map_err(aborted())?;
                ratings.push(VividnessRecord {
                    block_index: block.index,
                    trial_index,
                    imagine: block.imagine,
                    rating: VividnessRating::from_response(response.response),
                    reaction_time: response.reaction_time,
                });
            }
        }
        Ok(ImaginationReport {
            order: [blocks[0].imagine, blocks[1].imagine],
            mean_vividness: mean_vividness(&ratings),
            ratings,
        })
    }

    pub fn main_plan<O: TrialOrder>(&self, store: &ThresholdStore, order: &mut O) -> Vec<MainBlock> {
        plan_main_experiment(&self.config.main, store, self.mapping, order)
    }
}
