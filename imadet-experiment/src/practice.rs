use imadet_core::{
    ResponseMapping, StimulusConfig, TiltClass, TrialKind, TrialOutcome, TrialResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::accuracy::CycleResult;
use crate::config::PracticeConfig;
use crate::error::{ConfigError, ExperimentError};
use crate::order::TrialOrder;
use crate::trial::{TrialSpec, TrialStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PracticeState {
    RunningBlock,
    Evaluating,
    Done,
}

impl PracticeState {
    fn name(self) -> &'static str {
        match self {
            Self::RunningBlock => "RunningBlock",
            Self::Evaluating => "Evaluating",
            Self::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PracticeItem {
    Grating(TiltClass),
    Noise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub block_index: u32,
    pub visibility: f64,
    pub trials: usize,
    pub correct_count: usize,
    pub accuracy_percent: u32,
    pub passed: bool,
}

/// Repeats practice blocks until one reaches the pass accuracy, making the
/// gratings more visible after every failed block. There is no block limit.
#[derive(Debug, Clone)]
pub struct PracticeGate {
    config: PracticeConfig,
    mapping: ResponseMapping,
    state: PracticeState,
    offset: f64,
    blocks_completed: u32,
    plan: Vec<PracticeItem>,
    outcomes: Vec<TrialOutcome>,
    records: Vec<BlockRecord>,
}

impl PracticeGate {
    /// Validates `config` and plans the first block.
    pub fn new<O: TrialOrder>(
        config: PracticeConfig,
        mapping: ResponseMapping,
        order: &mut O,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut gate = Self {
            config,
            mapping,
            state: PracticeState::RunningBlock,
            offset: 0.0,
            blocks_completed: 0,
            plan: Vec::new(),
            outcomes: Vec::new(),
            records: Vec::new(),
        };
        gate.start_block(order);
        Ok(gate)
    }

    /// Grating opacity for the current block
    pub fn visibility(&self) -> f64 {
        (self.config.initial_visibility + self.offset).min(self.config.max_visibility)
    }

    pub fn next_trial(&self) -> Option<TrialSpec> {
        if self.state != PracticeState::RunningBlock {
            return None;
        }
        let index = self.outcomes.len();
        let item = *self.plan.get(index)?;
        let (kind, stimulus) = match item {
            PracticeItem::Grating(tilt) => (
                TrialKind::Signal,
                StimulusConfig::grating(tilt, self.visibility(), self.mapping),
            ),
            PracticeItem::Noise => (
                TrialKind::Noise,
                StimulusConfig::noise(TiltClass::Left.rotation_deg(), self.mapping),
            ),
        };
        Some(TrialSpec {
            index,
            kind,
            stimulus,
        })
    }

    pub fn record_response(&mut self, response: TrialResponse) -> Result<TrialStep, ExperimentError> {
        if self.state != PracticeState::RunningBlock {
            return Err(self.invalid("record a response"));
        }
        let kind = match self.plan[self.outcomes.len()] {
            PracticeItem::Grating(_) => TrialKind::Signal,
            PracticeItem::Noise => TrialKind::Noise,
        };
        let outcome = TrialOutcome::score(kind, response, &self.mapping);
        debug!(
            block = self.blocks_completed,
            trial = self.outcomes.len(),
            correct = outcome.correct,
            "practice trial scored"
        );
        self.outcomes.push(outcome);

        if self.outcomes.len() == self.plan.len() {
            self.state = PracticeState::Evaluating;
            Ok(TrialStep::BlockComplete)
        } else {
            Ok(TrialStep::Continue)
        }
    }

    /// Scores the finished block: done if it passed, otherwise bumps the
    /// visibility and plans another block.
    pub fn evaluate<O: TrialOrder>(&mut self, order: &mut O) -> Result<BlockRecord, ExperimentError> {
        if self.state != PracticeState::Evaluating {
            return Err(self.invalid("evaluate a block"));
        }
        let result = CycleResult::from_outcomes(&self.outcomes);
        let record = self.apply_accuracy(result);
        if self.state == PracticeState::RunningBlock {
            self.start_block(order);
        }
        Ok(record)
    }

    fn apply_accuracy(&mut self, result: CycleResult) -> BlockRecord {
        let accuracy_percent = result.accuracy_percent();
        let passed = self.config.passes(accuracy_percent);
        let record = BlockRecord {
            block_index: self.blocks_completed,
            visibility: self.visibility(),
            trials: result.trials_in_cycle,
            correct_count: result.correct_count,
            accuracy_percent,
            passed,
        };
        info!(
            block = record.block_index,
            accuracy = accuracy_percent,
            visibility = record.visibility,
            passed,
            "practice block evaluated"
        );
        self.records.push(record.clone());
        self.blocks_completed += 1;

        if passed {
            self.state = PracticeState::Done;
        } else {
            self.offset += self.config.increment;
            self.state = PracticeState::RunningBlock;
        }
        record
    }

    fn start_block<O: TrialOrder>(&mut self, order: &mut O) {
        let mut plan = Vec::with_capacity(self.config.repetitions * 3);
        for _ in 0..self.config.repetitions {
            plan.extend([
                PracticeItem::Grating(TiltClass::Left),
                PracticeItem::Grating(TiltClass::Right),
                PracticeItem::Noise,
            ]);
        }
        order.permute(&mut plan);
        self.plan = plan;
        self.outcomes.clear();
    }

    fn invalid(&self, action: &'static str) -> ExperimentError {
        ExperimentError::InvalidState {
            action,
            state: self.state.name(),
        }
    }

    pub fn state(&self) -> PracticeState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == PracticeState::Done
    }

    pub fn blocks_completed(&self) -> u32 {
        self.blocks_completed
    }

    pub fn records(&self) -> &[BlockRecord] {
        &self.records
    }
}
