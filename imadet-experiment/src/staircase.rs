use imadet_core::{
    ResponseMapping, StimulusConfig, ThresholdStore, TiltClass, TrialKind, TrialOutcome,
    TrialResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::accuracy::{CycleResult, VisibilityRule};
use crate::config::StaircaseConfig;
use crate::error::{ConfigError, ExperimentError};
use crate::order::TrialOrder;
use crate::trial::{TrialSpec, TrialStep, balanced_kinds};

/// Staircase state machine events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaircaseState {
    Instructing,
    RunningCycle,
    Evaluating,
    Committing,
    Done,
}

impl StaircaseState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Instructing => "Instructing",
            Self::RunningCycle => "RunningCycle",
            Self::Evaluating => "Evaluating",
            Self::Committing => "Committing",
            Self::Done => "Done",
        }
    }
}

/// Logged once per evaluated cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub tilt_class: TiltClass,
    pub cycle_index: u32,
    /// Visibility the cycle was run at
    pub visibility: f64,
    pub correct_count: usize,
    pub accuracy_percent: u32,
    pub new_visibility: f64,
}

/// Adaptive staircase for one tilt class.
///
/// Drive it with [`begin`](Self::begin), then alternate
/// [`next_trial`](Self::next_trial) / [`record_response`](Self::record_response)
/// until a cycle is complete, then call [`evaluate`](Self::evaluate). After
/// `cycles` evaluations the final visibility is written to the store and the
/// controller is [`StaircaseState::Done`].
#[derive(Debug, Clone)]
pub struct StaircaseController {
    tilt: TiltClass,
    config: StaircaseConfig,
    rule: VisibilityRule,
    mapping: ResponseMapping,
    state: StaircaseState,
    current_visibility: f64,
    cycles_completed: u32,
    plan: Vec<TrialKind>,
    outcomes: Vec<TrialOutcome>,
    records: Vec<CycleRecord>,
}

impl StaircaseController {
    pub fn new(
        tilt: TiltClass,
        config: StaircaseConfig,
        mapping: ResponseMapping,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tilt,
            rule: config.update_rule(),
            current_visibility: config.initial_visibility,
            plan: Vec::with_capacity(config.trials_per_cycle),
            outcomes: Vec::with_capacity(config.trials_per_cycle),
            config,
            mapping,
            state: StaircaseState::Instructing,
            cycles_completed: 0,
            records: Vec::new(),
        })
    }

    /// Leaves the instruction screen and plans the first cycle.
    pub fn begin<O: TrialOrder>(&mut self, order: &mut O) -> Result<(), ExperimentError> {
        self.expect_state(StaircaseState::Instructing, "begin a staircase run")?;
        self.current_visibility = self.config.initial_visibility;
        self.cycles_completed = 0;
        self.records.clear();
        self.start_cycle(order);
        info!(
            tilt = %self.tilt,
            visibility = self.current_visibility,
            cycles = self.config.cycles,
            "staircase run started"
        );
        Ok(())
    }

    /// The next trial of the running cycle, if any remain.
    pub fn next_trial(&self) -> Option<TrialSpec> {
        if self.state != StaircaseState::RunningCycle {
            return None;
        }
        let index = self.outcomes.len();
        let &kind = self.plan.get(index)?;
        let stimulus = match kind {
            TrialKind::Signal => {
                StimulusConfig::grating(self.tilt, self.current_visibility, self.mapping)
            }
            TrialKind::Noise => StimulusConfig::noise(self.tilt.rotation_deg(), self.mapping),
        };
        Some(TrialSpec {
            index,
            kind,
            stimulus,
        })
    }

    /// Scores the response to [`next_trial`](Self::next_trial).
    pub fn record_response(&mut self, response: TrialResponse) -> Result<TrialStep, ExperimentError> {
        self.expect_state(StaircaseState::RunningCycle, "record a response")?;
        let index = self.outcomes.len();
        let kind = self.plan[index];
        let outcome = TrialOutcome::score(kind, response, &self.mapping);
        debug!(
            tilt = %self.tilt,
            cycle = self.cycles_completed,
            trial = index,
            ?kind,
            correct = outcome.correct,
            "staircase trial scored"
        );
        self.outcomes.push(outcome);

        if self.outcomes.len() == self.plan.len() {
            self.state = StaircaseState::Evaluating;
            Ok(TrialStep::BlockComplete)
        } else {
            Ok(TrialStep::Continue)
        }
    }

    /// Scores the finished cycle and either plans the next one or commits the
    /// threshold for this tilt class.
    pub fn evaluate<O: TrialOrder>(
        &mut self,
        store: &mut ThresholdStore,
        order: &mut O,
    ) -> Result<CycleRecord, ExperimentError> {
        self.expect_state(StaircaseState::Evaluating, "evaluate a cycle")?;

        let result = CycleResult::from_outcomes(&self.outcomes);
        let accuracy_percent = result.accuracy_percent();
        let new_visibility = self
            .rule
            .next_visibility(self.current_visibility, accuracy_percent);

        let record = CycleRecord {
            tilt_class: self.tilt,
            cycle_index: self.cycles_completed,
            visibility: self.current_visibility,
            correct_count: result.correct_count,
            accuracy_percent,
            new_visibility,
        };
        info!(
            tilt = %self.tilt,
            cycle = record.cycle_index,
            accuracy = accuracy_percent,
            visibility = record.visibility,
            new_visibility,
            "staircase cycle evaluated"
        );
        self.records.push(record.clone());

        self.cycles_completed += 1;
        if self.cycles_completed >= self.config.cycles {
            // the last cycle's suggestion is logged only
            self.state = StaircaseState::Committing;
            self.commit(store);
        } else {
            if new_visibility < 0.0 {
                warn!(
                    tilt = %self.tilt,
                    new_visibility,
                    "staircase visibility dropped below zero"
                );
            }
            self.current_visibility = new_visibility;
            self.start_cycle(order);
        }
        Ok(record)
    }

    fn commit(&mut self, store: &mut ThresholdStore) {
        store.set(self.tilt, self.current_visibility);
        info!(
            tilt = %self.tilt,
            threshold = self.current_visibility,
            "staircase threshold committed"
        );
        self.current_visibility = self.config.initial_visibility;
        self.cycles_completed = 0;
        self.plan.clear();
        self.outcomes.clear();
        self.state = StaircaseState::Done;
    }

    /// Rearms a finished controller for another run of the same tilt class.
    pub fn reset(&mut self) -> Result<(), ExperimentError> {
        self.expect_state(StaircaseState::Done, "reset the staircase")?;
        self.state = StaircaseState::Instructing;
        Ok(())
    }

    fn start_cycle<O: TrialOrder>(&mut self, order: &mut O) {
        self.plan = balanced_kinds(self.config.trials_per_cycle, order);
        self.outcomes.clear();
        self.state = StaircaseState::RunningCycle;
    }

    fn expect_state(
        &self,
        expected: StaircaseState,
        action: &'static str,
    ) -> Result<(), ExperimentError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ExperimentError::InvalidState {
                action,
                state: self.state.name(),
            })
        }
    }

    pub fn tilt(&self) -> TiltClass {
        self.tilt
    }

    pub fn state(&self) -> StaircaseState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == StaircaseState::Done
    }

    pub fn current_visibility(&self) -> f64 {
        self.current_visibility
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    /// Trial kinds planned for the running cycle
    pub fn cycle_plan(&self) -> &[TrialKind] {
        &self.plan
    }

    pub fn records(&self) -> &[CycleRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{FixedOrder, ShuffledOrder};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    fn controller(tilt: TiltClass, cycles: u32) -> StaircaseController {
        let config = StaircaseConfig {
            cycles,
            ..Default::default()
        };
        StaircaseController::new(tilt, config, ResponseMapping::new('f', 'j')).unwrap()
    }

    /// Answers the first `correct` trials of the cycle right, the rest wrong.
    fn run_cycle(ctl: &mut StaircaseController, correct: usize) {
        let mut answered = 0;
        while let Some(trial) = ctl.next_trial() {
            let right = trial.stimulus.choices.expected(trial.kind);
            let wrong = if right == trial.stimulus.choices.present {
                trial.stimulus.choices.absent
            } else {
                trial.stimulus.choices.present
            };
            let key = if answered < correct { right } else { wrong };
            answered += 1;
            ctl.record_response(TrialResponse::pressed(key.0, Duration::from_millis(450)))
                .unwrap();
        }
    }

    #[test]
    fn cycle_presents_tilted_grating_at_current_visibility() {
        let mut ctl = controller(TiltClass::Right, 3);
        ctl.begin(&mut FixedOrder).unwrap();
        assert_eq!(ctl.state(), StaircaseState::RunningCycle);

        let trial = ctl.next_trial().unwrap();
        assert_eq!(trial.kind, TrialKind::Signal);
        assert_eq!(trial.stimulus.opacity, 0.8);
        assert_eq!(trial.stimulus.rotation_deg, 135.0);

        let kinds = ctl.cycle_plan();
        assert_eq!(kinds.iter().filter(|k| **k == TrialKind::Noise).count(), 5);
    }

    #[test]
    fn shuffled_cycles_stay_balanced() {
        let mut store = ThresholdStore::default();
        let mut order = ShuffledOrder::new(ChaCha8Rng::seed_from_u64(21));
        let mut ctl = controller(TiltClass::Left, 12);
        ctl.begin(&mut order).unwrap();

        let mut cycles = 0;
        while !ctl.is_done() {
            let plan = ctl.cycle_plan();
            assert_eq!(plan.len(), 10);
            assert_eq!(plan.iter().filter(|k| **k == TrialKind::Signal).count(), 5);
            assert_eq!(plan.iter().filter(|k| **k == TrialKind::Noise).count(), 5);
            run_cycle(&mut ctl, 7);
            ctl.evaluate(&mut store, &mut order).unwrap();
            cycles += 1;
        }
        assert_eq!(cycles, 12);
        assert_eq!(ctl.records().len(), 12);
    }

    #[test]
    fn easy_cycle_lowers_visibility() {
        let mut store = ThresholdStore::default();
        let mut ctl = controller(TiltClass::Left, 3);
        ctl.begin(&mut FixedOrder).unwrap();

        run_cycle(&mut ctl, 8);
        assert_eq!(ctl.state(), StaircaseState::Evaluating);
        let record = ctl.evaluate(&mut store, &mut FixedOrder).unwrap();

        assert_eq!(record.accuracy_percent, 80);
        assert_eq!(record.new_visibility, 0.78);
        assert_eq!(ctl.current_visibility(), 0.78);
        assert_eq!(ctl.cycles_completed(), 1);
        assert_eq!(ctl.state(), StaircaseState::RunningCycle);
    }

    #[test]
    fn commits_after_target_cycles_and_leaves_other_class_alone() {
        let mut store = ThresholdStore::new(None, Some(0.55));
        let mut ctl = controller(TiltClass::Left, 3);
        ctl.begin(&mut FixedOrder).unwrap();

        for _ in 0..3 {
            assert_eq!(store.get(TiltClass::Left), 0.8);
            run_cycle(&mut ctl, 10);
            ctl.evaluate(&mut store, &mut FixedOrder).unwrap();
        }

        assert!(ctl.is_done());
        // 100% twice applied: 0.8 -> 0.74 -> 0.68, third suggestion logged only
        assert_eq!(store.get(TiltClass::Left), 0.68);
        assert_eq!(store.get(TiltClass::Right), 0.55);
        assert_eq!(ctl.records().len(), 3);
        assert_eq!(ctl.records()[2].new_visibility, 0.62);
        assert_eq!(ctl.current_visibility(), 0.8);
        assert_eq!(ctl.cycles_completed(), 0);
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let mut store = ThresholdStore::default();
        let mut ctl = controller(TiltClass::Left, 1);
        assert!(ctl.next_trial().is_none());
        assert_eq!(
            ctl.record_response(TrialResponse::timed_out()),
            Err(ExperimentError::InvalidState {
                action: "record a response",
                state: "Instructing"
            })
        );

        ctl.begin(&mut FixedOrder).unwrap();
        assert!(ctl.evaluate(&mut store, &mut FixedOrder).is_err());
        assert!(ctl.begin(&mut FixedOrder).is_err());
    }

    #[test]
    fn finished_controller_can_run_again() {
        let mut store = ThresholdStore::default();
        let mut ctl = controller(TiltClass::Left, 1);
        ctl.begin(&mut FixedOrder).unwrap();
        run_cycle(&mut ctl, 5);
        ctl.evaluate(&mut store, &mut FixedOrder).unwrap();
        assert!(ctl.is_done());

        ctl.reset().unwrap();
        ctl.begin(&mut FixedOrder).unwrap();
        assert_eq!(ctl.current_visibility(), 0.8);
        assert!(ctl.records().is_empty());
    }

    #[test]
    fn timeouts_count_as_errors() {
        let mut store = ThresholdStore::default();
        let mut ctl = controller(TiltClass::Left, 2);
        ctl.begin(&mut FixedOrder).unwrap();
        while ctl.next_trial().is_some() {
            ctl.record_response(TrialResponse::timed_out()).unwrap();
        }
        let record = ctl.evaluate(&mut store, &mut FixedOrder).unwrap();
        assert_eq!(record.accuracy_percent, 0);
        // 0.8 + 70/500 = 0.94
        assert_eq!(record.new_visibility, 0.94);
    }
}
