use anyhow::{Context, Result};
use imadet_core::{Phase, ResponseMapping, SessionPhase, ThresholdStore, TrialOutcome};
use imadet_experiment::{
    CalibrationReport, CalibrationSession, ExperimentConfig, ImaginationReport, PracticeReport,
    ShuffledOrder, TrialRunner,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use crate::observer::{ObserverProfile, SimulatedObserver};

#[derive(Debug, Clone, Serialize)]
pub struct MainBlockSummary {
    pub index: usize,
    pub condition: String,
    pub trials: usize,
    pub hits: usize,
    pub false_alarms: usize,
    pub accuracy_percent: u32,
    pub imagery_check_correct: bool,
}

/// Everything a session produced, ready to be exported by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub seed: u64,
    pub mapping: ResponseMapping,
    pub practice: Option<PracticeReport>,
    pub calibration: Option<CalibrationReport>,
    pub imagination: Option<ImaginationReport>,
    pub thresholds: ThresholdStore,
    pub main: Vec<MainBlockSummary>,
}

/// Runs a whole session against a simulated participant.
pub struct App {
    session: CalibrationSession,
    observer: SimulatedObserver<ChaCha8Rng>,
    order: ShuffledOrder<ChaCha8Rng>,
    store: ThresholdStore,
    phase: SessionPhase,
    seed: u64,
    skip_main: bool,
}

impl App {
    pub fn new(
        config: ExperimentConfig,
        mapping: ResponseMapping,
        profile: ObserverProfile,
        seed: u64,
        skip_main: bool,
    ) -> Result<Self> {
        let session =
            CalibrationSession::new(config, mapping).context("invalid experiment configuration")?;
        profile.validate().context("invalid observer profile")?;
        // separate streams so the observer never shifts the trial order
        let observer = SimulatedObserver::new(profile, ChaCha8Rng::seed_from_u64(seed));
        let order = ShuffledOrder::new(ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)));

        Ok(Self {
            session,
            observer,
            order,
            store: ThresholdStore::default(),
            phase: SessionPhase::default(),
            seed,
            skip_main,
        })
    }

    pub fn run(mut self) -> Result<SessionSummary> {
        let mut practice = None;
        let mut calibration = None;
        let mut imagination = None;
        let mut main = Vec::new();

        loop {
            info!(phase = ?self.phase, "entering phase");
            match self.phase {
                phase if !phase.collects_responses() => {}
                phase if phase.is_practice() => {
                    practice = Some(
                        self.session
                            .run_practice(&mut self.observer, &mut self.order)
                            .context("practice failed")?,
                    );
                }
                phase if phase.is_calibration() => {
                    let report = self
                        .session
                        .run_calibration(&mut self.store, &mut self.observer, &mut self.order)
                        .context("calibration failed")?;
                    for run in &report.runs {
                        info!(tilt = %run.tilt_class, threshold = run.threshold, "threshold calibrated");
                    }
                    calibration = Some(report);
                }
                phase if phase.is_imagination_practice() => {
                    let report = self
                        .session
                        .run_imagination_practice(&mut self.observer, &mut self.order)
                        .context("imagination practice failed")?;
                    info!(mean_vividness = ?report.mean_vividness, "imagination practice done");
                    imagination = Some(report);
                }
                phase if phase.is_main() && !self.skip_main => {
                    main = self.run_main()?;
                }
                _ => {}
            }

            match self.phase.next() {
                Some(next) => self.phase = next,
                None => break,
            }
        }

        info!(trials = self.observer.trials_run(), "session complete");
        Ok(SessionSummary {
            seed: self.seed,
            mapping: self.session.mapping(),
            practice,
            calibration,
            imagination,
            thresholds: self.store,
            main,
        })
    }

    fn run_main(&mut self) -> Result<Vec<MainBlockSummary>> {
        let mapping = self.session.mapping();
        let blocks = self.session.main_plan(&self.store, &mut self.order);
        let mut summaries = Vec::with_capacity(blocks.len());

        for block in &blocks {
            let mut outcomes = Vec::with_capacity(block.trials.len());
            for trial in &block.trials {
                let response = self
                    .observer
                    .run_trial(&trial.stimulus)
                    .context("main experiment aborted")?;
                outcomes.push(TrialOutcome::score(trial.kind, response, &mapping));
            }
            let check = self.observer.imagery_check(block.condition.imagine);

            let hits = outcomes
                .iter()
                .filter(|o| o.is_signal_trial && o.correct)
                .count();
            let false_alarms = outcomes
                .iter()
                .filter(|o| !o.is_signal_trial && !o.correct && o.response.is_some())
                .count();
            let result = imadet_experiment::CycleResult::from_outcomes(&outcomes);

            summaries.push(MainBlockSummary {
                index: block.index,
                condition: block.condition.name(),
                trials: outcomes.len(),
                hits,
                false_alarms,
                accuracy_percent: result.accuracy_percent(),
                imagery_check_correct: block.score_imagery_check(check),
            });
        }
        Ok(summaries)
    }
}
