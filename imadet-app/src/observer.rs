use anyhow::ensure;
use imadet_core::{ResponseKey, StimulusConfig, TiltClass, TrialResponse};
use imadet_experiment::{Imagery, SessionAborted, TrialRunner, VividnessRating};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Psychometric parameters of the simulated participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverProfile {
    /// Opacity at which ~63% of left gratings are seen
    pub left_alpha: f64,
    pub right_alpha: f64,
    /// Weibull slope
    pub beta: f64,
    pub false_alarm_rate: f64,
    pub lapse_rate: f64,
    pub response_window_ms: u64,
    /// Reaction times are drawn uniformly from this range; draws past the
    /// response window count as no response.
    pub reaction_time_ms: (u64, u64),
    /// Probability of imagining what was asked
    pub imagery_compliance: f64,
    /// Vividness ratings are drawn uniformly from this range
    pub vividness: (u8, u8),
}

impl Default for ObserverProfile {
    fn default() -> Self {
        Self {
            left_alpha: 0.35,
            right_alpha: 0.45,
            beta: 3.0,
            false_alarm_rate: 0.1,
            lapse_rate: 0.02,
            response_window_ms: 2000,
            reaction_time_ms: (250, 2200),
            imagery_compliance: 0.95,
            vividness: (2, 5),
        }
    }
}

impl ObserverProfile {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.left_alpha > 0.0 && self.right_alpha > 0.0,
            "observer alphas must be positive, got left {} right {}",
            self.left_alpha,
            self.right_alpha
        );
        ensure!(self.beta > 0.0, "observer beta must be positive, got {}", self.beta);
        for (name, rate) in [
            ("false_alarm_rate", self.false_alarm_rate),
            ("lapse_rate", self.lapse_rate),
            ("imagery_compliance", self.imagery_compliance),
        ] {
            ensure!((0.0..=1.0).contains(&rate), "{name} must be within [0, 1], got {rate}");
        }
        ensure!(
            self.false_alarm_rate + self.lapse_rate <= 1.0,
            "false_alarm_rate + lapse_rate must not exceed 1"
        );
        let (lo, hi) = self.reaction_time_ms;
        ensure!(lo <= hi, "reaction_time_ms range is reversed: ({lo}, {hi})");
        let (lo, hi) = self.vividness;
        ensure!(
            VividnessRating::new(lo).is_some() && VividnessRating::new(hi).is_some() && lo <= hi,
            "vividness must be a range within 1..=5, got ({lo}, {hi})"
        );
        Ok(())
    }

    /// Probability of answering "present" for an animation at `opacity`
    pub fn p_yes(&self, tilt: Option<TiltClass>, opacity: f64) -> f64 {
        let alpha = match tilt {
            Some(TiltClass::Left) => self.left_alpha,
            Some(TiltClass::Right) => self.right_alpha,
            None => return self.false_alarm_rate,
        };
        if opacity <= 0.0 {
            return self.false_alarm_rate;
        }
        let detect = 1.0 - (-(opacity / alpha).powf(self.beta)).exp();
        let floor = self.false_alarm_rate;
        (floor + (1.0 - floor - self.lapse_rate) * detect).clamp(0.0, 1.0)
    }
}

/// A [`TrialRunner`] that answers like a participant with `profile`.
pub struct SimulatedObserver<R: Rng> {
    profile: ObserverProfile,
    rng: R,
    trials_run: usize,
}

impl<R: Rng> SimulatedObserver<R> {
    pub fn new(profile: ObserverProfile, rng: R) -> Self {
        Self {
            profile,
            rng,
            trials_run: 0,
        }
    }

    pub fn trials_run(&self) -> usize {
        self.trials_run
    }

    /// `None` when the drawn reaction time falls past the response window
    fn reaction_time_ms(&mut self) -> Option<u64> {
        let (lo, hi) = self.profile.reaction_time_ms;
        let rt_ms = self.rng.random_range(lo..=hi.max(lo));
        (rt_ms <= self.profile.response_window_ms).then_some(rt_ms)
    }

    /// Answer to the post-block question "what did you imagine?"
    pub fn imagery_check(&mut self, asked: Imagery) -> Option<ResponseKey> {
        if self.rng.random_bool(self.profile.imagery_compliance.clamp(0.0, 1.0)) {
            Some(asked.check_key())
        } else {
            Some(ResponseKey('n'))
        }
    }
}

impl<R: Rng> TrialRunner for SimulatedObserver<R> {
    fn run_trial(&mut self, stimulus: &StimulusConfig) -> Result<TrialResponse, SessionAborted> {
        self.trials_run += 1;
        let Some(rt_ms) = self.reaction_time_ms() else {
            return Ok(TrialResponse::timed_out());
        };

        let tilt = TiltClass::from_rotation(stimulus.rotation_deg);
        let p_yes = self.profile.p_yes(tilt, stimulus.opacity);
        let key = if self.rng.random_bool(p_yes) {
            stimulus.choices.present
        } else {
            stimulus.choices.absent
        };
        Ok(TrialResponse::pressed(key.0, Duration::from_millis(rt_ms)))
    }

    fn present(&mut self, _: &StimulusConfig, _: Duration) -> Result<(), SessionAborted> {
        self.trials_run += 1;
        Ok(())
    }

    fn rate_vividness(&mut self, _: TiltClass) -> Result<TrialResponse, SessionAborted> {
        let (lo, hi) = self.profile.vividness;
        let rating = self.rng.random_range(lo..=hi.max(lo));
        let key = char::from(b'0' + rating);
        let (rt_lo, rt_hi) = self.profile.reaction_time_ms;
        let rt_ms = self.rng.random_range(rt_lo..=rt_hi.max(rt_lo));
        Ok(TrialResponse::pressed(key, Duration::from_millis(rt_ms)))
    }
}
