use std::time::Duration;

use imadet_core::{StimulusConfig, TiltClass, TrialResponse};

use crate::error::SessionAborted;

/// Presents trials to the participant.
///
/// Implementations block until a key is pressed or the response window
/// closes, in which case they return [`TrialResponse::timed_out`]. Returning
/// `Err` ends the session.
pub trait TrialRunner {
    fn run_trial(&mut self, stimulus: &StimulusConfig) -> Result<TrialResponse, SessionAborted>;

    /// Shows `stimulus` for `duration` without collecting a response.
    fn present(&mut self, stimulus: &StimulusConfig, duration: Duration) -> Result<(), SessionAborted> {
        let _ = duration;
        self.run_trial(stimulus).map(drop)
    }

    /// Asks how vivid the imagined `tilt` grating was. Runners without a
    /// rating prompt report no answer.
    fn rate_vividness(&mut self, tilt: TiltClass) -> Result<TrialResponse, SessionAborted> {
        let _ = tilt;
        Ok(TrialResponse::timed_out())
    }
}

impl<R: TrialRunner + ?Sized> TrialRunner for &mut R {
    fn run_trial(&mut self, stimulus: &StimulusConfig) -> Result<TrialResponse, SessionAborted> {
        (**self).run_trial(stimulus)
    }

    fn present(&mut self, stimulus: &StimulusConfig, duration: Duration) -> Result<(), SessionAborted> {
        (**self).present(stimulus, duration)
    }

    fn rate_vividness(&mut self, tilt: TiltClass) -> Result<TrialResponse, SessionAborted> {
        (**self).rate_vividness(tilt)
    }
}
