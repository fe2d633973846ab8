use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A keyboard key as reported by the trial runner.
///
/// Keys compare case-insensitively, so `'f'` and `'F'` are the same response.
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub struct ResponseKey(pub char);

impl ResponseKey {
    pub fn normalized(self) -> char {
        self.0.to_ascii_lowercase()
    }
}

impl PartialEq for ResponseKey {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl std::hash::Hash for ResponseKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl std::fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_ascii_uppercase())
    }
}

/// Which key means "grating present" and which "grating absent".
/// Supplied once per session and constant throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMapping {
    pub present: ResponseKey,
    pub absent: ResponseKey,
}

impl ResponseMapping {
    pub fn new(present: char, absent: char) -> Self {
        Self {
            present: ResponseKey(present),
            absent: ResponseKey(absent),
        }
    }

    pub fn expected(&self, kind: TrialKind) -> ResponseKey {
        match kind {
            TrialKind::Signal => self.present,
            TrialKind::Noise => self.absent,
        }
    }
}

impl Default for ResponseMapping {
    fn default() -> Self {
        Self::new('f', 'j')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrialKind {
    /// Grating embedded in the noise
    Signal,
    /// Noise only
    Noise,
}

/// What the runner observed for one trial. `response` is `None` when the
/// response window closed without a key press.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrialResponse {
    pub response: Option<ResponseKey>,
    pub reaction_time: Option<Duration>,
}

impl TrialResponse {
    pub fn pressed(key: char, reaction_time: Duration) -> Self {
        Self {
            response: Some(ResponseKey(key)),
            reaction_time: Some(reaction_time),
        }
    }

    pub fn timed_out() -> Self {
        Self::default()
    }
}

/// Scored result per trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub is_signal_trial: bool,
    pub response: Option<ResponseKey>,
    pub correct_response: ResponseKey,
    pub correct: bool,
    pub reaction_time: Option<Duration>,
}

impl TrialOutcome {
    pub fn score(kind: TrialKind, observed: TrialResponse, mapping: &ResponseMapping) -> Self {
        let correct_response = mapping.expected(kind);
        Self {
            is_signal_trial: kind == TrialKind::Signal,
            response: observed.response,
            correct_response,
            // a missing response never matches
            correct: observed.response == Some(correct_response),
            reaction_time: observed.reaction_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_case_insensitively() {
        assert_eq!(ResponseKey('f'), ResponseKey('F'));
        assert_ne!(ResponseKey('f'), ResponseKey('j'));
    }

    #[test]
    fn signal_trial_expects_present_key() {
        let mapping = ResponseMapping::new('f', 'j');
        let hit = TrialOutcome::score(
            TrialKind::Signal,
            TrialResponse::pressed('F', Duration::from_millis(420)),
            &mapping,
        );
        assert!(hit.correct);
        assert!(hit.is_signal_trial);

        let miss = TrialOutcome::score(
            TrialKind::Signal,
            TrialResponse::pressed('j', Duration::from_millis(380)),
            &mapping,
        );
        assert!(!miss.correct);
        assert_eq!(miss.correct_response, ResponseKey('f'));
    }

    #[test]
    fn noise_trial_expects_absent_key() {
        let mapping = ResponseMapping::new('j', 'f');
        let outcome = TrialOutcome::score(
            TrialKind::Noise,
            TrialResponse::pressed('f', Duration::from_millis(500)),
            &mapping,
        );
        assert!(outcome.correct);
        assert!(!outcome.is_signal_trial);
    }

    #[test]
    fn no_response_is_scored_incorrect() {
        let mapping = ResponseMapping::default();
        for kind in [TrialKind::Signal, TrialKind::Noise] {
            let outcome = TrialOutcome::score(kind, TrialResponse::timed_out(), &mapping);
            assert!(!outcome.correct);
            assert_eq!(outcome.reaction_time, None);
        }
    }
}
