use serde::{Deserialize, Serialize};

/// Defines session phases and how they chain
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn collects_responses(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_practice(&self) -> bool {
        false
    }
    fn is_calibration(&self) -> bool {
        false
    }
    fn is_imagination_practice(&self) -> bool {
        false
    }
    fn is_main(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Welcome,
    PracticeDetection,
    Staircase,
    PracticeImagination,
    MainExperiment,
    Debrief,
}

impl Phase for SessionPhase {
    fn collects_responses(&self) -> bool {
        !matches!(self, Self::Welcome | Self::Debrief)
    }

    fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Welcome => PracticeDetection,
            PracticeDetection => Staircase,
            Staircase => PracticeImagination,
            PracticeImagination => MainExperiment,
            MainExperiment => Debrief,
            Debrief => return None,
        })
    }

    fn is_practice(&self) -> bool {
        matches!(self, SessionPhase::PracticeDetection)
    }

    fn is_calibration(&self) -> bool {
        matches!(self, SessionPhase::Staircase)
    }

    fn is_imagination_practice(&self) -> bool {
        matches!(self, SessionPhase::PracticeImagination)
    }

    fn is_main(&self) -> bool {
        matches!(self, SessionPhase::MainExperiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_chain_from_welcome_to_debrief() {
        let mut seen = vec![SessionPhase::default()];
        while let Some(next) = seen.last().and_then(|phase| phase.next()) {
            seen.push(next);
        }
        assert_eq!(
            seen,
            vec![
                SessionPhase::Welcome,
                SessionPhase::PracticeDetection,
                SessionPhase::Staircase,
                SessionPhase::PracticeImagination,
                SessionPhase::MainExperiment,
                SessionPhase::Debrief,
            ]
        );
    }

    #[test]
    fn imagination_practice_sits_between_calibration_and_main() {
        let staircase = SessionPhase::Staircase;
        assert!(staircase.is_calibration());
        assert!(staircase.collects_responses());
        assert_eq!(staircase.next(), Some(SessionPhase::PracticeImagination));

        let imagination = SessionPhase::PracticeImagination;
        assert!(imagination.is_imagination_practice());
        assert!(imagination.collects_responses());
        assert!(!imagination.is_practice());
        assert_eq!(imagination.next(), Some(SessionPhase::MainExperiment));
        assert!(!SessionPhase::Debrief.collects_responses());
    }
}
