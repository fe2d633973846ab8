use imadet_core::{StimulusConfig, TrialKind};
use serde::{Deserialize, Serialize};

use crate::order::TrialOrder;

/// One planned trial: what to show and what kind of answer is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSpec {
    /// Position within its cycle or block
    pub index: usize,
    pub kind: TrialKind,
    pub stimulus: StimulusConfig,
}

/// Result of recording one response in a running block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialStep {
    /// More trials remain in the current block
    Continue,
    /// The block is full and waiting for evaluation
    BlockComplete,
}

/// `trials / 2` signal and `trials / 2` noise trials in an order chosen by
/// `order`.
pub(crate) fn balanced_kinds<O: TrialOrder>(trials: usize, order: &mut O) -> Vec<TrialKind> {
    let half = trials / 2;
    let mut kinds: Vec<TrialKind> = std::iter::repeat_n(TrialKind::Signal, half)
        .chain(std::iter::repeat_n(TrialKind::Noise, half))
        .collect();
    order.permute(&mut kinds);
    kinds
}
