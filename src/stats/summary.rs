//! Descriptive statistics of per-configuration results

use crate::{BanditError, Result};
use serde::{Deserialize, Serialize};

/// Final-performance summary of one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
    /// Best arm's probability minus the mean
    pub optimal_gap: f64,
}

impl GroupSummary {
    pub fn from_samples(key: f64, samples: &[f64], optimal: f64) -> Result<Self> {
        if samples.is_empty() {
            return Err(BanditError::InsufficientData(format!(
                "no samples for configuration {}",
                key
            )));
        }

        let n = samples.len();
        let mean = mean(samples);
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            key,
            mean,
            std: variance.sqrt(),
            min,
            max,
            n,
            optimal_gap: optimal - mean,
        })
    }
}

/// Per-round reward of always playing the best arm
pub fn optimal_reward(true_probs: &[f64]) -> f64 {
    true_probs.iter().copied().fold(0.0, f64::max)
}

/// Relative tolerance under which two group means count as equal
pub(crate) const MEAN_REL_TOLERANCE: f64 = 1e-12;

/// True when every sample equals the first one (and for empty input)
pub(crate) fn is_constant(samples: &[f64]) -> bool {
    match samples.split_first() {
        Some((first, rest)) => rest.iter().all(|x| x == first),
        None => true,
    }
}

pub(crate) fn means_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= MEAN_REL_TOLERANCE * a.abs().max(b.abs())
}

/// Arithmetic mean. A constant sample returns its value exactly, without the
/// rounding residue of summing and dividing.
pub(crate) fn mean(samples: &[f64]) -> f64 {
    if let Some(&first) = samples.first() {
        if is_constant(samples) {
            return first;
        }
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Unbiased sample variance; 0 for fewer than two samples or a constant sample
pub(crate) fn sample_variance(samples: &[f64]) -> f64 {
    if samples.len() < 2 || is_constant(samples) {
        return 0.0;
    }
    let m = mean(samples);
    samples.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (samples.len() - 1) as f64
}
