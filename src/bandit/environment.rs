//! Bernoulli reward environment
//!
//! The environment is the only holder of the true success probabilities.
//! Sampling is stateless apart from the caller's random stream.

use crate::config::validate_probabilities;
use crate::{BanditError, Result};
use rand::rngs::StdRng;
use rand_distr::{Bernoulli, Distribution, Uniform};

/// Reward sampler over a fixed set of true success probabilities
#[derive(Debug, Clone)]
pub struct BanditEnvironment {
    true_probs: Vec<f64>,
    arms: Vec<Bernoulli>,
}

impl BanditEnvironment {
    /// Creates an environment; every probability must lie in [0, 1]
    pub fn new(true_probs: Vec<f64>) -> Result<Self> {
        validate_probabilities(&true_probs)?;
        let arms = true_probs
            .iter()
            .map(|&p| {
                Bernoulli::new(p).map_err(|e| {
                    BanditError::InvalidConfiguration(format!("probability {}: {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { true_probs, arms })
    }

    pub fn n_arms(&self) -> usize {
        self.arms.len()
    }

    pub fn true_probs(&self) -> &[f64] {
        &self.true_probs
    }

    /// Highest true probability, the per-round reward of an oracle
    pub fn optimal_probability(&self) -> f64 {
        self.true_probs
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Draws a 0/1 reward for `arm`
    pub fn sample(&self, arm: usize, rng: &mut StdRng) -> Result<u8> {
        let distribution = self.arms.get(arm).ok_or(BanditError::InvalidArm {
            arm,
            n_arms: self.arms.len(),
        })?;
        Ok(u8::from(distribution.sample(rng)))
    }
}

/// Draws `n_arms` probabilities independently and uniformly from the inclusive `range`
pub fn generate_hidden_probabilities(
    n_arms: usize,
    range: (f64, f64),
    rng: &mut StdRng,
) -> Result<Vec<f64>> {
    let (low, high) = range;
    let uniform = Uniform::new_inclusive(low, high).map_err(|e| {
        BanditError::InvalidConfiguration(format!("range [{}, {}]: {}", low, high, e))
    })?;
    Ok((0..n_arms).map(|_| uniform.sample(rng)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::SeedableRng;

    #[test]
    fn test_rejects_out_of_range_probability() {
        assert_matches!(
            BanditEnvironment::new(vec![0.5, -0.1]),
            Err(BanditError::InvalidConfiguration(_))
        );
        assert_matches!(
            BanditEnvironment::new(vec![]),
            Err(BanditError::InvalidConfiguration(_))
        );
    }

    #[test]
    fn test_degenerate_arms_are_deterministic() {
        let env = BanditEnvironment::new(vec![0.0, 1.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(env.sample(0, &mut rng).unwrap(), 0);
            assert_eq!(env.sample(1, &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn test_sample_invalid_arm() {
        let env = BanditEnvironment::new(vec![0.3, 0.6]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_matches!(
            env.sample(2, &mut rng),
            Err(BanditError::InvalidArm { arm: 2, n_arms: 2 })
        );
    }

    #[test]
    fn test_empirical_rate_matches_probability() {
        let env = BanditEnvironment::new(vec![0.3]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let draws = 20_000;
        let hits: u32 = (0..draws)
            .map(|_| env.sample(0, &mut rng).unwrap() as u32)
            .sum();
        let rate = hits as f64 / draws as f64;
        assert!((rate - 0.3).abs() < 0.02, "rate = {}", rate);
    }

    #[test]
    fn test_same_seed_same_rewards() {
        let env = BanditEnvironment::new(vec![0.5, 0.5]).unwrap();
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        let left: Vec<u8> = (0..50).map(|i| env.sample(i % 2, &mut a).unwrap()).collect();
        let right: Vec<u8> = (0..50).map(|i| env.sample(i % 2, &mut b).unwrap()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_optimal_probability() {
        let env = BanditEnvironment::new(vec![0.1, 0.7, 0.4]).unwrap();
        assert_eq!(env.optimal_probability(), 0.7);
    }

    #[test]
    fn test_hidden_probabilities_within_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let probs = generate_hidden_probabilities(50, (0.05, 0.30), &mut rng).unwrap();
        assert_eq!(probs.len(), 50);
        assert!(probs.iter().all(|p| (0.05..=0.30).contains(p)));
    }

    #[test]
    fn test_hidden_probabilities_bad_range() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(generate_hidden_probabilities(3, (0.5, 0.1), &mut rng).is_err());
    }
}
