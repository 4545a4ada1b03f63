//! Configuration for episodes, experiments and duels
//!
//! Every struct carries a `validate()` that runs before any engine state is
//! created, so a rejected configuration never leaves partial state behind.

use crate::{BanditError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Range the duel draws its hidden probabilities from. Excludes 0 and 1 so
/// every arm can both pay and miss.
pub const DEFAULT_HIDDEN_PROB_RANGE: (f64, f64) = (0.05, 0.30);

/// Significance level used when none is given
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Bounds for round counts accepted from interactive front ends
pub const MIN_ROUNDS: usize = 50;
pub const MAX_ROUNDS: usize = 20_000;

/// Application-wide defaults, loadable from a JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// True success probability per arm
    /// Default: [0.05, 0.10, 0.20]
    pub true_probs: Vec<f64>,

    /// Rounds per episode
    /// Default: 500
    pub n_rounds: usize,

    /// Exploration parameter
    /// Default: 2.0
    pub c: f64,

    /// Exploration parameters compared by default
    /// Default: [0.1, 0.5, 1.0, 2.0, 4.0]
    pub c_values: Vec<f64>,

    /// Monte Carlo repetitions per configuration
    /// Default: 30
    pub n_repetitions: usize,

    /// Significance level for ANOVA and pairwise tests
    /// Default: 0.05
    pub alpha: f64,

    /// Duel settings
    pub duel: DuelConfig,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            true_probs: vec![0.05, 0.10, 0.20],
            n_rounds: 500,
            c: 2.0,
            c_values: vec![0.1, 0.5, 1.0, 2.0, 4.0],
            n_repetitions: 30,
            alpha: DEFAULT_ALPHA,
            duel: DuelConfig::default(),
        }
    }
}

impl Defaults {
    /// Load defaults from a JSON file; absent fields keep their default value
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let defaults: Defaults = serde_json::from_str(&raw)?;
        defaults.validate()?;
        log::info!("Loaded defaults from {}", path.as_ref().display());
        Ok(defaults)
    }

    pub fn validate(&self) -> Result<()> {
        validate_probabilities(&self.true_probs)?;
        validate_positive("n_rounds", self.n_rounds)?;
        validate_exploration(self.c)?;
        if self.c_values.is_empty() {
            return Err(BanditError::InvalidConfiguration(
                "c_values must not be empty".to_string(),
            ));
        }
        for &c in &self.c_values {
            validate_exploration(c)?;
        }
        validate_positive("n_repetitions", self.n_repetitions)?;
        validate_alpha(self.alpha)?;
        self.duel.validate()
    }

    pub fn episode(&self) -> EpisodeConfig {
        EpisodeConfig::new(self.true_probs.clone(), self.n_rounds, self.c)
    }

    pub fn experiment(&self, seed: u64) -> ExperimentConfig {
        ExperimentConfig {
            true_probs: self.true_probs.clone(),
            n_rounds: self.n_rounds,
            n_repetitions: self.n_repetitions,
            seed,
            parallel: false,
        }
    }
}

/// Parameters of a single episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeConfig {
    pub true_probs: Vec<f64>,
    pub n_rounds: usize,
    pub c: f64,
    /// Keep a `RoundRecord` for every round
    pub record_trajectory: bool,
}

impl EpisodeConfig {
    pub fn new(true_probs: Vec<f64>, n_rounds: usize, c: f64) -> Self {
        Self {
            true_probs,
            n_rounds,
            c,
            record_trajectory: false,
        }
    }

    pub fn with_trajectory(mut self) -> Self {
        self.record_trajectory = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_probabilities(&self.true_probs)?;
        validate_positive("n_rounds", self.n_rounds)?;
        validate_exploration(self.c)
    }
}

/// Parameters shared by every configuration of a Monte Carlo experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub true_probs: Vec<f64>,
    pub n_rounds: usize,
    pub n_repetitions: usize,
    /// Base seed; every repetition derives its own stream from it
    pub seed: u64,
    /// Run repetitions on the rayon pool
    #[serde(default)]
    pub parallel: bool,
}

impl ExperimentConfig {
    pub fn new(true_probs: Vec<f64>, n_rounds: usize, n_repetitions: usize, seed: u64) -> Self {
        Self {
            true_probs,
            n_rounds,
            n_repetitions,
            seed,
            parallel: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_probabilities(&self.true_probs)?;
        validate_positive("n_rounds", self.n_rounds)?;
        validate_positive("n_repetitions", self.n_repetitions)
    }
}

/// Parameters of a human vs UCB duel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Default: 3
    pub n_arms: usize,
    /// Default: 30
    pub max_rounds: usize,
    /// Exploration parameter of the UCB opponent
    /// Default: 2.0
    pub c: f64,
    /// Inclusive range of the hidden probabilities
    /// Default: [0.05, 0.30]
    pub prob_range: (f64, f64),
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            n_arms: 3,
            max_rounds: 30,
            c: 2.0,
            prob_range: DEFAULT_HIDDEN_PROB_RANGE,
        }
    }
}

impl DuelConfig {
    pub fn validate(&self) -> Result<()> {
        validate_positive("n_arms", self.n_arms)?;
        validate_positive("max_rounds", self.max_rounds)?;
        validate_exploration(self.c)?;
        let (low, high) = self.prob_range;
        if !(low > 0.0 && low < high && high < 1.0) {
            return Err(BanditError::InvalidConfiguration(format!(
                "prob_range must satisfy 0 < low < high < 1 (got [{}, {}])",
                low, high
            )));
        }
        Ok(())
    }
}

pub fn validate_probabilities(probs: &[f64]) -> Result<()> {
    if probs.is_empty() {
        return Err(BanditError::InvalidConfiguration(
            "at least one arm is required".to_string(),
        ));
    }
    if let Some((arm, p)) = probs
        .iter()
        .enumerate()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        return Err(BanditError::InvalidConfiguration(format!(
            "probability of arm {} must lie in [0, 1] (got {})",
            arm, p
        )));
    }
    Ok(())
}

pub fn validate_exploration(c: f64) -> Result<()> {
    if !c.is_finite() || c < 0.0 {
        return Err(BanditError::InvalidConfiguration(format!(
            "exploration parameter c must be a non-negative number (got {})",
            c
        )));
    }
    Ok(())
}

pub fn validate_alpha(alpha: f64) -> Result<()> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(BanditError::InvalidConfiguration(format!(
            "alpha must lie in (0, 1) (got {})",
            alpha
        )));
    }
    Ok(())
}

/// Round counts typed in by a user must lie in `MIN_ROUNDS..=MAX_ROUNDS`
pub fn validate_ui_rounds(rounds: usize) -> Result<()> {
    if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&rounds) {
        return Err(BanditError::InvalidConfiguration(format!(
            "rounds must lie in {}..={} (got {})",
            MIN_ROUNDS, MAX_ROUNDS, rounds
        )));
    }
    Ok(())
}

fn validate_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(BanditError::InvalidConfiguration(format!(
            "{} must be positive",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_round_bounds() {
        assert!(validate_ui_rounds(MIN_ROUNDS).is_ok());
        assert!(validate_ui_rounds(MAX_ROUNDS).is_ok());
        assert!(validate_ui_rounds(1).is_err());
        assert!(validate_ui_rounds(MAX_ROUNDS + 1).is_err());
    }
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let defaults = Defaults::default();
        assert!(defaults.validate().is_ok());
        assert_eq!(defaults.true_probs, vec![0.05, 0.10, 0.20]);
        assert_eq!(defaults.n_rounds, 500);
        assert_eq!(defaults.c, 2.0);
        assert_eq!(defaults.alpha, 0.05);
    }

    #[test]
    fn test_episode_config_rejects_bad_values() {
        let bad_prob = EpisodeConfig::new(vec![0.2, 1.5], 10, 1.0);
        assert_matches!(bad_prob.validate(), Err(BanditError::InvalidConfiguration(_)));

        let no_arms = EpisodeConfig::new(vec![], 10, 1.0);
        assert_matches!(no_arms.validate(), Err(BanditError::InvalidConfiguration(_)));

        let zero_rounds = EpisodeConfig::new(vec![0.5], 0, 1.0);
        assert_matches!(zero_rounds.validate(), Err(BanditError::InvalidConfiguration(_)));

        let negative_c = EpisodeConfig::new(vec![0.5], 10, -0.1);
        assert_matches!(negative_c.validate(), Err(BanditError::InvalidConfiguration(_)));

        let nan_c = EpisodeConfig::new(vec![0.5], 10, f64::NAN);
        assert_matches!(nan_c.validate(), Err(BanditError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_boundary_probabilities_accepted() {
        assert!(EpisodeConfig::new(vec![0.0, 1.0], 1, 0.0).validate().is_ok());
    }

    #[test]
    fn test_alpha_bounds() {
        assert!(validate_alpha(0.05).is_ok());
        assert!(validate_alpha(0.0).is_err());
        assert!(validate_alpha(1.0).is_err());
        assert!(validate_alpha(f64::NAN).is_err());
    }

    #[test]
    fn test_duel_range_must_exclude_zero_and_one() {
        let mut config = DuelConfig::default();
        assert!(config.validate().is_ok());

        config.prob_range = (0.0, 0.3);
        assert!(config.validate().is_err());

        config.prob_range = (0.2, 1.0);
        assert!(config.validate().is_err());

        config.prob_range = (0.3, 0.2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "n_rounds": 1000, "duel": {{ "max_rounds": 12 }} }}"#).unwrap();

        let defaults = Defaults::from_json_file(file.path()).unwrap();
        assert_eq!(defaults.n_rounds, 1000);
        assert_eq!(defaults.duel.max_rounds, 12);
        assert_eq!(defaults.duel.n_arms, 3);
        assert_eq!(defaults.c, 2.0);
    }

    #[test]
    fn test_load_invalid_json_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "alpha": 1.5 }}"#).unwrap();

        assert_matches!(
            Defaults::from_json_file(file.path()),
            Err(BanditError::InvalidConfiguration(_))
        );
    }
}
