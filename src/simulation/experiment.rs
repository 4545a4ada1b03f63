//! Monte Carlo experiments over exploration parameters
//!
//! Every repetition gets its own `StdRng` seeded from `(base seed, c, repetition)`.
//! A configuration's samples therefore do not depend on which other
//! configurations run alongside it, on their order, or on whether the
//! repetitions run sequentially or on the rayon pool.

use crate::config::{validate_exploration, EpisodeConfig, ExperimentConfig};
use crate::simulation::episode::run_episode;
use crate::stats::comparator::{normalize_key, ConfigurationSample};
use crate::stats::summary::GroupSummary;
use crate::{BanditError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Mean learning curve of one exploration parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCurve {
    pub c: f64,
    /// Per-round mean of the cumulative average reward across runs
    pub mean_curve: Vec<f64>,
    /// Summary of the final-round values across runs
    pub final_summary: GroupSummary,
}

/// Runs repeated independent episodes
#[derive(Debug, Clone)]
pub struct ExperimentRunner {
    config: ExperimentConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl ExperimentRunner {
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
        })
    }

    /// Checks `flag` between repetitions; once set, runs fail with `Cancelled`
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Average reward of each of `n_repetitions` independent episodes with exploration `c`
    pub fn run_many(&self, c: f64) -> Result<Vec<f64>> {
        validate_exploration(c)?;
        let episode = EpisodeConfig::new(self.config.true_probs.clone(), self.config.n_rounds, c);
        let repetitions = self.config.n_repetitions;

        log::debug!(
            "run_many: c={}, repetitions={}, rounds={}, parallel={}",
            c,
            repetitions,
            self.config.n_rounds,
            self.config.parallel
        );

        if self.config.parallel {
            (0..repetitions)
                .into_par_iter()
                .map(|rep| {
                    self.check_cancelled(rep)?;
                    self.run_repetition(&episode, rep)
                        .map(|result| result.average_reward)
                })
                .collect()
        } else {
            let mut rewards = Vec::with_capacity(repetitions);
            for rep in 0..repetitions {
                self.check_cancelled(rep)?;
                rewards.push(self.run_repetition(&episode, rep)?.average_reward);
            }
            Ok(rewards)
        }
    }

    /// Runs `run_many` once per exploration parameter
    pub fn compare_configurations(&self, c_values: &[f64]) -> Result<ConfigurationSample> {
        if c_values.is_empty() {
            return Err(BanditError::InvalidConfiguration(
                "at least one c value is required".to_string(),
            ));
        }
        for &c in c_values {
            validate_exploration(c)?;
        }

        let mut sample = ConfigurationSample::new();
        for c in c_values.iter().copied().map(normalize_key) {
            if sample.contains(c) {
                return Err(BanditError::InvalidConfiguration(format!(
                    "duplicate c value {}",
                    c
                )));
            }
            let rewards = self.run_many(c)?;
            log::info!(
                "Configuration c={} done: mean average reward {:.4} over {} runs",
                c,
                rewards.iter().sum::<f64>() / rewards.len() as f64,
                rewards.len()
            );
            sample.insert(c, rewards)?;
        }
        Ok(sample)
    }

    /// Mean cumulative-average curve for each exploration parameter
    pub fn learning_curves(&self, c_values: &[f64]) -> Result<Vec<LearningCurve>> {
        let optimal = crate::stats::summary::optimal_reward(&self.config.true_probs);
        let mut curves = Vec::with_capacity(c_values.len());

        for &c in c_values {
            validate_exploration(c)?;
            let episode =
                EpisodeConfig::new(self.config.true_probs.clone(), self.config.n_rounds, c)
                    .with_trajectory();

            let mut sums = vec![0.0; self.config.n_rounds];
            let mut finals = Vec::with_capacity(self.config.n_repetitions);
            for rep in 0..self.config.n_repetitions {
                self.check_cancelled(rep)?;
                let result = self.run_repetition(&episode, rep)?;
                let trajectory = result.trajectory.unwrap_or_default();
                for (sum, record) in sums.iter_mut().zip(&trajectory) {
                    *sum += record.cumulative_average;
                }
                finals.push(result.average_reward);
            }

            let runs = self.config.n_repetitions as f64;
            curves.push(LearningCurve {
                c,
                mean_curve: sums.into_iter().map(|s| s / runs).collect(),
                final_summary: GroupSummary::from_samples(c, &finals, optimal)?,
            });
        }
        Ok(curves)
    }

    fn run_repetition(
        &self,
        episode: &EpisodeConfig,
        rep: usize,
    ) -> Result<crate::simulation::episode::EpisodeResult> {
        let seed = repetition_seed(self.config.seed, episode.c, rep);
        let mut rng = StdRng::seed_from_u64(seed);
        run_episode(episode, &mut rng)
    }

    fn check_cancelled(&self, completed: usize) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                log::warn!("Experiment cancelled after {} repetitions", completed);
                Err(BanditError::Cancelled {
                    completed,
                    requested: self.config.n_repetitions,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Seed of one repetition, mixed with SplitMix64 so nearby inputs give unrelated streams
pub fn repetition_seed(base_seed: u64, c: f64, repetition: usize) -> u64 {
    let mut x = splitmix64(base_seed);
    x = splitmix64(x ^ normalize_key(c).to_bits());
    splitmix64(x ^ repetition as u64)
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
