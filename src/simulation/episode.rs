//! Single-episode driver
//!
//! An episode pits a fresh `UcbAgent` against a `BanditEnvironment` for a
//! fixed number of rounds. It can be driven round by round (`step`) or run to
//! completion; the free function `run_episode` does the latter in one call.

use crate::bandit::{BanditEnvironment, UcbAgent};
use crate::config::EpisodeConfig;
use crate::Result;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// One round of an episode, immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number
    pub round_index: usize,
    pub chosen_arm: usize,
    pub reward: u8,
    /// Estimates after this round's update
    pub q_snapshot: Vec<f64>,
    /// Visit counts after this round's update
    pub n_snapshot: Vec<u64>,
    /// Scores the choice was made on; `+inf` marks forced exploration
    #[serde(with = "crate::serde_utils::ucb_scores")]
    pub ucb_values_snapshot: Vec<f64>,
    pub cumulative_reward: u64,
    /// cumulative_reward / round_index
    pub cumulative_average: f64,
}

/// Outcome of a full episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub average_reward: f64,
    pub total_reward: u64,
    pub n_rounds: usize,
    /// Reward an oracle playing the best arm would expect, minus what was earned
    pub regret: f64,
    pub trajectory: Option<Vec<RoundRecord>>,
}

/// Round-by-round episode driver
#[derive(Debug, Clone)]
pub struct EpisodeSimulator {
    environment: BanditEnvironment,
    agent: UcbAgent,
    n_rounds: usize,
    round: usize,
    total_reward: u64,
    trajectory: Option<Vec<RoundRecord>>,
}

impl EpisodeSimulator {
    pub fn new(config: &EpisodeConfig) -> Result<Self> {
        config.validate()?;
        let environment = BanditEnvironment::new(config.true_probs.clone())?;
        let agent = UcbAgent::new(environment.n_arms(), config.c)?;
        let trajectory = config
            .record_trajectory
            .then(|| Vec::with_capacity(config.n_rounds));

        Ok(Self {
            environment,
            agent,
            n_rounds: config.n_rounds,
            round: 0,
            total_reward: 0,
            trajectory,
        })
    }

    pub fn agent(&self) -> &UcbAgent {
        &self.agent
    }

    pub fn environment(&self) -> &BanditEnvironment {
        &self.environment
    }

    pub fn rounds_played(&self) -> usize {
        self.round
    }

    pub fn n_rounds(&self) -> usize {
        self.n_rounds
    }

    pub fn total_reward(&self) -> u64 {
        self.total_reward
    }

    pub fn is_finished(&self) -> bool {
        self.round >= self.n_rounds
    }

    /// Recorded rounds so far, when recording is on
    pub fn trajectory(&self) -> Option<&[RoundRecord]> {
        self.trajectory.as_deref()
    }

    /// Plays one round. Returns None once all rounds are played.
    pub fn step(&mut self, rng: &mut StdRng) -> Result<Option<RoundRecord>> {
        if self.is_finished() {
            return Ok(None);
        }

        let ucb_values = self.agent.get_ucb_values();
        let arm = self.agent.select_action();
        let reward = self.environment.sample(arm, rng)?;
        self.agent.update(arm, reward)?;

        self.round += 1;
        self.total_reward += u64::from(reward);

        let record = RoundRecord {
            round_index: self.round,
            chosen_arm: arm,
            reward,
            q_snapshot: self.agent.state().q().to_vec(),
            n_snapshot: self.agent.state().n().to_vec(),
            ucb_values_snapshot: ucb_values,
            cumulative_reward: self.total_reward,
            cumulative_average: self.total_reward as f64 / self.round as f64,
        };

        if let Some(trajectory) = self.trajectory.as_mut() {
            trajectory.push(record.clone());
        }

        Ok(Some(record))
    }

    /// Plays the remaining rounds and returns the episode outcome
    pub fn run_to_end(mut self, rng: &mut StdRng) -> Result<EpisodeResult> {
        while !self.is_finished() {
            self.step(rng)?;
        }
        Ok(self.into_result())
    }

    fn into_result(self) -> EpisodeResult {
        let average_reward = self.total_reward as f64 / self.n_rounds as f64;
        let regret =
            self.n_rounds as f64 * self.environment.optimal_probability() - self.total_reward as f64;

        log::debug!(
            "Episode finished: rounds={}, average_reward={:.4}, counts={:?}",
            self.n_rounds,
            average_reward,
            self.agent.state().n()
        );

        EpisodeResult {
            average_reward,
            total_reward: self.total_reward,
            n_rounds: self.n_rounds,
            regret,
            trajectory: self.trajectory,
        }
    }
}

/// Runs one complete episode with a fresh agent
pub fn run_episode(config: &EpisodeConfig, rng: &mut StdRng) -> Result<EpisodeResult> {
    EpisodeSimulator::new(config)?.run_to_end(rng)
}
