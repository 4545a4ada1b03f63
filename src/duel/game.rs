//! Human vs UCB duel over hidden arm probabilities
//!
//! Both players pull arms of the same hidden environment each round: the
//! human's arm comes from outside, the UCB agent picks its own without seeing
//! the human's choice. The true probabilities leave the controller through
//! `reveal()` only, once the game is finished, and exactly once.

use crate::bandit::{generate_hidden_probabilities, AgentState, BanditEnvironment, UcbAgent};
use crate::config::DuelConfig;
use crate::{BanditError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelStatus {
    NotStarted,
    InProgress,
    Finished,
}

impl fmt::Display for DuelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuelStatus::NotStarted => write!(f, "NOT_STARTED"),
            DuelStatus::InProgress => write!(f, "IN_PROGRESS"),
            DuelStatus::Finished => write!(f, "FINISHED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelOutcome {
    HumanWins,
    AgentWins,
    Tie,
}

impl fmt::Display for DuelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuelOutcome::HumanWins => write!(f, "Human wins"),
            DuelOutcome::AgentWins => write!(f, "UCB wins"),
            DuelOutcome::Tie => write!(f, "Tie"),
        }
    }
}

/// Both players' moves in one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelRoundRecord {
    /// 1-based
    pub round: usize,
    pub human_arm: usize,
    pub human_reward: u8,
    /// Human estimates after this round
    pub human_q: Vec<f64>,
    pub agent_arm: usize,
    pub agent_reward: u8,
    /// Agent estimates after this round
    pub agent_q: Vec<f64>,
    /// Unix time in milliseconds
    pub timestamp: i64,
}

/// Everything a front end may show while the game runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleState {
    pub game_id: String,
    pub status: DuelStatus,
    pub round: usize,
    pub max_rounds: usize,
    pub human_score: u64,
    pub agent_score: u64,
    pub human_q: Vec<f64>,
    pub human_n: Vec<u64>,
    pub agent_q: Vec<f64>,
    pub agent_n: Vec<u64>,
}

/// Owner of the true probabilities during a game. Its Debug output is redacted.
struct HiddenEnvironment(BanditEnvironment);

impl fmt::Debug for HiddenEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HiddenEnvironment({} arms, <hidden>)", self.0.n_arms())
    }
}

/// Duel state machine: NOT_STARTED → IN_PROGRESS → FINISHED
#[derive(Debug)]
pub struct DuelGameController {
    game_id: String,
    config: DuelConfig,
    status: DuelStatus,
    round: usize,
    max_rounds: usize,
    hidden: Option<HiddenEnvironment>,
    agent: UcbAgent,
    human: AgentState,
    human_score: u64,
    agent_score: u64,
    history: Vec<DuelRoundRecord>,
    rng: StdRng,
}

impl DuelGameController {
    /// New game in NOT_STARTED; `seed` drives the hidden probabilities and every reward.
    ///
    /// Anyone holding the seed can regenerate the hidden probabilities, so
    /// callers must not display or log it before `reveal()` has succeeded.
    pub fn new(config: DuelConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let agent = UcbAgent::new(config.n_arms, config.c)?;
        let human = AgentState::new(config.n_arms);

        Ok(Self {
            game_id: Uuid::new_v4().to_string(),
            max_rounds: config.max_rounds,
            config,
            status: DuelStatus::NotStarted,
            round: 0,
            hidden: None,
            agent,
            human,
            human_score: 0,
            agent_score: 0,
            history: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// New game seeded from the thread-local generator
    pub fn with_random_seed(config: DuelConfig) -> Result<Self> {
        Self::new(config, rand::random::<u64>())
    }

    /// Draws the hidden probabilities and opens the game
    pub fn start(&mut self, n_arms: usize, max_rounds: usize) -> Result<()> {
        if self.status != DuelStatus::NotStarted {
            return Err(BanditError::AlreadyStarted);
        }

        let config = DuelConfig {
            n_arms,
            max_rounds,
            ..self.config.clone()
        };
        config.validate()?;

        let probs = generate_hidden_probabilities(n_arms, config.prob_range, &mut self.rng)?;
        let environment = BanditEnvironment::new(probs)?;
        let agent = UcbAgent::new(n_arms, config.c)?;

        self.hidden = Some(HiddenEnvironment(environment));
        self.agent = agent;
        self.human = AgentState::new(n_arms);
        self.max_rounds = max_rounds;
        self.config = config;
        self.status = DuelStatus::InProgress;

        log::info!(
            "Duel {} started: {} arms, {} rounds, c={}",
            self.game_id,
            n_arms,
            max_rounds,
            self.config.c
        );
        Ok(())
    }

    /// Starts with the arm and round counts from the configuration
    pub fn start_default(&mut self) -> Result<()> {
        self.start(self.config.n_arms, self.config.max_rounds)
    }

    /// Plays one round: the human's arm, then the agent's own choice
    pub fn play_round(&mut self, human_arm: usize) -> Result<DuelRoundRecord> {
        self.expect_status(DuelStatus::InProgress)?;
        let n_arms = self.human.n_arms();
        if human_arm >= n_arms {
            return Err(BanditError::InvalidArm {
                arm: human_arm,
                n_arms,
            });
        }
        let environment = match self.hidden.as_ref() {
            Some(HiddenEnvironment(env)) => env,
            None => return Err(BanditError::AlreadyRevealed),
        };

        let human_reward = environment.sample(human_arm, &mut self.rng)?;
        self.human.record(human_arm, human_reward)?;

        let agent_arm = self.agent.select_action();
        let agent_reward = environment.sample(agent_arm, &mut self.rng)?;
        self.agent.update(agent_arm, agent_reward)?;

        self.round += 1;
        self.human_score += u64::from(human_reward);
        self.agent_score += u64::from(agent_reward);

        let record = DuelRoundRecord {
            round: self.round,
            human_arm,
            human_reward,
            human_q: self.human.q().to_vec(),
            agent_arm,
            agent_reward,
            agent_q: self.agent.state().q().to_vec(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.history.push(record.clone());

        log::debug!(
            "Duel {} round {}: human arm {} → {}, UCB arm {} → {}",
            self.game_id,
            self.round,
            human_arm,
            human_reward,
            agent_arm,
            agent_reward
        );

        if self.round >= self.max_rounds {
            self.finish();
        }
        Ok(record)
    }

    /// Ends the game before `max_rounds`
    pub fn end_early(&mut self) -> Result<()> {
        self.expect_status(DuelStatus::InProgress)?;
        log::info!("Duel {} ended early after {} rounds", self.game_id, self.round);
        self.finish();
        Ok(())
    }

    /// Releases the true probabilities. Only once, and only after the game is finished.
    pub fn reveal(&mut self) -> Result<Vec<f64>> {
        if self.status != DuelStatus::Finished {
            return Err(BanditError::NotFinished);
        }
        let HiddenEnvironment(environment) =
            self.hidden.take().ok_or(BanditError::AlreadyRevealed)?;
        log::info!("Duel {} revealed its true probabilities", self.game_id);
        Ok(environment.true_probs().to_vec())
    }

    pub fn is_revealed(&self) -> bool {
        self.status == DuelStatus::Finished && self.hidden.is_none()
    }

    /// Round count, scores and each side's own estimates
    pub fn get_visible_state(&self) -> VisibleState {
        VisibleState {
            game_id: self.game_id.clone(),
            status: self.status,
            round: self.round,
            max_rounds: self.max_rounds,
            human_score: self.human_score,
            agent_score: self.agent_score,
            human_q: self.human.q().to_vec(),
            human_n: self.human.n().to_vec(),
            agent_q: self.agent.state().q().to_vec(),
            agent_n: self.agent.state().n().to_vec(),
        }
    }

    /// Winner by total reward, once the game is finished
    pub fn outcome(&self) -> Option<DuelOutcome> {
        if self.status != DuelStatus::Finished {
            return None;
        }
        Some(match self.human_score.cmp(&self.agent_score) {
            std::cmp::Ordering::Greater => DuelOutcome::HumanWins,
            std::cmp::Ordering::Less => DuelOutcome::AgentWins,
            std::cmp::Ordering::Equal => DuelOutcome::Tie,
        })
    }

    pub fn history(&self) -> &[DuelRoundRecord] {
        &self.history
    }

    pub fn status(&self) -> DuelStatus {
        self.status
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn round(&self) -> usize {
        self.round
    }

    fn expect_status(&self, expected: DuelStatus) -> Result<()> {
        if self.status != expected {
            return Err(BanditError::InvalidState {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.status = DuelStatus::Finished;
        log::info!(
            "Duel {} finished after {} rounds: human {} vs UCB {}",
            self.game_id,
            self.round,
            self.human_score,
            self.agent_score
        );
    }
}
