//! Bandit agent state and the UCB1 agent
//!
//! `AgentState` is the belief shared by both duel players: a running mean and
//! a visit count per arm plus the total number of rounds. `UcbAgent` wraps one
//! state with an exploration constant and the UCB1 selection rule.

use crate::bandit::selection::{select_arm, ucb_values};
use crate::{BanditError, Result};
use serde::{Deserialize, Serialize};

/// Per-arm estimates and visit counts
///
/// Invariant: `n.iter().sum() == t` after every update. `q[i]` is 0 while `n[i] == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    q: Vec<f64>,
    n: Vec<u64>,
    t: u64,
}

impl AgentState {
    pub fn new(n_arms: usize) -> Self {
        Self {
            q: vec![0.0; n_arms],
            n: vec![0; n_arms],
            t: 0,
        }
    }

    pub fn n_arms(&self) -> usize {
        self.q.len()
    }

    /// Estimated reward per arm
    pub fn q(&self) -> &[f64] {
        &self.q
    }

    /// Visit count per arm
    pub fn n(&self) -> &[u64] {
        &self.n
    }

    /// Total rounds recorded
    pub fn t(&self) -> u64 {
        self.t
    }

    /// Estimate for one arm, None until it has been tried
    pub fn estimate(&self, arm: usize) -> Option<f64> {
        match self.n.get(arm) {
            Some(&n) if n > 0 => Some(self.q[arm]),
            _ => None,
        }
    }

    /// Records one observed reward with the incremental mean `Q += (r - Q) / N`
    pub fn record(&mut self, arm: usize, reward: u8) -> Result<()> {
        if arm >= self.q.len() {
            return Err(BanditError::InvalidArm {
                arm,
                n_arms: self.q.len(),
            });
        }
        if reward > 1 {
            return Err(BanditError::InvalidConfiguration(format!(
                "reward must be 0 or 1 (got {})",
                reward
            )));
        }

        self.n[arm] += 1;
        self.t += 1;
        self.q[arm] += (f64::from(reward) - self.q[arm]) / self.n[arm] as f64;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.q.iter_mut().for_each(|q| *q = 0.0);
        self.n.iter_mut().for_each(|n| *n = 0);
        self.t = 0;
    }
}

/// UCB1 agent over a fixed number of arms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UcbAgent {
    c: f64,
    state: AgentState,
}

impl UcbAgent {
    /// Creates an agent; `c` must be finite and non-negative, `n_arms` at least 1
    pub fn new(n_arms: usize, c: f64) -> Result<Self> {
        if n_arms == 0 {
            return Err(BanditError::InvalidConfiguration(
                "agent needs at least one arm".to_string(),
            ));
        }
        crate::config::validate_exploration(c)?;
        Ok(Self {
            c,
            state: AgentState::new(n_arms),
        })
    }

    pub fn n_arms(&self) -> usize {
        self.state.n_arms()
    }

    pub fn exploration(&self) -> f64 {
        self.c
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Arm to play next. Does not mutate the agent; `t` only advances on `update`.
    pub fn select_action(&self) -> usize {
        // n_arms >= 1 is enforced by the constructor
        select_arm(&self.state.q, &self.state.n, self.state.t, self.c).unwrap_or(0)
    }

    pub fn update(&mut self, arm: usize, reward: u8) -> Result<()> {
        self.state.record(arm, reward)
    }

    /// Current UCB score per arm; `f64::INFINITY` marks arms that must still be explored
    pub fn get_ucb_values(&self) -> Vec<f64> {
        ucb_values(&self.state.q, &self.state.n, self.state.t, self.c)
    }

    /// Zeroes Q, N and t; keeps the arm count and `c`
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_new_agent_is_zeroed() {
        let agent = UcbAgent::new(4, 2.0).unwrap();
        assert_eq!(agent.state().q(), &[0.0; 4]);
        assert_eq!(agent.state().n(), &[0; 4]);
        assert_eq!(agent.state().t(), 0);
    }

    #[test]
    fn test_invalid_construction() {
        assert_matches!(UcbAgent::new(0, 1.0), Err(BanditError::InvalidConfiguration(_)));
        assert_matches!(UcbAgent::new(3, -1.0), Err(BanditError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_visits_every_arm_before_exploiting() {
        let mut agent = UcbAgent::new(5, 2.0).unwrap();
        for expected in 0..5 {
            let arm = agent.select_action();
            assert_eq!(arm, expected);
            agent.update(arm, 1).unwrap();
        }
        assert!(agent.state().n().iter().all(|&n| n == 1));
    }

    #[test]
    fn test_incremental_mean() {
        let mut agent = UcbAgent::new(2, 1.0).unwrap();
        for reward in [1, 0, 1, 1] {
            agent.update(0, reward).unwrap();
        }
        assert!((agent.state().q()[0] - 0.75).abs() < 1e-12);
        assert_eq!(agent.state().n()[0], 4);
        assert_eq!(agent.state().t(), 4);
        assert_eq!(agent.state().q()[1], 0.0);
    }

    #[test]
    fn test_update_invalid_arm_leaves_state_untouched() {
        let mut agent = UcbAgent::new(3, 1.0).unwrap();
        agent.update(1, 1).unwrap();
        let before = agent.clone();

        assert_matches!(
            agent.update(3, 1),
            Err(BanditError::InvalidArm { arm: 3, n_arms: 3 })
        );
        assert_matches!(agent.update(0, 2), Err(BanditError::InvalidConfiguration(_)));
        assert_eq!(agent, before);
    }

    #[test]
    fn test_ucb_values_sentinel_for_unvisited() {
        let mut agent = UcbAgent::new(3, 2.0).unwrap();
        agent.update(0, 1).unwrap();
        agent.update(2, 0).unwrap();

        let values = agent.get_ucb_values();
        assert!(values[0].is_finite());
        assert_eq!(values[1], f64::INFINITY);
        assert!(values[2].is_finite());
        assert!(values[0] > values[2]);
    }

    #[test]
    fn test_select_action_matches_ucb_values() {
        let mut agent = UcbAgent::new(3, 0.5).unwrap();
        for (arm, reward) in [(0, 1), (1, 0), (2, 1), (2, 1), (0, 0), (1, 1)] {
            agent.update(arm, reward).unwrap();
        }
        let values = agent.get_ucb_values();
        let best = values
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc })
            .0;
        assert_eq!(agent.select_action(), best);
    }

    #[test]
    fn test_reset_behaves_like_fresh_agent() {
        let mut agent = UcbAgent::new(3, 2.0).unwrap();
        for arm in [0, 1, 2, 2, 2] {
            agent.update(arm, 1).unwrap();
        }
        agent.reset();

        let fresh = UcbAgent::new(3, 2.0).unwrap();
        assert_eq!(agent, fresh);
        assert_eq!(agent.select_action(), fresh.select_action());
        assert_eq!(agent.exploration(), 2.0);
        assert_eq!(agent.n_arms(), 3);
    }

    #[test]
    fn test_estimate_hidden_until_tried() {
        let mut state = AgentState::new(2);
        assert_eq!(state.estimate(0), None);
        state.record(0, 1).unwrap();
        assert_eq!(state.estimate(0), Some(1.0));
        assert_eq!(state.estimate(5), None);
    }
}
