//! # UCB Arena
//!
//! A library for teaching and evaluating the UCB1 algorithm on stochastic
//! Bernoulli multi-armed bandits.
//!
//! ## Features
//!
//! - **Bandit Engine**: reward environment, UCB1 agent and selection rule
//! - **Simulation**: single episodes with optional trajectories, Monte Carlo repetition
//! - **Statistics**: one-way ANOVA with Bonferroni-corrected pairwise t-tests
//! - **Duel**: human vs UCB game over a hidden set of arm probabilities
//! - **Recording**: CSV export of trajectories, comparisons and duel histories
//!
//! ## Usage
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use ucb_arena::{run_episode, EpisodeConfig};
//!
//! let config = EpisodeConfig::new(vec![0.1, 0.5, 0.9], 200, 2.0);
//! let mut rng = StdRng::seed_from_u64(7);
//! let result = run_episode(&config, &mut rng).unwrap();
//! assert!(result.average_reward >= 0.0 && result.average_reward <= 1.0);
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Reward environment, UCB1 scoring and the agent
pub mod bandit;

/// Validated configuration structs and defaults
pub mod config;

/// Human vs UCB hidden-information game
pub mod duel;

/// Logging setup for binaries
pub mod logging;

/// CSV export of engine outputs
pub mod recording;

/// Episode driver and Monte Carlo experiments
pub mod simulation;

/// ANOVA, pairwise tests and summaries
pub mod stats;

// ============================================================================
// INTERNAL MODULES
// ============================================================================

mod serde_utils;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use bandit::{AgentState, BanditEnvironment, UcbAgent};
pub use config::{Defaults, DuelConfig, EpisodeConfig, ExperimentConfig};
pub use duel::{DuelGameController, DuelOutcome, DuelRoundRecord, DuelStatus, VisibleState};
pub use simulation::{
    run_episode, EpisodeResult, EpisodeSimulator, ExperimentRunner, LearningCurve, RoundRecord,
};
pub use stats::{
    ComparisonResult, ConfigurationSample, GroupSummary, PairwiseComparison,
    StatisticalComparator,
};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the UCB Arena library
#[derive(Debug, thiserror::Error)]
pub enum BanditError {
    #[error("Invalid arm {arm}: expected an index in 0..{n_arms}")]
    InvalidArm { arm: usize, n_arms: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid state: expected {expected}, game is {actual}")]
    InvalidState {
        expected: duel::DuelStatus,
        actual: duel::DuelStatus,
    },

    #[error("Game already started")]
    AlreadyStarted,

    #[error("Game not finished: true probabilities stay hidden until the last round")]
    NotFinished,

    #[error("True probabilities were already revealed")]
    AlreadyRevealed,

    #[error("Experiment cancelled after {completed} of {requested} repetitions")]
    Cancelled { completed: usize, requested: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, BanditError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
