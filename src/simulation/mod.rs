pub mod episode;
pub mod experiment;

pub use episode::{run_episode, EpisodeResult, EpisodeSimulator, RoundRecord};
pub use experiment::{repetition_seed, ExperimentRunner, LearningCurve};
