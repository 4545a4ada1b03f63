pub mod agent;
pub mod environment;
pub mod selection;

pub use agent::{AgentState, UcbAgent};
pub use environment::{generate_hidden_probabilities, BanditEnvironment};
