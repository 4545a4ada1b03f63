pub mod comparator;
pub mod distributions;
pub mod summary;

pub use comparator::{
    ComparisonResult, ConfigurationSample, PairwiseComparison, StatisticalComparator,
};
pub use summary::{optimal_reward, GroupSummary};
