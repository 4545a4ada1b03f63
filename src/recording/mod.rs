//! Export of engine outputs for offline analysis.
//!
//! # Components
//!
//! - `csv_writer`: CSV files for trajectories, comparisons, summaries and duel histories

pub mod csv_writer;

pub use csv_writer::{load_trajectory_csv, CsvWriter, TrajectoryRow};
