//! CSV export of engine outputs.
//!
//! Files land in one output directory:
//! - `trajectory_<label>.csv`: one row per episode round
//! - `comparison_<label>.csv`: one row per pairwise test
//! - `summary_<label>.csv`: one row per configuration
//! - `duel_<game_id>.csv`: one row per duel round
//!
//! Per-arm vectors are written as `;`-separated cells.

use crate::duel::DuelRoundRecord;
use crate::simulation::RoundRecord;
use crate::stats::{ComparisonResult, GroupSummary};
use crate::{BanditError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Flat CSV form of a `RoundRecord`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    pub round_index: usize,
    pub chosen_arm: usize,
    pub reward: u8,
    pub cumulative_reward: u64,
    pub cumulative_average: f64,
    pub q: String,
    pub n: String,
    /// `inf` marks arms not yet explored
    pub ucb: String,
}

impl From<&RoundRecord> for TrajectoryRow {
    fn from(record: &RoundRecord) -> Self {
        Self {
            round_index: record.round_index,
            chosen_arm: record.chosen_arm,
            reward: record.reward,
            cumulative_reward: record.cumulative_reward,
            cumulative_average: record.cumulative_average,
            q: join_cells(&record.q_snapshot),
            n: join_cells(&record.n_snapshot),
            ucb: join_cells(&record.ucb_values_snapshot),
        }
    }
}

impl TryFrom<TrajectoryRow> for RoundRecord {
    type Error = BanditError;

    fn try_from(row: TrajectoryRow) -> Result<Self> {
        Ok(Self {
            round_index: row.round_index,
            chosen_arm: row.chosen_arm,
            reward: row.reward,
            q_snapshot: split_cells(&row.q)?,
            n_snapshot: split_cells(&row.n)?,
            ucb_values_snapshot: split_cells(&row.ucb)?,
            cumulative_reward: row.cumulative_reward,
            cumulative_average: row.cumulative_average,
        })
    }
}

#[derive(Debug, Serialize)]
struct PairwiseRow {
    c1: f64,
    c2: f64,
    mean_diff: f64,
    t_statistic: f64,
    raw_p_value: f64,
    adjusted_p_value: f64,
    significant: bool,
}

#[derive(Debug, Serialize)]
struct DuelRow<'a> {
    game_id: &'a str,
    round: usize,
    human_arm: usize,
    human_reward: u8,
    human_q: String,
    agent_arm: usize,
    agent_reward: u8,
    agent_q: String,
    timestamp: i64,
}

/// Writes export files into a single directory
pub struct CsvWriter {
    base_dir: PathBuf,
}

impl CsvWriter {
    /// Creates the directory if needed
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn write_trajectory(&self, label: &str, trajectory: &[RoundRecord]) -> Result<PathBuf> {
        let path = self.base_dir.join(format!("trajectory_{}.csv", label));
        let mut writer = csv::Writer::from_path(&path)?;
        for record in trajectory {
            writer.serialize(TrajectoryRow::from(record))?;
        }
        writer.flush()?;
        log::info!("Wrote {} rounds to {}", trajectory.len(), path.display());
        Ok(path)
    }

    pub fn write_comparison(&self, label: &str, result: &ComparisonResult) -> Result<PathBuf> {
        let path = self.base_dir.join(format!("comparison_{}.csv", label));
        let mut writer = csv::Writer::from_path(&path)?;
        for pair in &result.pairwise {
            writer.serialize(PairwiseRow {
                c1: pair.pair.0,
                c2: pair.pair.1,
                mean_diff: pair.mean_diff,
                t_statistic: pair.t_statistic,
                raw_p_value: pair.raw_p_value,
                adjusted_p_value: pair.adjusted_p_value,
                significant: pair.significant,
            })?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_summaries(&self, label: &str, summaries: &[GroupSummary]) -> Result<PathBuf> {
        let path = self.base_dir.join(format!("summary_{}.csv", label));
        let mut writer = csv::Writer::from_path(&path)?;
        for summary in summaries {
            writer.serialize(summary)?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_duel_history(&self, game_id: &str, history: &[DuelRoundRecord]) -> Result<PathBuf> {
        let path = self.base_dir.join(format!("duel_{}.csv", game_id));
        let mut writer = csv::Writer::from_path(&path)?;
        for record in history {
            writer.serialize(DuelRow {
                game_id,
                round: record.round,
                human_arm: record.human_arm,
                human_reward: record.human_reward,
                human_q: join_cells(&record.human_q),
                agent_arm: record.agent_arm,
                agent_reward: record.agent_reward,
                agent_q: join_cells(&record.agent_q),
                timestamp: record.timestamp,
            })?;
        }
        writer.flush()?;
        Ok(path)
    }
}

/// Reads a trajectory written by `CsvWriter::write_trajectory`
pub fn load_trajectory_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RoundRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<TrajectoryRow>()
        .map(|row| RoundRecord::try_from(row?))
        .collect()
}

fn join_cells<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

fn split_cells<T: std::str::FromStr>(cell: &str) -> Result<Vec<T>> {
    if cell.is_empty() {
        return Ok(Vec::new());
    }
    cell.split(';')
        .map(|part| {
            part.parse::<T>().map_err(|_| {
                BanditError::InvalidConfiguration(format!("unreadable CSV cell value {:?}", part))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DuelConfig, EpisodeConfig};
    use crate::duel::DuelGameController;
    use crate::simulation::run_episode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_trajectory_written_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CsvWriter::new(dir.path().join("exports")).unwrap();

        let config = EpisodeConfig::new(vec![0.2, 0.5, 0.8], 25, 2.0).with_trajectory();
        let result = run_episode(&config, &mut StdRng::seed_from_u64(4)).unwrap();
        let trajectory = result.trajectory.unwrap();

        let path = writer.write_trajectory("c2", &trajectory).unwrap();
        assert!(path.ends_with("trajectory_c2.csv"));

        let loaded = load_trajectory_csv(&path).unwrap();
        assert_eq!(loaded, trajectory);
        assert_eq!(loaded[0].ucb_values_snapshot[0], f64::INFINITY);
    }

    #[test]
    fn test_duel_history_has_one_row_per_round() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CsvWriter::new(dir.path()).unwrap();

        let mut game = DuelGameController::new(DuelConfig::default(), 5).unwrap();
        game.start(3, 4).unwrap();
        for arm in [0, 1, 2, 0] {
            game.play_round(arm).unwrap();
        }

        let path = writer
            .write_duel_history(game.game_id(), game.history())
            .unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("game_id,round,human_arm"));
    }

    #[test]
    fn test_split_cells_rejects_garbage() {
        assert!(split_cells::<f64>("0.1;abc").is_err());
        assert_eq!(split_cells::<u64>("").unwrap(), Vec::<u64>::new());
    }
}
