use clap::Parser;
use flexi_logger::Logger;
use std::error::Error;

use ucb_arena::config::ExperimentConfig;
use ucb_arena::simulation::ExperimentRunner;
use ucb_arena::stats::{optimal_reward, StatisticalComparator};

#[derive(Parser, Debug)]
#[command(
    name = "sweep-c",
    about = "Sweep the UCB exploration parameter over a grid and report final performance."
)]
struct Args {
    /// True success probabilities, comma-separated
    #[arg(long, value_delimiter = ',', default_value = "0.05,0.10,0.20")]
    probs: Vec<f64>,

    /// Rounds per episode
    #[arg(short = 'n', long, default_value_t = 500)]
    rounds: usize,

    /// Repetitions per c value
    #[arg(short, long, default_value_t = 30)]
    repetitions: usize,

    /// Smallest c in the grid
    #[arg(long, default_value_t = 0.1)]
    c_min: f64,

    /// Largest c in the grid
    #[arg(long, default_value_t = 5.0)]
    c_max: f64,

    /// Number of grid points
    #[arg(long, default_value_t = 10)]
    steps: usize,

    /// Base RNG seed
    #[arg(short, long, default_value_t = 2025)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    Logger::try_with_env_or_str("info")?
        .format(flexi_logger::colored_default_format)
        .start()?;

    let grid = c_grid(args.c_min, args.c_max, args.steps)?;

    log::info!(
        "🔍 Sweeping c over {} values: rounds={}, repetitions={}, seed={}",
        grid.len(),
        args.rounds,
        args.repetitions,
        args.seed
    );

    let optimal = optimal_reward(&args.probs);
    let mut config = ExperimentConfig::new(args.probs, args.rounds, args.repetitions, args.seed);
    config.parallel = true;
    let runner = ExperimentRunner::new(config)?;

    let samples = runner.compare_configurations(&grid)?;
    let summaries = StatisticalComparator::summarize(&samples, optimal)?;

    println!("\n===== c Sweep ({} repetitions) =====", args.repetitions);
    println!("{:>8} {:>10} {:>10} {:>10}", "c", "mean", "std", "gap");
    for s in &summaries {
        println!("{:>8.3} {:>10.4} {:>10.4} {:>10.4}", s.key, s.mean, s.std, s.optimal_gap);
    }

    if let Some(best) = summaries
        .iter()
        .max_by(|a, b| a.mean.total_cmp(&b.mean).then(b.key.total_cmp(&a.key)))
    {
        println!("\n🏆 Best c = {:.3} (mean {:.4})", best.key, best.mean);
    }
    println!("====================================\n");

    Ok(())
}

/// Evenly spaced c values from `c_min` to `c_max` inclusive
fn c_grid(c_min: f64, c_max: f64, steps: usize) -> Result<Vec<f64>, String> {
    if steps < 2 || !(c_min >= 0.0) || !(c_max > c_min) || !c_max.is_finite() {
        return Err(format!(
            "Grid needs 0 <= c_min < c_max and at least 2 steps (received {}..{} in {} steps).",
            c_min, c_max, steps
        ));
    }
    Ok((0..steps)
        .map(|i| c_min + (c_max - c_min) * i as f64 / (steps - 1) as f64)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_may_start_at_zero() {
        let grid = c_grid(0.0, 2.0, 5).unwrap();
        assert_eq!(grid, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_invalid_grids_rejected() {
        assert!(c_grid(-0.5, 2.0, 5).is_err());
        assert!(c_grid(1.0, 1.0, 5).is_err());
        assert!(c_grid(0.1, 2.0, 1).is_err());
        assert!(c_grid(f64::NAN, 2.0, 3).is_err());
    }
}
