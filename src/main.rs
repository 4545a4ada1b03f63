use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use ucb_arena::config::{
    validate_ui_rounds, Defaults, DuelConfig, EpisodeConfig, ExperimentConfig,
};
use ucb_arena::duel::DuelGameController;
use ucb_arena::logging::setup_logging;
use ucb_arena::recording::CsvWriter;
use ucb_arena::simulation::{run_episode, ExperimentRunner};
use ucb_arena::stats::{optimal_reward, StatisticalComparator};

#[derive(Parser, Debug)]
#[command(name = "ucb_arena", version, about = "UCB1 bandit simulations, comparisons and duels")]
struct Cli {
    /// JSON file overriding the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write rotated log files to this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Directory for CSV exports
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,

    /// RNG seed (random when omitted)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single episode and print its trajectory summary
    Simulate {
        /// True success probabilities, comma-separated
        #[arg(long, value_delimiter = ',')]
        probs: Option<Vec<f64>>,
        #[arg(short = 'n', long, value_parser = parse_rounds)]
        rounds: Option<usize>,
        #[arg(short, long)]
        c: Option<f64>,
        /// Print every round
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },
    /// Monte Carlo repetitions for one exploration parameter
    Experiment {
        #[arg(long, value_delimiter = ',')]
        probs: Option<Vec<f64>>,
        #[arg(short = 'n', long, value_parser = parse_rounds)]
        rounds: Option<usize>,
        #[arg(short, long)]
        c: Option<f64>,
        #[arg(short, long)]
        repetitions: Option<usize>,
        /// Run repetitions in parallel
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// ANOVA and Bonferroni-corrected pairwise tests across c values
    Compare {
        #[arg(long, value_delimiter = ',')]
        probs: Option<Vec<f64>>,
        #[arg(short = 'n', long, value_parser = parse_rounds)]
        rounds: Option<usize>,
        #[arg(long, value_delimiter = ',')]
        c_values: Option<Vec<f64>>,
        #[arg(short, long)]
        repetitions: Option<usize>,
        #[arg(short, long)]
        alpha: Option<f64>,
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Mean learning curves per c value
    Curves {
        #[arg(long, value_delimiter = ',')]
        probs: Option<Vec<f64>>,
        #[arg(short = 'n', long, value_parser = parse_rounds)]
        rounds: Option<usize>,
        #[arg(long, value_delimiter = ',')]
        c_values: Option<Vec<f64>>,
        #[arg(short, long)]
        repetitions: Option<usize>,
        /// Print the curve every `every` rounds
        #[arg(long, default_value_t = 50)]
        every: usize,
    },
    /// Play against UCB on hidden probabilities
    Duel {
        #[arg(long)]
        arms: Option<usize>,
        #[arg(long)]
        rounds: Option<usize>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _logger = setup_logging("info", cli.log_dir.as_deref())?;

    let defaults = match &cli.config {
        Some(path) => Defaults::from_json_file(path)?,
        None => Defaults::default(),
    };
    let seed = cli.seed.unwrap_or_else(rand::random::<u64>);
    if let Some(seed) = announced_seed(&cli.command, seed) {
        log::info!("🎲 Seed: {}", seed);
    }

    let export = match &cli.export_dir {
        Some(dir) => Some(CsvWriter::new(dir)?),
        None => None,
    };

    match cli.command {
        Command::Simulate {
            probs,
            rounds,
            c,
            verbose,
        } => {
            let config = EpisodeConfig::new(
                probs.unwrap_or_else(|| defaults.true_probs.clone()),
                rounds.unwrap_or(defaults.n_rounds),
                c.unwrap_or(defaults.c),
            )
            .with_trajectory();
            let result = run_episode(&config, &mut StdRng::seed_from_u64(seed))?;
            let trajectory = result.trajectory.as_deref().unwrap_or_default();

            if verbose {
                for r in trajectory {
                    println!(
                        "round {:>5}  arm {}  reward {}  avg {:.4}  Q {:?}  N {:?}",
                        r.round_index, r.chosen_arm, r.reward, r.cumulative_average, r.q_snapshot, r.n_snapshot
                    );
                }
            }
            if let Some(last) = trajectory.last() {
                println!("\n===== Episode Summary =====");
                println!("Rounds          : {}", result.n_rounds);
                println!("Average reward  : {:.4}", result.average_reward);
                println!("Optimal reward  : {:.4}", optimal_reward(&config.true_probs));
                println!("Regret          : {:.2}", result.regret);
                println!("Pulls per arm   : {:?}", last.n_snapshot);
                println!("Estimates       : {:?}", last.q_snapshot);
                println!("===========================\n");
            }
            if let Some(writer) = &export {
                writer.write_trajectory(&format!("c{}", config.c), trajectory)?;
            }
        }
        Command::Experiment {
            probs,
            rounds,
            c,
            repetitions,
            parallel,
        } => {
            let mut config = experiment_config(&defaults, probs, rounds, repetitions, seed);
            config.parallel = parallel;
            let c = c.unwrap_or(defaults.c);
            let optimal = optimal_reward(&config.true_probs);
            let runner = ExperimentRunner::new(config)?;
            let rewards = runner.run_many(c)?;
            let summary = ucb_arena::stats::GroupSummary::from_samples(c, &rewards, optimal)?;

            println!(
                "c = {:<6} mean = {:.4}, std = {:.4}, min = {:.4}, max = {:.4}, n = {}, gap = {:.4}",
                c, summary.mean, summary.std, summary.min, summary.max, summary.n, summary.optimal_gap
            );
        }
        Command::Compare {
            probs,
            rounds,
            c_values,
            repetitions,
            alpha,
            parallel,
        } => {
            let mut config = experiment_config(&defaults, probs, rounds, repetitions, seed);
            config.parallel = parallel;
            let c_values = c_values.unwrap_or_else(|| defaults.c_values.clone());
            let alpha = alpha.unwrap_or(defaults.alpha);
            let optimal = optimal_reward(&config.true_probs);

            let runner = ExperimentRunner::new(config)?;
            let samples = runner.compare_configurations(&c_values)?;
            let summaries = StatisticalComparator::summarize(&samples, optimal)?;
            let result = StatisticalComparator::compare(&samples, alpha)?;

            println!("\n===== Summary Statistics =====");
            for s in &summaries {
                println!(
                    "c = {:<6} mean = {:.4}, std = {:.4}, min = {:.4}, max = {:.4}, n = {}, gap = {:.4}",
                    s.key, s.mean, s.std, s.min, s.max, s.n, s.optimal_gap
                );
            }
            println!("\n===== ANOVA =====");
            println!("F({}, {}) = {:.4}, p = {:.6}", result.df_between, result.df_within, result.f_statistic, result.p_value);
            if result.significant {
                println!("Significant differences found (p < {})", alpha);
            } else {
                println!("No significant differences (p ≥ {})", alpha);
            }
            println!("\n===== Pairwise t-tests (Bonferroni) =====");
            for p in &result.pairwise {
                println!(
                    "c {:<6} vs {:<6} diff = {:+.5}, t = {:>8.4}, p = {:.6}, adj p = {:.6} {}",
                    p.pair.0,
                    p.pair.1,
                    p.mean_diff,
                    p.t_statistic,
                    p.raw_p_value,
                    p.adjusted_p_value,
                    if p.significant { "✅" } else { "❌" }
                );
            }
            if result.significant {
                println!("\n🏆 Best c = {}", result.best_key);
            }

            if let Some(writer) = &export {
                writer.write_summaries("compare", &summaries)?;
                writer.write_comparison("compare", &result)?;
            }
        }
        Command::Curves {
            probs,
            rounds,
            c_values,
            repetitions,
            every,
        } => {
            let config = experiment_config(&defaults, probs, rounds, repetitions, seed);
            let c_values = c_values.unwrap_or_else(|| defaults.c_values.clone());
            let runner = ExperimentRunner::new(config)?;
            let every = every.max(1);

            for curve in runner.learning_curves(&c_values)? {
                let points: Vec<String> = curve
                    .mean_curve
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| (i + 1) % every == 0)
                    .map(|(i, v)| format!("{}:{:.3}", i + 1, v))
                    .collect();
                println!(
                    "c = {:<6} final mean = {:.4} (gap {:.4})  {}",
                    curve.c,
                    curve.final_summary.mean,
                    curve.final_summary.optimal_gap,
                    points.join(" ")
                );
            }
        }
        Command::Duel { arms, rounds } => {
            let config = DuelConfig {
                n_arms: arms.unwrap_or(defaults.duel.n_arms),
                max_rounds: rounds.unwrap_or(defaults.duel.max_rounds),
                ..defaults.duel.clone()
            };
            let mut game = DuelGameController::new(config, seed)?;
            game.start_default()?;
            play_duel(&mut game)?;
            if game.is_revealed() {
                log::info!("🎲 Seed: {}", seed);
            }

            if let Some(writer) = &export {
                writer.write_duel_history(game.game_id(), game.history())?;
            }
        }
    }

    Ok(())
}

/// Round counts from the command line, bounded to `MIN_ROUNDS..=MAX_ROUNDS`
fn parse_rounds(raw: &str) -> Result<usize, String> {
    let rounds: usize = raw
        .parse()
        .map_err(|_| format!("`{}` is not a round count", raw))?;
    validate_ui_rounds(rounds).map_err(|e| e.to_string())?;
    Ok(rounds)
}

/// Seed to log before running `command`. A duel's seed determines its hidden
/// probabilities, so it is only logged once they have been revealed.
fn announced_seed(command: &Command, seed: u64) -> Option<u64> {
    match command {
        Command::Duel { .. } => None,
        _ => Some(seed),
    }
}

fn experiment_config(
    defaults: &Defaults,
    probs: Option<Vec<f64>>,
    rounds: Option<usize>,
    repetitions: Option<usize>,
    seed: u64,
) -> ExperimentConfig {
    ExperimentConfig::new(
        probs.unwrap_or_else(|| defaults.true_probs.clone()),
        rounds.unwrap_or(defaults.n_rounds),
        repetitions.unwrap_or(defaults.n_repetitions),
        seed,
    )
}

fn play_duel(game: &mut DuelGameController) -> Result<(), Box<dyn Error>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let n_arms = game.get_visible_state().human_n.len();

    while game.status() == ucb_arena::DuelStatus::InProgress {
        let state = game.get_visible_state();
        println!(
            "\nRound {}/{}   You {} – UCB {}",
            state.round + 1,
            state.max_rounds,
            state.human_score,
            state.agent_score
        );
        for (arm, (q, n)) in state.human_q.iter().zip(&state.human_n).enumerate() {
            if *n > 0 {
                println!("  Arm {}: your estimate {:.3} ({} tries)", arm + 1, q, n);
            } else {
                println!("  Arm {}: ??? (not tried)", arm + 1);
            }
        }
        print!("Choose an arm [1-{}] or q to stop: ", n_arms);
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                game.end_early()?;
                break;
            }
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("q") {
            game.end_early()?;
            break;
        }
        let arm = match input.parse::<usize>() {
            Ok(choice) if choice >= 1 => choice - 1,
            _ => {
                println!("⚠️ Enter a number between 1 and {}", n_arms);
                continue;
            }
        };
        match game.play_round(arm) {
            Ok(record) => println!(
                "  You: arm {} → {}   UCB: arm {} → {}",
                record.human_arm + 1,
                if record.human_reward == 1 { "✅" } else { "❌" },
                record.agent_arm + 1,
                if record.agent_reward == 1 { "✅" } else { "❌" }
            ),
            Err(e) => println!("⚠️ {}", e),
        }
    }

    let state = game.get_visible_state();
    println!("\n🏁 Game over after {} rounds", state.round);
    if let Some(outcome) = game.outcome() {
        println!("{}: you {} – UCB {}", outcome, state.human_score, state.agent_score);
    }

    let truth = game.reveal()?;
    println!("\n🎭 True probabilities:");
    for (arm, p) in truth.iter().enumerate() {
        match state.human_n[arm] {
            0 => println!("  Arm {}: {:.3} (not tried)", arm + 1, p),
            _ => println!("  Arm {}: {:.3} (you estimated {:.3})", arm + 1, p, state.human_q[arm]),
        }
    }
    Ok(())
}
