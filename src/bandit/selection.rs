//! UCB1 selection rule
//!
//! Score of a visited arm: `Q[i] + c × sqrt(ln(t) / N[i])`.
//! Arms with `N[i] == 0` score `f64::INFINITY`, the must-explore sentinel, and
//! are always taken before any scored arm (lowest index first). The log term is
//! therefore only ever evaluated once every arm has a visit, i.e. with `t >= 1`.

/// Score of a single arm
///
/// # Arguments
/// * `value` - Running mean reward of the arm
/// * `visits` - Times the arm was pulled
/// * `total` - Total pulls over all arms
/// * `c` - Exploration constant
pub fn ucb_score(value: f64, visits: u64, total: u64, c: f64) -> f64 {
    if visits == 0 {
        return f64::INFINITY;
    }
    let exploration = ((total as f64).ln() / visits as f64).sqrt();
    value + c * exploration
}

/// Scores of every arm, in arm order
pub fn ucb_values(values: &[f64], visits: &[u64], total: u64, c: f64) -> Vec<f64> {
    values
        .iter()
        .zip(visits)
        .map(|(&q, &n)| ucb_score(q, n, total, c))
        .collect()
}

/// Index of the arm UCB1 plays next, or None when there are no arms
///
/// Unvisited arms come first in index order; otherwise the highest score wins
/// and ties go to the lowest index.
pub fn select_arm(values: &[f64], visits: &[u64], total: u64, c: f64) -> Option<usize> {
    if values.is_empty() {
        return None;
    }

    if let Some(unvisited) = visits.iter().position(|&n| n == 0) {
        return Some(unvisited);
    }

    let mut best_ucb = f64::NEG_INFINITY;
    let mut best_index = 0;

    for (i, (&q, &n)) in values.iter().zip(visits).enumerate() {
        let ucb = ucb_score(q, n, total, c);
        // strict comparison keeps the lowest index on ties
        if ucb > best_ucb {
            best_ucb = ucb;
            best_index = i;
        }
    }

    Some(best_index)
}
