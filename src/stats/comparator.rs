//! Multi-configuration comparison
//!
//! One-way ANOVA across all configurations, then every pairwise two-sample
//! Student t-test (pooled variance) with a Bonferroni correction. Pairwise
//! rows are always reported; they can only be flagged significant when the
//! omnibus test is.

use crate::config::validate_alpha;
use crate::stats::distributions::{f_survival, students_t_two_tailed};
use crate::stats::summary::{is_constant, mean, means_equal, sample_variance, GroupSummary};
use crate::{BanditError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Per-episode average rewards of one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleGroup {
    pub key: f64,
    pub values: Vec<f64>,
}

/// Samples keyed by configuration (the exploration parameter), kept in
/// ascending key order with unique keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSample {
    groups: Vec<SampleGroup>,
}

impl ConfigurationSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a configuration. Fails on a NaN or already present key.
    pub fn insert(&mut self, key: f64, values: Vec<f64>) -> Result<()> {
        let key = normalize_key(key);
        if key.is_nan() {
            return Err(BanditError::InvalidConfiguration(
                "configuration key must not be NaN".to_string(),
            ));
        }
        match self
            .groups
            .binary_search_by(|group| group.key.total_cmp(&key))
        {
            Ok(_) => Err(BanditError::InvalidConfiguration(format!(
                "duplicate configuration key {}",
                key
            ))),
            Err(position) => {
                self.groups.insert(position, SampleGroup { key, values });
                Ok(())
            }
        }
    }

    pub fn contains(&self, key: f64) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: f64) -> Option<&[f64]> {
        let key = normalize_key(key);
        self.groups
            .binary_search_by(|group| group.key.total_cmp(&key))
            .ok()
            .map(|i| self.groups[i].values.as_slice())
    }

    pub fn keys(&self) -> Vec<f64> {
        self.groups.iter().map(|g| g.key).collect()
    }

    /// Groups in ascending key order
    pub fn groups(&self) -> &[SampleGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Folds -0.0 into 0.0 so both zeros name the same configuration
pub(crate) fn normalize_key(key: f64) -> f64 {
    key + 0.0
}

/// One pairwise test between two configurations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseComparison {
    /// (lower key, higher key)
    pub pair: (f64, f64),
    /// mean(first) - mean(second)
    pub mean_diff: f64,
    #[serde(with = "crate::serde_utils::unbounded_f64")]
    pub t_statistic: f64,
    pub raw_p_value: f64,
    /// min(raw × number of pairs, 1)
    pub adjusted_p_value: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(with = "crate::serde_utils::unbounded_f64")]
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub alpha: f64,
    /// Omnibus result: p_value < alpha
    pub significant: bool,
    /// Ascending by first key, then by partner key
    pub pairwise: Vec<PairwiseComparison>,
    /// Configuration with the highest mean (lowest key on ties)
    pub best_key: f64,
}

/// ANOVA + Bonferroni pairwise comparison of configuration samples
pub struct StatisticalComparator;

impl StatisticalComparator {
    /// Needs at least two configurations with at least two samples each
    pub fn compare(samples: &ConfigurationSample, alpha: f64) -> Result<ComparisonResult> {
        validate_alpha(alpha)?;
        if samples.len() < 2 {
            return Err(BanditError::InsufficientData(format!(
                "need at least 2 configurations, got {}",
                samples.len()
            )));
        }
        if let Some(group) = samples.groups().iter().find(|g| g.values.len() < 2) {
            return Err(BanditError::InsufficientData(format!(
                "configuration {} has {} sample(s), need at least 2",
                group.key,
                group.values.len()
            )));
        }
        if samples
            .groups()
            .iter()
            .any(|g| g.values.iter().any(|v| !v.is_finite()))
        {
            return Err(BanditError::InvalidConfiguration(
                "samples must be finite numbers".to_string(),
            ));
        }

        let (f_statistic, df_between, df_within) = one_way_anova(samples.groups());
        let p_value = f_survival(f_statistic, df_between as f64, df_within as f64);
        let significant = p_value < alpha;

        let groups = samples.groups();
        let num_pairs = groups.len() * (groups.len() - 1) / 2;
        let mut pairwise = Vec::with_capacity(num_pairs);
        for (i, first) in groups.iter().enumerate() {
            for second in &groups[i + 1..] {
                let (t_statistic, raw_p_value) = pooled_t_test(&first.values, &second.values);
                let adjusted_p_value = (raw_p_value * num_pairs as f64).min(1.0);
                pairwise.push(PairwiseComparison {
                    pair: (first.key, second.key),
                    mean_diff: mean(&first.values) - mean(&second.values),
                    t_statistic,
                    raw_p_value,
                    adjusted_p_value,
                    significant: significant && adjusted_p_value < alpha,
                });
            }
        }

        let best_key = groups
            .iter()
            .map(|g| (g.key, mean(&g.values)))
            .fold(None, |best: Option<(f64, f64)>, (key, m)| match best {
                Some((_, best_mean)) if m.partial_cmp(&best_mean) != Some(Ordering::Greater) => {
                    best
                }
                _ => Some((key, m)),
            })
            .map(|(key, _)| key)
            .unwrap_or(f64::NAN);

        log::info!(
            "ANOVA over {} configurations: F={:.4}, p={:.6}, significant={}",
            groups.len(),
            f_statistic,
            p_value,
            significant
        );

        Ok(ComparisonResult {
            f_statistic,
            p_value,
            df_between,
            df_within,
            alpha,
            significant,
            pairwise,
            best_key,
        })
    }

    /// Descriptive summary of each configuration in key order
    pub fn summarize(samples: &ConfigurationSample, optimal: f64) -> Result<Vec<GroupSummary>> {
        samples
            .groups()
            .iter()
            .map(|g| GroupSummary::from_samples(g.key, &g.values, optimal))
            .collect()
    }
}

/// Returns (F, df_between, df_within). When every group is constant there is
/// no within-group variance: F = 0 if all values agree, F = +inf otherwise.
fn one_way_anova(groups: &[SampleGroup]) -> (f64, usize, usize) {
    let total: usize = groups.iter().map(|g| g.values.len()).sum();
    let df_between = groups.len() - 1;
    let df_within = total - groups.len();

    if groups.iter().all(|g| is_constant(&g.values)) {
        let reference = groups.iter().find_map(|g| g.values.first().copied());
        let all_equal = groups
            .iter()
            .filter_map(|g| g.values.first())
            .all(|&v| reference.map_or(true, |r| means_equal(v, r)));
        let f = if all_equal { 0.0 } else { f64::INFINITY };
        return (f, df_between, df_within);
    }

    let grand_mean = groups
        .iter()
        .flat_map(|g| g.values.iter())
        .sum::<f64>()
        / total as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let m = mean(&group.values);
        ss_between += group.values.len() as f64 * (m - grand_mean).powi(2);
        ss_within += group.values.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    }

    let f = (ss_between / df_between as f64) / (ss_within / df_within as f64);
    (f, df_between, df_within)
}

/// Equal-variance two-sample t-test, returns (t, two-tailed p)
fn pooled_t_test(a: &[f64], b: &[f64]) -> (f64, f64) {
    let diff = mean(a) - mean(b);

    if is_constant(a) && is_constant(b) {
        if means_equal(mean(a), mean(b)) {
            return (0.0, 1.0);
        }
        return (diff.signum() * f64::INFINITY, 0.0);
    }

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let df = n1 + n2 - 2.0;
    let pooled = ((n1 - 1.0) * sample_variance(a) + (n2 - 1.0) * sample_variance(b)) / df;
    let t = diff / (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    (t, students_t_two_tailed(t, df))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample(groups: &[(f64, &[f64])]) -> ConfigurationSample {
        let mut s = ConfigurationSample::new();
        for (key, values) in groups {
            s.insert(*key, values.to_vec()).unwrap();
        }
        s
    }

    #[test]
    fn test_insert_keeps_keys_sorted_and_unique() {
        let mut s = ConfigurationSample::new();
        s.insert(2.0, vec![0.1]).unwrap();
        s.insert(0.5, vec![0.2]).unwrap();
        s.insert(10.0, vec![0.3]).unwrap();
        assert_eq!(s.keys(), vec![0.5, 2.0, 10.0]);
        assert_matches!(s.insert(2.0, vec![]), Err(BanditError::InvalidConfiguration(_)));
        assert_matches!(s.insert(f64::NAN, vec![]), Err(BanditError::InvalidConfiguration(_)));
        assert_eq!(s.get(0.5), Some(&[0.2][..]));
        assert_eq!(s.get(1.0), None);
    }

    #[test]
    fn test_negative_zero_is_the_same_key() {
        let mut s = ConfigurationSample::new();
        s.insert(-0.0, vec![0.4, 0.5]).unwrap();
        assert_eq!(s.keys()[0].to_bits(), 0.0f64.to_bits());
        assert!(s.contains(0.0));
        assert_matches!(s.insert(0.0, vec![0.1]), Err(BanditError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_insufficient_data() {
        let one_group = sample(&[(1.0, &[0.1, 0.2])]);
        assert_matches!(
            StatisticalComparator::compare(&one_group, 0.05),
            Err(BanditError::InsufficientData(_))
        );

        let one_rep = sample(&[(1.0, &[0.1, 0.2]), (2.0, &[0.3])]);
        assert_matches!(
            StatisticalComparator::compare(&one_rep, 0.05),
            Err(BanditError::InsufficientData(_))
        );
    }

    #[test]
    fn test_invalid_alpha() {
        let s = sample(&[(1.0, &[0.1, 0.2]), (2.0, &[0.3, 0.4])]);
        assert_matches!(
            StatisticalComparator::compare(&s, 1.0),
            Err(BanditError::InvalidConfiguration(_))
        );
    }

    #[test]
    fn test_anova_known_values() {
        // Textbook data: group means 5, 6, 9, grand mean 6.667
        // SSB = 5*(1.667² + 0.667² + 2.333²) = 43.33, SSW = 10 + 10 + 10 = 30
        let s = sample(&[
            (1.0, &[3.0, 4.0, 5.0, 6.0, 7.0]),
            (2.0, &[4.0, 5.0, 6.0, 7.0, 8.0]),
            (3.0, &[7.0, 8.0, 9.0, 10.0, 11.0]),
        ]);
        let result = StatisticalComparator::compare(&s, 0.05).unwrap();
        let expected_f = (43.333_333_333_333_336 / 2.0) / (30.0 / 12.0);
        assert!((result.f_statistic - expected_f).abs() < 1e-9);
        assert_eq!(result.df_between, 2);
        assert_eq!(result.df_within, 12);
        // closed form for d1 = 2
        let expected_p = (1.0 + 2.0 * expected_f / 12.0).powf(-6.0);
        assert!((result.p_value - expected_p).abs() < 1e-9);
        assert!(result.significant);
        assert_eq!(result.best_key, 3.0);
    }

    #[test]
    fn test_pairwise_canonical_order_and_bonferroni() {
        let s = sample(&[
            (10.0, &[0.50, 0.52, 0.49, 0.51]),
            (0.1, &[0.10, 0.12, 0.11, 0.09]),
            (2.0, &[0.80, 0.82, 0.79, 0.81]),
        ]);
        let result = StatisticalComparator::compare(&s, 0.05).unwrap();

        let pairs: Vec<(f64, f64)> = result.pairwise.iter().map(|p| p.pair).collect();
        assert_eq!(pairs, vec![(0.1, 2.0), (0.1, 10.0), (2.0, 10.0)]);
        for p in &result.pairwise {
            assert_eq!(p.adjusted_p_value, (p.raw_p_value * 3.0).min(1.0));
            assert!(p.significant);
        }
        assert!(result.pairwise[0].mean_diff < 0.0);
        assert!(result.pairwise[0].t_statistic < 0.0);
        assert_eq!(result.best_key, 2.0);
    }

    #[test]
    fn test_not_significant_forces_flags_false() {
        let s = sample(&[
            (1.0, &[0.50, 0.60, 0.40, 0.55]),
            (2.0, &[0.52, 0.58, 0.41, 0.56]),
            (3.0, &[0.49, 0.61, 0.42, 0.50]),
        ]);
        let result = StatisticalComparator::compare(&s, 0.05).unwrap();
        assert!(!result.significant);
        assert_eq!(result.pairwise.len(), 3);
        assert!(result.pairwise.iter().all(|p| !p.significant));
    }

    #[test]
    fn test_constant_groups() {
        let equal = sample(&[(1.0, &[0.5, 0.5]), (2.0, &[0.5, 0.5])]);
        let result = StatisticalComparator::compare(&equal, 0.05).unwrap();
        assert_eq!(result.f_statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.pairwise[0].raw_p_value, 1.0);

        let separated = sample(&[(1.0, &[0.2, 0.2]), (2.0, &[0.7, 0.7])]);
        let result = StatisticalComparator::compare(&separated, 0.05).unwrap();
        assert_eq!(result.f_statistic, f64::INFINITY);
        assert_eq!(result.p_value, 0.0);
        assert_eq!(result.pairwise[0].t_statistic, f64::NEG_INFINITY);
        assert!(result.pairwise[0].significant);
    }

    #[test]
    fn test_constant_groups_decided_without_rounding() {
        let tenths = sample(&[(1.0, &[0.1; 3][..]), (2.0, &[0.1; 3][..]), (3.0, &[0.1; 3][..])]);
        let result = StatisticalComparator::compare(&tenths, 0.05).unwrap();
        assert_eq!(result.f_statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(!result.significant);

        let mixed_sizes = sample(&[(0.5, &[0.9; 10][..]), (1.0, &[0.9; 3][..]), (2.0, &[0.86; 30][..])]);
        let result = StatisticalComparator::compare(&mixed_sizes, 0.05).unwrap();
        assert_eq!(result.f_statistic, f64::INFINITY);
        let equal_pair = &result.pairwise[0];
        assert_eq!(equal_pair.pair, (0.5, 1.0));
        assert_eq!(equal_pair.t_statistic, 0.0);
        assert_eq!(equal_pair.raw_p_value, 1.0);
        assert_eq!(equal_pair.mean_diff, 0.0);
        assert!(!equal_pair.significant);
    }

    #[test]
    fn test_identical_episodes_give_no_difference() {
        use crate::config::ExperimentConfig;
        use crate::simulation::ExperimentRunner;

        // deterministic arms: every repetition of every c earns exactly 0.9
        let runner =
            ExperimentRunner::new(ExperimentConfig::new(vec![1.0, 0.0], 10, 10, 3)).unwrap();
        let samples = runner.compare_configurations(&[0.1, 0.2, 0.3]).unwrap();
        assert!(samples.groups().iter().all(|g| g.values.iter().all(|&v| v == 0.9)));

        let result = StatisticalComparator::compare(&samples, 0.05).unwrap();
        assert_eq!(result.f_statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(!result.significant);
        assert!(result.pairwise.iter().all(|p| p.raw_p_value == 1.0 && !p.significant));
    }

    #[test]
    fn test_result_independent_of_insertion_order() {
        let a = sample(&[(1.0, &[0.1, 0.3, 0.2]), (5.0, &[0.6, 0.4, 0.5])]);
        let b = sample(&[(5.0, &[0.6, 0.4, 0.5]), (1.0, &[0.1, 0.3, 0.2])]);
        assert_eq!(
            StatisticalComparator::compare(&a, 0.05).unwrap(),
            StatisticalComparator::compare(&b, 0.05).unwrap()
        );
    }

    #[test]
    fn test_two_groups_anova_matches_t_test() {
        let s = sample(&[(1.0, &[0.1, 0.4, 0.3, 0.2]), (2.0, &[0.5, 0.3, 0.6, 0.4])]);
        let result = StatisticalComparator::compare(&s, 0.05).unwrap();
        let t = result.pairwise[0].t_statistic;
        assert!((result.f_statistic - t * t).abs() < 1e-9);
        assert!((result.p_value - result.pairwise[0].raw_p_value).abs() < 1e-9);
    }

    #[test]
    fn test_summarize() {
        let s = sample(&[(1.0, &[0.1, 0.3]), (2.0, &[0.5, 0.7])]);
        let summaries = StatisticalComparator::summarize(&s, 0.9).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].key, 1.0);
        assert!((summaries[1].mean - 0.6).abs() < 1e-12);
        assert!((summaries[1].optimal_gap - 0.3).abs() < 1e-12);
    }
}
