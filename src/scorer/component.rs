use std::collections::{BTreeMap, BTreeSet};

use crate::parser::clauses::ClauseKind;
use crate::parser::components::ComponentSets;

/// Running true/false positive/negative counters for one clause,
/// accumulated across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClauseStats {
    /// Components present on both sides.
    pub true_positive: usize,
    /// Components only the prediction produced.
    pub false_positive: usize,
    /// Components only the gold query produced.
    pub false_negative: usize,
}

impl ClauseStats {
    /// True when the clause never appeared on either side of any pair.
    ///
    /// A vacuous clause scores a perfect 1.0 on every metric, the same
    /// convention the execution comparator uses for two empty result sets;
    /// counters are reported alongside so vacuous scores are recognizable.
    pub fn is_vacuous(&self) -> bool {
        self.true_positive == 0 && self.false_positive == 0 && self.false_negative == 0
    }

    /// tp / (tp + fp); 0 on an empty denominator, 1.0 when vacuous.
    pub fn precision(&self) -> f64 {
        if self.is_vacuous() {
            return 1.0;
        }
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// tp / (tp + fn); 0 on an empty denominator, 1.0 when vacuous.
    pub fn recall(&self) -> f64 {
        if self.is_vacuous() {
            return 1.0;
        }
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// Harmonic mean of precision and recall; 0 when both are 0.
    pub fn f1(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }

    /// Accumulate one (predicted, gold) component-set comparison.
    pub fn add_comparison(&mut self, predicted: &BTreeSet<String>, gold: &BTreeSet<String>) {
        let intersection = predicted.intersection(gold).count();
        self.true_positive += intersection;
        self.false_positive += predicted.len() - intersection;
        self.false_negative += gold.len() - intersection;
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Micro-averaged component scorer: counters are pooled across the whole
/// batch rather than averaging per-example F1 values.
#[derive(Debug, Clone)]
pub struct ComponentScorer {
    stats: BTreeMap<ClauseKind, ClauseStats>,
    pairs: usize,
}

impl ComponentScorer {
    /// Fresh scorer with zeroed counters for every clause.
    pub fn new() -> Self {
        let stats = ClauseKind::ALL
            .iter()
            .map(|kind| (*kind, ClauseStats::default()))
            .collect();
        ComponentScorer { stats, pairs: 0 }
    }

    /// Fold one (predicted, gold) pair into the batch counters. A clause
    /// absent from both sides contributes nothing.
    pub fn accumulate(&mut self, predicted: &ComponentSets, gold: &ComponentSets) {
        let empty = BTreeSet::new();
        for kind in ClauseKind::ALL {
            let predicted_set = predicted.get(&kind).unwrap_or(&empty);
            let gold_set = gold.get(&kind).unwrap_or(&empty);
            if let Some(stats) = self.stats.get_mut(&kind) {
                stats.add_comparison(predicted_set, gold_set);
            }
        }
        self.pairs += 1;
    }

    /// Number of pairs folded in so far.
    pub fn pairs(&self) -> usize {
        self.pairs
    }

    /// Per-clause counters.
    pub fn stats(&self) -> &BTreeMap<ClauseKind, ClauseStats> {
        &self.stats
    }

    /// Per-clause F1 over the whole batch.
    pub fn f1_scores(&self) -> BTreeMap<ClauseKind, f64> {
        self.stats
            .iter()
            .map(|(kind, stats)| (*kind, stats.f1()))
            .collect()
    }

    /// F1 per clause for a single pair, without touching batch counters.
    pub fn pair_f1(predicted: &ComponentSets, gold: &ComponentSets) -> BTreeMap<ClauseKind, f64> {
        let mut single = ComponentScorer::new();
        single.accumulate(predicted, gold);
        single.f1_scores()
    }
}

impl Default for ComponentScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn counters_accumulate_micro_averaged() {
        let mut stats = ClauseStats::default();
        stats.add_comparison(&set(&["a", "b"]), &set(&["b", "c"]));
        stats.add_comparison(&set(&["c"]), &set(&["c"]));
        assert_eq!(stats.true_positive, 2);
        assert_eq!(stats.false_positive, 1);
        assert_eq!(stats.false_negative, 1);
        assert!((stats.precision() - 2.0 / 3.0).abs() < 1e-9);
        assert!((stats.recall() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn vacuous_clause_scores_perfect() {
        let stats = ClauseStats::default();
        assert!(stats.is_vacuous());
        assert_eq!(stats.precision(), 1.0);
        assert_eq!(stats.recall(), 1.0);
        assert_eq!(stats.f1(), 1.0);
    }

    #[test]
    fn one_sided_clause_scores_zero() {
        let mut stats = ClauseStats::default();
        stats.add_comparison(&set(&[]), &set(&["gold only"]));
        assert_eq!(stats.precision(), 0.0);
        assert_eq!(stats.recall(), 0.0);
        assert_eq!(stats.f1(), 0.0);
    }
}
