//! Information-gain strategy exploration.
//!
//! Deterministic alternative to sampling bandits: each candidate is scored by
//! a blended posterior mean plus an exploration bonus proportional to the
//! posterior standard deviation. Statistics are kept in two layers, global
//! and per-context, blended with a fixed context weight. Ties break on the
//! lexicographically smallest strategy key, so selection is reproducible.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const BETA: f64 = 1.0;
const CONTEXT_WEIGHT: f64 = 0.7;
const ESS_K: f64 = 5.0;
const MIN_CONFIDENCE: f64 = 0.4;
const MAX_CONFIDENCE: f64 = 0.98;
const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyStats {
    pub successes: f64,
    pub trials: f64,
}

impl StrategyStats {
    pub fn mean(&self) -> f64 {
        if self.trials < EPSILON {
            0.5
        } else {
            self.successes / self.trials
        }
    }

    pub fn variance(&self) -> f64 {
        if self.trials < 2.0 {
            0.25
        } else {
            let p = self.mean();
            p * (1.0 - p) / self.trials
        }
    }

    pub fn record(&mut self, reward: f64) {
        self.trials += 1.0;
        self.successes += reward;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfoGainExplorer {
    global: HashMap<String, StrategyStats>,
    context: HashMap<String, HashMap<String, StrategyStats>>,
}

impl InfoGainExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    fn score(&self, strategy_key: &str, context_key: Option<&str>) -> f64 {
        let global_stats = self.global.get(strategy_key);
        let context_stats =
            context_key.and_then(|ck| self.context.get(ck).and_then(|m| m.get(strategy_key)));

        let (g_mean, g_var) = global_stats
            .map(|s| (s.mean(), s.variance()))
            .unwrap_or((0.5, 0.25));
        let (c_mean, c_var) = context_stats
            .map(|s| (s.mean(), s.variance()))
            .unwrap_or((0.5, 0.25));

        let mean = CONTEXT_WEIGHT * c_mean + (1.0 - CONTEXT_WEIGHT) * g_mean;
        let var = CONTEXT_WEIGHT * c_var + (1.0 - CONTEXT_WEIGHT) * g_var;

        mean + BETA * var.sqrt()
    }

    pub fn select(&self, candidates: &[String], context_key: Option<&str>) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }

        let mut scored: Vec<_> = candidates
            .iter()
            .map(|c| (c.clone(), self.score(c, context_key)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        scored.first().map(|(s, _)| s.clone())
    }

    pub fn record(&mut self, strategy_key: &str, reward: f64, context_key: Option<&str>) {
        self.global
            .entry(strategy_key.to_string())
            .or_default()
            .record(reward);

        if let Some(ck) = context_key {
            self.context
                .entry(ck.to_string())
                .or_default()
                .entry(strategy_key.to_string())
                .or_default()
                .record(reward);
        }
    }

    /// Confidence from the effective sample size across both layers.
    pub fn confidence(&self, strategy_key: &str, context_key: Option<&str>) -> f64 {
        let global_trials = self
            .global
            .get(strategy_key)
            .map(|s| s.trials)
            .unwrap_or(0.0);
        let context_trials = context_key
            .and_then(|ck| self.context.get(ck))
            .and_then(|m| m.get(strategy_key))
            .map(|s| s.trials)
            .unwrap_or(0.0);

        let ess = global_trials + CONTEXT_WEIGHT * context_trials;
        let conf = 1.0 - (1.0 / (1.0 + ess / ESS_K));
        conf.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_even_with_no_history() {
        let explorer = InfoGainExplorer::new();
        let result = explorer.select(&["a".into(), "b".into()], None);
        assert!(result.is_some());
    }

    #[test]
    fn empty_candidates_yield_none() {
        let explorer = InfoGainExplorer::new();
        assert_eq!(explorer.select(&[], None), None);
    }

    #[test]
    fn rewards_steer_selection() {
        let mut explorer = InfoGainExplorer::new();
        for _ in 0..10 {
            explorer.record("good", 1.0, None);
            explorer.record("bad", 0.0, None);
        }
        let result = explorer.select(&["good".into(), "bad".into()], None);
        assert_eq!(result, Some("good".into()));
    }

    #[test]
    fn context_layer_dominates_global() {
        let mut explorer = InfoGainExplorer::new();
        for _ in 0..20 {
            explorer.record("a", 1.0, None);
            explorer.record("b", 0.0, None);
            // In the "tired" context the picture flips.
            explorer.record("a", 0.0, Some("tired"));
            explorer.record("b", 1.0, Some("tired"));
        }
        let global_pick = explorer.select(&["a".into(), "b".into()], None);
        let context_pick = explorer.select(&["a".into(), "b".into()], Some("tired"));
        assert_eq!(global_pick, Some("a".into()));
        assert_eq!(context_pick, Some("b".into()));
    }

    #[test]
    fn confidence_grows_with_trials_and_stays_bounded() {
        let mut explorer = InfoGainExplorer::new();
        let c0 = explorer.confidence("x", None);
        assert_eq!(c0, MIN_CONFIDENCE);
        for _ in 0..1000 {
            explorer.record("x", 0.5, None);
        }
        let c1 = explorer.confidence("x", None);
        assert!(c1 > c0);
        assert!(c1 <= MAX_CONFIDENCE);
    }

    #[test]
    fn ties_break_lexicographically() {
        let explorer = InfoGainExplorer::new();
        let result = explorer.select(&["b".into(), "a".into(), "c".into()], None);
        assert_eq!(result, Some("a".into()));
    }
}
