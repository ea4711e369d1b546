//! Thompson sampling baseline over strategy keys.
//!
//! Beta posteriors are held per strategy globally and per binned user-state
//! context, blended at scoring time. The decision pipeline reads posterior
//! means (`select_best`); Thompson sampling stays available for exploratory
//! selection. Maps are LRU-evicted so long-running users cannot grow them
//! without bound.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::LearnerState;

const MAX_ARM_CACHE_SIZE: usize = 1000;
const MAX_GAMMA_ITERATIONS: usize = 10000;
const CONTEXT_BINS: usize = 3;
const CONTEXT_WEIGHT: f64 = 0.7;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BetaArm {
    alpha: f64,
    beta: f64,
    last_used: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThompsonBaseline {
    prior_alpha: f64,
    prior_beta: f64,
    #[serde(default)]
    global_arms: HashMap<String, BetaArm>,
    #[serde(default)]
    context_arms: HashMap<String, BetaArm>,
    access_counter: u64,
}

impl ThompsonBaseline {
    pub fn new(prior_alpha: f64, prior_beta: f64) -> Self {
        Self {
            prior_alpha,
            prior_beta,
            global_arms: HashMap::new(),
            context_arms: HashMap::new(),
            access_counter: 0,
        }
    }

    pub fn select(&mut self, state: &LearnerState, candidates: &[String]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }

        let mut rng = rand::rng();
        let context_key = context_signature(state);
        let mut best_score = f64::NEG_INFINITY;
        let mut best = None;

        for key in candidates {
            let arm = self.touch_global(key);
            let context_arm = self.touch_context(&context_key, key);
            let global_sample = sample_beta(&mut rng, arm.alpha, arm.beta);
            let context_sample = sample_beta(&mut rng, context_arm.alpha, context_arm.beta);
            let score =
                (1.0 - CONTEXT_WEIGHT) * global_sample + CONTEXT_WEIGHT * context_sample;

            if score > best_score {
                best_score = score;
                best = Some(key.clone());
            }
        }

        best
    }

    /// Deterministic counterpart of `select`: scores each candidate by the
    /// blended posterior means instead of sampling, so identical inputs give
    /// identical picks. Ties go to the lexicographically smaller key.
    pub fn select_best(&self, state: &LearnerState, candidates: &[String]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }

        let context_key = context_signature(state);
        let prior_mean = self.prior_alpha / (self.prior_alpha + self.prior_beta);
        let mean = |arm: Option<&BetaArm>| -> f64 {
            arm.map(|a| a.alpha / (a.alpha + a.beta)).unwrap_or(prior_mean)
        };

        let mut best: Option<(&String, f64)> = None;
        for key in candidates {
            let full_key = format!("{context_key}|{key}");
            let score = (1.0 - CONTEXT_WEIGHT) * mean(self.global_arms.get(key))
                + CONTEXT_WEIGHT * mean(self.context_arms.get(&full_key));
            let better = match best {
                None => true,
                Some((best_key, best_score)) => {
                    score > best_score || (score == best_score && key < best_key)
                }
            };
            if better {
                best = Some((key, score));
            }
        }

        best.map(|(key, _)| key.clone())
    }

    pub fn record(&mut self, state: &LearnerState, strategy_key: &str, reward: f64) {
        let context_key = context_signature(state);
        let success = reward > 0.5;
        let counter = self.bump();

        let prior = (self.prior_alpha, self.prior_beta);
        let arm = self
            .global_arms
            .entry(strategy_key.to_string())
            .or_insert_with(|| BetaArm {
                alpha: prior.0,
                beta: prior.1,
                last_used: counter,
            });
        if success {
            arm.alpha += 1.0;
        } else {
            arm.beta += 1.0;
        }
        arm.last_used = counter;

        let full_key = format!("{context_key}|{strategy_key}");
        let context_arm = self.context_arms.entry(full_key).or_insert_with(|| BetaArm {
            alpha: prior.0,
            beta: prior.1,
            last_used: counter,
        });
        if success {
            context_arm.alpha += 1.0;
        } else {
            context_arm.beta += 1.0;
        }
        context_arm.last_used = counter;
    }

    pub fn expected_reward(&self, strategy_key: &str) -> f64 {
        self.global_arms
            .get(strategy_key)
            .map(|arm| arm.alpha / (arm.alpha + arm.beta))
            .unwrap_or(self.prior_alpha / (self.prior_alpha + self.prior_beta))
    }

    fn bump(&mut self) -> u64 {
        self.access_counter += 1;
        self.access_counter
    }

    fn touch_global(&mut self, key: &str) -> BetaArm {
        let counter = self.bump();
        evict_if_needed(&mut self.global_arms);
        let prior = (self.prior_alpha, self.prior_beta);
        self.global_arms
            .entry(key.to_string())
            .and_modify(|arm| arm.last_used = counter)
            .or_insert_with(|| BetaArm {
                alpha: prior.0,
                beta: prior.1,
                last_used: counter,
            })
            .clone()
    }

    fn touch_context(&mut self, context_key: &str, strategy_key: &str) -> BetaArm {
        let full_key = format!("{context_key}|{strategy_key}");
        let counter = self.bump();
        evict_if_needed(&mut self.context_arms);
        let prior = (self.prior_alpha, self.prior_beta);
        self.context_arms
            .entry(full_key)
            .and_modify(|arm| arm.last_used = counter)
            .or_insert_with(|| BetaArm {
                alpha: prior.0,
                beta: prior.1,
                last_used: counter,
            })
            .clone()
    }
}

impl Default for ThompsonBaseline {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

fn evict_if_needed(map: &mut HashMap<String, BetaArm>) {
    if map.len() <= MAX_ARM_CACHE_SIZE {
        return;
    }

    let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.clone(), v.last_used)).collect();
    entries.sort_by_key(|(_, last_used)| *last_used);

    let to_remove = map.len() - MAX_ARM_CACHE_SIZE / 2;
    for (key, _) in entries.into_iter().take(to_remove) {
        map.remove(&key);
    }
}

fn context_signature(state: &LearnerState) -> String {
    let max_idx = (CONTEXT_BINS - 1) as i32;
    let bin = |value: f64| -> i32 {
        let idx = (value.clamp(0.0, 1.0) * CONTEXT_BINS as f64).floor() as i32;
        idx.clamp(0, max_idx)
    };

    let motivation = ((state.motivation + 1.0) / 2.0).clamp(0.0, 1.0);
    format!(
        "a{}_f{}_m{}",
        bin(state.attention),
        bin(state.effective_fatigue()),
        bin(motivation)
    )
}

fn sample_beta<R: Rng>(rng: &mut R, alpha: f64, beta: f64) -> f64 {
    if alpha <= 0.0 || beta <= 0.0 {
        return 0.5;
    }

    let gamma1 = sample_gamma(rng, alpha, 1.0);
    let gamma2 = sample_gamma(rng, beta, 1.0);

    if gamma1 + gamma2 == 0.0 {
        return 0.5;
    }
    gamma1 / (gamma1 + gamma2)
}

// Marsaglia-Tsang, with the shape<1 boost trick.
fn sample_gamma<R: Rng>(rng: &mut R, shape: f64, scale: f64) -> f64 {
    if shape < 1.0 {
        let u: f64 = rng.random();
        return sample_gamma(rng, shape + 1.0, scale) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();

    for _ in 0..MAX_GAMMA_ITERATIONS {
        let z = random_normal(rng);
        let v = (1.0 + c * z).powi(3);
        if v <= 0.0 {
            continue;
        }

        let u: f64 = rng.random();
        let z_sq = z * z;

        if u < 1.0 - 0.0331 * z_sq * z_sq {
            return d * v * scale;
        }
        if u.ln() < 0.5 * z_sq + d * (1.0 - v + v.ln()) {
            return d * v * scale;
        }
    }

    d * scale
}

fn random_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-10);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidates_yield_none() {
        let mut bandit = ThompsonBaseline::default();
        assert_eq!(bandit.select(&LearnerState::default(), &[]), None);
    }

    #[test]
    fn rewarded_arm_dominates_eventually() {
        let mut bandit = ThompsonBaseline::default();
        let state = LearnerState::default();
        for _ in 0..50 {
            bandit.record(&state, "good", 1.0);
            bandit.record(&state, "bad", 0.0);
        }

        let mut good_picks = 0;
        for _ in 0..100 {
            if bandit.select(&state, &["good".into(), "bad".into()]) == Some("good".into()) {
                good_picks += 1;
            }
        }
        assert!(good_picks > 80, "good picked {good_picks}/100");
    }

    #[test]
    fn expected_reward_tracks_updates() {
        let mut bandit = ThompsonBaseline::default();
        let state = LearnerState::default();
        assert!((bandit.expected_reward("x") - 0.5).abs() < 1e-9);
        for _ in 0..20 {
            bandit.record(&state, "x", 1.0);
        }
        assert!(bandit.expected_reward("x") > 0.8);
    }

    #[test]
    fn mean_selection_is_deterministic() {
        let mut bandit = ThompsonBaseline::default();
        let state = LearnerState::default();
        for _ in 0..30 {
            bandit.record(&state, "good", 1.0);
            bandit.record(&state, "bad", 0.0);
        }

        let candidates = vec!["bad".to_string(), "good".to_string()];
        let first = bandit.select_best(&state, &candidates);
        assert_eq!(first, Some("good".into()));
        for _ in 0..50 {
            assert_eq!(bandit.select_best(&state, &candidates), first);
        }
    }

    #[test]
    fn mean_selection_breaks_ties_lexicographically() {
        let bandit = ThompsonBaseline::default();
        let state = LearnerState::default();
        let candidates = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        assert_eq!(bandit.select_best(&state, &candidates), Some("a".into()));
    }

    #[test]
    fn arm_cache_stays_bounded() {
        let mut bandit = ThompsonBaseline::default();
        let state = LearnerState::default();
        for i in 0..3000 {
            let key = format!("s{i}");
            bandit.select(&state, &[key]);
        }
        assert!(bandit.global_arms.len() <= MAX_ARM_CACHE_SIZE);
    }
}
