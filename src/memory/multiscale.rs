//! Multi-scale recall probability.
//!
//! Reviews leave exponentially decaying traces at three time constants
//! (τ = 1 h / 24 h / 168 h). The weighted trace sum is squashed through a
//! logistic function.
//!
//! Parameters:
//! - scale weights = 0.2 / 0.3 / 0.5 (short/medium/long)
//! - squash threshold = 0.3, slope = 1.5
//! - correct weight 1.0, incorrect weight 0.2
//! - history cap = 100 most recent samples

use serde::{Deserialize, Serialize};

const TAU_SHORT_HOURS: f64 = 1.0;
const TAU_MEDIUM_HOURS: f64 = 24.0;
const TAU_LONG_HOURS: f64 = 168.0;
const THRESHOLD: f64 = 0.3;
const SLOPE: f64 = 1.5;
const MAX_HISTORY: usize = 100;
const CORRECT_WEIGHT: f64 = 1.0;
const INCORRECT_WEIGHT: f64 = 0.2;
const NEUTRAL: f64 = 0.5;
/// Blend ratio against the cognitive memory estimate.
const TRACE_SHARE: f64 = 0.6;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSample {
    pub timestamp_hours: f64,
    pub is_correct: bool,
}

fn trace_sum(samples: &[ReviewSample], now_hours: f64, tau: f64) -> f64 {
    samples.iter().fold(0.0, |acc, s| {
        let age = (now_hours - s.timestamp_hours).max(0.0);
        let weight = if s.is_correct {
            CORRECT_WEIGHT
        } else {
            INCORRECT_WEIGHT
        };
        acc + weight * (-age / tau).exp()
    })
}

fn squash(x: f64) -> f64 {
    1.0 / (1.0 + (-(x - THRESHOLD) * SLOPE).exp())
}

/// Recall probability from review history. No history means no evidence either
/// way, so the neutral 0.5 is returned.
pub fn recall_probability(samples: &[ReviewSample], now_hours: f64) -> f64 {
    if samples.is_empty() {
        return NEUTRAL;
    }

    let window = if samples.len() > MAX_HISTORY {
        &samples[samples.len() - MAX_HISTORY..]
    } else {
        samples
    };

    let short = trace_sum(window, now_hours, TAU_SHORT_HOURS);
    let medium = trace_sum(window, now_hours, TAU_MEDIUM_HOURS);
    let long = trace_sum(window, now_hours, TAU_LONG_HOURS);

    let combined = 0.2 * short + 0.3 * medium + 0.5 * long;
    squash(combined).clamp(0.0, 1.0)
}

/// Final value consumed downstream: 60% trace evidence, 40% cognitive memory.
pub fn blend_with_cognitive(trace_probability: f64, cognitive_mem: f64) -> f64 {
    (TRACE_SHARE * trace_probability + (1.0 - TRACE_SHARE) * cognitive_mem).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_is_neutral() {
        assert!((recall_probability(&[], 10.0) - NEUTRAL).abs() < 1e-9);
    }

    #[test]
    fn fresh_correct_review_beats_neutral() {
        let samples = vec![ReviewSample {
            timestamp_hours: 0.0,
            is_correct: true,
        }];
        assert!(recall_probability(&samples, 0.0) > NEUTRAL);
    }

    #[test]
    fn recall_decays_with_elapsed_time() {
        let samples = vec![ReviewSample {
            timestamp_hours: 0.0,
            is_correct: true,
        }];
        let p0 = recall_probability(&samples, 0.0);
        let p24 = recall_probability(&samples, 24.0);
        let p168 = recall_probability(&samples, 168.0);
        assert!(p24 < p0);
        assert!(p168 < p24);
    }

    #[test]
    fn incorrect_reviews_carry_less_weight() {
        let correct = vec![ReviewSample {
            timestamp_hours: 0.0,
            is_correct: true,
        }];
        let incorrect = vec![ReviewSample {
            timestamp_hours: 0.0,
            is_correct: false,
        }];
        assert!(recall_probability(&correct, 0.0) > recall_probability(&incorrect, 0.0));
    }

    #[test]
    fn history_window_is_capped() {
        let old_failures: Vec<_> = (0..500)
            .map(|i| ReviewSample {
                timestamp_hours: i as f64 * 0.001,
                is_correct: false,
            })
            .collect();
        let mut mixed = old_failures.clone();
        mixed.extend((0..MAX_HISTORY).map(|_| ReviewSample {
            timestamp_hours: 1.0,
            is_correct: true,
        }));
        // Only the most recent 100 samples count, so the stale failures at the
        // front must not change the result.
        let recent_only: Vec<_> = mixed[mixed.len() - MAX_HISTORY..].to_vec();
        let p_mixed = recall_probability(&mixed, 1.0);
        let p_recent = recall_probability(&recent_only, 1.0);
        assert!((p_mixed - p_recent).abs() < 1e-12);
    }

    #[test]
    fn cognitive_blend_is_60_40() {
        let blended = blend_with_cognitive(1.0, 0.0);
        assert!((blended - 0.6).abs() < 1e-9);
        let blended = blend_with_cognitive(0.0, 1.0);
        assert!((blended - 0.4).abs() < 1e-9);
    }
}
