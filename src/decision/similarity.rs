//! Similarity-weighted outcome prediction.
//!
//! A bounded history of (context, strategy, reward) triples serves as a lazy
//! k-NN: candidate strategies are scored by reward, weighted by cosine
//! similarity to the current context and by a geometric recency factor. No
//! matrix math, so it is cheap and trivially serializable.

use crate::types::CountRecommendation;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const RECENCY_GAMMA: f64 = 0.5;
const CONFIDENCE_K: f64 = 5.0;
const MAX_HISTORY: usize = 200;
const EPSILON: f64 = 1e-6;
const MIN_CONFIDENCE: f64 = 0.4;
const MAX_CONFIDENCE: f64 = 0.98;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub context: Vec<f64>,
    pub strategy_key: String,
    pub reward: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimilarityPredictor {
    history: VecDeque<Observation>,
}

impl SimilarityPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm_a < EPSILON || norm_b < EPSILON {
            return 0.0;
        }
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }

    pub fn select(&self, context: &[f64], candidates: &[String]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }
        if self.history.is_empty() {
            return candidates.first().cloned();
        }

        let mut scores: Vec<(String, f64)> = candidates
            .iter()
            .map(|c| {
                let mut weighted_sum = 0.0;
                let mut weight_total = 0.0;

                for (i, entry) in self.history.iter().rev().enumerate() {
                    if entry.strategy_key != *c {
                        continue;
                    }
                    let sim = Self::cosine_similarity(context, &entry.context);
                    let recency = RECENCY_GAMMA.powi(i as i32);
                    let weight = (sim + 1.0) / 2.0 * recency;
                    weighted_sum += weight * entry.reward;
                    weight_total += weight;
                }

                let score = if weight_total > EPSILON {
                    weighted_sum / weight_total
                } else {
                    0.5
                };
                (c.clone(), score)
            })
            .collect();

        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        scores.first().map(|(s, _)| s.clone())
    }

    pub fn record(&mut self, context: Vec<f64>, strategy_key: String, reward: f64) {
        self.history.push_back(Observation {
            context,
            strategy_key,
            reward,
        });
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }

    /// Confidence in a strategy from how often it has been observed. A key
    /// with no history gets zero so it cannot influence the ensemble merge.
    pub fn confidence(&self, strategy_key: &str) -> f64 {
        let count = self
            .history
            .iter()
            .filter(|e| e.strategy_key == strategy_key)
            .count();
        if count == 0 {
            return 0.0;
        }
        let conf = 1.0 - (1.0 / (1.0 + count as f64 / CONFIDENCE_K));
        conf.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }

    /// Suggests extra words beyond the daily target when similar past
    /// contexts produced good rewards. None when history says nothing.
    pub fn recommend_additional_count(&self, context: &[f64]) -> Option<CountRecommendation> {
        if self.history.is_empty() || context.is_empty() {
            return None;
        }

        let mut weighted_reward = 0.0;
        let mut weight_total = 0.0;
        let mut comparable = 0;

        for (i, entry) in self.history.iter().rev().enumerate() {
            if entry.context.len() != context.len() {
                continue;
            }
            let sim = Self::cosine_similarity(context, &entry.context);
            let recency = RECENCY_GAMMA.powi(i as i32);
            let weight = (sim + 1.0) / 2.0 * recency;
            weighted_reward += weight * entry.reward;
            weight_total += weight;
            comparable += 1;
        }

        if weight_total < EPSILON || comparable == 0 {
            return None;
        }

        let avg_reward = weighted_reward / weight_total;
        let additional = (avg_reward * 10.0).round() as i32;
        if additional > 0 {
            // Confidence saturates with the amount of comparable evidence.
            let evidence = comparable as f64;
            Some(CountRecommendation {
                additional,
                confidence: (evidence / (evidence + CONFIDENCE_K)).min(MAX_CONFIDENCE),
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_falls_back_to_first_candidate() {
        let predictor = SimilarityPredictor::new();
        let result = predictor.select(&[0.5, 0.5], &["a".into(), "b".into()]);
        assert_eq!(result, Some("a".into()));
    }

    #[test]
    fn learns_from_similar_contexts() {
        let mut predictor = SimilarityPredictor::new();
        for _ in 0..5 {
            predictor.record(vec![1.0, 0.0], "good".into(), 1.0);
            predictor.record(vec![1.0, 0.0], "bad".into(), 0.0);
        }
        let result = predictor.select(&[1.0, 0.0], &["good".into(), "bad".into()]);
        assert_eq!(result, Some("good".into()));
    }

    #[test]
    fn history_is_fifo_bounded() {
        let mut predictor = SimilarityPredictor::new();
        for i in 0..250 {
            predictor.record(vec![i as f64], format!("s{i}"), 0.5);
        }
        assert_eq!(predictor.history.len(), MAX_HISTORY);
        assert!(predictor.history.front().map(|o| o.context[0]) == Some(50.0));
    }

    #[test]
    fn zero_context_vector_is_harmless() {
        let mut predictor = SimilarityPredictor::new();
        predictor.record(vec![0.0, 0.0], "a".into(), 1.0);
        let result = predictor.select(&[0.0, 0.0], &["a".into()]);
        assert_eq!(result, Some("a".into()));
    }

    #[test]
    fn recommendation_tracks_reward_level() {
        let mut predictor = SimilarityPredictor::new();
        for _ in 0..10 {
            predictor.record(vec![0.8, 0.2], "s".into(), 0.9);
        }
        let rec = predictor.recommend_additional_count(&[0.8, 0.2]);
        let rec = rec.expect("history should produce a recommendation");
        assert!(rec.additional >= 8);
        assert!(rec.confidence >= 0.5);
    }

    #[test]
    fn unseen_strategy_has_zero_confidence() {
        let mut predictor = SimilarityPredictor::new();
        assert_eq!(predictor.confidence("never-seen"), 0.0);
        predictor.record(vec![0.5, 0.5], "seen".into(), 0.7);
        assert_eq!(predictor.confidence("never-seen"), 0.0);
        assert!(predictor.confidence("seen") > 0.0);
    }

    #[test]
    fn recommendation_confidence_grows_with_evidence() {
        let mut predictor = SimilarityPredictor::new();
        for _ in 0..2 {
            predictor.record(vec![0.8, 0.2], "s".into(), 0.9);
        }
        let thin = predictor
            .recommend_additional_count(&[0.8, 0.2])
            .expect("rewarded history should recommend");
        assert!(thin.confidence < 0.5);

        for _ in 0..20 {
            predictor.record(vec![0.8, 0.2], "s".into(), 0.9);
        }
        let solid = predictor
            .recommend_additional_count(&[0.8, 0.2])
            .expect("rewarded history should recommend");
        assert!(solid.confidence >= 0.5);
        assert!(solid.confidence > thin.confidence);
    }

    #[test]
    fn poor_rewards_produce_no_recommendation() {
        let mut predictor = SimilarityPredictor::new();
        for _ in 0..10 {
            predictor.record(vec![0.8, 0.2], "s".into(), 0.0);
        }
        assert!(predictor.recommend_additional_count(&[0.8, 0.2]).is_none());
    }
}
