//! Cold-start onboarding: classify the new user, probe strategies, settle.
//!
//! Classification votes each interaction into fast / stable / cautious
//! buckets and exits early once the top bucket leads by a confident margin.
//! The explore phase then walks a fixed probe sequence, breaking out early
//! on clearly high or clearly low accuracy.

use crate::config::ColdStartConfig;
use crate::types::{ColdStartPhase, ColdStartState, DifficultyLevel, StrategyParams, UserType};
use std::cmp::Ordering;

pub struct ColdStartManager {
    config: ColdStartConfig,
    state: ColdStartState,
}

impl ColdStartManager {
    pub fn new(config: ColdStartConfig) -> Self {
        Self {
            config,
            state: ColdStartState::default(),
        }
    }

    pub fn from_state(config: ColdStartConfig, state: ColdStartState) -> Self {
        Self { config, state }
    }

    pub fn update(&mut self, accuracy: f64, response_time_ms: i64) -> Option<StrategyParams> {
        match self.state.phase {
            ColdStartPhase::Classify => self.handle_classify(accuracy, response_time_ms),
            ColdStartPhase::Explore => self.handle_explore(accuracy),
            ColdStartPhase::Normal => None,
        }
    }

    fn handle_classify(&mut self, accuracy: f64, response_time_ms: i64) -> Option<StrategyParams> {
        let fast_vote = if response_time_ms < 2000 && accuracy > 0.8 {
            1.0
        } else {
            0.0
        };
        let stable_vote = if (0.6..=0.85).contains(&accuracy) {
            1.0
        } else {
            0.0
        };
        let cautious_vote = if response_time_ms > 4000 || accuracy < 0.6 {
            1.0
        } else {
            0.0
        };

        self.state.classification_scores[0] += fast_vote;
        self.state.classification_scores[1] += stable_vote;
        self.state.classification_scores[2] += cautious_vote;
        self.state.update_count += 1;

        if self.state.update_count >= self.config.min_classify_samples {
            if let Some(user_type) = self.confident_user_type() {
                self.state.user_type = Some(user_type);
                self.state.phase = ColdStartPhase::Explore;
                self.state.probe_index = 0;
                return Some(StrategyParams::for_user_type(user_type));
            }
        }

        if self.state.update_count >= self.config.classify_samples {
            let max_idx = self
                .state
                .classification_scores
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
                .map(|(i, _)| i)
                .unwrap_or(1);

            let user_type = user_type_for_index(max_idx);
            self.state.user_type = Some(user_type);
            self.state.phase = ColdStartPhase::Explore;
            self.state.probe_index = 0;
            return Some(StrategyParams::for_user_type(user_type));
        }

        // Provisional strategy so even the very first question is personalized.
        let provisional = if response_time_ms < 2000 && accuracy > 0.8 {
            UserType::Fast
        } else if response_time_ms > 4000 || accuracy < 0.6 {
            UserType::Cautious
        } else {
            UserType::Stable
        };
        Some(StrategyParams::for_user_type(provisional))
    }

    fn handle_explore(&mut self, accuracy: f64) -> Option<StrategyParams> {
        self.state.update_count += 1;

        let min_total = self.config.min_classify_samples + self.config.min_explore_samples;
        if self.state.update_count >= min_total
            && (accuracy >= self.config.explore_high_accuracy
                || accuracy <= self.config.explore_low_accuracy)
        {
            return self.finish_explore(accuracy);
        }

        if self.state.update_count >= self.config.classify_samples + self.config.explore_samples {
            return self.finish_explore(accuracy);
        }

        if self.state.probe_index < self.config.probe_sequence.len() as i32 {
            let probe_idx = self.config.probe_sequence[self.state.probe_index as usize];
            self.state.probe_index += 1;
            return Some(StrategyParams::for_user_type(user_type_for_index(
                probe_idx.max(0) as usize,
            )));
        }

        None
    }

    fn confident_user_type(&self) -> Option<UserType> {
        let total: f64 = self.state.classification_scores.iter().sum();
        if total <= 1e-6 {
            return None;
        }

        let mut indexed: Vec<(usize, f64)> = self
            .state
            .classification_scores
            .iter()
            .copied()
            .enumerate()
            .collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let (top_idx, top_score) = indexed[0];
        let second_score = indexed.get(1).map(|(_, s)| *s).unwrap_or(0.0);
        let margin = (top_score - second_score) / total.max(1e-6);
        if margin < self.config.classify_confidence_margin {
            return None;
        }
        Some(user_type_for_index(top_idx))
    }

    fn finish_explore(&mut self, accuracy: f64) -> Option<StrategyParams> {
        self.state.phase = ColdStartPhase::Normal;

        let user_type = self.state.user_type.unwrap_or(UserType::Stable);
        let base = StrategyParams::for_user_type(user_type);

        let settled = if accuracy >= self.config.explore_high_accuracy {
            StrategyParams {
                difficulty: DifficultyLevel::Hard,
                new_ratio: (base.new_ratio + 0.1).min(0.4),
                ..base
            }
        } else if accuracy <= self.config.explore_low_accuracy {
            StrategyParams {
                difficulty: DifficultyLevel::Easy,
                new_ratio: (base.new_ratio - 0.1).max(0.1),
                hint_level: 2,
                ..base
            }
        } else {
            base
        };

        self.state.settled_strategy = Some(settled.clone());
        Some(settled)
    }

    pub fn phase(&self) -> ColdStartPhase {
        self.state.phase
    }

    pub fn state(&self) -> &ColdStartState {
        &self.state
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state.phase, ColdStartPhase::Normal)
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.state.user_type
    }

    pub fn settled_strategy(&self) -> Option<&StrategyParams> {
        self.state.settled_strategy.as_ref()
    }
}

fn user_type_for_index(idx: usize) -> UserType {
    match idx {
        0 => UserType::Fast,
        2 => UserType::Cautious,
        _ => UserType::Stable,
    }
}

impl Default for ColdStartManager {
    fn default() -> Self {
        Self::new(ColdStartConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_classify_phase() {
        let manager = ColdStartManager::default();
        assert_eq!(manager.phase(), ColdStartPhase::Classify);
        assert!(!manager.is_complete());
    }

    #[test]
    fn first_interaction_yields_a_provisional_strategy() {
        let mut manager = ColdStartManager::default();
        let strategy = manager.update(0.9, 1500);
        assert!(strategy.is_some());
        assert_eq!(manager.phase(), ColdStartPhase::Classify);
    }

    #[test]
    fn consistent_fast_user_classified_early() {
        let mut manager = ColdStartManager::default();
        for _ in 0..3 {
            manager.update(0.95, 1200);
        }
        assert_eq!(manager.phase(), ColdStartPhase::Explore);
        assert_eq!(manager.user_type(), Some(UserType::Fast));
    }

    #[test]
    fn slow_inaccurate_user_classified_cautious() {
        let mut manager = ColdStartManager::default();
        for _ in 0..5 {
            manager.update(0.4, 5000);
        }
        assert_eq!(manager.user_type(), Some(UserType::Cautious));
    }

    #[test]
    fn mixed_signals_defer_until_sample_cap() {
        let mut manager = ColdStartManager::default();
        manager.update(0.9, 1500); // fast
        manager.update(0.4, 5000); // cautious
        manager.update(0.7, 3000); // stable
        assert_eq!(manager.phase(), ColdStartPhase::Classify);
        manager.update(0.9, 1500);
        manager.update(0.4, 5000);
        assert_eq!(manager.phase(), ColdStartPhase::Explore);
    }

    #[test]
    fn explore_finishes_early_on_high_accuracy() {
        let mut manager = ColdStartManager::default();
        for _ in 0..3 {
            manager.update(0.95, 1200);
        }
        assert_eq!(manager.phase(), ColdStartPhase::Explore);
        for _ in 0..3 {
            manager.update(0.95, 1200);
        }
        assert!(manager.is_complete());
        let settled = manager.settled_strategy().expect("settled strategy");
        assert_eq!(settled.difficulty, DifficultyLevel::Hard);
    }

    #[test]
    fn low_explore_accuracy_settles_gentle_strategy() {
        let mut manager = ColdStartManager::default();
        for _ in 0..3 {
            manager.update(0.95, 1200);
        }
        for _ in 0..3 {
            manager.update(0.3, 1200);
        }
        assert!(manager.is_complete());
        let settled = manager.settled_strategy().expect("settled strategy");
        assert_eq!(settled.difficulty, DifficultyLevel::Easy);
        assert_eq!(settled.hint_level, 2);
    }

    #[test]
    fn normal_phase_returns_none() {
        let mut manager = ColdStartManager::default();
        for _ in 0..6 {
            manager.update(0.95, 1200);
        }
        assert!(manager.is_complete());
        assert!(manager.update(0.95, 1200).is_none());
    }

    #[test]
    fn state_round_trips_through_from_state() {
        let mut manager = ColdStartManager::default();
        for _ in 0..3 {
            manager.update(0.95, 1200);
        }
        let saved = manager.state().clone();
        let restored = ColdStartManager::from_state(ColdStartConfig::default(), saved.clone());
        assert_eq!(restored.phase(), saved.phase);
        assert_eq!(restored.user_type(), saved.user_type);
    }
}
