//! Rule-based strategy adjustment from the current learner state.
//!
//! Always available: unlike the learned components it needs no history, so
//! it anchors the ensemble and covers brand-new users.

use crate::types::{DifficultyLevel, LearnerState, StrategyParams};

pub struct HeuristicAdvisor {
    fatigue_threshold: f64,
    attention_threshold: f64,
    motivation_threshold: f64,
}

impl HeuristicAdvisor {
    pub fn new(fatigue_threshold: f64, attention_threshold: f64, motivation_threshold: f64) -> Self {
        Self {
            fatigue_threshold,
            attention_threshold,
            motivation_threshold,
        }
    }

    pub fn suggest(&self, state: &LearnerState, current: &StrategyParams) -> StrategyParams {
        let mut result = current.clone();
        let fatigue = state.effective_fatigue();

        if fatigue > self.fatigue_threshold {
            result.batch_size = (result.batch_size - 2).max(5);
            result.new_ratio = (result.new_ratio - 0.1).max(0.1);
            if result.difficulty == DifficultyLevel::Hard {
                result.difficulty = DifficultyLevel::Mid;
            }
        }

        if state.attention < self.attention_threshold {
            result.hint_level = (result.hint_level + 1).min(2);
            result.batch_size = (result.batch_size - 1).max(5);
        }

        if state.motivation < self.motivation_threshold {
            result.difficulty = result.difficulty.easier();
            result.interval_scale = (result.interval_scale * 1.1).min(1.5);
        }

        if state.motivation > 0.7 && fatigue < 0.3 && state.attention > 0.7 {
            result.batch_size = (result.batch_size + 2).min(16);
            result.new_ratio = (result.new_ratio + 0.05).min(0.4);
            if result.difficulty == DifficultyLevel::Easy {
                result.difficulty = DifficultyLevel::Mid;
            }
        }

        if state.cognitive.mem > 0.8 && state.cognitive.speed > 0.7 {
            result.interval_scale = (result.interval_scale * 0.9).max(0.5);
        } else if state.cognitive.mem < 0.4 {
            result.interval_scale = (result.interval_scale * 1.2).min(1.5);
            result.hint_level = (result.hint_level + 1).min(2);
        }

        result
    }

    /// Each rule that fires means the state is unusual, so confidence drops
    /// multiplicatively, floored at 0.3.
    pub fn confidence(&self, state: &LearnerState) -> f64 {
        let fatigue_factor: f64 = if state.effective_fatigue() > self.fatigue_threshold {
            0.8
        } else {
            1.0
        };
        let attention_factor: f64 = if state.attention < self.attention_threshold {
            0.8
        } else {
            1.0
        };
        let motivation_factor: f64 = if state.motivation < self.motivation_threshold {
            0.8
        } else {
            1.0
        };

        (fatigue_factor * attention_factor * motivation_factor).max(0.3)
    }
}

impl Default for HeuristicAdvisor {
    fn default() -> Self {
        Self::new(0.7, 0.4, -0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatigue_shrinks_the_batch() {
        let advisor = HeuristicAdvisor::default();
        let state = LearnerState {
            fatigue: 0.9,
            ..Default::default()
        };
        let current = StrategyParams::default();
        let suggested = advisor.suggest(&state, &current);
        assert!(suggested.batch_size < current.batch_size);
        assert!(suggested.new_ratio < current.new_ratio);
    }

    #[test]
    fn low_attention_adds_hints() {
        let advisor = HeuristicAdvisor::default();
        let state = LearnerState {
            attention: 0.2,
            ..Default::default()
        };
        let suggested = advisor.suggest(&state, &StrategyParams::default());
        assert!(suggested.hint_level >= 1);
    }

    #[test]
    fn thriving_user_gets_more_work() {
        let advisor = HeuristicAdvisor::default();
        let state = LearnerState {
            attention: 0.9,
            fatigue: 0.1,
            motivation: 0.8,
            ..Default::default()
        };
        let current = StrategyParams::default();
        let suggested = advisor.suggest(&state, &current);
        assert!(suggested.batch_size > current.batch_size);
    }

    #[test]
    fn fused_fatigue_takes_precedence() {
        let advisor = HeuristicAdvisor::default();
        let state = LearnerState {
            fatigue: 0.1,
            fused_fatigue: Some(0.9),
            ..Default::default()
        };
        let current = StrategyParams::default();
        let suggested = advisor.suggest(&state, &current);
        assert!(suggested.batch_size < current.batch_size);
    }

    #[test]
    fn confidence_drops_when_rules_fire() {
        let advisor = HeuristicAdvisor::default();
        let calm = LearnerState::default();
        let stressed = LearnerState {
            fatigue: 0.9,
            attention: 0.2,
            motivation: -0.5,
            ..Default::default()
        };
        assert!(advisor.confidence(&stressed) < advisor.confidence(&calm));
        assert!(advisor.confidence(&stressed) >= 0.3);
    }
}
