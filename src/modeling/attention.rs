//! Attention estimation from behavioral signals.
//!
//! Each update folds seventeen feature scores into a weighted average, then
//! smooths it with a volatility-adaptive EMA so noisy sessions respond faster
//! while calm ones stay stable.

use crate::config::AttentionWeights;
use crate::types::CognitiveProfile;

#[derive(Debug, Clone)]
pub struct AttentionSignals {
    /// Response time normalized by an expected maximum, in [0, 1].
    pub rt_norm: f64,
    pub rt_cv: f64,
    pub pace_cv: f64,
    pub pause_count: f64,
    pub switch_count: f64,
    pub interaction_density: f64,
    pub focus_loss: f64,
    pub recent_accuracy: f64,
    pub is_correct: Option<bool>,
    pub hint_used: bool,
    pub retry_count: i32,
    /// Dwell time normalized to [0, 1]; optimum sits near 0.2.
    pub dwell_norm: f64,
    pub biometric_fatigue: f64,
    pub biometric_confidence: f64,
    pub motivation: f64,
    pub cognitive: CognitiveProfile,
    pub study_duration_minutes: f64,
    pub hour_of_day: u32,
}

impl Default for AttentionSignals {
    fn default() -> Self {
        Self {
            rt_norm: 0.5,
            rt_cv: 0.0,
            pace_cv: 0.0,
            pause_count: 0.0,
            switch_count: 0.0,
            interaction_density: 0.5,
            focus_loss: 0.0,
            recent_accuracy: 0.7,
            is_correct: None,
            hint_used: false,
            retry_count: 0,
            dwell_norm: 0.5,
            biometric_fatigue: 0.0,
            biometric_confidence: 0.5,
            motivation: 0.5,
            cognitive: CognitiveProfile::default(),
            study_duration_minutes: 0.0,
            hour_of_day: 12,
        }
    }
}

pub struct AttentionMonitor {
    weights: AttentionWeights,
    base_smoothing: f64,
    current_value: f64,
    correct_streak: u32,
    error_streak: u32,
}

impl AttentionMonitor {
    pub fn new(weights: AttentionWeights, smoothing: f64) -> Self {
        Self {
            weights,
            base_smoothing: smoothing,
            current_value: 0.7,
            correct_streak: 0,
            error_streak: 0,
        }
    }

    pub fn update(&mut self, signals: &AttentionSignals) -> f64 {
        // "Lower is better" signals are inverted into scores.
        let rt_score = 1.0 - signals.rt_norm.clamp(0.0, 1.0);
        let cv_score = 1.0 - signals.rt_cv.clamp(0.0, 1.0);
        let pace_score = 1.0 - signals.pace_cv.clamp(0.0, 1.0);
        let pause_score = 1.0 - (signals.pause_count / 10.0).clamp(0.0, 1.0);
        let switch_score = 1.0 - (signals.switch_count / 5.0).clamp(0.0, 1.0);
        let interaction_score = signals.interaction_density.clamp(0.0, 1.0);
        let focus_score = 1.0 - signals.focus_loss.clamp(0.0, 1.0);
        let accuracy_score = signals.recent_accuracy.clamp(0.0, 1.0);

        if let Some(is_correct) = signals.is_correct {
            if is_correct {
                self.correct_streak = self.correct_streak.saturating_add(1);
                self.error_streak = 0;
            } else {
                self.error_streak = self.error_streak.saturating_add(1);
                self.correct_streak = 0;
            }
        }

        let streak_boost = (self.correct_streak.min(5) as f64 / 5.0) * 0.5;
        let streak_penalty = (self.error_streak.min(3) as f64 / 3.0) * 0.5;
        let streak_score = 0.5 + streak_boost - streak_penalty;

        let hint_score = if signals.hint_used { 0.3 } else { 1.0 };
        let retry_score = 1.0 - (signals.retry_count as f64 / 3.0).clamp(0.0, 1.0);

        // U-shaped dwell score: optimum around 20% of the normalized range,
        // both rushing and lingering read as attention loss.
        let dwell_distance = (signals.dwell_norm.clamp(0.0, 1.0) - 0.2).abs() * 2.5;
        let dwell_score = (1.0 - dwell_distance).max(0.0);

        let confidence = signals.biometric_confidence.clamp(0.0, 1.0);
        let biometric_score = 1.0 - signals.biometric_fatigue.clamp(0.0, 1.0) * confidence;

        let motivation_score = signals.motivation.clamp(0.0, 1.0);

        let cognitive_score = ((signals.cognitive.mem
            + signals.cognitive.speed
            + signals.cognitive.stability)
            / 3.0)
            .clamp(0.0, 1.0);

        // Attention starts decaying after 20 minutes of continuous study.
        let duration_score = if signals.study_duration_minutes <= 20.0 {
            1.0
        } else {
            1.0 - ((signals.study_duration_minutes - 20.0) / 60.0).clamp(0.0, 0.4)
        };

        let circadian_score = match signals.hour_of_day {
            6..=11 => 1.0,   // morning peak
            12..=14 => 0.75, // post-lunch dip
            15..=19 => 0.9,
            20..=23 => 0.65,
            _ => 0.5, // late night
        };

        let weighted_sum = self.weights.rt_mean * rt_score
            + self.weights.rt_cv * cv_score
            + self.weights.pace_cv * pace_score
            + self.weights.pause * pause_score
            + self.weights.switch * switch_score
            + self.weights.interaction * interaction_score
            + self.weights.focus_loss * focus_score
            + self.weights.recent_accuracy * accuracy_score
            + self.weights.streak * streak_score
            + self.weights.hint * hint_score
            + self.weights.retry * retry_score
            + self.weights.dwell * dwell_score
            + self.weights.biometric_fatigue * biometric_score
            + self.weights.motivation * motivation_score
            + self.weights.cognitive * cognitive_score
            + self.weights.study_duration * duration_score
            + self.weights.circadian * circadian_score;

        let raw_attention = weighted_sum / self.weights.total().max(1e-6);

        // Volatile sessions get a faster EMA so attention tracks reality.
        let volatility = (signals.rt_cv + signals.pace_cv + signals.switch_count / 5.0) / 3.0;
        let alpha = (self.base_smoothing * (1.0 + 0.5 * volatility)).clamp(0.15, 0.7);

        self.current_value = (alpha * raw_attention + (1.0 - alpha) * self.current_value)
            .clamp(0.0, 1.0);
        self.current_value
    }

    pub fn current(&self) -> f64 {
        self.current_value
    }

    pub fn set_value(&mut self, value: f64) {
        self.current_value = value.clamp(0.0, 1.0);
    }

    pub fn streaks(&self) -> (u32, u32) {
        (self.correct_streak, self.error_streak)
    }
}

impl Default for AttentionMonitor {
    fn default() -> Self {
        Self::new(AttentionWeights::default(), 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focused_signals_raise_attention() {
        let mut monitor = AttentionMonitor::default();
        let signals = AttentionSignals {
            rt_norm: 0.1,
            recent_accuracy: 1.0,
            is_correct: Some(true),
            dwell_norm: 0.2,
            motivation: 0.9,
            hour_of_day: 9,
            ..Default::default()
        };
        let mut value = monitor.current();
        for _ in 0..10 {
            value = monitor.update(&signals);
        }
        assert!(value > 0.7, "attention {value}");
    }

    #[test]
    fn distracted_signals_lower_attention() {
        let mut monitor = AttentionMonitor::default();
        let signals = AttentionSignals {
            rt_norm: 1.0,
            rt_cv: 1.0,
            pause_count: 10.0,
            switch_count: 5.0,
            focus_loss: 1.0,
            recent_accuracy: 0.2,
            is_correct: Some(false),
            hint_used: true,
            retry_count: 3,
            hour_of_day: 2,
            ..Default::default()
        };
        let mut value = monitor.current();
        for _ in 0..10 {
            value = monitor.update(&signals);
        }
        assert!(value < 0.4, "attention {value}");
    }

    #[test]
    fn output_stays_in_unit_range() {
        let mut monitor = AttentionMonitor::default();
        let extreme = AttentionSignals {
            rt_norm: 10.0,
            rt_cv: -5.0,
            pause_count: 1000.0,
            retry_count: -7,
            ..Default::default()
        };
        for _ in 0..20 {
            let v = monitor.update(&extreme);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn error_streak_resets_on_correct_answer() {
        let mut monitor = AttentionMonitor::default();
        let wrong = AttentionSignals {
            is_correct: Some(false),
            ..Default::default()
        };
        monitor.update(&wrong);
        monitor.update(&wrong);
        assert_eq!(monitor.streaks(), (0, 2));

        let right = AttentionSignals {
            is_correct: Some(true),
            ..Default::default()
        };
        monitor.update(&right);
        assert_eq!(monitor.streaks(), (1, 0));
    }
}
