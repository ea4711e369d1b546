//! Fatigue accumulation and multi-source fusion.
//!
//! Behavioral fatigue accumulates from error trends, slowing response times
//! and repeat errors, with exponential decay between updates. When a
//! biometric sample with sufficient confidence is available, the behavioral
//! estimate is fused with it and with time-on-task.

use crate::config::FatigueParams;

#[derive(Debug, Clone, Default)]
pub struct FatigueSignals {
    pub error_rate_trend: f64,
    pub rt_increase_rate: f64,
    pub repeat_errors: i32,
    pub break_minutes: Option<f64>,
}

pub struct FatigueEstimator {
    params: FatigueParams,
    current_value: f64,
}

impl FatigueEstimator {
    pub fn new(params: FatigueParams) -> Self {
        Self {
            params,
            current_value: 0.0,
        }
    }

    pub fn update(&mut self, signals: &FatigueSignals) -> f64 {
        if let Some(break_min) = signals.break_minutes {
            if break_min >= self.params.long_break_threshold {
                self.current_value = 0.0;
                return self.current_value;
            }
        }

        let error_component = self.params.beta * signals.error_rate_trend.max(0.0);
        let rt_component = self.params.gamma * signals.rt_increase_rate.max(0.0);
        let repeat_component = self.params.delta * (signals.repeat_errors as f64 / 5.0).min(1.0);

        let delta = error_component + rt_component + repeat_component;
        let decay = (-self.params.k).exp();

        self.current_value = (self.current_value * decay + delta).clamp(0.0, 1.0);
        self.current_value
    }

    pub fn current(&self) -> f64 {
        self.current_value
    }

    pub fn set_value(&mut self, value: f64) {
        self.current_value = value.clamp(0.0, 1.0);
    }

    /// Passive recovery while the user is away, scaled to elapsed minutes.
    pub fn apply_time_decay(&mut self, elapsed_minutes: f64) {
        let factor = (-self.params.k * elapsed_minutes.max(0.0) / 10.0).exp();
        self.current_value *= factor;
    }
}

impl Default for FatigueEstimator {
    fn default() -> Self {
        Self::new(FatigueParams::default())
    }
}

const BEHAVIORAL_WEIGHT: f64 = 0.4;
const BIOMETRIC_WEIGHT: f64 = 0.4;
const TEMPORAL_WEIGHT: f64 = 0.2;
const CONFIDENCE_GATE: f64 = 0.2;
const TEMPORAL_DECAY_K: f64 = 0.05;
const TEMPORAL_ONSET_MIN: f64 = 30.0;

fn temporal_fatigue(duration_minutes: f64) -> f64 {
    let effective = (duration_minutes - TEMPORAL_ONSET_MIN).max(0.0);
    1.0 - (-TEMPORAL_DECAY_K * effective).exp()
}

/// Fuses behavioral, biometric and time-on-task fatigue. Biometric input is
/// only trusted above the confidence gate; otherwise the behavioral estimate
/// stands alone.
pub fn fuse_fatigue(
    behavioral: f64,
    biometric: Option<f64>,
    confidence: Option<f64>,
    study_duration_min: f64,
) -> f64 {
    let conf = confidence.unwrap_or(0.0);
    let temporal = temporal_fatigue(study_duration_min);

    match biometric {
        Some(b) if conf >= CONFIDENCE_GATE => (BEHAVIORAL_WEIGHT * behavioral
            + BIOMETRIC_WEIGHT * b
            + TEMPORAL_WEIGHT * temporal)
            .clamp(0.0, 1.0),
        _ => behavioral.clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatigue_accumulates_from_errors() {
        let mut estimator = FatigueEstimator::default();
        let signals = FatigueSignals {
            error_rate_trend: 0.5,
            rt_increase_rate: 0.3,
            repeat_errors: 2,
            break_minutes: None,
        };
        let first = estimator.update(&signals);
        let second = estimator.update(&signals);
        assert!(first > 0.0);
        assert!(second > first);
    }

    #[test]
    fn long_break_resets_fatigue() {
        let mut estimator = FatigueEstimator::default();
        estimator.set_value(0.8);
        let value = estimator.update(&FatigueSignals {
            break_minutes: Some(45.0),
            ..Default::default()
        });
        assert_eq!(value, 0.0);
    }

    #[test]
    fn short_break_does_not_reset() {
        let mut estimator = FatigueEstimator::default();
        estimator.set_value(0.8);
        let value = estimator.update(&FatigueSignals {
            break_minutes: Some(10.0),
            ..Default::default()
        });
        assert!(value > 0.0);
    }

    #[test]
    fn time_decay_reduces_fatigue() {
        let mut estimator = FatigueEstimator::default();
        estimator.set_value(0.6);
        estimator.apply_time_decay(20.0);
        assert!(estimator.current() < 0.6);
        assert!(estimator.current() > 0.0);
    }

    #[test]
    fn fusion_uses_biometric_when_confident() {
        let fused = fuse_fatigue(0.5, Some(0.9), Some(0.8), 60.0);
        assert!(fused > 0.5);
    }

    #[test]
    fn fusion_ignores_low_confidence_biometric() {
        let fused = fuse_fatigue(0.5, Some(0.9), Some(0.1), 60.0);
        assert!((fused - 0.5).abs() < 1e-9);
    }

    #[test]
    fn fusion_without_biometric_passes_behavioral_through() {
        let fused = fuse_fatigue(0.3, None, Some(0.9), 120.0);
        assert!((fused - 0.3).abs() < 1e-9);
    }

    #[test]
    fn temporal_component_grows_after_onset() {
        assert_eq!(temporal_fatigue(20.0), 0.0);
        assert!(temporal_fatigue(90.0) > temporal_fatigue(45.0));
    }
}
