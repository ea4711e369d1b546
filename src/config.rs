use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionWeights {
    pub rt_mean: f64,
    pub rt_cv: f64,
    pub pace_cv: f64,
    pub pause: f64,
    pub switch: f64,
    pub interaction: f64,
    pub focus_loss: f64,
    pub recent_accuracy: f64,
    pub streak: f64,
    pub hint: f64,
    pub retry: f64,
    pub dwell: f64,
    pub biometric_fatigue: f64,
    pub motivation: f64,
    pub cognitive: f64,
    pub study_duration: f64,
    pub circadian: f64,
}

impl AttentionWeights {
    pub fn total(&self) -> f64 {
        self.rt_mean
            + self.rt_cv
            + self.pace_cv
            + self.pause
            + self.switch
            + self.interaction
            + self.focus_loss
            + self.recent_accuracy
            + self.streak
            + self.hint
            + self.retry
            + self.dwell
            + self.biometric_fatigue
            + self.motivation
            + self.cognitive
            + self.study_duration
            + self.circadian
    }
}

impl Default for AttentionWeights {
    fn default() -> Self {
        Self {
            rt_mean: 0.14,
            rt_cv: 0.10,
            pace_cv: 0.06,
            pause: 0.08,
            switch: 0.06,
            interaction: 0.06,
            focus_loss: 0.08,
            recent_accuracy: 0.10,
            streak: 0.06,
            hint: 0.04,
            retry: 0.04,
            dwell: 0.04,
            biometric_fatigue: 0.04,
            motivation: 0.04,
            cognitive: 0.02,
            study_duration: 0.02,
            circadian: 0.02,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FatigueParams {
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub k: f64,
    /// Breaks at least this long (minutes) reset fatigue to zero.
    pub long_break_threshold: f64,
}

impl Default for FatigueParams {
    fn default() -> Self {
        Self {
            beta: 0.3,
            gamma: 0.3,
            delta: 0.2,
            k: 0.05,
            long_break_threshold: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivationParams {
    pub rho: f64,
    pub kappa: f64,
    pub lambda: f64,
    pub mu: f64,
}

impl Default for MotivationParams {
    fn default() -> Self {
        Self {
            rho: 0.9,
            kappa: 0.1,
            lambda: 0.15,
            mu: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CognitiveParams {
    pub memory_alpha: f64,
    pub speed_baseline_ms: f64,
    pub stability_window: usize,
}

impl Default for CognitiveParams {
    fn default() -> Self {
        Self {
            memory_alpha: 0.1,
            speed_baseline_ms: 3000.0,
            stability_window: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendParams {
    pub window_size: usize,
    pub up_threshold: f64,
    pub down_threshold: f64,
    pub stuck_variance_threshold: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            window_size: 30,
            up_threshold: 0.05,
            down_threshold: -0.05,
            stuck_variance_threshold: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColdStartConfig {
    pub classify_samples: i32,
    pub explore_samples: i32,
    pub min_classify_samples: i32,
    pub min_explore_samples: i32,
    pub classify_confidence_margin: f64,
    pub explore_high_accuracy: f64,
    pub explore_low_accuracy: f64,
    pub probe_sequence: Vec<i32>,
}

impl Default for ColdStartConfig {
    fn default() -> Self {
        Self {
            classify_samples: 5,
            explore_samples: 10,
            min_classify_samples: 3,
            min_explore_samples: 3,
            classify_confidence_margin: 0.4,
            explore_high_accuracy: 0.85,
            explore_low_accuracy: 0.5,
            probe_sequence: vec![0, 1, 2, 0, 1, 2],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    pub accuracy_weight: f64,
    pub speed_weight: f64,
    pub stability_weight: f64,
    pub retention_weight: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            accuracy_weight: 0.4,
            speed_weight: 0.2,
            stability_weight: 0.2,
            retention_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Candidates below this confidence are excluded from blending.
    pub min_confidence: f64,
    pub infogain_weight: f64,
    pub similarity_weight: f64,
    pub bandit_weight: f64,
    pub heuristic_weight: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            infogain_weight: 0.3,
            similarity_weight: 0.3,
            bandit_weight: 0.2,
            heuristic_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub ensemble_enabled: bool,
    pub infogain_enabled: bool,
    pub similarity_enabled: bool,
    pub bandit_enabled: bool,
    pub heuristic_enabled: bool,
    pub memory_model_enabled: bool,
    pub multiscale_enabled: bool,
    pub morphology_enabled: bool,
    pub interference_enabled: bool,
    pub variability_enabled: bool,
    pub kalman_profile_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            ensemble_enabled: true,
            infogain_enabled: true,
            similarity_enabled: true,
            bandit_enabled: true,
            heuristic_enabled: true,
            memory_model_enabled: true,
            multiscale_enabled: true,
            morphology_enabled: true,
            interference_enabled: true,
            variability_enabled: true,
            kalman_profile_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub attention_weights: AttentionWeights,
    pub attention_smoothing: f64,
    pub fatigue: FatigueParams,
    pub motivation: MotivationParams,
    pub cognitive: CognitiveParams,
    pub trend: TrendParams,
    pub cold_start: ColdStartConfig,
    pub reward: RewardConfig,
    pub ensemble: EnsembleConfig,
    pub feature_flags: FeatureFlags,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            attention_weights: AttentionWeights::default(),
            attention_smoothing: 0.3,
            fatigue: FatigueParams::default(),
            motivation: MotivationParams::default(),
            cognitive: CognitiveParams::default(),
            trend: TrendParams::default(),
            cold_start: ColdStartConfig::default(),
            reward: RewardConfig::default(),
            ensemble: EnsembleConfig::default(),
            feature_flags: FeatureFlags::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let flags = &mut config.feature_flags;

        if let Ok(val) = std::env::var("AMDE_ENSEMBLE_ENABLED") {
            flags.ensemble_enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("AMDE_INFOGAIN_ENABLED") {
            flags.infogain_enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("AMDE_SIMILARITY_ENABLED") {
            flags.similarity_enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("AMDE_BANDIT_ENABLED") {
            flags.bandit_enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("AMDE_HEURISTIC_ENABLED") {
            flags.heuristic_enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("AMDE_MEMORY_MODEL_ENABLED") {
            flags.memory_model_enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("AMDE_MULTISCALE_ENABLED") {
            flags.multiscale_enabled = val.parse().unwrap_or(true);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attention_weights_sum_to_one() {
        let total = AttentionWeights::default().total();
        assert!((total - 1.0).abs() < 1e-9, "total = {total}");
    }

    #[test]
    fn default_config_round_trips() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(
            restored.cold_start.probe_sequence,
            config.cold_start.probe_sequence
        );
    }
}
