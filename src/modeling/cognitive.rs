//! EMA-based cognitive profiling: memory, speed and stability.

use crate::config::CognitiveParams;
use crate::types::CognitiveProfile;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct CognitiveObservation {
    pub accuracy: f64,
    pub avg_response_time_ms: i64,
}

impl Default for CognitiveObservation {
    fn default() -> Self {
        Self {
            accuracy: 0.8,
            avg_response_time_ms: 3000,
        }
    }
}

pub struct CognitiveProfiler {
    params: CognitiveParams,
    profile: CognitiveProfile,
    accuracy_history: VecDeque<f64>,
}

impl CognitiveProfiler {
    pub fn new(params: CognitiveParams) -> Self {
        Self {
            params,
            profile: CognitiveProfile::default(),
            accuracy_history: VecDeque::with_capacity(32),
        }
    }

    pub fn update(&mut self, obs: &CognitiveObservation) -> CognitiveProfile {
        let alpha = self.params.memory_alpha;

        self.profile.mem = alpha * obs.accuracy + (1.0 - alpha) * self.profile.mem;

        let normalized_speed = 1.0
            - (obs.avg_response_time_ms as f64 / self.params.speed_baseline_ms as f64 / 3.0)
                .min(1.0);
        self.profile.speed = alpha * normalized_speed + (1.0 - alpha) * self.profile.speed;

        self.accuracy_history.push_back(obs.accuracy);
        if self.accuracy_history.len() > self.params.stability_window {
            self.accuracy_history.pop_front();
        }

        // Stability is the inverse of recent accuracy variance; needs a few
        // samples before it says anything.
        let stability = if self.accuracy_history.len() >= 3 {
            1.0 - (accuracy_variance(&self.accuracy_history) * 4.0).min(1.0)
        } else {
            0.5
        };
        self.profile.stability = alpha * stability + (1.0 - alpha) * self.profile.stability;

        self.profile.mem = self.profile.mem.clamp(0.0, 1.0);
        self.profile.speed = self.profile.speed.clamp(0.0, 1.0);
        self.profile.stability = self.profile.stability.clamp(0.0, 1.0);

        self.profile.clone()
    }

    pub fn current(&self) -> &CognitiveProfile {
        &self.profile
    }

    pub fn set_profile(&mut self, profile: CognitiveProfile) {
        self.profile = profile;
    }
}

impl Default for CognitiveProfiler {
    fn default() -> Self {
        Self::new(CognitiveParams::default())
    }
}

fn accuracy_variance(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_accuracy_raises_memory() {
        let mut profiler = CognitiveProfiler::default();
        for _ in 0..30 {
            profiler.update(&CognitiveObservation {
                accuracy: 0.95,
                avg_response_time_ms: 1500,
            });
        }
        assert!(profiler.current().mem > 0.8);
        assert!(profiler.current().speed > 0.5);
    }

    #[test]
    fn erratic_accuracy_lowers_stability() {
        let mut steady = CognitiveProfiler::default();
        let mut erratic = CognitiveProfiler::default();
        for i in 0..30 {
            steady.update(&CognitiveObservation {
                accuracy: 0.7,
                avg_response_time_ms: 3000,
            });
            erratic.update(&CognitiveObservation {
                accuracy: if i % 2 == 0 { 1.0 } else { 0.0 },
                avg_response_time_ms: 3000,
            });
        }
        assert!(erratic.current().stability < steady.current().stability);
    }

    #[test]
    fn profile_stays_in_unit_range() {
        let mut profiler = CognitiveProfiler::default();
        for _ in 0..50 {
            let p = profiler.update(&CognitiveObservation {
                accuracy: 1.5,
                avg_response_time_ms: -100,
            });
            for v in [p.mem, p.speed, p.stability] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}
