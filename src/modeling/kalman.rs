//! Kalman-filtered cognitive profile with uncertainty tracking.
//!
//! State is the 3-vector [mem, speed, stability] with a full 3x3 covariance.
//! The observation model is identity: each review supplies a direct (noisy)
//! reading of all three dimensions. Confidence is derived from the covariance
//! trace, so it grows as evidence accumulates.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KalmanConfig {
    pub drift_rate: f64,
    pub process_noise: f64,
    pub observation_noise: f64,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            drift_rate: 0.001,
            process_noise: 0.001,
            observation_noise: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KalmanProfileState {
    /// [mem, speed, stability]
    pub mu: [f64; 3],
    pub cov: [[f64; 3]; 3],
}

impl Default for KalmanProfileState {
    fn default() -> Self {
        Self {
            mu: [0.5, 0.5, 0.5],
            cov: [[0.1, 0.0, 0.0], [0.0, 0.1, 0.0], [0.0, 0.0, 0.1]],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileObservation {
    pub accuracy: f64,
    pub speed: f64,
    pub consistency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEstimate {
    pub mem: f64,
    pub speed: f64,
    pub stability: f64,
    pub confidence: f64,
    pub covariance_trace: f64,
}

pub struct KalmanProfiler {
    config: KalmanConfig,
}

impl Default for KalmanProfiler {
    fn default() -> Self {
        Self::new(KalmanConfig::default())
    }
}

impl KalmanProfiler {
    pub fn new(config: KalmanConfig) -> Self {
        Self { config }
    }

    pub fn update(&self, state: &mut KalmanProfileState, obs: &ProfileObservation) -> ProfileEstimate {
        // Predict: drift the mean upward slightly and inflate uncertainty.
        for i in 0..3 {
            state.mu[i] += self.config.drift_rate;
            state.cov[i][i] += self.config.process_noise;
        }

        let z = [
            obs.accuracy.clamp(0.0, 1.0),
            obs.speed.clamp(0.0, 1.0),
            obs.consistency.clamp(0.0, 1.0),
        ];
        let innovation = [z[0] - state.mu[0], z[1] - state.mu[1], z[2] - state.mu[2]];

        // S = P + R with diagonal R; gain uses the diagonal inverse of S.
        let r = self.config.observation_noise;
        let mut s_diag = [0.0f64; 3];
        for (j, s) in s_diag.iter_mut().enumerate() {
            *s = state.cov[j][j] + r;
        }

        let mut gain = [[0.0f64; 3]; 3];
        for (i, gain_row) in gain.iter_mut().enumerate() {
            for (j, g) in gain_row.iter_mut().enumerate() {
                let s_inv = if s_diag[j].abs() > 1e-12 {
                    1.0 / s_diag[j]
                } else {
                    0.0
                };
                *g = state.cov[i][j] * s_inv;
            }
        }

        for (i, gain_row) in gain.iter().enumerate() {
            let correction: f64 = gain_row
                .iter()
                .zip(innovation.iter())
                .map(|(k, y)| k * y)
                .sum();
            state.mu[i] = (state.mu[i] + correction).clamp(0.0, 1.0);
        }

        // P' = (I - K) P, with a floor on the diagonal to keep it positive.
        let prior_cov = state.cov;
        for i in 0..3 {
            for j in 0..3 {
                let mut cell = 0.0;
                for (m, prior_row) in prior_cov.iter().enumerate() {
                    let i_minus_k = if i == m { 1.0 } else { 0.0 } - gain[i][m];
                    cell += i_minus_k * prior_row[j];
                }
                if i == j {
                    cell = cell.max(1e-6);
                }
                state.cov[i][j] = cell;
            }
        }

        let trace: f64 = (0..3).map(|i| state.cov[i][i]).sum();
        let confidence = (1.0 / (1.0 + trace)).clamp(0.0, 1.0);

        ProfileEstimate {
            mem: state.mu[0],
            speed: state.mu[1],
            stability: state.mu[2],
            confidence,
            covariance_trace: trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_of(state: &KalmanProfileState) -> f64 {
        (0..3).map(|i| state.cov[i][i]).sum()
    }

    #[test]
    fn strong_observations_pull_profile_up() {
        let profiler = KalmanProfiler::default();
        let mut state = KalmanProfileState::default();
        for _ in 0..20 {
            profiler.update(
                &mut state,
                &ProfileObservation {
                    accuracy: 0.95,
                    speed: 0.9,
                    consistency: 0.85,
                },
            );
        }
        assert!(state.mu[0] > 0.5);
        assert!(state.mu[1] > 0.5);
        assert!(state.mu[2] > 0.5);
    }

    #[test]
    fn weak_observations_pull_profile_down() {
        let profiler = KalmanProfiler::default();
        let mut state = KalmanProfileState::default();
        for _ in 0..20 {
            profiler.update(
                &mut state,
                &ProfileObservation {
                    accuracy: 0.2,
                    speed: 0.1,
                    consistency: 0.2,
                },
            );
        }
        assert!(state.mu[0] < 0.5);
        assert!(state.mu[1] < 0.5);
    }

    #[test]
    fn confidence_grows_with_evidence() {
        let profiler = KalmanProfiler::default();
        let mut state = KalmanProfileState::default();
        let before = 1.0 / (1.0 + trace_of(&state));
        let mut estimate = None;
        for _ in 0..10 {
            estimate = Some(profiler.update(
                &mut state,
                &ProfileObservation {
                    accuracy: 0.7,
                    speed: 0.6,
                    consistency: 0.7,
                },
            ));
        }
        let after = estimate.map(|e| e.confidence).unwrap_or(0.0);
        assert!(after > before);
    }

    #[test]
    fn mean_stays_bounded_and_diagonal_positive() {
        let profiler = KalmanProfiler::default();
        let mut state = KalmanProfileState::default();
        for _ in 0..100 {
            profiler.update(
                &mut state,
                &ProfileObservation {
                    accuracy: 1.0,
                    speed: 1.0,
                    consistency: 1.0,
                },
            );
        }
        for v in state.mu {
            assert!((0.0..=1.0).contains(&v));
        }
        for i in 0..3 {
            assert!(state.cov[i][i] > 0.0);
        }
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = KalmanProfileState::default();
        let json = serde_json::to_value(&state).unwrap();
        let restored: KalmanProfileState = serde_json::from_value(json).unwrap();
        assert_eq!(state.mu, restored.mu);
        assert_eq!(state.cov, restored.cov);
    }
}
