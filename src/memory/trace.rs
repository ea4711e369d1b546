//! Per-word memory dynamics.
//!
//! Strength decays along dM/dt = -λ0·M / (1 + αC·M), whose trajectory obeys the
//! implicit relation
//!
//!   ln M(t) + αC·M(t) = ln M0 + αC·M0 - λ0·t   (t in days)
//!
//! Retrievability is R(t) = M(t)/M0. M(t) has no elementary closed form, so the
//! relation is solved by Newton iteration.
//!
//! Parameters:
//! - λ0 = 0.3/day (base decay rate)
//! - α = 0.5 (consolidation coupling)
//! - M ∈ [0.1, 10], C ∈ [0, 1]
//! - η = 2.0 (strength gain), κ = 0.25 (consolidation gain)

use serde::{Deserialize, Serialize};

const LAMBDA_0: f64 = 0.3;
const ALPHA: f64 = 0.5;
const M_MAX: f64 = 10.0;
const M_MIN: f64 = 0.1;
const ETA: f64 = 2.0;
const KAPPA: f64 = 0.25;
const WRONG_STRENGTH_DECAY: f64 = 0.3;
const WRONG_CONSOLIDATION_LOSS: f64 = 0.1;
const MAX_INTERVAL_DAYS: f64 = 365.0;
const EPSILON: f64 = 1e-6;

/// Newton convergence tolerance on |f(m)|.
const NEWTON_TOL: f64 = 1e-10;
/// Iteration cap; on non-convergence the closed-form seed is returned instead.
const NEWTON_MAX_ITER: u32 = 40;

/// Solves `ln m + a·m = k` for m > 0.
///
/// f is strictly increasing and concave, and the seed is always at or above the
/// root, so Newton descends monotonically. Convergence: |f| < 1e-10 or 40
/// iterations, after which the best iterate is returned.
fn solve_log_linear(k: f64, a: f64, seed: f64) -> f64 {
    let mut m = seed.max(1e-12);
    for _ in 0..NEWTON_MAX_ITER {
        let f = m.ln() + a * m - k;
        if f.abs() < NEWTON_TOL {
            break;
        }
        let df = 1.0 / m + a;
        let next = m - f / df;
        if next <= 0.0 {
            m /= 2.0;
        } else {
            m = next;
        }
    }
    m
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryTrace {
    #[serde(alias = "ummStrength")]
    pub strength: f64,
    #[serde(alias = "ummConsolidation")]
    pub consolidation: f64,
    #[serde(alias = "ummLastReviewTs")]
    pub last_review_ms: i64,
}

impl Default for MemoryTrace {
    fn default() -> Self {
        Self {
            strength: 1.0,
            consolidation: 0.1,
            last_review_ms: 0,
        }
    }
}

impl MemoryTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a trace from legacy scheduler parameters. The calibration is a
    /// one-time choice, so the conversion is supplied by the caller; see
    /// [`legacy_scheduler_conversion`] for the shipped default.
    pub fn from_legacy<F>(stability: f64, difficulty: f64, convert: F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64),
    {
        let (strength, consolidation) = convert(stability, difficulty);
        Self {
            strength: strength.clamp(M_MIN, M_MAX),
            consolidation: consolidation.clamp(0.0, 1.0),
            last_review_ms: 0,
        }
    }

    fn coupling(&self) -> f64 {
        ALPHA * self.consolidation
    }

    /// Predicted recall probability after `elapsed_days`, always in (0, 1].
    pub fn retrievability(&self, elapsed_days: f64) -> f64 {
        if elapsed_days <= EPSILON {
            return 1.0;
        }
        let m0 = self.strength;
        let a = self.coupling();
        let k = m0.ln() + a * m0 - LAMBDA_0 * elapsed_days;
        // Closed-form decay at the initial rate; an upper bound on the root.
        let seed = m0 * (-LAMBDA_0 * elapsed_days / (1.0 + a * m0)).exp();
        let m_t = solve_log_linear(k, a, seed);
        (m_t / m0).clamp(1e-12, 1.0)
    }

    /// Applies one review outcome. Bounds are re-imposed after every update.
    pub fn update(&mut self, quality: f64, is_correct: bool, now_ms: i64) {
        let quality = quality.clamp(0.0, 1.0);
        if is_correct {
            let delta_m = ETA * (1.0 - self.strength / M_MAX) * quality;
            self.strength = (self.strength + delta_m).clamp(M_MIN, M_MAX);
            let delta_c = KAPPA * (1.0 - self.consolidation) * quality;
            self.consolidation = (self.consolidation + delta_c).clamp(0.0, 1.0);
        } else {
            self.strength = (self.strength * (1.0 - WRONG_STRENGTH_DECAY)).clamp(M_MIN, M_MAX);
            self.consolidation =
                (self.consolidation * (1.0 - WRONG_CONSOLIDATION_LOSS)).clamp(0.0, 1.0);
        }
        self.last_review_ms = now_ms;
    }

    /// Days until retrievability decays to `r_target`. The implicit relation
    /// inverts in closed form for t.
    pub fn interval_for_target(&self, r_target: f64) -> f64 {
        let r = r_target.clamp(0.05, 0.97);
        let a = self.coupling();
        let interval = (-r.ln() + a * self.strength * (1.0 - r)) / LAMBDA_0;
        interval.clamp(0.0, MAX_INTERVAL_DAYS)
    }
}

/// Maps a review outcome to a quality scalar in [0, 1]. Wrong answers are
/// always 0; pathological telemetry clamps rather than erroring.
pub fn review_quality(is_correct: bool, response_time_ms: i64, hint_count: i32) -> f64 {
    if !is_correct {
        return 0.0;
    }
    let rt = response_time_ms.max(0) as f64;
    let hints = hint_count.max(0) as f64;
    let rt_factor = 1.0 - (rt / 30000.0).min(1.0);
    let hint_factor = 1.0 - (hints / 3.0).min(1.0);
    (0.5 + 0.3 * rt_factor + 0.2 * hint_factor).clamp(0.0, 1.0)
}

/// The calibration used when importing traces from the legacy scheduler.
pub fn legacy_scheduler_conversion(stability: f64, difficulty: f64) -> (f64, f64) {
    ((stability + 1.0).ln(), 1.0 - difficulty / 10.0)
}
