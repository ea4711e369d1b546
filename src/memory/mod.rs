//! Memory model: per-word decay traces, multi-scale recall estimation and
//! adaptive mastery.

pub mod mastery;
pub mod multiscale;
pub mod trace;

pub use mastery::{
    assess_mastery, default_retention_target, retention_target, MasteryAssessment,
    MasteryBaseline, MasteryFactors, MasteryHistory, ReviewContext,
};
pub use multiscale::{blend_with_cognitive, recall_probability, ReviewSample};
pub use trace::{legacy_scheduler_conversion, review_quality, MemoryTrace};

const MULTIPLIER_MIN: f64 = 0.5;
const MULTIPLIER_MAX: f64 = 2.0;
const R_MIN: f64 = 0.05;
const R_MAX: f64 = 0.97;

/// Next-review interval with a word-specific difficulty multiplier applied.
///
/// The multiplier stretches or shrinks the effective retention target: a word
/// that transfers well from known morphemes tolerates a lower target (longer
/// interval), an interference-prone word needs a higher one.
pub fn adjusted_interval_days(trace: &MemoryTrace, r_target: f64, multiplier: f64) -> f64 {
    let mult = multiplier.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);
    let effective_target = (r_target / mult).clamp(R_MIN, R_MAX);
    trace.interval_for_target(effective_target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_multiplier_lengthens_interval() {
        let trace = MemoryTrace {
            strength: 2.0,
            consolidation: 0.5,
            last_review_ms: 0,
        };
        let shrink = adjusted_interval_days(&trace, 0.9, 0.7);
        let neutral = adjusted_interval_days(&trace, 0.9, 1.0);
        let stretch = adjusted_interval_days(&trace, 0.9, 1.5);
        assert!(shrink < neutral);
        assert!(neutral < stretch);
    }

    #[test]
    fn extreme_multipliers_are_clamped() {
        let trace = MemoryTrace::default();
        let low = adjusted_interval_days(&trace, 0.9, 0.01);
        let low_clamped = adjusted_interval_days(&trace, 0.9, MULTIPLIER_MIN);
        assert!((low - low_clamped).abs() < 1e-12);

        let high = adjusted_interval_days(&trace, 0.9, 100.0);
        let high_clamped = adjusted_interval_days(&trace, 0.9, MULTIPLIER_MAX);
        assert!((high - high_clamped).abs() < 1e-12);
    }
}
