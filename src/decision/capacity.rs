//! Dynamic study-volume cap and target-count resolution.
//!
//! The cap bounds how many extra words the engine will ever recommend in one
//! cycle. It rises with attention, motivation and a solid cognitive profile,
//! and falls with fatigue, never below MIN_CAP. A user's explicit target is
//! always honored: the cap only limits what we add on top of it.

use crate::types::{CountRecommendation, LearnerState};

pub const MIN_CAP: i32 = 5;
const BASE_CAP: f64 = 10.0;
const SPAN: f64 = 20.0;
const ATTENTION_WEIGHT: f64 = 0.35;
const MOTIVATION_WEIGHT: f64 = 0.25;
const STABILITY_WEIGHT: f64 = 0.2;
const SPEED_WEIGHT: f64 = 0.2;
const FATIGUE_PENALTY: f64 = 12.0;
const CONFIDENCE_GATE: f64 = 0.5;

pub fn dynamic_cap(state: &LearnerState) -> i32 {
    let motivation_norm = ((state.motivation + 1.0) / 2.0).clamp(0.0, 1.0);
    let readiness = ATTENTION_WEIGHT * state.attention.clamp(0.0, 1.0)
        + MOTIVATION_WEIGHT * motivation_norm
        + STABILITY_WEIGHT * state.cognitive.stability.clamp(0.0, 1.0)
        + SPEED_WEIGHT * state.cognitive.speed.clamp(0.0, 1.0);

    let raw = BASE_CAP + SPAN * readiness - FATIGUE_PENALTY * state.effective_fatigue().clamp(0.0, 1.0);
    (raw.floor() as i32).max(MIN_CAP)
}

/// Resolves the number of words for this cycle from the user's own target,
/// the recommender's suggestion and the dynamic cap.
pub fn resolve_target_count(
    user_target: i32,
    recommendation: Option<&CountRecommendation>,
    cap: i32,
) -> i32 {
    // The user's explicit choice is never reduced, even above the cap.
    if user_target > cap {
        return user_target;
    }

    match recommendation {
        Some(rec) if rec.confidence >= CONFIDENCE_GATE => {
            (user_target + rec.additional.max(0)).min(cap)
        }
        _ => user_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CognitiveProfile;

    fn state(attention: f64, fatigue: f64, motivation: f64) -> LearnerState {
        LearnerState {
            attention,
            fatigue,
            motivation,
            cognitive: CognitiveProfile::default(),
            ..Default::default()
        }
    }

    #[test]
    fn cap_never_falls_below_minimum() {
        let exhausted = state(0.0, 1.0, -1.0);
        assert_eq!(dynamic_cap(&exhausted), MIN_CAP);
    }

    #[test]
    fn cap_is_monotone_in_fatigue_and_attention() {
        for f in [0.0, 0.25, 0.5, 0.75, 1.0] {
            for f2 in [0.0, 0.25, 0.5, 0.75, 1.0] {
                if f < f2 {
                    assert!(dynamic_cap(&state(0.6, f, 0.2)) >= dynamic_cap(&state(0.6, f2, 0.2)));
                }
            }
        }
        for a in [0.0, 0.25, 0.5, 0.75, 1.0] {
            for a2 in [0.0, 0.25, 0.5, 0.75, 1.0] {
                if a < a2 {
                    assert!(dynamic_cap(&state(a, 0.3, 0.2)) <= dynamic_cap(&state(a2, 0.3, 0.2)));
                }
            }
        }
    }

    #[test]
    fn user_target_above_cap_wins() {
        let cap = 10;
        let rec = CountRecommendation {
            additional: 5,
            confidence: 0.9,
        };
        assert_eq!(resolve_target_count(25, Some(&rec), cap), 25);
    }

    #[test]
    fn low_confidence_recommendation_is_ignored() {
        let rec = CountRecommendation {
            additional: 5,
            confidence: 0.3,
        };
        assert_eq!(resolve_target_count(8, Some(&rec), 20), 8);
    }

    #[test]
    fn confident_recommendation_adds_up_to_cap() {
        let rec = CountRecommendation {
            additional: 5,
            confidence: 0.8,
        };
        assert_eq!(resolve_target_count(8, Some(&rec), 20), 13);
        assert_eq!(resolve_target_count(18, Some(&rec), 20), 20);
    }

    #[test]
    fn no_recommendation_keeps_user_target() {
        assert_eq!(resolve_target_count(12, None, 20), 12);
    }
}
