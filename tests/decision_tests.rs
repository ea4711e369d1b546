//! Decision layer integration tests: cold-start lifecycle, ensemble blending
//! and the capacity/target-count rules working together.

use amde::config::{ColdStartConfig, EnsembleConfig, FeatureFlags};
use amde::decision::{
    dynamic_cap, resolve_target_count, ColdStartManager, SimilarityPredictor, SourceProposal,
    StrategyEnsemble, MIN_CAP,
};
use amde::types::{
    CognitiveProfile, ColdStartPhase, CountRecommendation, DifficultyLevel, LearnerState,
    StrategyParams, UserType,
};

fn state_with(attention: f64, fatigue: f64, motivation: f64) -> LearnerState {
    LearnerState {
        attention,
        fatigue,
        motivation,
        cognitive: CognitiveProfile::default(),
        trend: None,
        conf: 0.5,
        ts: 0,
        fused_fatigue: None,
    }
}

#[test]
fn fast_learner_classifies_early_and_gets_a_hard_start() {
    let mut manager = ColdStartManager::new(ColdStartConfig::default());

    let mut settled = None;
    for _ in 0..3 {
        settled = manager.update(0.95, 1200);
    }

    assert_eq!(manager.phase(), ColdStartPhase::Explore);
    assert_eq!(manager.user_type(), Some(UserType::Fast));
    let strategy = settled.expect("classification emits a provisional strategy");
    assert_eq!(strategy.difficulty, DifficultyLevel::Hard);
}

#[test]
fn cautious_learner_finishes_with_an_easy_strategy() {
    let mut manager = ColdStartManager::new(ColdStartConfig::default());

    for _ in 0..30 {
        manager.update(0.4, 6000);
        if manager.is_complete() {
            break;
        }
    }

    assert!(manager.is_complete());
    assert_eq!(manager.user_type(), Some(UserType::Cautious));
    let strategy = manager.settled_strategy().expect("settled after explore");
    assert_eq!(strategy.difficulty, DifficultyLevel::Easy);
    assert_eq!(strategy.hint_level, 2);
}

#[test]
fn cold_start_always_terminates_within_the_sample_caps() {
    let config = ColdStartConfig::default();
    let cap = (config.classify_samples + config.explore_samples) as usize;
    // Ambiguous telemetry that never triggers an early exit.
    let mut manager = ColdStartManager::new(config);
    for i in 0..cap + 5 {
        manager.update(if i % 2 == 0 { 0.9 } else { 0.3 }, 3000);
        if manager.is_complete() {
            return;
        }
    }
    panic!("cold start did not terminate");
}

#[test]
fn ensemble_keeps_current_strategy_when_no_candidate_clears_the_floor() {
    let mut flags = FeatureFlags::default();
    flags.heuristic_enabled = false;
    let ensemble = StrategyEnsemble::new(flags, EnsembleConfig::default());

    let current = StrategyParams {
        batch_size: 12,
        ..Default::default()
    };
    let low_confidence = SourceProposal {
        strategy: Some(StrategyParams::default()),
        confidence: Some(0.1),
    };
    let (strategy, candidates) = ensemble.decide(
        &state_with(0.7, 0.2, 0.5),
        &current,
        &low_confidence,
        &SourceProposal::default(),
        &SourceProposal::default(),
    );

    assert!(candidates.is_empty());
    assert_eq!(strategy.key(), current.key());
}

#[test]
fn merged_strategy_lands_on_the_grid() {
    let ensemble = StrategyEnsemble::new(FeatureFlags::default(), EnsembleConfig::default());
    let proposal = |batch: i32, ratio: f64| SourceProposal {
        strategy: Some(StrategyParams {
            batch_size: batch,
            new_ratio: ratio,
            ..Default::default()
        }),
        confidence: Some(0.9),
    };

    let (strategy, candidates) = ensemble.decide(
        &state_with(0.7, 0.2, 0.5),
        &StrategyParams::default(),
        &proposal(16, 0.4),
        &proposal(5, 0.1),
        &proposal(12, 0.3),
    );

    assert!(!candidates.is_empty());
    assert!([5, 8, 12, 16].contains(&strategy.batch_size));
    assert!([0.1, 0.2, 0.3, 0.4]
        .iter()
        .any(|r| (r - strategy.new_ratio).abs() < 1e-9));
}

#[test]
fn exhausted_learner_is_forced_onto_a_gentle_strategy() {
    let ensemble = StrategyEnsemble::new(FeatureFlags::default(), EnsembleConfig::default());
    let aggressive = StrategyParams {
        difficulty: DifficultyLevel::Hard,
        batch_size: 16,
        new_ratio: 0.4,
        hint_level: 0,
        ..Default::default()
    };
    let filtered = ensemble.post_filter(aggressive, &state_with(0.6, 0.95, 0.5), None);
    assert_eq!(filtered.difficulty, DifficultyLevel::Easy);
    assert!(filtered.batch_size <= 5);
    assert!(filtered.hint_level >= 2);
    assert!(filtered.new_ratio <= 0.2);
}

#[test]
fn cap_never_rises_with_fatigue_and_never_falls_with_attention() {
    for base_attention in [0.2, 0.5, 0.8] {
        let mut previous = i32::MAX;
        for fatigue_step in 0..=10 {
            let fatigue = fatigue_step as f64 / 10.0;
            let cap = dynamic_cap(&state_with(base_attention, fatigue, 0.3));
            assert!(cap <= previous, "cap rose with fatigue");
            assert!(cap >= MIN_CAP);
            previous = cap;
        }
    }

    for base_fatigue in [0.0, 0.4, 0.8] {
        let mut previous = 0;
        for attention_step in 0..=10 {
            let attention = attention_step as f64 / 10.0;
            let cap = dynamic_cap(&state_with(attention, base_fatigue, 0.3));
            assert!(cap >= previous, "cap fell with attention");
            previous = cap;
        }
    }
}

#[test]
fn explicit_user_target_overrides_the_cap() {
    let cap = 10;
    assert_eq!(resolve_target_count(50, None, cap), 50);
}

#[test]
fn low_confidence_recommendations_are_ignored() {
    let rec = CountRecommendation {
        additional: 5,
        confidence: 0.3,
    };
    assert_eq!(resolve_target_count(10, Some(&rec), 30), 10);
}

#[test]
fn confident_recommendation_is_applied_up_to_the_cap() {
    let rec = CountRecommendation {
        additional: 5,
        confidence: 0.8,
    };
    assert_eq!(resolve_target_count(10, Some(&rec), 30), 15);
    assert_eq!(resolve_target_count(10, Some(&rec), 12), 12);
}

#[test]
fn seasoned_recommendation_clears_the_confidence_gate() {
    let mut predictor = SimilarityPredictor::new();
    let context = vec![0.7, 0.3, 0.9];
    for _ in 0..20 {
        predictor.record(context.clone(), "mid|8|0.2".into(), 0.9);
    }

    let rec = predictor
        .recommend_additional_count(&context)
        .expect("rewarded history recommends");
    assert!(rec.confidence >= 0.5, "confidence was {}", rec.confidence);

    let resolved = resolve_target_count(10, Some(&rec), 30);
    assert_eq!(resolved, (10 + rec.additional).min(30));
    assert!(resolved > 10, "the recommendation never applied");
}
