//! Engine orchestration: one `process_event` call per study interaction.
//!
//! The engine owns per-user model caches and state caches. A cycle runs
//! load-or-init, event sanitation, feature extraction, state modeling, the
//! cold-start or ensemble decision, capacity resolution, reward attribution,
//! the per-word memory decision and finally one atomic save. Users are
//! independent; the save transaction is the only serialization point.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Timelike, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{EngineConfig, FeatureFlags};
use crate::decision::{
    dynamic_cap, resolve_target_count, ColdStartManager, InfoGainExplorer, SessionInfo,
    SimilarityPredictor, SourceProposal, StrategyEnsemble, ThompsonBaseline,
};
use crate::error::EngineError;
use crate::lexical::{self, ConfusablePair, MorphemeMastery, StudyContext};
use crate::memory::{
    adjusted_interval_days, assess_mastery, blend_with_cognitive, default_retention_target,
    recall_probability, retention_target, review_quality, MasteryHistory, MemoryTrace,
    ReviewContext,
};
use crate::modeling::{
    fuse_fatigue, AttentionMonitor, AttentionSignals, CognitiveObservation, CognitiveProfiler,
    FatigueEstimator, FatigueSignals, KalmanProfileState, KalmanProfiler, MotivationEvent,
    MotivationTracker, ProfileObservation, TrendAnalyzer,
};
use crate::persistence::StateStore;
use crate::types::{
    ColdStartPhase, CycleResult, DecisionExplanation, DecisionFactor, DifficultyLevel,
    EventContext, FeatureVector, InteractionEvent, LearnerState, PersistedLearnerState, Reward,
    StrategyParams, WordDecision,
};

const MAX_RESPONSE_TIME_MS: f64 = 10_000.0;
const CONFIDENCE_DECAY: f64 = 0.9;
const MIN_CONFIDENCE: f64 = 0.3;
const DEFAULT_DAILY_TARGET: i32 = 20;
/// Breaks at least this long (minutes) reset fatigue on reload.
const RELOAD_RESET_MINUTES: f64 = 30.0;
const RELOAD_DECAY_MINUTES: f64 = 5.0;
const RELOAD_DECAY_K: f64 = 0.05;

/// Per-user model instances, rebuilt from the persisted state on first touch.
struct UserModels {
    attention: AttentionMonitor,
    fatigue: FatigueEstimator,
    cognitive: CognitiveProfiler,
    motivation: MotivationTracker,
    trend: TrendAnalyzer,
    kalman_state: KalmanProfileState,
    cold_start: Option<ColdStartManager>,
    infogain: InfoGainExplorer,
    similarity: SimilarityPredictor,
    bandit: ThompsonBaseline,
}

impl UserModels {
    fn restore(config: &EngineConfig, persisted: &PersistedLearnerState) -> Self {
        let mut attention =
            AttentionMonitor::new(config.attention_weights.clone(), config.attention_smoothing);
        attention.set_value(persisted.state.attention);

        let mut fatigue = FatigueEstimator::new(config.fatigue.clone());
        fatigue.set_value(persisted.state.fatigue);

        let mut cognitive = CognitiveProfiler::new(config.cognitive.clone());
        cognitive.set_profile(persisted.state.cognitive.clone());

        let mut motivation = MotivationTracker::new(config.motivation.clone());
        motivation.set_value(persisted.state.motivation);

        let cold_start = persisted
            .cold_start
            .clone()
            .map(|state| ColdStartManager::from_state(config.cold_start.clone(), state));

        let restore_model = |key: &str| -> Option<serde_json::Value> {
            persisted
                .algorithm_states
                .as_ref()
                .and_then(|states| states.get(key))
                .filter(|v| !v.is_null())
                .cloned()
        };
        let infogain = restore_model("infogain")
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let similarity = restore_model("similarity")
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let bandit = restore_model("bandit")
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let kalman_state = restore_model("kalmanProfile")
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        Self {
            attention,
            fatigue,
            cognitive,
            motivation,
            trend: TrendAnalyzer::new(config.trend.clone()),
            kalman_state,
            cold_start,
            infogain,
            similarity,
            bandit,
        }
    }

    fn snapshot(&self) -> Result<serde_json::Value, EngineError> {
        Ok(serde_json::json!({
            "infogain": serde_json::to_value(&self.infogain)?,
            "similarity": serde_json::to_value(&self.similarity)?,
            "bandit": serde_json::to_value(&self.bandit)?,
            "kalmanProfile": serde_json::to_value(&self.kalman_state)?,
        }))
    }
}

pub struct AdaptiveEngine {
    config: Arc<RwLock<EngineConfig>>,
    store: Option<Arc<StateStore>>,
    ensemble: Arc<RwLock<StrategyEnsemble>>,
    kalman: KalmanProfiler,
    user_models: Arc<RwLock<HashMap<String, UserModels>>>,
    user_states: Arc<RwLock<HashMap<String, PersistedLearnerState>>>,
}

impl Default for AdaptiveEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default(), None)
    }
}

impl AdaptiveEngine {
    pub fn new(config: EngineConfig, store: Option<Arc<StateStore>>) -> Self {
        let ensemble = StrategyEnsemble::new(config.feature_flags.clone(), config.ensemble.clone());
        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            ensemble: Arc::new(RwLock::new(ensemble)),
            kalman: KalmanProfiler::default(),
            user_models: Arc::new(RwLock::new(HashMap::new())),
            user_states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Runs one full decision cycle for a sanitized interaction event.
    pub async fn process_event(
        &self,
        user_id: &str,
        event: InteractionEvent,
        context: &EventContext,
    ) -> Result<CycleResult, EngineError> {
        let config = self.config.read().await.clone();
        let event = event.sanitized();

        let mut persisted = self.load_or_init_state(user_id).await?;
        if let Some(strategy) = &context.current_strategy {
            persisted.current_strategy = strategy.clone();
        }

        let mut models_map = self.user_models.write().await;
        let models = models_map
            .entry(user_id.to_string())
            .or_insert_with(|| UserModels::restore(&config, &persisted));

        let features = build_feature_vector(&event, context, &persisted.state);
        let new_state = self.update_modeling(models, &config, &persisted.state, &event, context);

        let accuracy_observation = context
            .recent_accuracy
            .unwrap_or(if event.is_correct { 1.0 } else { 0.0 });

        let in_cold_start = models
            .cold_start
            .as_ref()
            .map(|cs| !cs.is_complete())
            .unwrap_or(false);

        let mut strategy;
        let mut candidates = Vec::new();
        let mut cold_start_phase: Option<ColdStartPhase> = None;

        if in_cold_start {
            strategy = persisted.current_strategy.clone();
            if let Some(manager) = models.cold_start.as_mut() {
                if let Some(settled) =
                    manager.update(accuracy_observation, event.response_time_ms)
                {
                    strategy = settled;
                }
                cold_start_phase = Some(manager.phase());
                persisted.cold_start = Some(manager.state().clone());
                debug!(user_id, phase = ?manager.phase(), "cold start decision");
            }
        } else if config.feature_flags.ensemble_enabled {
            let grid = generate_strategy_candidates(&persisted.current_strategy);
            let by_key: HashMap<String, StrategyParams> =
                grid.iter().map(|s| (s.key(), s.clone())).collect();
            let keys: Vec<String> = grid.iter().map(|s| s.key()).collect();
            let context_key = state_context_key(&new_state);

            let infogain_proposal = if config.feature_flags.infogain_enabled {
                match models.infogain.select(&keys, Some(&context_key)) {
                    Some(key) => SourceProposal {
                        confidence: Some(models.infogain.confidence(&key, Some(&context_key))),
                        strategy: by_key.get(&key).cloned(),
                    },
                    None => SourceProposal::default(),
                }
            } else {
                SourceProposal::default()
            };

            let similarity_proposal = if config.feature_flags.similarity_enabled {
                match models.similarity.select(&features.values, &keys) {
                    Some(key) => SourceProposal {
                        confidence: Some(models.similarity.confidence(&key)),
                        strategy: by_key.get(&key).cloned(),
                    },
                    None => SourceProposal::default(),
                }
            } else {
                SourceProposal::default()
            };

            let bandit_proposal = if config.feature_flags.bandit_enabled {
                match models.bandit.select_best(&new_state, &keys) {
                    Some(key) => SourceProposal {
                        confidence: Some(models.bandit.expected_reward(&key).clamp(0.4, 0.98)),
                        strategy: by_key.get(&key).cloned(),
                    },
                    None => SourceProposal::default(),
                }
            } else {
                SourceProposal::default()
            };

            let session = session_info(context);
            let mut ensemble = self.ensemble.write().await;
            ensemble.performance = persisted.ensemble_performance.clone().unwrap_or_default();
            let (merged, merged_candidates) = ensemble.decide(
                &new_state,
                &persisted.current_strategy,
                &infogain_proposal,
                &similarity_proposal,
                &bandit_proposal,
            );
            strategy = ensemble.post_filter(merged, &new_state, session.as_ref());
            persisted.ensemble_performance = Some(ensemble.performance.clone());
            candidates = merged_candidates;
        } else {
            strategy = persisted.current_strategy.clone();
        }

        if !in_cold_start && config.feature_flags.similarity_enabled {
            strategy.recommendation = models.similarity.recommend_additional_count(&features.values);
        }

        let reward = compute_reward(&event, &new_state, &config);

        if !in_cold_start {
            let reward01 = ((reward.value + 1.0) / 2.0).clamp(0.0, 1.0);
            let key = strategy.key();
            let context_key = state_context_key(&new_state);
            if config.feature_flags.infogain_enabled {
                models.infogain.record(&key, reward01, Some(&context_key));
            }
            if config.feature_flags.similarity_enabled {
                models
                    .similarity
                    .record(features.values.clone(), key.clone(), reward01);
            }
            if config.feature_flags.bandit_enabled {
                models.bandit.record(&new_state, &key, reward01);
            }
            if config.feature_flags.ensemble_enabled && !candidates.is_empty() {
                let mut ensemble = self.ensemble.write().await;
                ensemble.performance = persisted.ensemble_performance.clone().unwrap_or_default();
                ensemble.update_performance(&candidates, &strategy, reward01);
                persisted.ensemble_performance = Some(ensemble.performance.clone());
            }
        }

        let cap = dynamic_cap(&new_state);
        let user_target = context.daily_target.unwrap_or(DEFAULT_DAILY_TARGET);
        let target_count = resolve_target_count(user_target, strategy.recommendation.as_ref(), cap);

        let mut word_traces: Vec<(String, MemoryTrace)> = Vec::new();
        let word_decision = if config.feature_flags.memory_model_enabled {
            self.decide_word(
                models,
                &config,
                &mut persisted,
                &new_state,
                &event,
                context,
                &strategy,
                &mut word_traces,
            )
            .await?
        } else {
            None
        };

        let explanation =
            build_explanation(&new_state, &persisted.current_strategy, &strategy);

        persisted.state = new_state.clone();
        persisted.current_strategy = strategy.clone();
        persisted.interaction_count += 1;
        persisted.last_updated = Utc::now().timestamp_millis();
        persisted.algorithm_states = Some(models.snapshot()?);
        drop(models_map);

        // The cache only advances once the save transaction has committed;
        // a rolled-back save surfaces to the caller with the cache untouched.
        if let Some(store) = &self.store {
            store.save_state(&persisted, &word_traces).await?;
        }
        self.user_states
            .write()
            .await
            .insert(user_id.to_string(), persisted);

        Ok(CycleResult {
            state: new_state,
            strategy,
            target_count,
            dynamic_cap: cap,
            reward,
            explanation,
            feature_vector: Some(features),
            word_decision,
            cold_start_phase,
        })
    }

    pub async fn get_user_state(&self, user_id: &str) -> Option<LearnerState> {
        self.user_states
            .read()
            .await
            .get(user_id)
            .map(|p| p.state.clone())
    }

    pub async fn get_current_strategy(&self, user_id: &str) -> Option<StrategyParams> {
        self.user_states
            .read()
            .await
            .get(user_id)
            .map(|p| p.current_strategy.clone())
    }

    /// Drops cached state and models, forcing a reload from storage.
    pub async fn invalidate_cache(&self, user_id: &str) {
        self.user_states.write().await.remove(user_id);
        self.user_models.write().await.remove(user_id);
    }

    pub async fn set_feature_flags(&self, flags: FeatureFlags) {
        self.config.write().await.feature_flags = flags.clone();
        self.ensemble.write().await.set_feature_flags(flags);
    }

    async fn load_or_init_state(
        &self,
        user_id: &str,
    ) -> Result<PersistedLearnerState, EngineError> {
        if let Some(cached) = self.user_states.read().await.get(user_id) {
            return Ok(cached.clone());
        }

        let mut persisted = match &self.store {
            Some(store) => match store.load_state(user_id).await? {
                Some(loaded) => loaded,
                None => PersistedLearnerState::initial(user_id),
            },
            None => PersistedLearnerState::initial(user_id),
        };

        // On reload, time away from the app works off accumulated fatigue.
        let elapsed_minutes =
            (Utc::now().timestamp_millis() - persisted.state.ts).max(0) as f64 / 60_000.0;
        if elapsed_minutes >= RELOAD_RESET_MINUTES {
            persisted.state.fatigue = 0.0;
            persisted.state.fused_fatigue = None;
            persisted.state.attention = persisted.state.attention.max(0.7);
        } else if elapsed_minutes > RELOAD_DECAY_MINUTES {
            let decay = (-RELOAD_DECAY_K * elapsed_minutes).exp();
            persisted.state.fatigue *= decay;
            persisted.state.fused_fatigue = persisted.state.fused_fatigue.map(|f| f * decay);
        }

        Ok(persisted)
    }

    fn update_modeling(
        &self,
        models: &mut UserModels,
        config: &EngineConfig,
        prev: &LearnerState,
        event: &InteractionEvent,
        context: &EventContext,
    ) -> LearnerState {
        let rt_norm = (event.response_time_ms as f64 / MAX_RESPONSE_TIME_MS).min(1.0);
        let dwell_norm = event
            .dwell_time_ms
            .map(|ms| (ms as f64 / MAX_RESPONSE_TIME_MS).min(1.0))
            .unwrap_or(rt_norm);
        let focus_loss = event
            .focus_loss_ms
            .map(|ms| (ms as f64 / 60_000.0).min(1.0))
            .unwrap_or(0.0);
        let recent_accuracy = context
            .recent_accuracy
            .unwrap_or(if event.is_correct { 0.8 } else { 0.6 });
        let study_duration = context.study_duration_minutes.unwrap_or(0.0);
        let biometric = context.biometric.as_ref();

        let attention = models.attention.update(&AttentionSignals {
            rt_norm,
            rt_cv: context.rt_cv.unwrap_or(0.0),
            pace_cv: context.pace_cv.unwrap_or(0.0),
            pause_count: event.pause_count as f64,
            switch_count: event.switch_count as f64,
            interaction_density: event.interaction_density.unwrap_or(0.5),
            focus_loss,
            recent_accuracy,
            is_correct: Some(event.is_correct),
            hint_used: event.hint_count > 0,
            retry_count: event.retry_count,
            dwell_norm,
            biometric_fatigue: biometric.map(|b| b.score).unwrap_or(0.0),
            biometric_confidence: biometric.map(|b| b.confidence).unwrap_or(0.5),
            motivation: prev.motivation,
            cognitive: prev.cognitive.clone(),
            study_duration_minutes: study_duration,
            hour_of_day: chrono::Local::now().hour(),
        });

        let fatigue = models.fatigue.update(&FatigueSignals {
            error_rate_trend: if event.is_correct { -0.05 } else { 0.1 },
            rt_increase_rate: rt_norm,
            repeat_errors: event.retry_count,
            break_minutes: context.break_minutes,
        });

        let mut cognitive = models.cognitive.update(&CognitiveObservation {
            accuracy: if event.is_correct { 1.0 } else { 0.0 },
            avg_response_time_ms: event.response_time_ms,
        });

        if config.feature_flags.multiscale_enabled {
            if let Some(history) = context.review_history.as_deref() {
                if !history.is_empty() {
                    let now_hours = event.timestamp_ms as f64 / 3_600_000.0;
                    let recall = recall_probability(history, now_hours);
                    cognitive.mem = blend_with_cognitive(recall, cognitive.mem);
                }
            }
        }

        let mut observation_conf = 0.7;
        if config.feature_flags.kalman_profile_enabled {
            let estimate = self.kalman.update(
                &mut models.kalman_state,
                &ProfileObservation {
                    accuracy: recent_accuracy,
                    speed: cognitive.speed,
                    consistency: cognitive.stability,
                },
            );
            cognitive.mem = (0.7 * cognitive.mem + 0.3 * estimate.mem).clamp(0.0, 1.0);
            cognitive.speed = (0.7 * cognitive.speed + 0.3 * estimate.speed).clamp(0.0, 1.0);
            cognitive.stability =
                (0.7 * cognitive.stability + 0.3 * estimate.stability).clamp(0.0, 1.0);
            observation_conf = estimate.confidence;
        }

        let motivation = models.motivation.update(&MotivationEvent {
            is_correct: event.is_correct,
            is_quit: event.is_quit,
        });

        let mastery_score = (cognitive.mem + cognitive.speed + cognitive.stability) / 3.0;
        let trend = models.trend.update(mastery_score);

        let conf = (CONFIDENCE_DECAY * prev.conf + (1.0 - CONFIDENCE_DECAY) * observation_conf)
            .max(MIN_CONFIDENCE);

        let fused = fuse_fatigue(
            fatigue,
            biometric.map(|b| b.score),
            biometric.map(|b| b.confidence),
            study_duration,
        );

        LearnerState {
            attention,
            fatigue,
            cognitive,
            motivation,
            trend: Some(trend),
            conf,
            ts: Utc::now().timestamp_millis(),
            fused_fatigue: Some(fused),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn decide_word(
        &self,
        models: &UserModels,
        config: &EngineConfig,
        persisted: &mut PersistedLearnerState,
        state: &LearnerState,
        event: &InteractionEvent,
        context: &EventContext,
        strategy: &StrategyParams,
        word_traces: &mut Vec<(String, MemoryTrace)>,
    ) -> Result<Option<WordDecision>, EngineError> {
        let word_id = match &event.word_id {
            Some(id) => id.clone(),
            None => return Ok(None),
        };

        let mut trace = match &context.word_trace {
            Some(trace) => trace.clone(),
            None => match &self.store {
                Some(store) => store
                    .load_word_trace(&persisted.user_id, &word_id)
                    .await?
                    .unwrap_or_default(),
                None => MemoryTrace::default(),
            },
        };

        let is_first_attempt = trace.last_review_ms == 0;
        let elapsed_days = if is_first_attempt {
            0.0
        } else {
            (event.timestamp_ms - trace.last_review_ms).max(0) as f64 / 86_400_000.0
        };
        let retrievability = trace.retrievability(elapsed_days);

        let quality = review_quality(event.is_correct, event.response_time_ms, event.hint_count);
        trace.update(quality, event.is_correct, event.timestamp_ms);

        let empty_morphemes: Vec<MorphemeMastery> = Vec::new();
        let empty_confusables: Vec<ConfusablePair> = Vec::new();
        let empty_words: Vec<String> = Vec::new();
        let empty_contexts: Vec<StudyContext> = Vec::new();
        let morphemes = if config.feature_flags.morphology_enabled {
            context.morphemes.as_deref().unwrap_or(&empty_morphemes)
        } else {
            &empty_morphemes
        };
        let confusables = if config.feature_flags.interference_enabled {
            context.confusables.as_deref().unwrap_or(&empty_confusables)
        } else {
            &empty_confusables
        };
        let recent_words = if config.feature_flags.interference_enabled {
            context.recent_word_ids.as_deref().unwrap_or(&empty_words)
        } else {
            &empty_words
        };
        let study_contexts = if config.feature_flags.variability_enabled {
            context.study_contexts.as_deref().unwrap_or(&empty_contexts)
        } else {
            &empty_contexts
        };
        let multiplier = lexical::specialization_multiplier(
            morphemes,
            confusables,
            recent_words,
            study_contexts,
        );

        let r_target = match context.reviews_today.zip(context.daily_target) {
            Some((actual, target)) if target > 0 => retention_target(
                actual,
                target,
                context.study_duration_minutes.unwrap_or(0.0),
                context.planned_study_minutes.unwrap_or(0.0),
            ),
            _ => default_retention_target(),
        };
        let interval_days =
            scheduled_interval_days(&trace, r_target, strategy.interval_scale, multiplier);

        let recent_accuracy = context.recent_accuracy.unwrap_or(0.7);
        let review_context = ReviewContext {
            is_first_attempt,
            correct_count: (recent_accuracy * 10.0).round() as i32,
            total_attempts: 10,
            response_time_ms: event.response_time_ms,
            hint_used: event.hint_count > 0,
            consecutive_correct: models.attention.streaks().0 as i32,
        };

        let history = persisted.mastery_history.get_or_insert_with(MasteryHistory::new);
        let assessment = assess_mastery(
            &trace,
            state,
            &review_context,
            strategy.difficulty,
            event.is_correct,
            Some(history),
        );
        history.record(
            assessment.score,
            assessment.threshold,
            assessment.is_mastered,
            event.timestamp_ms,
        );

        word_traces.push((word_id.clone(), trace.clone()));

        Ok(Some(WordDecision {
            word_id,
            retrievability,
            recommended_interval_days: interval_days,
            is_mastered: assessment.is_mastered,
            mastery_score: assessment.score,
            mastery_threshold: assessment.threshold,
            confidence: assessment.confidence,
            quality,
            strength: trace.strength,
            consolidation: trace.consolidation,
            last_review_ms: trace.last_review_ms,
        }))
    }
}

fn build_feature_vector(
    event: &InteractionEvent,
    context: &EventContext,
    state: &LearnerState,
) -> FeatureVector {
    let rt_norm = (event.response_time_ms as f64 / MAX_RESPONSE_TIME_MS).min(1.0);
    let dwell_norm = event
        .dwell_time_ms
        .map(|ms| (ms as f64 / MAX_RESPONSE_TIME_MS).min(1.0))
        .unwrap_or(rt_norm);
    let hour = chrono::Local::now().hour() as f64 / 23.0;

    FeatureVector::new(
        vec![
            rt_norm,
            dwell_norm,
            if event.is_correct { 1.0 } else { 0.0 },
            (event.retry_count as f64 / 3.0).min(1.0),
            state.attention,
            state.effective_fatigue(),
            ((state.motivation + 1.0) / 2.0).clamp(0.0, 1.0),
            state.cognitive.mem,
            hour,
            context.recent_accuracy.unwrap_or(0.7),
        ],
        vec![
            "rtNorm".to_string(),
            "dwellNorm".to_string(),
            "correct".to_string(),
            "retryNorm".to_string(),
            "attention".to_string(),
            "fatigue".to_string(),
            "motivationNorm".to_string(),
            "memory".to_string(),
            "hourNorm".to_string(),
            "recentAccuracy".to_string(),
        ],
    )
}

/// Next-review interval for a word: the lexical multiplier shifts the
/// retention target, the strategy's interval scale stretches the result.
fn scheduled_interval_days(
    trace: &MemoryTrace,
    r_target: f64,
    interval_scale: f64,
    multiplier: f64,
) -> f64 {
    adjusted_interval_days(trace, r_target, multiplier) * interval_scale.clamp(0.5, 2.0)
}

/// Context key shared by the explorers, binned from the learner state.
fn state_context_key(state: &LearnerState) -> String {
    let bin = |value: f64| -> i32 { ((value.clamp(0.0, 1.0) * 3.0).floor() as i32).min(2) };
    let motivation = ((state.motivation + 1.0) / 2.0).clamp(0.0, 1.0);
    format!(
        "a{}_f{}_m{}",
        bin(state.attention),
        bin(state.effective_fatigue()),
        bin(motivation)
    )
}

fn session_info(context: &EventContext) -> Option<SessionInfo> {
    context.total_sessions.map(|total_sessions| SessionInfo {
        total_sessions,
        duration_minutes: context.study_duration_minutes.unwrap_or(0.0),
    })
}

/// The strategy grid the learned components score: difficulty x new-ratio
/// variants, plus batch-size and hint-level variants of the current strategy.
fn generate_strategy_candidates(current: &StrategyParams) -> Vec<StrategyParams> {
    let difficulties = [
        DifficultyLevel::Easy,
        DifficultyLevel::Mid,
        DifficultyLevel::Hard,
    ];
    let new_ratios = [0.1, 0.2, 0.3, 0.4];
    let batch_sizes = [5, 8, 12, 16];
    let hint_levels = [0, 1, 2];

    let mut candidates = Vec::with_capacity(difficulties.len() * new_ratios.len() + 8);

    for &difficulty in &difficulties {
        for &new_ratio in &new_ratios {
            candidates.push(StrategyParams {
                difficulty,
                new_ratio,
                batch_size: current.batch_size,
                interval_scale: current.interval_scale,
                hint_level: current.hint_level,
                recommendation: None,
            });
        }
    }

    for &batch_size in &batch_sizes {
        candidates.push(StrategyParams {
            batch_size,
            recommendation: None,
            ..current.clone()
        });
    }

    for &hint_level in &hint_levels {
        candidates.push(StrategyParams {
            hint_level,
            recommendation: None,
            ..current.clone()
        });
    }

    let mut base = current.clone();
    base.recommendation = None;
    if !candidates.iter().any(|c| c.key() == base.key()) {
        candidates.push(base);
    }

    candidates
}

fn compute_reward(event: &InteractionEvent, state: &LearnerState, config: &EngineConfig) -> Reward {
    let accuracy_score = if event.is_correct { 1.0 } else { 0.0 };
    let speed_score = 1.0 - (event.response_time_ms as f64 / MAX_RESPONSE_TIME_MS).min(1.0);
    let stability_score = state.cognitive.stability;
    let retention_score = state.cognitive.mem;

    let value = config.reward.accuracy_weight * accuracy_score
        + config.reward.speed_weight * speed_score
        + config.reward.stability_weight * stability_score
        + config.reward.retention_weight * retention_score;
    let value = (value * 2.0 - 1.0).clamp(-1.0, 1.0);

    let reason = if event.is_correct {
        if speed_score > 0.7 {
            "correct and fast"
        } else {
            "correct"
        }
    } else if event.hint_count > 0 {
        "answered with hints"
    } else {
        "incorrect"
    };

    Reward::new(value, reason)
}

fn build_explanation(
    state: &LearnerState,
    previous: &StrategyParams,
    strategy: &StrategyParams,
) -> DecisionExplanation {
    let mut factors = Vec::new();
    let fatigue = state.effective_fatigue();

    if fatigue > 0.5 {
        factors.push(DecisionFactor {
            name: "fatigue".to_string(),
            value: fatigue,
            impact: "reduced batch size".to_string(),
            percentage: (fatigue - 0.5) * 100.0,
        });
    }
    if state.attention < 0.5 {
        factors.push(DecisionFactor {
            name: "attention".to_string(),
            value: state.attention,
            impact: "raised hint level".to_string(),
            percentage: (0.5 - state.attention) * 100.0,
        });
    }
    if state.motivation < 0.0 {
        factors.push(DecisionFactor {
            name: "motivation".to_string(),
            value: state.motivation,
            impact: "lowered difficulty".to_string(),
            percentage: state.motivation.abs() * 100.0,
        });
    }

    let mut changes = Vec::new();
    if previous.difficulty != strategy.difficulty {
        changes.push(format!(
            "difficulty: {} -> {}",
            previous.difficulty.as_str(),
            strategy.difficulty.as_str()
        ));
    } else {
        changes.push(format!("difficulty: {}", strategy.difficulty.as_str()));
    }
    if previous.batch_size != strategy.batch_size {
        changes.push(format!(
            "batch: {} -> {}",
            previous.batch_size, strategy.batch_size
        ));
    } else {
        changes.push(format!("batch: {}", strategy.batch_size));
    }
    if (previous.new_ratio - strategy.new_ratio).abs() > f64::EPSILON {
        changes.push(format!(
            "new-word ratio: {:.0}% -> {:.0}%",
            previous.new_ratio * 100.0,
            strategy.new_ratio * 100.0
        ));
    } else {
        changes.push(format!("new-word ratio: {:.0}%", strategy.new_ratio * 100.0));
    }

    let text = if factors.is_empty() {
        "learning state is healthy, keeping the current strategy".to_string()
    } else {
        let names: Vec<&str> = factors.iter().map(|f| f.name.as_str()).collect();
        format!("strategy adjusted for {}", names.join(", "))
    };

    DecisionExplanation {
        factors,
        changes,
        text,
    }
}
