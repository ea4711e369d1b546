//! Simulation binary: drives the engine with a scripted learner session
//! against an in-memory store and prints each cycle's decision.

use std::sync::Arc;

use amde::config::EngineConfig;
use amde::logging::init_tracing;
use amde::persistence::StateStore;
use amde::types::{EventContext, InteractionEvent};
use amde::AdaptiveEngine;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let log_level = std::env::var("AMDE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let _log_guard = init_tracing(&log_level);

    let store = Arc::new(StateStore::in_memory().await?);
    store.init_schema().await?;

    let engine = AdaptiveEngine::new(EngineConfig::from_env(), Some(store.clone()));
    let user_id = format!("sim-{}", uuid::Uuid::new_v4());
    let user_id = user_id.as_str();

    // A session arc: warm-up, a strong stretch, then a tired tail.
    let script: Vec<(bool, i64)> = (0..8)
        .map(|i| (i % 2 == 0, 4500 - i * 200))
        .chain((0..12).map(|i| (true, 1800 + (i % 3) * 150)))
        .chain((0..6).map(|i| (i % 3 == 0, 6000 + i * 400)))
        .collect();

    let mut now = chrono::Utc::now().timestamp_millis();
    for (step, (is_correct, response_time_ms)) in script.into_iter().enumerate() {
        now += 8_000;
        let event = InteractionEvent {
            is_correct,
            response_time_ms,
            hint_count: if is_correct { 0 } else { 1 },
            word_id: Some(format!("word-{}", step % 5)),
            timestamp_ms: now,
            ..Default::default()
        };
        let context = EventContext {
            recent_accuracy: Some(if step < 8 { 0.6 } else { 0.8 }),
            study_duration_minutes: Some(step as f64 * 0.6),
            daily_target: Some(25),
            ..Default::default()
        };

        let result = engine.process_event(user_id, event, &context).await?;

        info!(
            step,
            attention = format!("{:.2}", result.state.attention),
            fatigue = format!("{:.2}", result.state.effective_fatigue()),
            motivation = format!("{:.2}", result.state.motivation),
            strategy = %result.strategy.key(),
            target = result.target_count,
            cap = result.dynamic_cap,
            reward = format!("{:.2}", result.reward.value),
            phase = ?result.cold_start_phase,
            "cycle complete"
        );
        if let Some(word) = &result.word_decision {
            info!(
                word_id = %word.word_id,
                retrievability = format!("{:.3}", word.retrievability),
                interval_days = format!("{:.2}", word.recommended_interval_days),
                mastered = word.is_mastered,
                score = format!("{:.1}", word.mastery_score),
                "word decision"
            );
        }
    }

    let final_version = store.snapshot_version(user_id, "bandit").await?;
    info!(?final_version, "simulation finished");
    Ok(())
}
