use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::error::EngineError;
use crate::memory::MemoryTrace;
use crate::types::{LearnerState, PersistedLearnerState, StrategyParams, TrendState};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

pub struct StateStore {
    pool: SqlitePool,
}

impl StateStore {
    pub async fn connect(url: &str) -> Result<Self, EngineError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(sqlx::Error::from)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self, EngineError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn init_schema(&self) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS "learner_states" (
                "userId" TEXT PRIMARY KEY,
                "attention" REAL NOT NULL,
                "fatigue" REAL NOT NULL,
                "fusedFatigue" REAL,
                "motivation" REAL NOT NULL,
                "confidence" REAL NOT NULL,
                "cognitiveProfile" TEXT NOT NULL,
                "trendState" TEXT,
                "currentStrategy" TEXT NOT NULL,
                "coldStart" TEXT,
                "masteryHistory" TEXT,
                "ensemblePerformance" TEXT,
                "interactionCount" INTEGER NOT NULL DEFAULT 0,
                "updatedAt" TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS "model_snapshots" (
                "userId" TEXT NOT NULL,
                "algorithm" TEXT NOT NULL,
                "parameters" TEXT NOT NULL,
                "schemaVersion" INTEGER NOT NULL,
                "version" INTEGER NOT NULL,
                "updatedAt" TEXT NOT NULL,
                PRIMARY KEY ("userId", "algorithm")
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS "word_traces" (
                "userId" TEXT NOT NULL,
                "wordId" TEXT NOT NULL,
                "strength" REAL NOT NULL,
                "consolidation" REAL NOT NULL,
                "lastReviewMs" INTEGER NOT NULL,
                "updatedAt" TEXT NOT NULL,
                PRIMARY KEY ("userId", "wordId")
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persists the full per-user state in one transaction. Algorithm
    /// snapshots only get a version bump when their parameters changed.
    pub async fn save_state(
        &self,
        persisted: &PersistedLearnerState,
        word_traces: &[(String, MemoryTrace)],
    ) -> Result<(), EngineError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let cognitive = serde_json::to_string(&persisted.state.cognitive)?;
        let strategy = serde_json::to_string(&persisted.current_strategy)?;
        let cold_start = persisted
            .cold_start
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let mastery_history = persisted
            .mastery_history
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let ensemble_performance = persisted
            .ensemble_performance
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let trend = persisted.state.trend.map(|t| t.as_str().to_string());

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO "learner_states" (
                "userId", "attention", "fatigue", "fusedFatigue", "motivation",
                "confidence", "cognitiveProfile", "trendState", "currentStrategy",
                "coldStart", "masteryHistory", "ensemblePerformance",
                "interactionCount", "updatedAt"
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT ("userId") DO UPDATE SET
                "attention" = EXCLUDED."attention",
                "fatigue" = EXCLUDED."fatigue",
                "fusedFatigue" = EXCLUDED."fusedFatigue",
                "motivation" = EXCLUDED."motivation",
                "confidence" = EXCLUDED."confidence",
                "cognitiveProfile" = EXCLUDED."cognitiveProfile",
                "trendState" = EXCLUDED."trendState",
                "currentStrategy" = EXCLUDED."currentStrategy",
                "coldStart" = EXCLUDED."coldStart",
                "masteryHistory" = EXCLUDED."masteryHistory",
                "ensemblePerformance" = EXCLUDED."ensemblePerformance",
                "interactionCount" = EXCLUDED."interactionCount",
                "updatedAt" = EXCLUDED."updatedAt"
            "#,
        )
        .bind(&persisted.user_id)
        .bind(persisted.state.attention)
        .bind(persisted.state.fatigue)
        .bind(persisted.state.fused_fatigue)
        .bind(persisted.state.motivation)
        .bind(persisted.state.conf)
        .bind(&cognitive)
        .bind(&trend)
        .bind(&strategy)
        .bind(&cold_start)
        .bind(&mastery_history)
        .bind(&ensemble_performance)
        .bind(persisted.interaction_count)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        if let Some(Value::Object(algorithms)) = &persisted.algorithm_states {
            for (algorithm, parameters) in algorithms {
                let serialized = serde_json::to_string(parameters)?;

                let existing = sqlx::query(
                    r#"
                    SELECT "parameters", "version" FROM "model_snapshots"
                    WHERE "userId" = $1 AND "algorithm" = $2
                    "#,
                )
                .bind(&persisted.user_id)
                .bind(algorithm)
                .fetch_optional(&mut *tx)
                .await?;

                let version = match existing {
                    Some(row) => {
                        let stored: String = row.try_get("parameters").unwrap_or_default();
                        let stored_version: i32 = row.try_get("version").unwrap_or(1);
                        if stored == serialized {
                            continue;
                        }
                        stored_version + 1
                    }
                    None => 1,
                };

                sqlx::query(
                    r#"
                    INSERT INTO "model_snapshots" (
                        "userId", "algorithm", "parameters", "schemaVersion", "version", "updatedAt"
                    ) VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT ("userId", "algorithm") DO UPDATE SET
                        "parameters" = EXCLUDED."parameters",
                        "schemaVersion" = EXCLUDED."schemaVersion",
                        "version" = EXCLUDED."version",
                        "updatedAt" = EXCLUDED."updatedAt"
                    "#,
                )
                .bind(&persisted.user_id)
                .bind(algorithm)
                .bind(&serialized)
                .bind(CURRENT_SCHEMA_VERSION)
                .bind(version)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
        }

        for (word_id, trace) in word_traces {
            sqlx::query(
                r#"
                INSERT INTO "word_traces" (
                    "userId", "wordId", "strength", "consolidation", "lastReviewMs", "updatedAt"
                ) VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT ("userId", "wordId") DO UPDATE SET
                    "strength" = EXCLUDED."strength",
                    "consolidation" = EXCLUDED."consolidation",
                    "lastReviewMs" = EXCLUDED."lastReviewMs",
                    "updatedAt" = EXCLUDED."updatedAt"
                "#,
            )
            .bind(&persisted.user_id)
            .bind(word_id)
            .bind(trace.strength)
            .bind(trace.consolidation)
            .bind(trace.last_review_ms)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn load_state(
        &self,
        user_id: &str,
    ) -> Result<Option<PersistedLearnerState>, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM "learner_states"
            WHERE "userId" = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let updated_at_raw: String = row.try_get("updatedAt").unwrap_or_default();
        let last_updated = match DateTime::parse_from_rfc3339(&updated_at_raw) {
            Ok(dt) => dt.timestamp_millis(),
            Err(err) => {
                tracing::warn!(
                    user_id,
                    raw = %updated_at_raw,
                    error = %err,
                    "unparseable updatedAt, falling back to now"
                );
                Utc::now().timestamp_millis()
            }
        };

        let cognitive_raw: String = row.try_get("cognitiveProfile").unwrap_or_default();
        let cognitive = serde_json::from_str(&cognitive_raw).unwrap_or_default();
        let trend: Option<String> = row.try_get("trendState").ok();
        let trend = trend.as_deref().map(TrendState::parse);

        let state = LearnerState {
            attention: row.try_get("attention").unwrap_or(0.7),
            fatigue: row.try_get("fatigue").unwrap_or(0.0),
            fused_fatigue: row.try_get("fusedFatigue").ok().flatten(),
            motivation: row.try_get("motivation").unwrap_or(0.5),
            conf: row.try_get("confidence").unwrap_or(0.5),
            cognitive,
            trend,
            ts: last_updated,
        };

        let strategy_raw: String = row.try_get("currentStrategy").unwrap_or_default();
        let current_strategy: StrategyParams =
            serde_json::from_str(&strategy_raw).unwrap_or_default();

        let cold_start = decode_json_column(&row, "coldStart");
        let mastery_history = decode_json_column(&row, "masteryHistory");
        let ensemble_performance = decode_json_column(&row, "ensemblePerformance");
        let algorithm_states = self.load_algorithm_states(user_id).await?;

        Ok(Some(PersistedLearnerState {
            user_id: user_id.to_string(),
            state,
            current_strategy,
            cold_start,
            interaction_count: row.try_get("interactionCount").unwrap_or(0),
            last_updated,
            mastery_history,
            ensemble_performance,
            algorithm_states,
        }))
    }

    async fn load_algorithm_states(&self, user_id: &str) -> Result<Option<Value>, EngineError> {
        let rows = sqlx::query(
            r#"
            SELECT "algorithm", "parameters" FROM "model_snapshots"
            WHERE "userId" = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut map = serde_json::Map::new();
        for row in rows {
            let algorithm: String = row.try_get("algorithm").unwrap_or_default();
            let parameters_raw: String = row.try_get("parameters").unwrap_or_default();
            let parameters: Value = serde_json::from_str(&parameters_raw).unwrap_or(Value::Null);
            map.insert(algorithm, parameters);
        }
        Ok(Some(Value::Object(map)))
    }

    pub async fn load_word_trace(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<Option<MemoryTrace>, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT "strength", "consolidation", "lastReviewMs" FROM "word_traces"
            WHERE "userId" = $1 AND "wordId" = $2
            "#,
        )
        .bind(user_id)
        .bind(word_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| MemoryTrace {
            strength: r.try_get("strength").unwrap_or(1.0),
            consolidation: r.try_get("consolidation").unwrap_or(0.1),
            last_review_ms: r.try_get("lastReviewMs").unwrap_or(0),
        }))
    }

    pub async fn snapshot_version(
        &self,
        user_id: &str,
        algorithm: &str,
    ) -> Result<Option<i32>, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT "version" FROM "model_snapshots"
            WHERE "userId" = $1 AND "algorithm" = $2
            "#,
        )
        .bind(user_id)
        .bind(algorithm)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.try_get("version").unwrap_or(1)))
    }
}

fn decode_json_column<T: serde::de::DeserializeOwned>(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Option<T> {
    let raw: Option<String> = row.try_get(column).ok().flatten();
    raw.and_then(|s| serde_json::from_str(&s).ok())
}
