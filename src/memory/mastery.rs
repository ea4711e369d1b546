//! Adaptive mastery decisions.
//!
//! The mastery threshold is personal: derived from the cognitive profile,
//! scaled by the difficulty band, and nudged by the user's recent pass/fail
//! margins. A word is mastered when the weighted score (memory trace +
//! cognitive state + performance + context) clears that threshold.

use crate::memory::trace::MemoryTrace;
use crate::types::{CognitiveProfile, DifficultyLevel, LearnerState};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Personal scoring baseline computed from the cognitive profile.
#[derive(Debug, Clone)]
pub struct MasteryBaseline {
    /// Base threshold on the 0-100 score scale; higher is stricter.
    pub base_threshold: f64,
    pub cognitive_factor: f64,
    pub speed_factor: f64,
    pub stability_factor: f64,
    pub memory_factor: f64,
}

impl MasteryBaseline {
    pub fn from_cognitive(cognitive: &CognitiveProfile) -> Self {
        let cognitive_factor =
            cognitive.speed * 0.4 + cognitive.mem * 0.35 + cognitive.stability * 0.25;
        let base_threshold = 70.0 - cognitive_factor * 35.0;

        Self {
            base_threshold: base_threshold.clamp(35.0, 70.0),
            cognitive_factor,
            speed_factor: cognitive.speed,
            stability_factor: cognitive.stability,
            memory_factor: cognitive.mem,
        }
    }

    pub fn adjusted_threshold(&self, difficulty: DifficultyLevel) -> f64 {
        let multiplier = match difficulty {
            DifficultyLevel::Easy => 0.75,
            DifficultyLevel::Mid => 1.0,
            DifficultyLevel::Hard => 1.25,
        };
        (self.base_threshold * multiplier).clamp(25.0, 80.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryAttempt {
    pub score: f64,
    pub threshold: f64,
    pub mastered: bool,
    pub timestamp: i64,
}

/// Bounded log of recent mastery attempts, used to tune the threshold.
/// FIFO-evicted at capacity; counters track evictions so ratios stay honest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryHistory {
    pub attempts: VecDeque<MasteryAttempt>,
    pub avg_margin: f64,
    pub near_miss_count: i32,
    pub easy_pass_count: i32,
}

impl MasteryHistory {
    pub const MAX_ATTEMPTS: usize = 20;
    const NEAR_MISS_MARGIN: f64 = 0.1;
    const EASY_PASS_MARGIN: f64 = 0.2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, score: f64, threshold: f64, mastered: bool, timestamp: i64) {
        let margin = (score - threshold) / threshold;

        if !mastered && margin > -Self::NEAR_MISS_MARGIN {
            self.near_miss_count += 1;
        }
        if mastered && margin > Self::EASY_PASS_MARGIN {
            self.easy_pass_count += 1;
        }

        self.attempts.push_back(MasteryAttempt {
            score,
            threshold,
            mastered,
            timestamp,
        });

        while self.attempts.len() > Self::MAX_ATTEMPTS {
            if let Some(evicted) = self.attempts.pop_front() {
                let old_margin = (evicted.score - evicted.threshold) / evicted.threshold;
                if !evicted.mastered && old_margin > -Self::NEAR_MISS_MARGIN {
                    self.near_miss_count = (self.near_miss_count - 1).max(0);
                }
                if evicted.mastered && old_margin > Self::EASY_PASS_MARGIN {
                    self.easy_pass_count = (self.easy_pass_count - 1).max(0);
                }
            }
        }

        self.avg_margin = self.compute_avg_margin();
    }

    fn compute_avg_margin(&self) -> f64 {
        if self.attempts.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .attempts
            .iter()
            .map(|a| (a.score - a.threshold) / a.threshold)
            .sum();
        sum / self.attempts.len() as f64
    }

    /// Multiplier in [0.85, 1.15] applied to the base threshold. Many near
    /// misses lower it; many easy passes raise it.
    pub fn threshold_adjustment(&self) -> f64 {
        if self.attempts.len() < 3 {
            return 1.0;
        }

        let total = self.attempts.len() as f64;
        let near_miss_ratio = self.near_miss_count as f64 / total;
        let easy_pass_ratio = self.easy_pass_count as f64 / total;

        let adjustment = if near_miss_ratio > 0.4 {
            0.85 + (0.4 - near_miss_ratio).max(-0.15) * 0.5
        } else if easy_pass_ratio > 0.5 {
            1.0 + (easy_pass_ratio - 0.5).min(0.3) * 0.5
        } else {
            1.0 + self.avg_margin.clamp(-0.1, 0.1) * 0.5
        };

        adjustment.clamp(0.85, 1.15)
    }
}

#[derive(Debug, Clone)]
pub struct ReviewContext {
    pub is_first_attempt: bool,
    pub correct_count: i32,
    pub total_attempts: i32,
    pub response_time_ms: i64,
    pub hint_used: bool,
    pub consecutive_correct: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MasteryFactors {
    pub trace_contribution: f64,
    pub state_contribution: f64,
    pub performance_contribution: f64,
    pub context_contribution: f64,
}

#[derive(Debug, Clone)]
pub struct MasteryAssessment {
    pub is_mastered: bool,
    pub confidence: f64,
    pub score: f64,
    pub threshold: f64,
    pub factors: MasteryFactors,
}

pub fn assess_mastery(
    trace: &MemoryTrace,
    state: &LearnerState,
    context: &ReviewContext,
    difficulty: DifficultyLevel,
    is_correct: bool,
    history: Option<&MasteryHistory>,
) -> MasteryAssessment {
    let baseline = MasteryBaseline::from_cognitive(&state.cognitive);
    let mut threshold = baseline.adjusted_threshold(difficulty);

    if let Some(hist) = history {
        threshold *= hist.threshold_adjustment();
        threshold = threshold.clamp(25.0, 80.0);
    }

    // Memory trace: up to 35 points, weights boosted by the cognitive factor.
    let strength_weight = 2.0 + baseline.cognitive_factor;
    let consolidation_weight = 8.0 + baseline.memory_factor * 4.0;
    let trace_contribution =
        (trace.strength * strength_weight + trace.consolidation * consolidation_weight).min(35.0);

    // Current state: up to 25 points.
    let attention_score = state.attention * 10.0;
    let fatigue_penalty = state.effective_fatigue() * 8.0;
    let motivation_bonus = (state.motivation - 0.5).max(0.0) * 10.0;
    let state_contribution = (attention_score - fatigue_penalty + motivation_bonus).clamp(0.0, 25.0);

    // Performance on this word: up to 30 points, only earned on correct answers.
    let performance_contribution = if is_correct {
        let expected_time = 2500.0 + (1.0 - baseline.speed_factor) * 7500.0;
        let rt = context.response_time_ms.max(0) as f64;
        let speed_score = if rt <= expected_time {
            15.0 * (1.0 - (rt / expected_time / 2.0)).max(0.5)
        } else {
            15.0 * (expected_time / rt).max(0.3)
        };

        let accuracy = if context.total_attempts > 0 {
            context.correct_count as f64 / context.total_attempts as f64
        } else {
            1.0
        };
        let accuracy_score = accuracy * 10.0;

        let streak_multiplier = 2.5 + baseline.stability_factor * 1.5;
        let streak_score = (context.consecutive_correct.max(0) as f64).sqrt() * streak_multiplier;

        (speed_score + accuracy_score + streak_score.min(7.0)).min(30.0)
    } else {
        0.0
    };

    // Review context: up to 15 points.
    let context_contribution = if is_correct {
        let mut bonus = 0.0;
        if context.is_first_attempt && context.response_time_ms < 5000 {
            bonus += 6.0 + baseline.cognitive_factor * 6.0;
        }
        if !context.hint_used {
            bonus += 3.0;
        }
        bonus.min(15.0)
    } else {
        0.0
    };

    let score =
        trace_contribution + state_contribution + performance_contribution + context_contribution;
    let is_mastered = score >= threshold;
    let confidence = sigmoid((score - threshold) / 10.0);

    MasteryAssessment {
        is_mastered,
        confidence,
        score,
        threshold,
        factors: MasteryFactors {
            trace_contribution,
            state_contribution,
            performance_contribution,
            context_contribution,
        },
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

const R_TARGET_MIN: f64 = 0.75;
const R_TARGET_MAX: f64 = 0.95;
const R_TARGET_BASE: f64 = 0.90;
const BURDEN_SENSITIVITY: f64 = 0.1;

/// Personalized retention target from review burden over the recent window.
/// A user reviewing more than planned gets a lower target (longer intervals).
pub fn retention_target(
    actual_review_count: i32,
    target_review_count: i32,
    actual_time_minutes: f64,
    target_time_minutes: f64,
) -> f64 {
    let count_ratio = if target_review_count > 0 {
        actual_review_count as f64 / target_review_count as f64
    } else {
        1.0
    };
    let time_ratio = if target_time_minutes > 0.0 {
        actual_time_minutes / target_time_minutes
    } else {
        1.0
    };

    let burden = 0.5 * count_ratio + 0.5 * time_ratio;
    let target = R_TARGET_BASE * (1.0 + BURDEN_SENSITIVITY * (1.0 - burden));
    target.clamp(R_TARGET_MIN, R_TARGET_MAX)
}

pub fn default_retention_target() -> f64 {
    R_TARGET_BASE
}
