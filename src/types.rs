use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Mid,
    Hard,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Mid => "mid",
            Self::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Mid,
        }
    }

    pub fn harder(&self) -> Self {
        match self {
            Self::Easy => Self::Mid,
            _ => Self::Hard,
        }
    }

    pub fn easier(&self) -> Self {
        match self {
            Self::Hard => Self::Mid,
            _ => Self::Easy,
        }
    }

    /// Normalized difficulty band used by the study-batch assembler.
    pub fn band(&self) -> (f64, f64) {
        match self {
            Self::Easy => (0.0, 0.4),
            Self::Mid => (0.2, 0.7),
            Self::Hard => (0.5, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendState {
    Up,
    #[default]
    Flat,
    Stuck,
    Down,
}

impl TrendState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Flat => "flat",
            Self::Stuck => "stuck",
            Self::Down => "down",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "up" => Self::Up,
            "stuck" => Self::Stuck,
            "down" => Self::Down,
            _ => Self::Flat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Fast,
    #[default]
    Stable,
    Cautious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColdStartPhase {
    #[default]
    Classify,
    Explore,
    Normal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitiveProfile {
    pub mem: f64,
    pub speed: f64,
    pub stability: f64,
}

impl Default for CognitiveProfile {
    fn default() -> Self {
        Self {
            mem: 0.5,
            speed: 0.5,
            stability: 0.5,
        }
    }
}

/// Rolling per-user affective and cognitive state. Mutated once per processed
/// event and persisted after every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerState {
    #[serde(rename = "A")]
    pub attention: f64,
    #[serde(rename = "F")]
    pub fatigue: f64,
    #[serde(rename = "C")]
    pub cognitive: CognitiveProfile,
    #[serde(rename = "M")]
    pub motivation: f64,
    #[serde(rename = "T")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendState>,
    pub conf: f64,
    pub ts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fused_fatigue: Option<f64>,
}

impl Default for LearnerState {
    fn default() -> Self {
        Self {
            attention: 0.7,
            fatigue: 0.0,
            cognitive: CognitiveProfile::default(),
            motivation: 0.5,
            trend: None,
            conf: 0.5,
            ts: chrono::Utc::now().timestamp_millis(),
            fused_fatigue: None,
        }
    }
}

impl LearnerState {
    /// Fatigue with the biometric fusion applied when available.
    pub fn effective_fatigue(&self) -> f64 {
        self.fused_fatigue.unwrap_or(self.fatigue)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdStartState {
    pub phase: ColdStartPhase,
    pub user_type: Option<UserType>,
    pub probe_index: i32,
    pub update_count: i32,
    pub settled_strategy: Option<StrategyParams>,
    #[serde(default)]
    pub classification_scores: [f64; 3],
}

impl Default for ColdStartState {
    fn default() -> Self {
        Self {
            phase: ColdStartPhase::Classify,
            user_type: None,
            probe_index: 0,
            update_count: 0,
            settled_strategy: None,
            classification_scores: [0.0; 3],
        }
    }
}

/// Additional word count suggested by the similarity predictor, with the
/// confidence backing it. Sub-0.5 confidence recommendations are ignored by the
/// target-count rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRecommendation {
    pub additional: i32,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyParams {
    pub interval_scale: f64,
    pub new_ratio: f64,
    pub difficulty: DifficultyLevel,
    pub batch_size: i32,
    pub hint_level: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<CountRecommendation>,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            interval_scale: 1.0,
            new_ratio: 0.2,
            difficulty: DifficultyLevel::Mid,
            batch_size: 8,
            hint_level: 1,
            recommendation: None,
        }
    }
}

impl StrategyParams {
    pub fn for_user_type(user_type: UserType) -> Self {
        match user_type {
            UserType::Fast => Self {
                interval_scale: 0.8,
                new_ratio: 0.3,
                difficulty: DifficultyLevel::Hard,
                batch_size: 12,
                hint_level: 0,
                recommendation: None,
            },
            UserType::Stable => Self::default(),
            UserType::Cautious => Self {
                interval_scale: 1.2,
                new_ratio: 0.1,
                difficulty: DifficultyLevel::Easy,
                batch_size: 5,
                hint_level: 2,
                recommendation: None,
            },
        }
    }

    /// Stable textual key for algorithm statistics. Keys compare
    /// lexicographically, which is how score ties are broken.
    pub fn key(&self) -> String {
        format!(
            "{}-b{:02}-n{:.2}-i{:.2}-h{}",
            self.difficulty.as_str(),
            self.batch_size,
            self.new_ratio,
            self.interval_scale,
            self.hint_level
        )
    }
}

/// One raw interaction event as emitted by the study client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub is_correct: bool,
    pub response_time_ms: i64,
    pub hint_count: i32,
    pub retry_count: i32,
    pub pause_count: i32,
    pub switch_count: i32,
    pub dwell_time_ms: Option<i64>,
    pub focus_loss_ms: Option<i64>,
    pub interaction_density: Option<f64>,
    pub word_id: Option<String>,
    pub question_type: Option<String>,
    pub device_type: Option<String>,
    pub timestamp_ms: i64,
    #[serde(default)]
    pub is_quit: bool,
}

impl Default for InteractionEvent {
    fn default() -> Self {
        Self {
            is_correct: true,
            response_time_ms: 3000,
            hint_count: 0,
            retry_count: 0,
            pause_count: 0,
            switch_count: 0,
            dwell_time_ms: None,
            focus_loss_ms: None,
            interaction_density: None,
            word_id: None,
            question_type: None,
            device_type: None,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            is_quit: false,
        }
    }
}

impl InteractionEvent {
    /// Clamps malformed telemetry at the boundary. Logs once per offending
    /// field and proceeds; malformed input never aborts a cycle.
    pub fn sanitized(mut self) -> Self {
        if self.response_time_ms < 0 {
            tracing::debug!(value = self.response_time_ms, "negative responseTimeMs clamped");
            self.response_time_ms = 0;
        }
        if self.hint_count < 0 {
            tracing::debug!(value = self.hint_count, "negative hintCount clamped");
            self.hint_count = 0;
        }
        if self.retry_count < 0 {
            self.retry_count = 0;
        }
        if self.pause_count < 0 {
            self.pause_count = 0;
        }
        if self.switch_count < 0 {
            self.switch_count = 0;
        }
        if let Some(d) = self.dwell_time_ms {
            if d < 0 {
                self.dwell_time_ms = Some(0);
            }
        }
        if let Some(f) = self.focus_loss_ms {
            if f < 0 {
                self.focus_loss_ms = Some(0);
            }
        }
        if let Some(density) = self.interaction_density {
            if !(0.0..=1.0).contains(&density) {
                tracing::debug!(value = density, "interactionDensity clamped to [0,1]");
                self.interaction_density = Some(density.clamp(0.0, 1.0));
            }
        }
        self
    }
}

/// Optional biometric fatigue sample shipped alongside an event.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BiometricSample {
    pub score: f64,
    pub confidence: f64,
    pub timestamp_ms: i64,
}

/// Side-channel inputs for one decision cycle. Everything here is optional;
/// absence degrades to neutral behavior.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    pub current_strategy: Option<StrategyParams>,
    /// The user's configured daily word target.
    pub daily_target: Option<i32>,
    /// Reviews completed so far today, for the burden-based retention target.
    #[serde(default)]
    pub reviews_today: Option<i32>,
    /// Planned study time for today in minutes.
    #[serde(default)]
    pub planned_study_minutes: Option<f64>,
    pub recent_accuracy: Option<f64>,
    pub rt_cv: Option<f64>,
    pub pace_cv: Option<f64>,
    pub session_id: Option<String>,
    pub study_duration_minutes: Option<f64>,
    pub break_minutes: Option<f64>,
    pub total_sessions: Option<u32>,
    pub biometric: Option<BiometricSample>,
    /// Memory trace for the reviewed word, if it has one.
    pub word_trace: Option<crate::memory::MemoryTrace>,
    /// Prior review outcomes for the reviewed word (multi-scale trace input).
    pub review_history: Option<Vec<crate::memory::ReviewSample>>,
    #[serde(default)]
    pub morphemes: Option<Vec<crate::lexical::MorphemeMastery>>,
    #[serde(default)]
    pub confusables: Option<Vec<crate::lexical::ConfusablePair>>,
    #[serde(default)]
    pub recent_word_ids: Option<Vec<String>>,
    #[serde(default)]
    pub study_contexts: Option<Vec<crate::lexical::StudyContext>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub values: Vec<f64>,
    pub labels: Vec<String>,
    pub ts: i64,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>, labels: Vec<String>) -> Self {
        Self {
            values,
            labels,
            ts: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionFactor {
    pub name: String,
    pub value: f64,
    pub impact: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DecisionExplanation {
    pub factors: Vec<DecisionFactor>,
    pub changes: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub value: f64,
    pub reason: String,
    pub ts: i64,
}

impl Reward {
    pub fn new(value: f64, reason: impl Into<String>) -> Self {
        Self {
            value,
            reason: reason.into(),
            ts: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Per-word outcome of a cycle, consumed by review scheduling.
///
/// The `umm*` aliases accept snapshots written during the key migration; the
/// camelCase names are the only ones ever written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDecision {
    pub word_id: String,
    pub retrievability: f64,
    pub recommended_interval_days: f64,
    pub is_mastered: bool,
    pub mastery_score: f64,
    pub mastery_threshold: f64,
    pub confidence: f64,
    pub quality: f64,
    #[serde(alias = "ummStrength")]
    pub strength: f64,
    #[serde(alias = "ummConsolidation")]
    pub consolidation: f64,
    #[serde(alias = "ummLastReviewTs")]
    pub last_review_ms: i64,
}

/// Full result surfaced to the study-batch assembler after one cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleResult {
    pub state: LearnerState,
    pub strategy: StrategyParams,
    /// Resolved target word count (user setting, recommendation and cap applied).
    pub target_count: i32,
    pub dynamic_cap: i32,
    pub reward: Reward,
    pub explanation: DecisionExplanation,
    pub feature_vector: Option<FeatureVector>,
    pub word_decision: Option<WordDecision>,
    pub cold_start_phase: Option<ColdStartPhase>,
}

/// Aggregate persisted per user: the state row plus all model snapshots.
/// Saved and loaded as one unit; the store writes it in a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLearnerState {
    pub user_id: String,
    pub state: LearnerState,
    pub current_strategy: StrategyParams,
    pub cold_start: Option<ColdStartState>,
    pub interaction_count: i32,
    pub last_updated: i64,
    #[serde(default)]
    pub mastery_history: Option<crate::memory::MasteryHistory>,
    #[serde(default)]
    pub ensemble_performance: Option<crate::decision::ensemble::PerformanceTracker>,
    #[serde(default)]
    pub algorithm_states: Option<serde_json::Value>,
}

impl PersistedLearnerState {
    pub fn initial(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            state: LearnerState::default(),
            current_strategy: StrategyParams::default(),
            cold_start: Some(ColdStartState::default()),
            interaction_count: 0,
            last_updated: chrono::Utc::now().timestamp_millis(),
            mastery_history: None,
            ensemble_performance: None,
            algorithm_states: None,
        }
    }
}
