//! Decision layer: strategy exploration, prediction, the ensemble blend and
//! study-volume capacity.

pub mod bandit;
pub mod capacity;
pub mod coldstart;
pub mod ensemble;
pub mod heuristic;
pub mod infogain;
pub mod similarity;

pub use bandit::ThompsonBaseline;
pub use capacity::{dynamic_cap, resolve_target_count, MIN_CAP};
pub use coldstart::ColdStartManager;
pub use ensemble::{
    DecisionCandidate, PerformanceTracker, SessionInfo, SourceProposal, StrategyEnsemble,
};
pub use heuristic::HeuristicAdvisor;
pub use infogain::{InfoGainExplorer, StrategyStats};
pub use similarity::SimilarityPredictor;
