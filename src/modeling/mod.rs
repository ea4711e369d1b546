//! User-state modeling: attention, fatigue, motivation, cognitive profile
//! and progress trend.

pub mod attention;
pub mod cognitive;
pub mod fatigue;
pub mod kalman;
pub mod motivation;
pub mod trend;

pub use attention::{AttentionMonitor, AttentionSignals};
pub use cognitive::{CognitiveObservation, CognitiveProfiler};
pub use fatigue::{fuse_fatigue, FatigueEstimator, FatigueSignals};
pub use kalman::{
    KalmanConfig, KalmanProfiler, KalmanProfileState, ProfileEstimate, ProfileObservation,
};
pub use motivation::{MotivationEvent, MotivationTracker};
pub use trend::TrendAnalyzer;
