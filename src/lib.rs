pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod lexical;
pub mod logging;
pub mod memory;
pub mod modeling;
pub mod persistence;
pub mod types;

pub use engine::AdaptiveEngine;
pub use error::EngineError;
