//! SQLite-backed persistence for learner state, algorithm snapshots and
//! per-word memory traces.
//!
//! `save_state` writes the state row, every algorithm snapshot and any dirty
//! word traces in one transaction: a failure at any sub-step leaves storage
//! exactly as it was. Algorithm snapshots carry a version that is bumped only
//! when the serialized parameters actually change.

pub mod store;

pub use store::{StateStore, CURRENT_SCHEMA_VERSION};
