//! Next-action prediction library.
//!
//! This crate predicts the next symbol of an open-vocabulary event sequence
//! (shell commands, application actions, ...) and measures how often the
//! true next symbol lands in the top-N predictions:
//! - Incremental prediction models behind one `PredictionModel` trait
//! - An evaluation harness with top-N and decay-rate sweeps
//! - History loading with binary snapshots
//! - TOML configuration
//!
//! Symbols are opaque tokens; tokenizing raw logs is up to the caller.

/// Settings for history, models, evaluation and the service.
pub mod config;

/// Crate-wide error type.
pub mod error;

/// Replays held-out sequences against models and reports hit rates.
pub mod evaluation;

/// History files, snapshots and path helpers.
pub mod io;

/// Prediction models and the shared model capability.
pub mod model;

pub use config::Settings;
pub use error::{PredictError, PredictResult};
pub use evaluation::{Evaluation, Harness};
pub use model::{ModelKind, PredictionModel};
