use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PredictError, PredictResult};
use crate::model::adaptive_model::{DEFAULT_DECAY_RATE, DEFAULT_INITIAL_WEIGHT};
use crate::model::ModelKind;

/// Complete configuration, one section per concern.
///
/// Every section falls back to its defaults, so an empty TOML document is
/// a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub history: HistorySettings,
	pub adaptive: AdaptiveSettings,
	pub evaluation: EvaluationSettings,
	pub server: ServerSettings,
}

/// Where the symbol stream comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
	/// Text history, one symbol per line.
	pub path: PathBuf,
	/// Read and write a binary snapshot next to the text file.
	pub cache: bool,
}

impl Default for HistorySettings {
	fn default() -> Self {
		Self {
			path: PathBuf::from("data/history.txt"),
			cache: true,
		}
	}
}

/// Parameters of the adaptive weight model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveSettings {
	/// Fraction of a weight kept per update, strictly between 0 and 1.
	pub decay_rate: f64,
	/// Weight of the cells of a newly created row.
	pub initial_weight: f64,
}

impl Default for AdaptiveSettings {
	fn default() -> Self {
		Self {
			decay_rate: DEFAULT_DECAY_RATE,
			initial_weight: DEFAULT_INITIAL_WEIGHT,
		}
	}
}

/// Evaluation protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
	/// Share of the history used for training, the rest is held out.
	pub train_ratio: f64,
	/// Top-N cut-offs to sweep.
	pub top_n: Vec<usize>,
	/// Decay rates to sweep for the adaptive model.
	pub decay_rates: Vec<f64>,
	/// Share of distinct symbols counted as "most frequent".
	pub frequent_fraction: f64,
	/// Share of distinct symbols (from the top) excluded from "least frequent".
	pub rare_fraction: f64,
	/// Keep learning from the held-out sequence while scoring it.
	pub online: bool,
}

impl Default for EvaluationSettings {
	fn default() -> Self {
		Self {
			train_ratio: 0.5,
			top_n: (1..=8).collect(),
			decay_rates: vec![0.5, 0.6, 0.7, 0.8, 0.9],
			frequent_fraction: 0.1,
			rare_fraction: 0.5,
			online: false,
		}
	}
}

/// Prediction service binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
	pub host: String,
	pub port: u16,
	/// Directory holding `.txt` histories the service can train from.
	pub data_dir: PathBuf,
	/// Model answering `/v1/predict` requests that do not name one.
	pub default_model: ModelKind,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			data_dir: PathBuf::from("./data"),
			default_model: ModelKind::Adaptive,
		}
	}
}

impl Settings {
	/// Parses settings from a TOML document and validates them.
	pub fn from_toml(document: &str) -> PredictResult<Self> {
		let settings: Settings = toml::from_str(document)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Reads settings from a TOML file.
	///
	/// # Errors
	/// A missing file is an I/O error; callers wanting defaults check first.
	pub fn load<P: AsRef<Path>>(path: P) -> PredictResult<Self> {
		let document = std::fs::read_to_string(path.as_ref())?;
		tracing::debug!(path = %path.as_ref().display(), "settings loaded");
		Self::from_toml(&document)
	}

	/// Checks value ranges that the types cannot express.
	pub fn validate(&self) -> PredictResult<()> {
		let adaptive = &self.adaptive;
		if !(adaptive.decay_rate > 0.0 && adaptive.decay_rate < 1.0) {
			return Err(PredictError::InvalidDecayRate(adaptive.decay_rate));
		}
		if !adaptive.initial_weight.is_finite() || adaptive.initial_weight < 0.0 {
			return Err(PredictError::InvalidInitialWeight(adaptive.initial_weight));
		}

		let evaluation = &self.evaluation;
		for (name, value) in [
			("train_ratio", evaluation.train_ratio),
			("frequent_fraction", evaluation.frequent_fraction),
			("rare_fraction", evaluation.rare_fraction),
		] {
			if !(0.0..=1.0).contains(&value) {
				return Err(PredictError::invalid(format!("{name} must be between 0.0 and 1.0, got {value}")));
			}
		}
		if evaluation.top_n.contains(&0) {
			return Err(PredictError::invalid("top_n values must be at least 1"));
		}
		if let Some(rate) = evaluation.decay_rates.iter().find(|rate| !(**rate > 0.0 && **rate < 1.0)) {
			return Err(PredictError::InvalidDecayRate(*rate));
		}
		Ok(())
	}
}
