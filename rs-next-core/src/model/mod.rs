//! Next-symbol prediction models.
//!
//! Every model learns incrementally from one symbol at a time and ranks
//! candidates for the symbol that follows a context:
//! - Frequency ranking (`FrequencyModel`)
//! - Bigram and trigram tables with fallback ranking (`NGramModel`)
//! - Decaying association weights (`AdaptiveWeightModel`)
//! - Eligibility-aware recency/frequency hybrid (`EligibilityFrequencyModel`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::AdaptiveSettings;
use crate::error::{PredictError, PredictResult};

/// Decay-based learner over a growing square weight matrix.
pub mod adaptive_model;

/// Ranking of all known symbols, filtered by a caller-supplied predicate.
pub mod eligibility_model;

/// Context-free ranking by occurrence count.
pub mod frequency_model;

/// Order-1 and order-2 gram tables indexed by context.
pub mod ngram_model;

/// Append-only symbol/index mapping.
pub mod vocabulary;

/// Flat, restrided storage for the adaptive model.
mod weight_matrix;

pub use adaptive_model::AdaptiveWeightModel;
pub use eligibility_model::{EligibilityFrequencyModel, RankedSymbol, Ranking};
pub use frequency_model::FrequencyModel;
pub use ngram_model::NGramModel;
pub use vocabulary::Vocabulary;

/// Capability shared by all models.
///
/// One owner drives a model: `update` once per observed symbol, `predict`
/// as often as needed. Neither performs I/O and neither can fail.
pub trait PredictionModel {
	/// Learns from the next symbol of the sequence.
	fn update(&mut self, symbol: &str);

	/// Returns at most `n` symbols likely to follow `context`, best first.
	///
	/// Unknown contexts are not an error: each model documents its fallback.
	/// Fewer than `n` symbols are returned when fewer are available.
	fn predict(&self, context: &str, n: usize) -> Vec<String>;

	/// Human-readable model name.
	fn name(&self) -> &str;
}

/// The model variants, used to build models from names or settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
	Frequency,
	Bigram,
	Trigram,
	Adaptive,
	Eligibility,
}

impl ModelKind {
	pub const ALL: [ModelKind; 5] = [
		ModelKind::Adaptive,
		ModelKind::Frequency,
		ModelKind::Bigram,
		ModelKind::Trigram,
		ModelKind::Eligibility,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			ModelKind::Frequency => "frequency",
			ModelKind::Bigram => "bigram",
			ModelKind::Trigram => "trigram",
			ModelKind::Adaptive => "adaptive",
			ModelKind::Eligibility => "eligibility",
		}
	}

	/// Builds an empty model of this kind.
	///
	/// # Errors
	/// Only the adaptive model can fail, on invalid `adaptive` settings.
	pub fn build(&self, adaptive: &AdaptiveSettings) -> PredictResult<Box<dyn PredictionModel + Send>> {
		Ok(match self {
			ModelKind::Frequency => Box::new(FrequencyModel::new()),
			ModelKind::Bigram => Box::new(NGramModel::bigram()),
			ModelKind::Trigram => Box::new(NGramModel::trigram()),
			ModelKind::Adaptive => {
				Box::new(AdaptiveWeightModel::new(adaptive.decay_rate, adaptive.initial_weight)?)
			}
			ModelKind::Eligibility => Box::new(EligibilityFrequencyModel::new()),
		})
	}
}

impl fmt::Display for ModelKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ModelKind {
	type Err = PredictError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ModelKind::ALL
			.into_iter()
			.find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| PredictError::UnknownModel(s.to_owned()))
	}
}
