use thiserror::Error;

/// Errors raised by model construction, evaluation, history I/O and
/// configuration loading.
///
/// `update` and `predict` never fail: unknown contexts and oversized
/// top-N requests degrade to documented rankings instead.
#[derive(Error, Debug)]
pub enum PredictError {
	/// No `(context, next)` pair was scored, so no hit rate exists.
	#[error("Evaluation set is empty: no pair was scored")]
	EmptyEvaluationSet,

	#[error("Decay rate must be strictly between 0.0 and 1.0, got {0}")]
	InvalidDecayRate(f64),

	#[error("Initial weight must be finite and non-negative, got {0}")]
	InvalidInitialWeight(f64),

	#[error("N-gram order must be 1 or 2, got {0}")]
	InvalidOrder(usize),

	#[error("Invalid parameter: {0}")]
	InvalidParameter(String),

	#[error("Unknown model: {0}")]
	UnknownModel(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] postcard::Error),

	#[error("Configuration error: {0}")]
	Config(#[from] toml::de::Error),
}

/// Result type for prediction operations.
pub type PredictResult<T> = Result<T, PredictError>;

impl PredictError {
	/// Create an invalid parameter error
	pub fn invalid(msg: impl Into<String>) -> Self {
		Self::InvalidParameter(msg.into())
	}
}
