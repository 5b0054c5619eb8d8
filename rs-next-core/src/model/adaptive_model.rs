use crate::error::{PredictError, PredictResult};
use super::vocabulary::Vocabulary;
use super::weight_matrix::{row_min, WeightMatrix};
use super::PredictionModel;

pub const DEFAULT_DECAY_RATE: f64 = 0.8;
pub const DEFAULT_INITIAL_WEIGHT: f64 = 1.0;

/// On-line learner of symbol-to-symbol affinities with exponential decay.
///
/// Each observed transition `p -> c` decays row `p` by `alpha` and adds
/// `1 - alpha` to `weight[p][c]`. A default row receives every update
/// regardless of source and answers for contexts never seen as a source.
///
/// # Invariants
/// - The matrix and the default row are `|vocabulary|` wide after every update
/// - Weights stay non-negative (`0 < alpha < 1`, `initial_weight >= 0`)
#[derive(Clone, Debug)]
pub struct AdaptiveWeightModel {
	/// Fraction of every weight kept per update of its row.
	decay_rate: f64,

	/// Weight of every cell in a row created for a new symbol.
	initial_weight: f64,

	vocabulary: Vocabulary,
	weights: WeightMatrix,

	/// Fallback row, decayed and reinforced with every transition.
	default_row: Vec<f64>,

	/// Index of the last observed symbol.
	previous: Option<usize>,
}

impl AdaptiveWeightModel {
	/// Creates an empty model.
	///
	/// # Errors
	/// - `decay_rate` must lie strictly between 0.0 and 1.0
	/// - `initial_weight` must be finite and non-negative
	pub fn new(decay_rate: f64, initial_weight: f64) -> PredictResult<Self> {
		if !(decay_rate > 0.0 && decay_rate < 1.0) {
			return Err(PredictError::InvalidDecayRate(decay_rate));
		}
		if !initial_weight.is_finite() || initial_weight < 0.0 {
			return Err(PredictError::InvalidInitialWeight(initial_weight));
		}
		tracing::debug!(decay_rate, initial_weight, "adaptive model created");
		Ok(Self {
			decay_rate,
			initial_weight,
			vocabulary: Vocabulary::new(),
			weights: WeightMatrix::new(),
			default_row: Vec::new(),
			previous: None,
		})
	}

	pub fn decay_rate(&self) -> f64 {
		self.decay_rate
	}

	pub fn initial_weight(&self) -> f64 {
		self.initial_weight
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	/// Outgoing weights of `symbol`, indexed like the vocabulary.
	pub fn weights(&self, symbol: &str) -> Option<&[f64]> {
		self.vocabulary.get(symbol).map(|index| self.weights.row(index))
	}

	pub fn default_weights(&self) -> &[f64] {
		&self.default_row
	}

	/// Registers a symbol, growing the matrix and the default row.
	///
	/// The default row starts at `[initial_weight]`, then follows the
	/// min-of-row rule like every other row.
	fn register(&mut self, symbol: &str) -> usize {
		let known = self.vocabulary.len();
		let index = self.vocabulary.index_of(symbol);
		if index == known {
			self.weights.grow(self.initial_weight);
			let floor = if self.default_row.is_empty() {
				self.initial_weight
			} else {
				row_min(&self.default_row)
			};
			self.default_row.push(floor);
		}
		index
	}
}

impl PredictionModel for AdaptiveWeightModel {
	/// Learns the transition from the previous symbol to `symbol`.
	///
	/// The very first observation only registers the symbol.
	fn update(&mut self, symbol: &str) {
		let current = self.register(symbol);

		let Some(previous) = self.previous.replace(current) else {
			return;
		};

		let alpha = self.decay_rate;
		let row = self.weights.row_mut(previous);
		row.iter_mut().for_each(|weight| *weight *= alpha);
		row[current] += 1.0 - alpha;

		self.default_row.iter_mut().for_each(|weight| *weight *= alpha);
		self.default_row[current] += 1.0 - alpha;
	}

	/// Ranks columns of the context row by weight, descending.
	///
	/// Equal weights keep column order, i.e. the order symbols entered the
	/// vocabulary. An unknown context uses the default row. At most `n`
	/// symbols are returned (fewer when the vocabulary is smaller).
	fn predict(&self, context: &str, n: usize) -> Vec<String> {
		let row = match self.vocabulary.get(context) {
			Some(index) => self.weights.row(index),
			None => self.default_row.as_slice(),
		};

		let mut columns: Vec<usize> = (0..row.len()).collect();
		// Stable: ties stay in ascending column order
		columns.sort_by(|a, b| row[*b].total_cmp(&row[*a]));

		columns
			.into_iter()
			.take(n)
			.filter_map(|column| self.vocabulary.symbol(column).map(str::to_owned))
			.collect()
	}

	fn name(&self) -> &str {
		"Ideal On-line Learning Algorithm"
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const EPSILON: f64 = 1e-12;

	fn trained(symbols: &[&str]) -> AdaptiveWeightModel {
		let mut model = AdaptiveWeightModel::new(DEFAULT_DECAY_RATE, DEFAULT_INITIAL_WEIGHT).unwrap();
		for symbol in symbols {
			model.update(symbol);
		}
		model
	}

	fn assert_close(actual: &[f64], expected: &[f64]) {
		assert_eq!(actual.len(), expected.len());
		for (a, e) in actual.iter().zip(expected) {
			assert!((a - e).abs() < EPSILON, "{actual:?} != {expected:?}");
		}
	}

	#[test]
	fn validates_parameters() {
		assert!(matches!(AdaptiveWeightModel::new(0.0, 1.0), Err(PredictError::InvalidDecayRate(_))));
		assert!(matches!(AdaptiveWeightModel::new(1.0, 1.0), Err(PredictError::InvalidDecayRate(_))));
		assert!(matches!(AdaptiveWeightModel::new(f64::NAN, 1.0), Err(PredictError::InvalidDecayRate(_))));
		assert!(matches!(AdaptiveWeightModel::new(0.5, -1.0), Err(PredictError::InvalidInitialWeight(_))));
		assert!(matches!(AdaptiveWeightModel::new(0.5, f64::INFINITY), Err(PredictError::InvalidInitialWeight(_))));
	}

	#[test]
	fn first_observation_only_registers() {
		let model = trained(&["a"]);
		assert_close(model.weights("a").unwrap(), &[1.0]);
		assert_close(model.default_weights(), &[1.0]);
	}

	#[test]
	fn transitions_decay_and_reinforce() {
		let model = trained(&["a", "b"]);
		// "b" appended column min 1.0 to row a, then row a decayed and reinforced
		assert_close(model.weights("a").unwrap(), &[0.8, 1.0]);
		assert_close(model.weights("b").unwrap(), &[1.0, 1.0]);
		assert_close(model.default_weights(), &[0.8, 1.0]);

		let model = trained(&["a", "b", "a", "c"]);
		// "c" appends each row's minimum before a -> c is learned
		assert_close(model.weights("a").unwrap(), &[0.64, 0.8, 0.84]);
		assert_close(model.weights("b").unwrap(), &[1.0, 0.8, 0.8]);
		assert_close(model.weights("c").unwrap(), &[1.0, 1.0, 1.0]);
	}

	#[test]
	fn predicts_strongest_affinity_first() {
		let model = trained(&["a", "b", "a", "c"]);
		assert_eq!(model.predict("a", 3), vec!["c", "b", "a"]);
		// Row b is [1.0, 0.8, 0.8]: tie between b and c keeps column order
		assert_eq!(model.predict("b", 3), vec!["a", "b", "c"]);
	}

	#[test]
	fn unknown_context_uses_default_row() {
		let model = trained(&["a", "b", "b"]);
		let default = model.default_weights().to_vec();
		assert!(default[1] > default[0]);
		assert_eq!(model.predict("never_seen", 2), vec!["b", "a"]);
		assert!(trained(&[]).predict("x", 3).is_empty());
	}

	#[test]
	fn oversized_requests_are_clamped() {
		let model = trained(&["a", "b", "c"]);
		assert_eq!(model.predict("a", 10).len(), 3);
		assert!(model.predict("a", 0).is_empty());
	}
}
