use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::thread;

use crate::error::{PredictError, PredictResult};
use crate::model::{AdaptiveWeightModel, PredictionModel};

/// Outcome of replaying a sequence against a model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Evaluation {
	/// Pairs whose next symbol was among the predictions.
	pub successes: usize,
	/// Pairs whose next symbol was missed.
	pub failures: usize,
}

impl Evaluation {
	/// Number of scored pairs.
	pub fn total(&self) -> usize {
		self.successes + self.failures
	}

	/// `successes / (successes + failures)`, in [0, 1].
	///
	/// # Errors
	/// `EmptyEvaluationSet` when no pair was scored.
	pub fn hit_rate(&self) -> PredictResult<f64> {
		match self.total() {
			0 => Err(PredictError::EmptyEvaluationSet),
			total => Ok(self.successes as f64 / total as f64),
		}
	}
}

/// Replays held-out sequences pairwise: for each `(context, next)` the model
/// predicts `top_n` symbols after `context` and scores a hit if `next` is
/// among them.
///
/// # Parameters
/// - `top_n`: number of predictions that count
/// - `restrict_to`: when set, only pairs whose context is in the set are
///   scored. An empty set scores nothing.
#[derive(Clone, Debug)]
pub struct Harness {
	pub top_n: usize,
	pub restrict_to: Option<HashSet<String>>,
}

impl Harness {
	pub fn new(top_n: usize) -> Self {
		Self { top_n, restrict_to: None }
	}

	/// Scores only pairs whose context is in `contexts`.
	pub fn restricted_to(mut self, contexts: HashSet<String>) -> Self {
		self.restrict_to = Some(contexts);
		self
	}

	/// Scores `sequence` against a model that stays as trained.
	pub fn score<M: PredictionModel + ?Sized>(&self, model: &M, sequence: &[String]) -> Evaluation {
		let mut evaluation = Evaluation::default();
		for pair in sequence.windows(2) {
			self.score_pair(model, &pair[0], &pair[1], &mut evaluation);
		}
		evaluation
	}

	/// Scores `sequence` while the model keeps learning from it.
	///
	/// The first symbol is observed before scoring starts, then every `next`
	/// is observed right after its pair was scored. Skipped pairs are still
	/// learned from.
	pub fn score_online<M: PredictionModel + ?Sized>(&self, model: &mut M, sequence: &[String]) -> Evaluation {
		let mut evaluation = Evaluation::default();
		if let Some(first) = sequence.first() {
			model.update(first);
		}
		for pair in sequence.windows(2) {
			self.score_pair(model, &pair[0], &pair[1], &mut evaluation);
			model.update(&pair[1]);
		}
		evaluation
	}

	/// Hit rate of `score`.
	pub fn evaluate<M: PredictionModel + ?Sized>(&self, model: &M, sequence: &[String]) -> PredictResult<f64> {
		let evaluation = self.score(model, sequence);
		tracing::debug!(
			model = model.name(),
			top_n = self.top_n,
			successes = evaluation.successes,
			failures = evaluation.failures,
			"evaluated"
		);
		evaluation.hit_rate()
	}

	/// Hit rate of `score_online`.
	pub fn evaluate_online<M: PredictionModel + ?Sized>(&self, model: &mut M, sequence: &[String]) -> PredictResult<f64> {
		self.score_online(model, sequence).hit_rate()
	}

	fn score_pair<M: PredictionModel + ?Sized>(&self, model: &M, context: &str, next: &str, evaluation: &mut Evaluation) {
		if let Some(contexts) = &self.restrict_to {
			if !contexts.contains(context) {
				return;
			}
		}
		if model.predict(context, self.top_n).iter().any(|symbol| symbol == next) {
			evaluation.successes += 1;
		} else {
			evaluation.failures += 1;
		}
	}
}

/// Hit rate for each top-N cut-off, in the given order.
pub fn sweep_top_n<M: PredictionModel + ?Sized>(
	model: &M,
	sequence: &[String],
	top_n: &[usize],
	restrict_to: Option<&HashSet<String>>,
) -> PredictResult<Vec<(usize, f64)>> {
	top_n
		.iter()
		.map(|n| {
			let harness = Harness { top_n: *n, restrict_to: restrict_to.cloned() };
			harness.evaluate(model, sequence).map(|rate| (*n, rate))
		})
		.collect()
}

/// Top-N curve of one adaptive model.
#[derive(Clone, Debug, PartialEq)]
pub struct DecayCurve {
	pub decay_rate: f64,
	pub hit_rates: Vec<(usize, f64)>,
}

/// Trains one adaptive model per decay rate on `train`, then sweeps the
/// top-N cut-offs over `held_out`.
///
/// # Behavior
/// - Decay rates are split into chunks, one worker thread per chunk
///   (at most one per CPU).
/// - Workers send their curves back over an MPSC channel.
/// - Curves are returned in the order the rates were given.
///
/// # Errors
/// The first invalid decay rate, or `EmptyEvaluationSet`.
pub fn sweep_decay_rates(
	train: &[String],
	held_out: &[String],
	decay_rates: &[f64],
	top_n: &[usize],
	initial_weight: f64,
	restrict_to: Option<&HashSet<String>>,
) -> PredictResult<Vec<DecayCurve>> {
	if decay_rates.is_empty() {
		return Ok(Vec::new());
	}

	let workers = num_cpus::get().clamp(1, decay_rates.len());
	let chunk_size = decay_rates.len().div_ceil(workers);
	let indexed: Vec<(usize, f64)> = decay_rates.iter().copied().enumerate().collect();

	let (tx, rx) = mpsc::channel();
	thread::scope(|scope| {
		for chunk in indexed.chunks(chunk_size) {
			let tx = tx.clone();
			scope.spawn(move || {
				for &(index, decay_rate) in chunk {
					let curve = train_and_sweep(train, held_out, decay_rate, top_n, initial_weight, restrict_to);
					// The receiver outlives the scope
					let _ = tx.send((index, curve));
				}
			});
		}
	});
	drop(tx);

	let mut curves: Vec<(usize, PredictResult<DecayCurve>)> = rx.iter().collect();
	curves.sort_by_key(|(index, _)| *index);
	tracing::info!(rates = curves.len(), workers, "decay rate sweep finished");

	curves.into_iter().map(|(_, curve)| curve).collect()
}

fn train_and_sweep(
	train: &[String],
	held_out: &[String],
	decay_rate: f64,
	top_n: &[usize],
	initial_weight: f64,
	restrict_to: Option<&HashSet<String>>,
) -> PredictResult<DecayCurve> {
	let mut model = AdaptiveWeightModel::new(decay_rate, initial_weight)?;
	for symbol in train {
		model.update(symbol);
	}
	let hit_rates = sweep_top_n(&model, held_out, top_n, restrict_to)?;
	Ok(DecayCurve { decay_rate, hit_rates })
}

/// Splits a sequence into a training prefix and a held-out suffix.
///
/// The prefix holds `round(len * train_ratio)` symbols (ties to even).
pub fn split_train_eval(sequence: &[String], train_ratio: f64) -> PredictResult<(&[String], &[String])> {
	if !(0.0..=1.0).contains(&train_ratio) {
		return Err(PredictError::invalid(format!("train_ratio must be between 0.0 and 1.0, got {train_ratio}")));
	}
	let cut = (sequence.len() as f64 * train_ratio).round_ties_even() as usize;
	Ok(sequence.split_at(cut.min(sequence.len())))
}

/// Symbol counts, most common first; ties keep first appearance order.
pub fn symbol_counts(sequence: &[String]) -> Vec<(String, usize)> {
	ranked_counts(sequence.iter().cloned())
}

/// Counts of consecutive pairs, most common first; ties keep first
/// appearance order.
pub fn pair_counts(sequence: &[String]) -> Vec<((String, String), usize)> {
	ranked_counts(sequence.windows(2).map(|pair| (pair[0].clone(), pair[1].clone())))
}

/// The `round(distinct * fraction)` most common symbols.
pub fn most_frequent(sequence: &[String], fraction: f64) -> HashSet<String> {
	let counts = symbol_counts(sequence);
	let keep = share(counts.len(), fraction);
	counts.into_iter().take(keep).map(|(symbol, _)| symbol).collect()
}

/// The rarest symbols: all but the `round(distinct * fraction) + 1` most
/// common ones (empty when that exceeds the number of distinct symbols).
pub fn least_frequent(sequence: &[String], fraction: f64) -> HashSet<String> {
	let counts = symbol_counts(sequence);
	let skip = share(counts.len(), fraction) + 1;
	counts.into_iter().skip(skip).map(|(symbol, _)| symbol).collect()
}

fn share(distinct: usize, fraction: f64) -> usize {
	((distinct as f64 * fraction.clamp(0.0, 1.0)).round_ties_even() as usize).min(distinct)
}

fn ranked_counts<T, I>(items: I) -> Vec<(T, usize)>
where
	T: std::hash::Hash + Eq + Clone,
	I: IntoIterator<Item = T>,
{
	let mut order: Vec<T> = Vec::new();
	let mut counts: HashMap<T, usize> = HashMap::new();
	for item in items {
		let count = counts.entry(item.clone()).or_insert_with(|| {
			order.push(item.clone());
			0
		});
		*count += 1;
	}

	let mut ranked: Vec<(T, usize)> = order
		.into_iter()
		.map(|item| {
			let count = counts.get(&item).copied().unwrap_or(0);
			(item, count)
		})
		.collect();
	// Stable: ties keep first appearance order
	ranked.sort_by(|a, b| b.1.cmp(&a.1));
	ranked
}
