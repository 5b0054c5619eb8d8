use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::{PredictError, PredictResult};
use super::PredictionModel;

/// Placeholder written into gram keys for context slots that precede the
/// first observations.
pub const EMPTY_CONTEXT: &str = "";

/// Context symbols followed by the observed symbol.
type GramKey = Vec<String>;

/// Bucket identifier of the context index.
///
/// `None` marks a slot with no history yet. Those buckets are registered
/// but can never be reached by a lookup with a real symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum ContextKey {
	Single(Option<String>),
	Pair(Option<String>, Option<String>),
}

/// N-gram model over symbol sequences, of order 1 (bigram) or 2 (trigram).
///
/// # Responsibilities
/// - Count gram keys (context window + observed symbol)
/// - Index gram keys by their context so lookups avoid scanning the table
/// - Rank candidates for a context, falling back on the whole table
///
/// # Invariants
/// - `order` is 1 or 2 and `window.len() == order`
/// - Every gram key has `order + 1` components and a count >= 1
/// - Every gram key is registered in the bucket of its immediate predecessor
#[derive(Clone, Debug)]
pub struct NGramModel {
	/// Number of context symbols per gram key.
	order: usize,

	/// Last `order` symbols seen, oldest first.
	window: Vec<Option<String>>,

	/// Occurrence count per gram key.
	grams: HashMap<GramKey, usize>,

	/// Gram keys sharing a context.
	related: HashMap<ContextKey, HashSet<GramKey>>,
}

impl NGramModel {
	/// Creates a new n-gram model conditioning on `order` previous symbols.
	///
	/// # Errors
	/// Returns an error if `order` is not 1 or 2.
	pub fn new(order: usize) -> PredictResult<Self> {
		if !(1..=2).contains(&order) {
			return Err(PredictError::InvalidOrder(order));
		}
		Ok(Self::with_order(order))
	}

	/// Order-1 model.
	pub fn bigram() -> Self {
		Self::with_order(1)
	}

	/// Order-2 model.
	pub fn trigram() -> Self {
		Self::with_order(2)
	}

	/// Sets up an empty table whose window holds `order` slots.
	fn with_order(order: usize) -> Self {
		Self {
			order,
			window: vec![None; order],
			grams: HashMap::new(),
			related: HashMap::new(),
		}
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of distinct gram keys.
	pub fn len(&self) -> usize {
		self.grams.len()
	}

	pub fn is_empty(&self) -> bool {
		self.grams.is_empty()
	}

	/// Returns the count of a full gram key (context symbols then target).
	pub fn count(&self, key: &[&str]) -> usize {
		let key: GramKey = key.iter().map(|s| (*s).to_owned()).collect();
		self.grams.get(&key).copied().unwrap_or(0)
	}

	/// Ranks with the two-symbol context `(earlier, context)`.
	///
	/// Same ranking and fallback as `predict`, but candidates are the gram
	/// keys registered under the pair bucket. An order-1 model has no pair
	/// buckets and answers like `predict(context, n)`.
	pub fn predict_after_pair(&self, earlier: &str, context: &str, n: usize) -> Vec<String> {
		if self.order < 2 {
			return self.predict(context, n);
		}
		let bucket = ContextKey::Pair(Some(earlier.to_owned()), Some(context.to_owned()));
		self.rank(&bucket, n)
	}

	/// Candidates first, then (if short of `n`) every other gram key.
	fn rank(&self, bucket: &ContextKey, n: usize) -> Vec<String> {
		let empty = HashSet::new();
		let related = self.related.get(bucket).unwrap_or(&empty);

		let mut ranked: Vec<(&GramKey, usize)> = related
			.iter()
			.filter_map(|key| self.grams.get(key).map(|count| (key, *count)))
			.collect();
		ranked.sort_by(Self::by_rank);

		if ranked.len() < n {
			let mut unrelated: Vec<(&GramKey, usize)> = self.grams
				.iter()
				.filter(|(key, _)| !related.contains(*key))
				.map(|(key, count)| (key, *count))
				.collect();
			unrelated.sort_by(Self::by_rank);
			ranked.extend(unrelated);
		}

		ranked
			.into_iter()
			.take(n)
			.filter_map(|(key, _)| key.last().cloned())
			.collect()
	}

	/// Count descending, then the whole gram key descending.
	fn by_rank(a: &(&GramKey, usize), b: &(&GramKey, usize)) -> Ordering {
		b.1.cmp(&a.1).then_with(|| b.0.cmp(a.0))
	}
}

impl PredictionModel for NGramModel {
	/// Counts the gram key ending in `symbol` and slides the window.
	///
	/// Context slots without history are written as `EMPTY_CONTEXT`.
	fn update(&mut self, symbol: &str) {
		let mut key: GramKey = self.window
			.iter()
			.map(|slot| slot.clone().unwrap_or_else(|| EMPTY_CONTEXT.to_owned()))
			.collect();
		key.push(symbol.to_owned());

		*self.grams.entry(key.clone()).or_insert(0) += 1;

		let last = self.window[self.order - 1].clone();
		if self.order == 2 {
			let pair = ContextKey::Pair(self.window[0].clone(), last.clone());
			self.related.entry(pair).or_default().insert(key.clone());
		}
		self.related.entry(ContextKey::Single(last)).or_default().insert(key);

		self.window.remove(0);
		self.window.push(Some(symbol.to_owned()));
	}

	/// Ranks the gram keys whose immediate predecessor is `context`.
	///
	/// Both orders look up the single-symbol bucket, so a trigram ranks
	/// with the most recent symbol only (see `predict_after_pair`).
	/// An unseen context has no candidates and ranks the whole table.
	/// Duplicated targets are kept, the result holds at most `n` symbols.
	fn predict(&self, context: &str, n: usize) -> Vec<String> {
		self.rank(&ContextKey::Single(Some(context.to_owned())), n)
	}

	fn name(&self) -> &str {
		match self.order {
			1 => "Bigram",
			_ => "Trigram",
		}
	}
}
