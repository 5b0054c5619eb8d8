use super::vocabulary::Vocabulary;
use super::PredictionModel;

/// Divides raw occurrence counts so that one observed follow-up outweighs
/// ten extra uses.
pub const FREQUENCY_DAMPING: f64 = 10.0;

/// Rating reported for symbols the predicate rejected.
pub const INELIGIBLE_RATING: f64 = -1.0;

/// A symbol with the rating it was ranked by.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedSymbol<'a> {
	pub symbol: &'a str,
	pub rating: f64,
}

/// Recency/frequency hybrid filtered by a caller-supplied eligibility
/// predicate (for example "can this action run right now").
///
/// # Responsibilities
/// - Keep the full history and, per symbol, the positions it occurred at
/// - Rate eligible symbols by damped frequency plus follow-ups of the last symbol
/// - Enumerate every known symbol, eligible ones first
///
/// # Invariants
/// - `counts`, `positions` are indexed like `vocabulary`
/// - `positions[s]` is sorted and `history[p] == s` for each `p` in it
#[derive(Clone, Debug, Default)]
pub struct EligibilityFrequencyModel {
	/// Every known symbol in discovery order.
	vocabulary: Vocabulary,

	/// Occurrence count per symbol index.
	counts: Vec<usize>,

	/// Observed symbols as vocabulary indices.
	history: Vec<usize>,

	/// History positions per symbol index.
	positions: Vec<Vec<usize>>,
}

impl EligibilityFrequencyModel {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a model that already knows `symbols` (used or not), so
	/// rankings cover them from the start.
	pub fn with_known_symbols<I, S>(symbols: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut model = Self::new();
		model.register_known(symbols);
		model
	}

	/// Adds `symbols` to the known set without counting a use, so they
	/// appear in rankings even before they are first observed.
	pub fn register_known<I, S>(&mut self, symbols: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for symbol in symbols {
			self.register(symbol.as_ref());
		}
	}

	/// Number of known symbols, which is also the length of every ranking.
	pub fn len(&self) -> usize {
		self.vocabulary.len()
	}

	pub fn is_empty(&self) -> bool {
		self.vocabulary.is_empty()
	}

	/// Iterates over the observed history, oldest first.
	pub fn history(&self) -> impl Iterator<Item = &str> {
		self.history.iter().filter_map(|index| self.vocabulary.symbol(*index))
	}

	/// The most recently observed symbol.
	pub fn last(&self) -> Option<&str> {
		self.history.last().and_then(|index| self.vocabulary.symbol(*index))
	}

	/// Ranks every known symbol after the last observed one.
	pub fn rank<F>(&self, is_eligible: F) -> Ranking<'_>
	where
		F: FnMut(&str) -> bool,
	{
		self.rank_after(self.last(), is_eligible)
	}

	/// Ranks every known symbol as if `last` had just been used.
	///
	/// Eligible symbols are rated `count / FREQUENCY_DAMPING`, plus one for
	/// every time they directly followed `last` in the history (repeats of
	/// `last` itself are not counted). They come first, by rating
	/// descending, ties in discovery order. Ineligible symbols follow with
	/// `INELIGIBLE_RATING`, in discovery order.
	///
	/// The predicate is called once per known symbol. The model is not
	/// modified; clone the returned ranking to enumerate it again.
	pub fn rank_after<F>(&self, last: Option<&str>, mut is_eligible: F) -> Ranking<'_>
	where
		F: FnMut(&str) -> bool,
	{
		let eligible: Vec<bool> = self.vocabulary.iter().map(|symbol| is_eligible(symbol)).collect();

		let mut ratings: Vec<f64> = self.counts
			.iter()
			.map(|count| *count as f64 / FREQUENCY_DAMPING)
			.collect();

		if let Some(last) = last.and_then(|symbol| self.vocabulary.get(symbol)) {
			for position in &self.positions[last] {
				if let Some(&next) = self.history.get(position + 1) {
					if next != last && eligible[next] {
						ratings[next] += 1.0;
					}
				}
			}
		}

		let mut ranked: Vec<(usize, f64)> = (0..eligible.len())
			.filter(|index| eligible[*index])
			.map(|index| (index, ratings[index]))
			.collect();
		ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

		ranked.extend(
			(0..eligible.len())
				.filter(|index| !eligible[*index])
				.map(|index| (index, INELIGIBLE_RATING)),
		);

		Ranking { vocabulary: &self.vocabulary, ranked, cursor: 0 }
	}

	fn register(&mut self, symbol: &str) -> usize {
		let index = self.vocabulary.index_of(symbol);
		if index == self.counts.len() {
			self.counts.push(0);
			self.positions.push(Vec::new());
		}
		index
	}
}

impl PredictionModel for EligibilityFrequencyModel {
	fn update(&mut self, symbol: &str) {
		let index = self.register(symbol);
		self.counts[index] += 1;
		self.positions[index].push(self.history.len());
		self.history.push(index);
	}

	/// Top `n` of `rank_after(Some(context), ..)` with every symbol eligible.
	fn predict(&self, context: &str, n: usize) -> Vec<String> {
		self.rank_after(Some(context), |_| true)
			.take(n)
			.map(|ranked| ranked.symbol.to_owned())
			.collect()
	}

	fn name(&self) -> &str {
		"Eligibility"
	}
}

/// Ordered enumeration produced by `EligibilityFrequencyModel::rank_after`.
///
/// Finite, yields each known symbol exactly once. Cloning restarts from
/// the current position.
#[derive(Clone, Debug)]
pub struct Ranking<'a> {
	vocabulary: &'a Vocabulary,
	ranked: Vec<(usize, f64)>,
	cursor: usize,
}

impl<'a> Iterator for Ranking<'a> {
	type Item = RankedSymbol<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		let (index, rating) = *self.ranked.get(self.cursor)?;
		self.cursor += 1;
		let symbol = self.vocabulary.symbol(index)?;
		Some(RankedSymbol { symbol, rating })
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let remaining = self.ranked.len() - self.cursor;
		(remaining, Some(remaining))
	}
}

impl ExactSizeIterator for Ranking<'_> {}

#[cfg(test)]
mod tests {
	use super::*;

	fn trained(symbols: &[&str]) -> EligibilityFrequencyModel {
		let mut model = EligibilityFrequencyModel::new();
		for symbol in symbols {
			model.update(symbol);
		}
		model
	}

	fn symbols(ranking: Ranking<'_>) -> Vec<&str> {
		ranking.map(|ranked| ranked.symbol).collect()
	}

	#[test]
	fn follow_ups_outrank_frequency() {
		// After "a": "b" followed once, "c" followed twice
		let model = trained(&["a", "b", "a", "c", "a", "c", "d", "d", "d", "d", "a"]);
		let ranking: Vec<_> = model.rank(|_| true).collect();

		assert_eq!(ranking[0], RankedSymbol { symbol: "c", rating: 2.0 + 0.2 });
		assert_eq!(ranking[1], RankedSymbol { symbol: "b", rating: 1.0 + 0.1 });
		assert_eq!(ranking[2].symbol, "a");
		assert_eq!(ranking[3].symbol, "d");
	}

	#[test]
	fn registered_symbols_are_ranked_before_first_use() {
		let mut model = trained(&["mesh.select_all", "mesh.delete"]);
		model.register_known(["mesh.delete", "object.mode_set"]);

		assert_eq!(model.len(), 3);
		assert_eq!(model.history().count(), 2);
		let ranking: Vec<_> = model.rank(|symbol| symbol != "mesh.select_all").collect();
		assert_eq!(ranking, vec![
			RankedSymbol { symbol: "mesh.delete", rating: 0.1 },
			RankedSymbol { symbol: "object.mode_set", rating: 0.0 },
			RankedSymbol { symbol: "mesh.select_all", rating: INELIGIBLE_RATING },
		]);
	}

	#[test]
	fn self_transitions_are_ignored() {
		let model = trained(&["a", "a", "a", "b", "a"]);
		let ranking: Vec<_> = model.rank(|_| true).collect();
		assert_eq!(ranking[0].symbol, "b");
		assert!((ranking[0].rating - 1.1).abs() < 1e-12);
		assert!((ranking[1].rating - 0.4).abs() < 1e-12);
	}

	#[test]
	fn ineligible_symbols_come_last_in_discovery_order() {
		let model = EligibilityFrequencyModel::with_known_symbols(["undo", "redo", "save", "open"]);
		let ranking: Vec<_> = model.rank(|symbol| symbol.starts_with('s') || symbol == "open").collect();

		assert_eq!(ranking.len(), 4);
		assert_eq!(ranking[0].symbol, "save");
		assert_eq!(ranking[1].symbol, "open");
		assert_eq!(ranking[2], RankedSymbol { symbol: "undo", rating: INELIGIBLE_RATING });
		assert_eq!(ranking[3], RankedSymbol { symbol: "redo", rating: INELIGIBLE_RATING });
	}

	#[test]
	fn follow_ups_must_be_eligible() {
		let model = trained(&["a", "b", "a", "c", "a"]);
		let ranking: Vec<_> = model.rank(|symbol| symbol != "b").collect();
		assert_eq!(ranking[0].symbol, "c");
		assert_eq!(ranking.last().map(|ranked| ranked.rating), Some(INELIGIBLE_RATING));
	}

	#[test]
	fn ranking_is_restartable() {
		let model = trained(&["x", "y", "x", "z", "x"]);
		let ranking = model.rank(|_| true);
		assert_eq!(ranking.len(), 3);
		assert_eq!(symbols(ranking.clone()), symbols(ranking));
		assert_eq!(symbols(model.rank(|_| true)), symbols(model.rank(|_| true)));
	}

	#[test]
	fn empty_history_rates_zero() {
		let model = EligibilityFrequencyModel::with_known_symbols(["a", "b"]);
		assert_eq!(model.last(), None);
		let ranking: Vec<_> = model.rank(|_| true).collect();
		assert_eq!(ranking.iter().map(|r| r.symbol).collect::<Vec<_>>(), vec!["a", "b"]);
		assert!(ranking.iter().all(|r| r.rating == 0.0));
	}

	#[test]
	fn predict_uses_context_as_last_symbol() {
		let model = trained(&["a", "b", "c", "a", "b", "c"]);
		assert_eq!(model.predict("b", 1), vec!["c"]);
		assert_eq!(model.predict("c", 1), vec!["a"]);
		assert_eq!(model.predict("unknown", 10).len(), 3);
	}
}
