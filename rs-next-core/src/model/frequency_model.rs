use std::collections::HashMap;

use super::PredictionModel;

/// Context-free model ranking symbols by how often they were observed.
///
/// # Ranking
/// Count descending, then symbol ascending so ties are reproducible.
#[derive(Clone, Debug, Default)]
pub struct FrequencyModel {
	/// Occurrence count per symbol.
	counts: HashMap<String, usize>,
}

impl FrequencyModel {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns how many times `symbol` was observed.
	pub fn count(&self, symbol: &str) -> usize {
		self.counts.get(symbol).copied().unwrap_or(0)
	}

	/// Number of distinct symbols observed.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}
}

impl PredictionModel for FrequencyModel {
	fn update(&mut self, symbol: &str) {
		*self.counts.entry(symbol.to_owned()).or_insert(0) += 1;
	}

	/// Ignores `context`. Returns every known symbol when fewer than `n` exist.
	fn predict(&self, _context: &str, n: usize) -> Vec<String> {
		let mut ranked: Vec<(&String, &usize)> = self.counts.iter().collect();
		ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
		ranked.into_iter().take(n).map(|(symbol, _)| symbol.clone()).collect()
	}

	fn name(&self) -> &str {
		"MostUsed"
	}
}
