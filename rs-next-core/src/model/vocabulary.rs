use std::collections::HashMap;

/// Bidirectional, append-only mapping between symbols and dense indices.
///
/// # Invariants
/// - Indices are assigned in order of first appearance, starting at 0
/// - An index is never reassigned and no symbol is ever removed
/// - `symbols[i]` and `indices[&symbols[i]] == i` always agree
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
	/// Symbol to index lookup.
	indices: HashMap<String, usize>,

	/// Index to symbol lookup, in order of first appearance.
	symbols: Vec<String>,
}

impl Vocabulary {
	/// Creates an empty vocabulary.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the index of `symbol`, assigning the next free one if the
	/// symbol has never been seen.
	///
	/// Amortized O(1). The vocabulary has no upper bound.
	pub fn index_of(&mut self, symbol: &str) -> usize {
		if let Some(&index) = self.indices.get(symbol) {
			return index;
		}
		let index = self.symbols.len();
		self.indices.insert(symbol.to_owned(), index);
		self.symbols.push(symbol.to_owned());
		tracing::trace!(symbol, index, "new symbol");
		index
	}

	/// Looks up a symbol without registering it.
	pub fn get(&self, symbol: &str) -> Option<usize> {
		self.indices.get(symbol).copied()
	}

	/// Returns the symbol stored at `index`.
	pub fn symbol(&self, index: usize) -> Option<&str> {
		self.symbols.get(index).map(String::as_str)
	}

	pub fn contains(&self, symbol: &str) -> bool {
		self.indices.contains_key(symbol)
	}

	pub fn len(&self) -> usize {
		self.symbols.len()
	}

	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}

	/// Iterates over the symbols in index order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.symbols.iter().map(String::as_str)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn indices_follow_first_appearance() {
		let mut vocabulary = Vocabulary::new();
		assert_eq!(vocabulary.index_of("select_all"), 0);
		assert_eq!(vocabulary.index_of("delete"), 1);
		assert_eq!(vocabulary.index_of("select_all"), 0);
		assert_eq!(vocabulary.index_of("extrude"), 2);

		assert_eq!(vocabulary.len(), 3);
		assert_eq!(vocabulary.get("delete"), Some(1));
		assert_eq!(vocabulary.get("undo"), None);
		assert_eq!(vocabulary.symbol(2), Some("extrude"));
		assert_eq!(vocabulary.symbol(3), None);
		assert_eq!(vocabulary.iter().collect::<Vec<_>>(), vec!["select_all", "delete", "extrude"]);
	}

	#[test]
	fn lookup_does_not_register() {
		let vocabulary = Vocabulary::new();
		assert!(!vocabulary.contains("ls"));
		assert!(vocabulary.is_empty());
	}
}
