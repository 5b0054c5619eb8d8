use std::collections::HashSet;

use proptest::prelude::*;
use rs_next_core::model::{AdaptiveWeightModel, EligibilityFrequencyModel, FrequencyModel, NGramModel, Vocabulary};
use rs_next_core::PredictionModel;

/// Sequences over a small alphabet so that symbols repeat.
fn symbols() -> impl Strategy<Value = Vec<String>> {
	prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", "e", "f", "g"]), 0..60)
		.prop_map(|symbols| symbols.into_iter().map(str::to_owned).collect())
}

// Property 1: indices never change once assigned, size never shrinks
proptest! {
	#[test]
	fn prop_vocabulary_is_monotonic(sequence in symbols()) {
		let mut vocabulary = Vocabulary::new();
		let mut assigned: Vec<(String, usize)> = Vec::new();
		let mut size = 0;

		for symbol in &sequence {
			let index = vocabulary.index_of(symbol);
			prop_assert!(vocabulary.len() >= size);
			size = vocabulary.len();
			assigned.push((symbol.clone(), index));

			for (seen, seen_index) in &assigned {
				prop_assert_eq!(vocabulary.get(seen), Some(*seen_index));
			}
		}
	}
}

// Property 2: every row (and the default row) is |vocabulary| wide, weights stay non-negative
proptest! {
	#[test]
	fn prop_adaptive_shape_and_sign(
		sequence in symbols(),
		decay_rate in 0.01f64..0.99,
		initial_weight in 0.0f64..10.0,
	) {
		let mut model = AdaptiveWeightModel::new(decay_rate, initial_weight).unwrap();

		for symbol in &sequence {
			model.update(symbol);

			let size = model.vocabulary().len();
			prop_assert_eq!(model.default_weights().len(), size);
			for known in model.vocabulary().iter() {
				let row = model.weights(known).unwrap();
				prop_assert_eq!(row.len(), size);
				prop_assert!(row.iter().all(|weight| *weight >= 0.0), "negative weight in {:?}", row);
			}
			prop_assert!(model.default_weights().iter().all(|weight| *weight >= 0.0));
		}
	}
}

// Property 3: identical inputs give identical predictions
proptest! {
	#[test]
	fn prop_adaptive_is_deterministic(sequence in symbols(), decay_rate in 0.01f64..0.99) {
		let mut first = AdaptiveWeightModel::new(decay_rate, 1.0).unwrap();
		let mut second = AdaptiveWeightModel::new(decay_rate, 1.0).unwrap();
		for symbol in &sequence {
			first.update(symbol);
			second.update(symbol);
		}

		for context in ["a", "b", "c", "d", "e", "f", "g", "unseen"] {
			prop_assert_eq!(first.predict(context, 7), second.predict(context, 7));
		}
	}
}

// Property 4: no model returns more than requested
proptest! {
	#[test]
	fn prop_predictions_are_clamped(sequence in symbols(), n in 0usize..12) {
		let mut models: Vec<Box<dyn PredictionModel>> = vec![
			Box::new(FrequencyModel::new()),
			Box::new(NGramModel::bigram()),
			Box::new(NGramModel::trigram()),
			Box::new(AdaptiveWeightModel::new(0.8, 1.0).unwrap()),
			Box::new(EligibilityFrequencyModel::new()),
		];
		for symbol in &sequence {
			for model in models.iter_mut() {
				model.update(symbol);
			}
		}

		for model in &models {
			prop_assert!(model.predict("a", n).len() <= n, "{} returned too many", model.name());
		}
	}
}

// Property 5: every known symbol is ranked exactly once, eligible first
proptest! {
	#[test]
	fn prop_eligibility_ranking_is_complete(
		sequence in symbols(),
		eligible in prop::collection::hash_set(prop::sample::select(vec!["a", "b", "c", "d", "e", "f", "g"]), 0..7),
	) {
		let mut model = EligibilityFrequencyModel::with_known_symbols(["g", "f"]);
		for symbol in &sequence {
			model.update(symbol);
		}

		let ranking: Vec<_> = model.rank(|symbol| eligible.contains(symbol)).collect();
		prop_assert_eq!(ranking.len(), model.len());

		let distinct: HashSet<&str> = ranking.iter().map(|ranked| ranked.symbol).collect();
		prop_assert_eq!(distinct.len(), ranking.len());

		let first_ineligible = ranking.iter().position(|ranked| !eligible.contains(ranked.symbol));
		if let Some(boundary) = first_ineligible {
			prop_assert!(ranking[boundary..].iter().all(|ranked| !eligible.contains(ranked.symbol)));
			prop_assert!(ranking[boundary..].iter().all(|ranked| ranked.rating == -1.0));
		}
		prop_assert!(ranking.iter().filter(|ranked| eligible.contains(ranked.symbol)).all(|ranked| ranked.rating >= 0.0));
	}
}

// Property 6: frequency ranking is sorted by count, ties by symbol
proptest! {
	#[test]
	fn prop_frequency_ranking_is_sorted(sequence in symbols()) {
		let mut model = FrequencyModel::new();
		for symbol in &sequence {
			model.update(symbol);
		}

		let ranked = model.predict("", 7);
		for pair in ranked.windows(2) {
			let (left, right) = (model.count(&pair[0]), model.count(&pair[1]));
			prop_assert!(left > right || (left == right && pair[0] < pair[1]));
		}
	}
}
