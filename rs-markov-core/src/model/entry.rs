use indexmap::IndexMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

/// Statistics recorded for one context string.
///
/// A `ChainEntry` is a node of the Markov chain: `next` holds every
/// continuation observed right after the context, weighted by its number of
/// observations, and `count` is the total number of observations.
///
/// ## Responsibilities:
/// - Accumulate continuation occurrences during training
/// - Drop rare continuations during pruning
/// - Draw a continuation with probability proportional to its count
///
/// ## Invariants
/// - `count == next.values().sum()` outside of a mutation
/// - `next` iterates in first-observation order; sampling relies on it
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainEntry {
	/// Total observations of the context.
	pub(crate) count: u64,
	/// Occurrences per continuation, in insertion order.
	/// Example: { "e" => 42, "a" => 3 }
	pub(crate) next: IndexMap<String, u64>,
}

impl ChainEntry {
	/// Creates an empty entry (count 0, no continuation).
	pub fn new() -> Self {
		Self::default()
	}

	/// Total observations of the context.
	pub fn count(&self) -> u64 {
		self.count
	}

	/// Occurrences per continuation, in insertion order.
	pub fn next(&self) -> &IndexMap<String, u64> {
		&self.next
	}

	/// Occurrences of a single continuation (0 if never seen).
	pub fn occurrences(&self, continuation: &str) -> u64 {
		self.next.get(continuation).copied().unwrap_or(0)
	}

	/// Records one occurrence of `continuation` after this context.
	pub fn observe(&mut self, continuation: &str) {
		self.count += 1;
		match self.next.get_mut(continuation) {
			Some(occurrence) => *occurrence += 1,
			None => {
				self.next.insert(continuation.to_owned(), 1);
			}
		}
	}

	/// Whether `count` equals the sum of the continuation counts.
	///
	/// A sum that does not fit in a `u64` is never consistent.
	pub fn is_consistent(&self) -> bool {
		self.next
			.values()
			.try_fold(0u64, |total, occurrence| total.checked_add(*occurrence))
			== Some(self.count)
	}

	/// Removes every continuation seen `threshold` times or less and
	/// subtracts its occurrences from `count`.
	///
	/// Survivors keep their relative order. Returns the number of removed
	/// continuations.
	pub fn drop_rare(&mut self, threshold: u64) -> usize {
		let before = self.next.len();
		let mut removed = 0;
		self.next.retain(|_, occurrence| {
			if *occurrence <= threshold {
				removed += *occurrence;
				false
			} else {
				true
			}
		});
		self.count = self.count.saturating_sub(removed);
		before - self.next.len()
	}

	/// Draws a continuation with probability proportional to its count.
	///
	/// Picks `r` uniformly in `[0, count)`, then walks the continuations in
	/// insertion order subtracting each count from `r`, and returns the first
	/// one where the remainder drops to zero or below.
	///
	/// Returns `None` if the entry is empty, or if the walk ends without a
	/// pick (only possible when `count` exceeds the sum of the continuations).
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		if self.count == 0 {
			return None;
		}

		let mut remainder = rng.random_range(0..self.count);
		for (continuation, occurrence) in &self.next {
			if remainder <= *occurrence {
				return Some(continuation.as_str());
			}
			remainder -= occurrence;
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn entry(pairs: &[(&str, u64)]) -> ChainEntry {
		let mut entry = ChainEntry::new();
		for (continuation, occurrence) in pairs {
			for _ in 0..*occurrence {
				entry.observe(continuation);
			}
		}
		entry
	}

	#[test]
	fn observe_keeps_count_in_sync() {
		let entry = entry(&[("a", 3), ("b", 1), ("a", 2)]);
		assert_eq!(entry.count(), 6);
		assert_eq!(entry.occurrences("a"), 5);
		assert_eq!(entry.occurrences("b"), 1);
		assert_eq!(entry.occurrences("z"), 0);
		assert!(entry.is_consistent());
		let order: Vec<_> = entry.next().keys().cloned().collect();
		assert_eq!(order, vec!["a", "b"]);
	}

	#[test]
	fn overflowing_counts_are_inconsistent() {
		let mut entry = ChainEntry::new();
		entry.next.insert("x".to_owned(), u64::MAX);
		entry.next.insert("y".to_owned(), 2);
		entry.count = 1;
		assert!(!entry.is_consistent());
	}

	#[test]
	fn drop_rare_subtracts_removed_counts() {
		let mut entry = entry(&[("a", 1), ("b", 5), ("c", 2), ("d", 3)]);
		assert_eq!(entry.drop_rare(2), 2);
		assert_eq!(entry.count(), 8);
		assert!(entry.is_consistent());
		let order: Vec<_> = entry.next().keys().cloned().collect();
		assert_eq!(order, vec!["b", "d"]);
	}

	#[test]
	fn sample_on_empty_entry_is_none() {
		let mut rng = StdRng::seed_from_u64(7);
		assert_eq!(ChainEntry::new().sample(&mut rng), None);
	}

	#[test]
	fn sample_falls_through_on_inflated_count() {
		let mut entry = entry(&[("a", 1)]);
		entry.count = 1000;
		let mut rng = StdRng::seed_from_u64(3);
		let misses = (0..200).filter(|_| entry.sample(&mut rng).is_none()).count();
		assert!(misses > 0);
	}

	#[test]
	fn sample_only_returns_known_continuations() {
		let entry = entry(&[("x", 2), ("y", 7), ("z", 1)]);
		let mut rng = StdRng::seed_from_u64(11);
		for _ in 0..500 {
			let pick = entry.sample(&mut rng).unwrap();
			assert!(entry.next().contains_key(pick));
		}
	}

	#[test]
	fn sample_frequencies_follow_counts() {
		let entry = entry(&[("a", 200), ("b", 500), ("c", 300)]);
		let mut rng = StdRng::seed_from_u64(42);
		let draws = 100_000;
		let mut seen: IndexMap<&str, u64> = IndexMap::new();
		for _ in 0..draws {
			*seen.entry(entry.sample(&mut rng).unwrap()).or_insert(0) += 1;
		}
		for (continuation, expected) in [("a", 0.2), ("b", 0.5), ("c", 0.3)] {
			let observed = seen[continuation] as f64 / draws as f64;
			assert!((observed - expected).abs() < 0.01, "{continuation}: {observed}");
		}
	}
}
