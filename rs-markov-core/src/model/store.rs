use indexmap::IndexMap;

use super::entry::ChainEntry;

/// Multi-resolution context table.
///
/// Maps every context string to its `ChainEntry`. Contexts of different
/// lengths live side by side in the same map; a context's order is simply
/// its character length, so lookups must ask for the exact length they want.
///
/// Iteration follows insertion order. Pruning keeps the relative order of
/// surviving contexts, and persistence writes contexts in this order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainStore {
	entries: IndexMap<String, ChainEntry>,
}

impl ChainStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Statistics recorded for `context`, if any.
	pub fn get(&self, context: &str) -> Option<&ChainEntry> {
		self.entries.get(context)
	}

	/// Records one `(context, continuation)` observation.
	///
	/// Creates the entry (count 0, no continuation) the first time a context
	/// is seen, then increments both counts.
	pub fn observe(&mut self, context: &str, continuation: &str) {
		match self.entries.get_mut(context) {
			Some(entry) => entry.observe(continuation),
			None => {
				let mut entry = ChainEntry::new();
				entry.observe(continuation);
				self.entries.insert(context.to_owned(), entry);
			}
		}
	}

	/// Iterates `(context, entry)` pairs in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &ChainEntry)> {
		self.entries.iter().map(|(context, entry)| (context.as_str(), entry))
	}

	/// Whether every entry satisfies `count == sum(next)`.
	pub fn is_consistent(&self) -> bool {
		self.entries.values().all(ChainEntry::is_consistent)
	}

	/// Removes every context.
	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// Releases spare capacity left behind by pruning.
	pub fn shrink_to_fit(&mut self) {
		for entry in self.entries.values_mut() {
			entry.next.shrink_to_fit();
		}
		self.entries.shrink_to_fit();
	}

	pub(crate) fn entries_mut(&mut self) -> &mut IndexMap<String, ChainEntry> {
		&mut self.entries
	}

	pub(crate) fn from_entries(entries: IndexMap<String, ChainEntry>) -> Self {
		Self { entries }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn observe_creates_then_increments() {
		let mut store = ChainStore::new();
		store.observe("ab", "c");
		store.observe("ab", "c");
		store.observe("ab", "d");
		store.observe("b", "c");

		assert_eq!(store.len(), 2);
		let entry = store.get("ab").unwrap();
		assert_eq!(entry.count(), 3);
		assert_eq!(entry.occurrences("c"), 2);
		assert_eq!(entry.occurrences("d"), 1);
		assert!(store.is_consistent());
	}

	#[test]
	fn contexts_of_different_lengths_are_distinct() {
		let mut store = ChainStore::new();
		store.observe("abc", "d");
		store.observe("bc", "d");
		store.observe("c", "d");
		assert_eq!(store.len(), 3);
		assert!(store.get("abc").is_some());
		assert!(store.get("bc").is_some());
		assert!(store.get("ab").is_none());
	}

	#[test]
	fn iterates_in_insertion_order() {
		let mut store = ChainStore::new();
		for context in ["zz", "aa", "mm", "aa"] {
			store.observe(context, "x");
		}
		let contexts: Vec<_> = store.iter().map(|(context, _)| context).collect();
		assert_eq!(contexts, vec!["zz", "aa", "mm"]);
	}
}
