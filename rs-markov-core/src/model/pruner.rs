use log::debug;

use super::observer::{MemoryReclaimHint, NoReclaim};
use super::store::ChainStore;

/// Default pruning threshold.
pub const DEFAULT_PRUNE_THRESHOLD: u64 = 1;

/// Outcome of one pruning pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
	/// Continuation slots removed in phase 1.
	pub continuations_removed: usize,
	/// Context entries removed in phase 2.
	pub contexts_removed: usize,
}

impl PruneReport {
	/// Whether the pass changed nothing.
	pub fn is_noop(&self) -> bool {
		self.continuations_removed == 0 && self.contexts_removed == 0
	}
}

/// Bounds a `ChainStore` by discarding low-frequency statistics.
///
/// Two phases, in this order:
/// 1. every continuation seen `threshold` times or less is removed and its
///    occurrences subtracted from its context's count;
/// 2. every context whose (reduced) count is `threshold` or less is removed.
///
/// The decision is purely local to each entry. Running the same pruner twice
/// in a row is a no-op the second time. Survivors keep their order.
pub struct Pruner<'a> {
	threshold: u64,
	reclaim: &'a dyn MemoryReclaimHint,
}

impl<'a> Pruner<'a> {
	/// Creates a pruner with the given threshold and no reclaim hint.
	pub fn new(threshold: u64) -> Self {
		Self { threshold, reclaim: &NoReclaim }
	}

	/// Sets the hook invoked after each pass.
	pub fn with_reclaim(mut self, reclaim: &'a dyn MemoryReclaimHint) -> Self {
		self.reclaim = reclaim;
		self
	}

	pub fn threshold(&self) -> u64 {
		self.threshold
	}

	/// Prunes the store in place.
	pub fn run(&self, store: &mut ChainStore) -> PruneReport {
		let threshold = self.threshold;
		let entries = store.entries_mut();

		let continuations_removed: usize = entries
			.values_mut()
			.map(|entry| entry.drop_rare(threshold))
			.sum();

		let before = entries.len();
		entries.retain(|_, entry| entry.count > threshold);
		let contexts_removed = before - entries.len();

		self.reclaim.reclaim(store);

		debug!(
			"pruned store (threshold {}): {} continuations, {} contexts removed, {} contexts left",
			threshold,
			continuations_removed,
			contexts_removed,
			store.len()
		);

		PruneReport { continuations_removed, contexts_removed }
	}
}

impl ChainStore {
	/// Prunes the store with `threshold` (see `Pruner`).
	pub fn clean_up(&mut self, threshold: u64) -> PruneReport {
		Pruner::new(threshold).run(self)
	}
}
