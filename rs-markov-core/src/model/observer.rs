use log::info;

use super::store::ChainStore;

/// Progress notification emitted periodically during a training pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressUpdate {
	/// Context length of the current pass.
	pub order: usize,
	/// Pairs processed so far in the current pass.
	pub items_processed: usize,
	/// Pairs in the current pass.
	pub total_items: usize,
	/// Distinct contexts currently held by the store.
	pub distinct_contexts: usize,
}

/// Receives training progress.
///
/// Purely observational: a sink cannot change what training does.
pub trait ProgressSink {
	fn on_progress(&mut self, update: ProgressUpdate);
}

/// Reports progress through the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
	fn on_progress(&mut self, update: ProgressUpdate) {
		info!(
			"order {}: {} / {} pairs, {} contexts",
			update.order, update.items_processed, update.total_items, update.distinct_contexts
		);
	}
}

/// Ignores progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
	fn on_progress(&mut self, _update: ProgressUpdate) {}
}

impl<F: FnMut(ProgressUpdate)> ProgressSink for F {
	fn on_progress(&mut self, update: ProgressUpdate) {
		self(update)
	}
}

/// Hook invoked after each pruning pass.
///
/// Doing nothing is always valid.
pub trait MemoryReclaimHint {
	fn reclaim(&self, store: &mut ChainStore);
}

/// Leaves the store untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReclaim;

impl MemoryReclaimHint for NoReclaim {
	fn reclaim(&self, _store: &mut ChainStore) {}
}

/// Gives spare map capacity back to the allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShrinkToFit;

impl MemoryReclaimHint for ShrinkToFit {
	fn reclaim(&self, store: &mut ChainStore) {
		store.shrink_to_fit();
	}
}
