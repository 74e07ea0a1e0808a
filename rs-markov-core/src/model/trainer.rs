use log::{debug, info, warn};

use super::config::ChainConfig;
use super::ngram::ngrams;
use super::observer::{LogProgress, MemoryReclaimHint, NoReclaim, ProgressSink, ProgressUpdate};
use super::pruner::Pruner;
use super::store::ChainStore;

/// Distinct contexts above which training prunes inline.
pub const DEFAULT_CONTEXT_BUDGET: usize = 4_000_000;

/// Pairs between two progress notifications.
pub const DEFAULT_PROGRESS_EVERY: usize = 1_000_000;

/// Summary of a training run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrainReport {
	/// Order passes run.
	pub passes: usize,
	/// `(context, continuation)` pairs recorded over all passes.
	pub pairs: usize,
	/// Pruning passes run, inline ones included.
	pub prunes: usize,
}

/// Fills a `ChainStore` from text, one pass per context length.
///
/// Starting from the requested order, each pass records every
/// `(context, continuation)` pair of the text, then prunes the store; the
/// next pass uses a context `step_down` characters shorter, until the order
/// drops below `min_order`. All passes accumulate into the same store.
///
/// Whenever the store grows past the context budget in the middle of a pass,
/// the pruner runs right away before the next pair is recorded.
pub struct Trainer<'a> {
	store: &'a mut ChainStore,
	config: &'a ChainConfig,
	prune_threshold: u64,
	context_budget: usize,
	progress_every: usize,
	progress: Box<dyn ProgressSink + 'a>,
	reclaim: &'a dyn MemoryReclaimHint,
}

impl<'a> Trainer<'a> {
	/// Creates a trainer writing into `store`.
	///
	/// Progress goes to the log every `DEFAULT_PROGRESS_EVERY` pairs.
	pub fn new(store: &'a mut ChainStore, config: &'a ChainConfig, prune_threshold: u64) -> Self {
		Self {
			store,
			config,
			prune_threshold,
			context_budget: DEFAULT_CONTEXT_BUDGET,
			progress_every: DEFAULT_PROGRESS_EVERY,
			progress: Box::new(LogProgress),
			reclaim: &NoReclaim,
		}
	}

	/// Sets the number of distinct contexts that triggers an inline prune.
	pub fn with_context_budget(mut self, context_budget: usize) -> Self {
		self.context_budget = context_budget;
		self
	}

	/// Sets how many pairs separate two progress notifications (0 disables them).
	pub fn with_progress_every(mut self, progress_every: usize) -> Self {
		self.progress_every = progress_every;
		self
	}

	/// Replaces the progress sink.
	pub fn with_progress<P: ProgressSink + 'a>(mut self, progress: P) -> Self {
		self.progress = Box::new(progress);
		self
	}

	/// Sets the hook invoked after each pruning pass.
	pub fn with_reclaim(mut self, reclaim: &'a dyn MemoryReclaimHint) -> Self {
		self.reclaim = reclaim;
		self
	}

	/// Trains from the configured order with the configured continuation length.
	pub fn train(&mut self, text: &str) -> TrainReport {
		self.train_from(text, self.config.order, self.config.next_order)
	}

	/// Trains from `order` down to `min_order` with `continuation_len`.
	///
	/// Does nothing when `order < min_order` or `continuation_len == 0`.
	pub fn train_from(&mut self, text: &str, order: usize, continuation_len: usize) -> TrainReport {
		let mut report = TrainReport::default();
		if continuation_len == 0 {
			warn!("continuation length is 0, nothing to train");
			return report;
		}

		let pruner = Pruner::new(self.prune_threshold).with_reclaim(self.reclaim);
		let step_down = self.config.step_down;
		let longest = text.chars().count().saturating_sub(continuation_len);
		let mut order = order;

		while order >= self.config.min_order {
			self.pass(text, order, continuation_len, &pruner, &mut report);

			debug!("order {} done, cleaning up", order);
			pruner.run(self.store);
			report.prunes += 1;

			if step_down == 0 {
				break;
			}
			// Orders above the longest context yield no pairs and would only
			// prune an unchanged store again.
			let steps = order.saturating_sub(longest).div_ceil(step_down).max(1);
			match steps.checked_mul(step_down).and_then(|drop| order.checked_sub(drop)) {
				Some(next) => order = next,
				None => break,
			}
		}

		info!(
			"training done: {} passes, {} pairs, {} prunes, {} contexts",
			report.passes,
			report.pairs,
			report.prunes,
			self.store.len()
		);
		report
	}

	/// Records every pair of one order, pruning inline when over budget.
	fn pass(&mut self, text: &str, order: usize, continuation_len: usize, pruner: &Pruner, report: &mut TrainReport) {
		let pairs = ngrams(text, order, continuation_len);
		let total_items = pairs.len();
		info!("training order {}: {} pairs", order, total_items);

		let mut warned = false;
		for (index, (context, continuation)) in pairs.enumerate() {
			self.store.observe(context, continuation);

			let items_processed = index + 1;
			if self.progress_every > 0 && items_processed % self.progress_every == 0 {
				self.progress.on_progress(ProgressUpdate {
					order,
					items_processed,
					total_items,
					distinct_contexts: self.store.len(),
				});
			}

			if self.store.len() > self.context_budget {
				debug!("{} contexts over budget {}, cleaning up", self.store.len(), self.context_budget);
				pruner.run(self.store);
				report.prunes += 1;
				if !warned && self.store.len() > self.context_budget {
					warn!(
						"store still holds {} contexts after pruning with threshold {}",
						self.store.len(),
						pruner.threshold()
					);
					warned = true;
				}
			}
		}

		report.passes += 1;
		report.pairs += total_items;
	}
}
