use rand::Rng;

use super::config::ChainConfig;
use super::store::ChainStore;

/// Default cap on the length of the text produced by `predict_until`, prompt included.
pub const DEFAULT_MAX_LENGTH: usize = 500;

/// Returns the last `n` characters of a string.
///
/// If `n` is greater than the number of characters in `s`, the entire string
/// is returned. UTF-8 safe.
fn last_n_chars(s: &str, n: usize) -> &str {
	if n == 0 {
		return &s[s.len()..];
	}
	match s.char_indices().rev().nth(n - 1) {
		Some((offset, _)) => &s[offset..],
		None => s,
	}
}

/// Read-only sampler over a `ChainStore`.
///
/// Lookups start with the longest configured context and back off by
/// `step_down` characters each time a context is unknown, until the order
/// falls to `min_order - step_down` or below.
///
/// Every method has a `_with` variant taking the random source, so callers
/// can seed draws; the plain variants use the thread-local generator.
#[derive(Clone, Copy, Debug)]
pub struct Predictor<'a> {
	store: &'a ChainStore,
	config: &'a ChainConfig,
}

impl<'a> Predictor<'a> {
	pub fn new(store: &'a ChainStore, config: &'a ChainConfig) -> Self {
		Self { store, config }
	}

	/// Draws one continuation for `text`, starting at the configured order.
	pub fn predict_next(&self, text: &str) -> Option<&'a str> {
		self.predict_next_with(text, &mut rand::rng())
	}

	/// `predict_next` with an explicit random source.
	pub fn predict_next_with<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Option<&'a str> {
		self.predict_next_from(text, self.config.order, rng)
	}

	/// Draws one continuation for `text`, starting the backoff at `order`.
	///
	/// The context looked up at each step is the last `order` characters of
	/// `text` (all of it when shorter). An entry whose draw comes back empty
	/// is treated like a missing one.
	///
	/// Returns `None` once the backoff chain is exhausted.
	pub fn predict_next_from<R: Rng + ?Sized>(&self, text: &str, order: usize, rng: &mut R) -> Option<&'a str> {
		let min_order = self.config.min_order;
		let step_down = self.config.step_down;
		let text_len = text.chars().count();
		let mut order = order;

		loop {
			if order.saturating_add(step_down) <= min_order {
				return None;
			}

			let context = last_n_chars(text, order);
			if let Some(continuation) = self.store.get(context).and_then(|entry| entry.sample(rng)) {
				return Some(continuation);
			}

			if step_down == 0 {
				return None;
			}
			// Every order above the text length looks up the whole text, so skip
			// straight to the first one that fits. Orders never go below zero.
			let steps = order.saturating_sub(text_len).div_ceil(step_down).max(1);
			order = steps.checked_mul(step_down).and_then(|drop| order.checked_sub(drop))?;
		}
	}

	/// Appends up to `count` continuations to `text` and returns the generated suffix.
	///
	/// Stops early the first time no continuation can be drawn.
	pub fn predict(&self, text: &str, count: usize) -> String {
		self.predict_with(text, count, &mut rand::rng())
	}

	/// `predict` with an explicit random source.
	pub fn predict_with<R: Rng + ?Sized>(&self, text: &str, count: usize, rng: &mut R) -> String {
		let mut result = text.to_owned();
		for _ in 0..count {
			match self.predict_next_with(&result, rng) {
				Some(continuation) => result.push_str(continuation),
				None => break,
			}
		}
		result.split_off(text.len())
	}

	/// Generates until a stop string, a dead end, or `max_length` characters.
	///
	/// Continuations are appended one character at a time. After each
	/// character the result is checked against `stop`, so generation may end
	/// in the middle of a continuation. `max_length` bounds the whole result,
	/// prompt included, and is never exceeded. Empty stop strings are ignored.
	///
	/// Returns only the generated suffix.
	pub fn predict_until<S: AsRef<str>>(&self, text: &str, stop: &[S], max_length: usize) -> String {
		self.predict_until_with(text, stop, max_length, &mut rand::rng())
	}

	/// `predict_until` with an explicit random source.
	pub fn predict_until_with<S, R>(&self, text: &str, stop: &[S], max_length: usize, rng: &mut R) -> String
	where
		S: AsRef<str>,
		R: Rng + ?Sized,
	{
		let mut result = text.to_owned();
		let mut length = text.chars().count();

		'generation: while length < max_length {
			let Some(continuation) = self.predict_next_with(&result, rng) else {
				break;
			};

			for letter in continuation.chars() {
				result.push(letter);
				length += 1;

				let stopped = stop.iter().any(|s| {
					let s: &str = s.as_ref();
					!s.is_empty() && result.ends_with(s)
				});
				if stopped || length >= max_length {
					break 'generation;
				}
			}
		}

		result.split_off(text.len())
	}
}
