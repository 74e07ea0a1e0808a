use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, Result};

/// Default starting (maximum) context length.
pub const DEFAULT_ORDER: usize = 3;
/// Default lowest context length used by training.
pub const DEFAULT_MIN_ORDER: usize = 1;
/// Default length of every continuation string.
pub const DEFAULT_NEXT_ORDER: usize = 3;
/// Default decrement between two context lengths.
pub const DEFAULT_STEP_DOWN: usize = 1;
/// Default substrings that end generation in `predict_until`.
pub const DEFAULT_STOP_CHARACTERS: [&str; 4] = [".", "!", "?", "  "];

/// Configuration of a Markov chain model.
///
/// All lengths are counted in characters (Unicode scalar values).
///
/// # Invariants (checked by `validate`)
/// - `order >= 1`
/// - `min_order <= order`
/// - `next_order >= 1`
/// - `step_down >= 1`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChainConfig {
	/// Starting (and maximum) context length.
	pub order: usize,
	/// Lowest context length attempted before giving up.
	pub min_order: usize,
	/// Fixed length of every continuation string.
	pub next_order: usize,
	/// Decrement applied when moving to a shorter context.
	pub step_down: usize,
	/// Substrings whose appearance at the end of generated output terminates generation.
	pub stop_characters: Vec<String>,
}

impl Default for ChainConfig {
	fn default() -> Self {
		Self {
			order: DEFAULT_ORDER,
			min_order: DEFAULT_MIN_ORDER,
			next_order: DEFAULT_NEXT_ORDER,
			step_down: DEFAULT_STEP_DOWN,
			stop_characters: DEFAULT_STOP_CHARACTERS.iter().map(|s| (*s).to_owned()).collect(),
		}
	}
}

impl ChainConfig {
	/// Sets the starting context length.
	pub fn with_order(mut self, order: usize) -> Self {
		self.order = order;
		self
	}

	/// Sets the lowest context length.
	pub fn with_min_order(mut self, min_order: usize) -> Self {
		self.min_order = min_order;
		self
	}

	/// Sets the continuation length.
	pub fn with_next_order(mut self, next_order: usize) -> Self {
		self.next_order = next_order;
		self
	}

	/// Sets the decrement between two context lengths.
	pub fn with_step_down(mut self, step_down: usize) -> Self {
		self.step_down = step_down;
		self
	}

	/// Replaces the stop characters.
	pub fn with_stop_characters<I, S>(mut self, stop_characters: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.stop_characters = stop_characters.into_iter().map(Into::into).collect();
		self
	}

	/// Checks the configuration.
	///
	/// A zero `next_order` or `step_down` would make training loop forever on
	/// the same position or order, so both are rejected up front.
	///
	/// # Errors
	/// Returns `MarkovError::Configuration` describing the first broken rule.
	pub fn validate(&self) -> Result<()> {
		if self.order == 0 {
			return Err(MarkovError::Configuration("order must be >= 1".to_owned()));
		}
		if self.next_order == 0 {
			return Err(MarkovError::Configuration("next_order must be >= 1".to_owned()));
		}
		if self.step_down == 0 {
			return Err(MarkovError::Configuration("step_down must be >= 1".to_owned()));
		}
		if self.min_order > self.order {
			return Err(MarkovError::Configuration(format!(
				"min_order ({}) must not exceed order ({})",
				self.min_order, self.order
			)));
		}
		Ok(())
	}
}
