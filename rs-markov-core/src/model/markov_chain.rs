use std::path::Path;

use log::info;

use super::config::ChainConfig;
use super::persisted::PersistedModel;
use super::predictor::{DEFAULT_MAX_LENGTH, Predictor};
use super::pruner::PruneReport;
use super::store::ChainStore;
use super::trainer::{TrainReport, Trainer};
use crate::error::Result;
use crate::io::{self, ModelFormat};

/// A variable-order Markov chain over raw text.
///
/// The model owns its configuration and its `ChainStore`:
/// - training mutates the store in place (one caller at a time)
/// - prediction only reads it, so `&MarkovChain` can be shared by readers
///   as long as nobody trains concurrently
///
/// # Invariants
/// - the configuration is valid (checked at construction and on load)
/// - every entry of the store satisfies `count == sum(next)`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkovChain {
	config: ChainConfig,
	store: ChainStore,
}

impl MarkovChain {
	/// Creates an empty model.
	///
	/// # Errors
	/// Returns `MarkovError::Configuration` if `config` is invalid.
	pub fn new(config: ChainConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { config, store: ChainStore::new() })
	}

	pub fn config(&self) -> &ChainConfig {
		&self.config
	}

	pub fn store(&self) -> &ChainStore {
		&self.store
	}

	/// Number of distinct contexts held by the model.
	pub fn len(&self) -> usize {
		self.store.len()
	}

	pub fn is_empty(&self) -> bool {
		self.store.is_empty()
	}

	/// Returns a trainer writing into this model, for callers that need
	/// custom observers or a different context budget.
	pub fn trainer(&mut self, prune_threshold: u64) -> Trainer<'_> {
		Trainer::new(&mut self.store, &self.config, prune_threshold)
	}

	/// Trains on `text` from the configured order down to `min_order`.
	pub fn train(&mut self, text: &str, prune_threshold: u64) -> TrainReport {
		self.trainer(prune_threshold).train(text)
	}

	/// Trains on `text` starting at `order` with continuations of `continuation_len`.
	pub fn train_from(&mut self, text: &str, prune_threshold: u64, order: usize, continuation_len: usize) -> TrainReport {
		self.trainer(prune_threshold).train_from(text, order, continuation_len)
	}

	/// Prunes the model (see `Pruner`).
	pub fn clean_up(&mut self, threshold: u64) -> PruneReport {
		self.store.clean_up(threshold)
	}

	/// Returns a read-only sampler over this model.
	pub fn predictor(&self) -> Predictor<'_> {
		Predictor::new(&self.store, &self.config)
	}

	/// Draws one continuation for `text`, or `None` when backoff is exhausted.
	pub fn predict_next(&self, text: &str) -> Option<&str> {
		self.predictor().predict_next(text)
	}

	/// Draws one continuation for `text`, starting the backoff at `order`.
	pub fn predict_next_from(&self, text: &str, order: usize) -> Option<&str> {
		self.predictor().predict_next_from(text, order, &mut rand::rng())
	}

	/// Generates up to `count` continuations and returns them.
	pub fn predict(&self, text: &str, count: usize) -> String {
		self.predictor().predict(text, count)
	}

	/// Generates until one of the model's stop characters, a dead end, or
	/// `DEFAULT_MAX_LENGTH` characters.
	pub fn predict_until(&self, text: &str) -> String {
		self.predictor()
			.predict_until(text, self.config.stop_characters.as_slice(), DEFAULT_MAX_LENGTH)
	}

	/// Generates until one of `stop`, a dead end, or `max_length` characters.
	pub fn predict_until_with<S: AsRef<str>>(&self, text: &str, stop: &[S], max_length: usize) -> String {
		self.predictor().predict_until(text, stop, max_length)
	}

	/// Snapshots the model into its persistable form.
	pub fn to_persisted(&self) -> PersistedModel {
		PersistedModel::new(&self.config, &self.store)
	}

	/// Rebuilds a model from its persistable form, keeping every ordering.
	///
	/// # Errors
	/// Returns `MarkovError::Deserialization` if the document is malformed.
	pub fn from_persisted(data: PersistedModel) -> Result<Self> {
		let (config, store) = data.into_parts()?;
		Ok(Self { config, store })
	}

	/// Encodes the model.
	pub fn to_bytes(&self, format: ModelFormat) -> Result<Vec<u8>> {
		io::encode(&self.to_persisted(), format)
	}

	/// Decodes a model.
	pub fn from_bytes(bytes: &[u8], format: ModelFormat) -> Result<Self> {
		Self::from_persisted(io::decode(bytes, format)?)
	}

	/// Saves the model, choosing the format from the file extension.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let format = ModelFormat::from_path(&path);
		io::save_model(&path, &self.to_persisted(), format)?;
		info!("saved {} contexts to {}", self.len(), path.as_ref().display());
		Ok(())
	}

	/// Loads a model, choosing the format from the file extension.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let model = Self::from_persisted(io::load_model(&path)?)?;
		info!("loaded {} contexts from {}", model.len(), path.as_ref().display());
		Ok(model)
	}
}
