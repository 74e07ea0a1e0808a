//! Error types for rs-markov.

use thiserror::Error;

/// Result type alias for rs-markov operations.
pub type Result<T> = std::result::Result<T, MarkovError>;

/// Errors that can occur while building, loading or saving a model.
///
/// Training, pruning and prediction never fail: "no prediction" is an
/// `Option::None`, not an error.
#[derive(Debug, Error)]
pub enum MarkovError {
	/// The model configuration is not usable (zero lengths, `min_order > order`, ...).
	#[error("invalid configuration: {0}")]
	Configuration(String),

	/// A persisted model is malformed (bad encoding, missing fields, broken counts).
	#[error("cannot deserialize model: {0}")]
	Deserialization(String),

	/// A model could not be encoded.
	#[error("cannot serialize model: {0}")]
	Serialization(String),

	/// Underlying file system error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
