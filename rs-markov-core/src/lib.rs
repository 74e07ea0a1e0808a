//! Variable-order Markov text generation library.
//!
//! This crate provides a multi-resolution substring model including:
//! - Fixed-length (context, continuation) extraction over raw text
//! - Training across descending context lengths into a single store
//! - Frequency-based pruning to keep the store under a memory ceiling
//! - Weighted random prediction with order backoff
//! - Persistence to JSON (optionally gzip compressed) or postcard
//!
//! The model instance (`MarkovChain`) is the main entry point. Lower
//! level components are public so hosts can drive training and prediction
//! with their own observers and random sources.

/// Markov chain model, training, pruning and prediction.
pub mod model;

/// Error and result types shared by the crate.
pub mod error;

/// I/O utilities (model loading/saving, corpus reading, path helpers).
pub mod io;

pub use error::{MarkovError, Result};
pub use model::markov_chain::MarkovChain;
