//! Top-level module for the Markov chain model.
//!
//! This module provides a multi-resolution substring model, including:
//! - Model configuration (`ChainConfig`)
//! - (context, continuation) extraction (`Ngrams`)
//! - Per-context statistics (`ChainEntry`) and the context table (`ChainStore`)
//! - Training passes (`Trainer`), pruning (`Pruner`) and sampling (`Predictor`)
//! - The persisted representation (`PersistedModel`)
//! - The model instance tying it all together (`MarkovChain`)

/// Immutable per-model configuration and its validation rules.
pub mod config;

/// Lazy (context, continuation) pair extraction over raw text.
pub mod ngram;

/// Statistics recorded for a single context string.
///
/// Tracks the total observation count and per-continuation counts
/// in insertion order, and supports weighted random sampling.
pub mod entry;

/// Multi-resolution context table.
pub mod store;

/// Frequency-based pruning of the context table.
pub mod pruner;

/// Training driver across descending context lengths.
pub mod trainer;

/// Order-backoff lookup and weighted sampling.
pub mod predictor;

/// Progress and memory reclaim observers used during training and pruning.
pub mod observer;

/// Persistable structure of a model.
pub mod persisted;

/// The model instance.
pub mod markov_chain;
