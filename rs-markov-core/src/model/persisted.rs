use indexmap::IndexMap;

use serde::{Deserialize, Serialize};

use super::config::{ChainConfig, DEFAULT_STEP_DOWN};
use super::entry::ChainEntry;
use super::store::ChainStore;
use crate::error::{MarkovError, Result};

fn default_step_down() -> usize {
	DEFAULT_STEP_DOWN
}

/// Persistable form of a model.
///
/// Field names follow the interchange document:
///
/// ```text
/// {
///   "order": 3, "nextOrder": 3, "minOrder": 1, "stepDown": 1,
///   "stopCharacters": [".", "!"],
///   "chain": [["abc", {"count": 2, "next": {"d": 1, "e": 1}}], ...]
/// }
/// ```
///
/// `chain` lists contexts in store order, and each `next` object keeps its
/// continuation order, so sampling behaves the same after a round trip.
/// `stepDown` may be omitted and then defaults to 1.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedModel {
	pub order: usize,
	pub next_order: usize,
	pub min_order: usize,
	#[serde(default = "default_step_down")]
	pub step_down: usize,
	pub stop_characters: Vec<String>,
	pub chain: Vec<(String, ChainEntry)>,
}

impl PersistedModel {
	/// Snapshots a configuration and a store.
	pub fn new(config: &ChainConfig, store: &ChainStore) -> Self {
		Self {
			order: config.order,
			next_order: config.next_order,
			min_order: config.min_order,
			step_down: config.step_down,
			stop_characters: config.stop_characters.clone(),
			chain: store
				.iter()
				.map(|(context, entry)| (context.to_owned(), entry.clone()))
				.collect(),
		}
	}

	/// Configuration fields of the document.
	pub fn config(&self) -> ChainConfig {
		ChainConfig {
			order: self.order,
			min_order: self.min_order,
			next_order: self.next_order,
			step_down: self.step_down,
			stop_characters: self.stop_characters.clone(),
		}
	}

	/// Checks and splits the document into a configuration and a store.
	///
	/// Nothing is built unless the whole document is valid.
	///
	/// # Errors
	/// `MarkovError::Deserialization` if the configuration is invalid, a
	/// context appears twice, or an entry's count differs from the sum of
	/// its continuations.
	pub fn into_parts(self) -> Result<(ChainConfig, ChainStore)> {
		let config = self.config();
		config
			.validate()
			.map_err(|e| MarkovError::Deserialization(e.to_string()))?;

		let mut entries = IndexMap::with_capacity(self.chain.len());
		for (context, entry) in self.chain {
			if !entry.is_consistent() {
				return Err(MarkovError::Deserialization(format!(
					"context {:?}: count {} does not match its continuations",
					context,
					entry.count()
				)));
			}
			if entries.contains_key(&context) {
				return Err(MarkovError::Deserialization(format!("duplicate context {:?}", context)));
			}
			entries.insert(context, entry);
		}

		Ok((config, ChainStore::from_entries(entries)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn document() -> &'static str {
		r#"{
			"order": 2,
			"nextOrder": 1,
			"minOrder": 1,
			"stepDown": 1,
			"stopCharacters": [".", "  "],
			"chain": [
				["ab", {"count": 3, "next": {"c": 2, "a": 1}}],
				["b", {"count": 1, "next": {"c": 1}}]
			]
		}"#
	}

	#[test]
	fn reads_the_interchange_document() {
		let persisted: PersistedModel = serde_json::from_str(document()).unwrap();
		let (config, store) = persisted.into_parts().unwrap();

		assert_eq!(config.order, 2);
		assert_eq!(config.stop_characters, vec![".", "  "]);
		let ab = store.get("ab").unwrap();
		let order: Vec<_> = ab.next().keys().cloned().collect();
		assert_eq!(order, vec!["c", "a"]);
		assert_eq!(ab.count(), 3);
	}

	#[test]
	fn writes_camel_case_fields_and_pairs() {
		let persisted: PersistedModel = serde_json::from_str(document()).unwrap();
		let value = serde_json::to_value(&persisted).unwrap();

		assert_eq!(value["nextOrder"], 1);
		assert_eq!(value["stepDown"], 1);
		assert_eq!(value["chain"][0][0], "ab");
		assert_eq!(value["chain"][0][1]["next"]["a"], 1);
	}

	#[test]
	fn step_down_defaults_to_one() {
		let json = r#"{"order": 3, "nextOrder": 1, "minOrder": 1, "stopCharacters": [], "chain": []}"#;
		let persisted: PersistedModel = serde_json::from_str(json).unwrap();
		assert_eq!(persisted.step_down, 1);
	}

	#[test]
	fn rejects_negative_counts_and_missing_fields() {
		let negative = document().replace("\"count\": 1", "\"count\": -1");
		assert!(serde_json::from_str::<PersistedModel>(&negative).is_err());

		let missing = r#"{"order": 3, "minOrder": 1, "stopCharacters": [], "chain": []}"#;
		assert!(serde_json::from_str::<PersistedModel>(missing).is_err());
	}

	#[test]
	fn rejects_inconsistent_counts() {
		let broken = document().replace("\"count\": 3", "\"count\": 4");
		let persisted: PersistedModel = serde_json::from_str(&broken).unwrap();
		assert!(matches!(persisted.into_parts(), Err(MarkovError::Deserialization(_))));
	}

	#[test]
	fn rejects_counts_that_overflow() {
		let json = r#"{"order": 1, "nextOrder": 1, "minOrder": 1, "stopCharacters": [],
			"chain": [["a", {"count": 1, "next": {"x": 18446744073709551615, "y": 2}}]]}"#;
		let persisted: PersistedModel = serde_json::from_str(json).unwrap();
		assert!(matches!(persisted.into_parts(), Err(MarkovError::Deserialization(_))));
	}

	#[test]
	fn rejects_duplicate_contexts() {
		let duplicated = document().replace("[\"b\",", "[\"ab\",");
		let persisted: PersistedModel = serde_json::from_str(&duplicated).unwrap();
		assert!(matches!(persisted.into_parts(), Err(MarkovError::Deserialization(_))));
	}

	#[test]
	fn rejects_invalid_configuration() {
		let broken = document().replace("\"minOrder\": 1", "\"minOrder\": 5");
		let persisted: PersistedModel = serde_json::from_str(&broken).unwrap();
		assert!(matches!(persisted.into_parts(), Err(MarkovError::Deserialization(_))));
	}
}
