use rand::SeedableRng;
use rand::rngs::StdRng;

use rs_markov_core::io::{self, ModelFormat};
use rs_markov_core::model::config::ChainConfig;
use rs_markov_core::{MarkovChain, MarkovError};

const CORPUS: &str = "It was the best of times, it was the worst of times, it was the age of wisdom, \
	it was the age of foolishness, it was the epoch of belief, it was the epoch of incredulity. \
	It was the season of Light, it was the season of Darkness!";

fn trained() -> MarkovChain {
	let config = ChainConfig::default().with_order(4).with_min_order(1).with_next_order(2);
	let mut chain = MarkovChain::new(config).unwrap();
	chain.train(CORPUS, 0);
	chain
}

fn layout(chain: &MarkovChain) -> Vec<(String, u64, Vec<(String, u64)>)> {
	chain
		.store()
		.iter()
		.map(|(context, entry)| {
			let next = entry.next().iter().map(|(k, v)| (k.clone(), *v)).collect();
			(context.to_owned(), entry.count(), next)
		})
		.collect()
}

#[test]
fn saved_models_reload_identically() {
	let chain = trained();
	let dir = tempfile::tempdir().unwrap();

	for name in ["model.json", "model.json.gz", "model.bin"] {
		let path = dir.path().join(name);
		chain.save(&path).unwrap();
		let restored = MarkovChain::load(&path).unwrap();

		assert_eq!(restored.config(), chain.config());
		assert_eq!(layout(&restored), layout(&chain), "{name}");
	}
}

#[test]
fn sampling_is_identical_after_a_round_trip() {
	let chain = trained();
	let bytes = chain.to_bytes(ModelFormat::JsonGz).unwrap();
	let restored = MarkovChain::from_bytes(&bytes, ModelFormat::JsonGz).unwrap();

	for seed in 0..20 {
		let before = chain.predictor().predict_with("It was", 30, &mut StdRng::seed_from_u64(seed));
		let after = restored.predictor().predict_with("It was", 30, &mut StdRng::seed_from_u64(seed));
		assert_eq!(before, after);
	}
}

#[test]
fn json_document_has_the_interchange_shape() {
	let chain = trained();
	let bytes = chain.to_bytes(ModelFormat::Json).unwrap();
	let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

	for field in ["order", "nextOrder", "minOrder", "stepDown", "stopCharacters", "chain"] {
		assert!(value.get(field).is_some(), "missing {field}");
	}
	let first = &value["chain"][0];
	assert!(first[0].is_string());
	assert!(first[1]["count"].is_u64());
	assert!(first[1]["next"].is_object());
}

#[test]
fn corrupted_file_is_rejected() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("broken.json");
	std::fs::write(&path, br#"{"order": 3, "nextOrder": 1, "minOrder": 1, "stopCharacters": [], "chain": [["ab", {"count": 9, "next": {"c": 1}}]]}"#).unwrap();

	assert!(matches!(MarkovChain::load(&path), Err(MarkovError::Deserialization(_))));
	assert!(matches!(MarkovChain::load(dir.path().join("missing.json")), Err(MarkovError::Io(_))));
}

#[test]
fn model_files_are_listed_by_name() {
	let chain = trained();
	let dir = tempfile::tempdir().unwrap();
	chain.save(dir.path().join("dickens.json.gz")).unwrap();
	chain.save(dir.path().join("dickens-fast.bin")).unwrap();

	let files = io::list_files(dir.path(), &io::MODEL_EXTENSIONS).unwrap();
	let names: Vec<_> = files.iter().map(|file| io::get_model_name(file).unwrap()).collect();
	assert_eq!(names, vec!["dickens-fast", "dickens"]);
}
