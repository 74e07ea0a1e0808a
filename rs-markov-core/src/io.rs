use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::{MarkovError, Result};
use crate::model::persisted::PersistedModel;

/// Extensions recognised as model files.
pub const MODEL_EXTENSIONS: [&str; 3] = ["json", "gz", "bin"];

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Encoding of a persisted model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelFormat {
	/// Plain JSON document.
	Json,
	/// Gzip compressed JSON document.
	JsonGz,
	/// Compact postcard binary.
	Postcard,
}

impl ModelFormat {
	/// Picks the format from the file extension.
	///
	/// - `.bin` → `Postcard`
	/// - `.gz` → `JsonGz`
	/// - anything else → `Json`
	pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
		match path.as_ref().extension().and_then(OsStr::to_str) {
			Some("bin") => ModelFormat::Postcard,
			Some("gz") => ModelFormat::JsonGz,
			_ => ModelFormat::Json,
		}
	}
}

/// Encodes a model.
pub fn encode(model: &PersistedModel, format: ModelFormat) -> Result<Vec<u8>> {
	match format {
		ModelFormat::Json => serde_json::to_vec(model).map_err(|e| MarkovError::Serialization(e.to_string())),
		ModelFormat::JsonGz => {
			let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
			serde_json::to_writer(&mut encoder, model).map_err(|e| MarkovError::Serialization(e.to_string()))?;
			Ok(encoder.finish()?)
		}
		ModelFormat::Postcard => postcard::to_stdvec(model).map_err(|e| MarkovError::Serialization(e.to_string())),
	}
}

/// Decodes a model.
///
/// JSON input is gunzipped first when it starts with the gzip magic bytes,
/// whatever `format` says, so `.json` and `.json.gz` load the same way.
///
/// # Errors
/// Any malformed input is `MarkovError::Deserialization`.
pub fn decode(bytes: &[u8], format: ModelFormat) -> Result<PersistedModel> {
	let decoded = match format {
		ModelFormat::Postcard => postcard::from_bytes(bytes).map_err(|e| e.to_string()),
		ModelFormat::Json | ModelFormat::JsonGz if bytes.starts_with(&GZIP_MAGIC) => {
			serde_json::from_reader(BufReader::new(GzDecoder::new(bytes))).map_err(|e| e.to_string())
		}
		ModelFormat::Json | ModelFormat::JsonGz => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
	};
	decoded.map_err(MarkovError::Deserialization)
}

/// Loads a model file, choosing the format from its extension.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<PersistedModel> {
	let bytes = fs::read(&path)?;
	decode(&bytes, ModelFormat::from_path(&path))
}

/// Writes a model file.
pub fn save_model<P: AsRef<Path>>(path: P, model: &PersistedModel, format: ModelFormat) -> Result<()> {
	let bytes = encode(model, format)?;
	let mut writer = BufWriter::new(File::create(path)?);
	writer.write_all(&bytes)?;
	writer.flush()?;
	Ok(())
}

/// Reads a whole text corpus.
pub fn read_text<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"json.gz"` → `data/input.json.gz`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the model name of a file: its file name without any model extension.
///
/// Examples:
/// - `"./data/shakespeare.json.gz"` → `"shakespeare"`
/// - `"model.bin"` → `"model"`
pub fn get_model_name<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let mut name = input_path
		.as_ref()
		.file_name()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?
		.to_string_lossy()
		.to_string();

	while let Some((stem, extension)) = name.rsplit_once('.') {
		if stem.is_empty() || !MODEL_EXTENSIONS.contains(&extension) {
			break;
		}
		name.truncate(stem.len());
	}
	Ok(name)
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with one of the given extensions in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if !path.is_file() {
			continue;
		}
		let matches = path
			.extension()
			.and_then(OsStr::to_str)
			.is_some_and(|extension| extensions.contains(&extension));
		if matches {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn model() -> PersistedModel {
		serde_json::from_str(
			r#"{"order": 2, "nextOrder": 1, "minOrder": 1, "stepDown": 1, "stopCharacters": ["."],
			"chain": [["ab", {"count": 2, "next": {"c": 1, "a": 1}}]]}"#,
		)
		.unwrap()
	}

	#[test]
	fn format_follows_extension() {
		assert_eq!(ModelFormat::from_path("a/model.bin"), ModelFormat::Postcard);
		assert_eq!(ModelFormat::from_path("a/model.json.gz"), ModelFormat::JsonGz);
		assert_eq!(ModelFormat::from_path("a/model.json"), ModelFormat::Json);
		assert_eq!(ModelFormat::from_path("model"), ModelFormat::Json);
	}

	#[test]
	fn every_format_decodes_what_it_encodes() {
		for format in [ModelFormat::Json, ModelFormat::JsonGz, ModelFormat::Postcard] {
			let bytes = encode(&model(), format).unwrap();
			assert_eq!(decode(&bytes, format).unwrap(), model());
		}
	}

	#[test]
	fn compressed_json_is_sniffed() {
		let bytes = encode(&model(), ModelFormat::JsonGz).unwrap();
		assert!(bytes.starts_with(&GZIP_MAGIC));
		assert_eq!(decode(&bytes, ModelFormat::Json).unwrap(), model());
	}

	#[test]
	fn garbage_is_a_deserialization_error() {
		for format in [ModelFormat::Json, ModelFormat::JsonGz, ModelFormat::Postcard] {
			assert!(matches!(decode(b"\x1f\x8bnot a model", format), Err(MarkovError::Deserialization(_))));
			assert!(matches!(decode(b"{\"order\": 1}", format), Err(MarkovError::Deserialization(_))));
		}
	}

	#[test]
	fn output_path_and_model_name() {
		let path = build_output_path("data/input.txt", "json.gz").unwrap();
		assert_eq!(path, PathBuf::from("data/input.json.gz"));
		assert_eq!(get_model_name(&path).unwrap(), "input");
		assert_eq!(get_model_name("model.bin").unwrap(), "model");
		assert_eq!(get_model_name("my.corpus.json").unwrap(), "my.corpus");
	}

	#[test]
	fn lists_model_files_only() {
		let dir = tempfile::tempdir().unwrap();
		for name in ["b.json.gz", "a.bin", "notes.txt", "c.json"] {
			fs::write(dir.path().join(name), b"").unwrap();
		}
		let files = list_files(dir.path(), &MODEL_EXTENSIONS).unwrap();
		assert_eq!(files, vec!["a.bin", "b.json.gz", "c.json"]);
	}
}
