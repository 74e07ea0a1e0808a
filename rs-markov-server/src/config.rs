use std::env;
use std::path::PathBuf;

use rs_markov_core::io::normalize_folder;

const HOST_VAR: &str = "RS_MARKOV_HOST";
const PORT_VAR: &str = "RS_MARKOV_PORT";
const DATA_VAR: &str = "RS_MARKOV_DATA";

/// Server settings, read from the environment.
///
/// | Variable | Default |
/// |---|---|
/// | `RS_MARKOV_HOST` | `127.0.0.1` |
/// | `RS_MARKOV_PORT` | `5000` |
/// | `RS_MARKOV_DATA` | `./data` |
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	/// Folder holding model files.
	pub data_dir: PathBuf,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			data_dir: PathBuf::from("./data"),
		}
	}
}

impl ServerConfig {
	/// Builds the configuration from the process environment.
	///
	/// # Errors
	/// Returns an error if `RS_MARKOV_PORT` is not a valid port number.
	pub fn from_env() -> Result<Self, String> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, String> {
		let mut config = Self::default();
		if let Some(host) = lookup(HOST_VAR) {
			config.host = host;
		}
		if let Some(port) = lookup(PORT_VAR) {
			config.port = port
				.parse()
				.map_err(|_| format!("{PORT_VAR} must be a port number, got {port:?}"))?;
		}
		if let Some(data_dir) = lookup(DATA_VAR) {
			config.data_dir = normalize_folder(&data_dir);
		}
		Ok(config)
	}
}
