use std::io;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, TryLockError};

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, put, web};
use env_logger::Env;
use log::{info, warn};
use serde::Deserialize;

use rs_markov_core::MarkovChain;
use rs_markov_core::io::{MODEL_EXTENSIONS, get_model_name, list_files};
use rs_markov_core::model::predictor::DEFAULT_MAX_LENGTH;
use rs_markov_core::model::pruner::DEFAULT_PRUNE_THRESHOLD;

mod config;

use config::ServerConfig;

/// Largest corpus accepted by `/v1/train`.
const TRAIN_PAYLOAD_LIMIT: usize = 256 * 1024 * 1024;

/// Model shared by every worker.
///
/// Training and loading take the write lock, predictions the read lock.
struct SharedData {
	model: RwLock<MarkovChain>,
	data_dir: PathBuf,
}

/// Takes the read lock without waiting on the worker thread.
///
/// Answers `503 Service Unavailable` while training or loading holds the write lock.
fn read_model(data: &SharedData) -> Result<RwLockReadGuard<'_, MarkovChain>, HttpResponse> {
	data.model.try_read().map_err(|e| match e {
		TryLockError::WouldBlock => HttpResponse::ServiceUnavailable().body("Model is busy"),
		TryLockError::Poisoned(_) => HttpResponse::InternalServerError().body("Model lock failed"),
	})
}

#[derive(Deserialize)]
struct NameQuery {
	name: Option<String>,
}

#[derive(Deserialize)]
struct TrainQuery {
	threshold: Option<u64>,
}

#[derive(Deserialize)]
struct PredictNextQuery {
	text: Option<String>,
}

#[derive(Deserialize)]
struct PredictQuery {
	text: Option<String>,
	count: Option<usize>,
}

#[derive(Deserialize)]
struct PredictUntilQuery {
	text: Option<String>,
	max: Option<usize>,
	stop: Option<String>, // JSON array of strings, model's stop characters if absent
}

impl NameQuery {
	/// Model name, refused if empty or if it could escape the data folder.
	fn name(&self) -> Result<&str, String> {
		match &self.name {
			Some(s) if !s.trim().is_empty() => {
				let name = s.trim();
				if name.contains(['/', '\\']) || name.starts_with('.') {
					Err(format!("Invalid model name: {name}"))
				} else {
					Ok(name)
				}
			}
			_ => Err("Missing or empty model name".to_owned()),
		}
	}
}

impl PredictUntilQuery {
	fn stop(&self) -> Result<Option<Vec<String>>, String> {
		match &self.stop {
			None => Ok(None),
			Some(s) => serde_json::from_str(s)
				.map(Some)
				.map_err(|_| "stop must be a JSON array of strings".to_owned()),
		}
	}
}

/// Finds the model file named `name` in `folder`.
fn find_model(folder: &Path, name: &str) -> io::Result<Option<PathBuf>> {
	for file in list_files(folder, &MODEL_EXTENSIONS)? {
		if get_model_name(&file)? == name {
			return Ok(Some(folder.join(file)));
		}
	}
	Ok(None)
}

/// HTTP GET endpoint `/v1/models`
///
/// Lists the model names available in the data folder.
#[get("/v1/models")]
async fn get_models(data: web::Data<SharedData>) -> impl Responder {
	let files = match list_files(&data.data_dir, &MODEL_EXTENSIONS) {
		Ok(files) => files,
		Err(_) => return HttpResponse::InternalServerError().body("Failed to list models"),
	};
	let names: Vec<String> = files.iter().filter_map(|file| get_model_name(file).ok()).collect();
	HttpResponse::Ok().body(names.join("\n"))
}

/// HTTP GET endpoint `/v1/config`
///
/// Returns the configuration of the current model as JSON.
#[get("/v1/config")]
async fn get_config(data: web::Data<SharedData>) -> impl Responder {
	let model = match read_model(&data) {
		Ok(m) => m,
		Err(response) => return response,
	};
	HttpResponse::Ok().json(model.config())
}

/// HTTP PUT endpoint `/v1/load_model`
///
/// Replaces the current model by a model file of the data folder.
/// The current model is kept if loading fails.
#[put("/v1/load_model")]
async fn put_load_model(data: web::Data<SharedData>, query: web::Query<NameQuery>) -> impl Responder {
	let name = match query.name() {
		Ok(name) => name.to_owned(),
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let path = match find_model(&data.data_dir, &name) {
		Ok(Some(path)) => path,
		Ok(None) => return HttpResponse::NotFound().body(format!("Model {name} not found")),
		Err(_) => return HttpResponse::InternalServerError().body("Failed to list models"),
	};

	let shared = data.clone();
	let loaded = web::block(move || -> Result<usize, String> {
		let model = MarkovChain::load(&path).map_err(|e| format!("Failed to load model: {e}"))?;
		let contexts = model.len();
		let mut current = shared.model.write().map_err(|_| "Model lock failed".to_owned())?;
		*current = model;
		Ok(contexts)
	})
	.await;

	match loaded {
		Ok(Ok(contexts)) => {
			info!("model {name} loaded ({contexts} contexts)");
			HttpResponse::Ok().body(format!("Model {name} loaded ({contexts} contexts)"))
		}
		Ok(Err(e)) => {
			warn!("{e}");
			HttpResponse::InternalServerError().body(e)
		}
		Err(_) => HttpResponse::InternalServerError().body("Loading was interrupted"),
	}
}

/// HTTP PUT endpoint `/v1/save_model`
///
/// Saves the current model as gzip compressed JSON in the data folder.
#[put("/v1/save_model")]
async fn put_save_model(data: web::Data<SharedData>, query: web::Query<NameQuery>) -> impl Responder {
	let name = match query.name() {
		Ok(name) => name.to_owned(),
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let path = data.data_dir.join(format!("{name}.json.gz"));

	let shared = data.clone();
	let saved = web::block(move || -> Result<(), String> {
		let model = shared.model.read().map_err(|_| "Model lock failed".to_owned())?;
		model.save(&path).map_err(|e| format!("Failed to save model: {e}"))
	})
	.await;

	match saved {
		Ok(Ok(())) => HttpResponse::Ok().body(format!("Model {name} saved")),
		Ok(Err(e)) => HttpResponse::InternalServerError().body(e),
		Err(_) => HttpResponse::InternalServerError().body("Saving was interrupted"),
	}
}

/// HTTP POST endpoint `/v1/train`
///
/// Trains the current model on the request body. Runs on the blocking pool
/// and holds the write lock for the whole run.
#[post("/v1/train")]
async fn post_train(data: web::Data<SharedData>, query: web::Query<TrainQuery>, body: String) -> impl Responder {
	let threshold = query.threshold.unwrap_or(DEFAULT_PRUNE_THRESHOLD);

	let shared = data.clone();
	let trained = web::block(move || -> Result<(usize, usize), String> {
		let mut model = shared.model.write().map_err(|_| "Model lock failed".to_owned())?;
		let report = model.train(&body, threshold);
		Ok((report.pairs, model.len()))
	})
	.await;

	match trained {
		Ok(Ok((pairs, contexts))) => HttpResponse::Ok().body(format!("Trained on {pairs} pairs, {contexts} contexts")),
		Ok(Err(e)) => HttpResponse::InternalServerError().body(e),
		Err(_) => HttpResponse::InternalServerError().body("Training was interrupted"),
	}
}

/// HTTP GET endpoint `/v1/predict_next`
///
/// Returns one continuation, or `204 No Content` when nothing can follow.
#[get("/v1/predict_next")]
async fn get_predict_next(data: web::Data<SharedData>, query: web::Query<PredictNextQuery>) -> impl Responder {
	let model = match read_model(&data) {
		Ok(m) => m,
		Err(response) => return response,
	};
	match model.predict_next(query.text.as_deref().unwrap_or_default()) {
		Some(continuation) => HttpResponse::Ok().body(continuation.to_owned()),
		None => HttpResponse::NoContent().finish(),
	}
}

/// HTTP GET endpoint `/v1/predict`
///
/// Returns up to `count` (default 1) continuations.
#[get("/v1/predict")]
async fn get_predict(data: web::Data<SharedData>, query: web::Query<PredictQuery>) -> impl Responder {
	let model = match read_model(&data) {
		Ok(m) => m,
		Err(response) => return response,
	};
	let text = query.text.as_deref().unwrap_or_default();
	HttpResponse::Ok().body(model.predict(text, query.count.unwrap_or(1)))
}

/// HTTP GET endpoint `/v1/predict_until`
///
/// Generates until a stop string, a dead end or `max` characters (prompt included).
#[get("/v1/predict_until")]
async fn get_predict_until(data: web::Data<SharedData>, query: web::Query<PredictUntilQuery>) -> impl Responder {
	let stop = match query.stop() {
		Ok(stop) => stop,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let model = match read_model(&data) {
		Ok(m) => m,
		Err(response) => return response,
	};

	let text = query.text.as_deref().unwrap_or_default();
	let max = query.max.unwrap_or(DEFAULT_MAX_LENGTH);
	let generated = match &stop {
		Some(stop) => model.predict_until_with(text, stop.as_slice(), max),
		None => model.predict_until_with(text, model.config().stop_characters.as_slice(), max),
	};
	HttpResponse::Ok().body(generated)
}

fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_models)
		.service(get_config)
		.service(put_load_model)
		.service(put_save_model)
		.service(post_train)
		.service(get_predict_next)
		.service(get_predict)
		.service(get_predict_until);
}

/// Main entry point for the server.
///
/// Starts with an empty model (default configuration), wraps it in a
/// `RwLock` and serves the `/v1` endpoints.
///
/// # Notes
/// - Bind address and data folder come from `ServerConfig::from_env`.
/// - Models are loaded with `PUT /v1/load_model?name=...`.
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

	let config = ServerConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
	let shared_data = web::Data::new(SharedData {
		model: RwLock::new(MarkovChain::default()),
		data_dir: config.data_dir.clone(),
	});

	info!("serving {} on {}:{}", config.data_dir.display(), config.host, config.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.app_data(web::PayloadConfig::new(TRAIN_PAYLOAD_LIMIT))
			.configure(configure)
	})
		.bind((config.host.as_str(), config.port))?
		.run()
		.await
}
