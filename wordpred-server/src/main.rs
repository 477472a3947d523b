use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};

use serde::{Deserialize, Serialize};
use wordpred_core::io::{Artifact, artifact_path, list_files, normalize_folder};
use wordpred_core::model::sequence::arg_max;
use wordpred_core::model::{BackoffModel, NgramContinuation, Predictor};
use wordpred_core::text::Language;

/// Model directory, overridable with `WORDPRED_MODEL_DIR`
const MODEL_DIR: &str = "./models";
const MODEL_DIR_ENV: &str = "WORDPRED_MODEL_DIR";
const BACKOFF_SUFFIX: &str = "_backoff.json";

/// Upper bound for `limit` and `raw_limit`
const MAX_SUGGESTIONS: usize = 50;
/// Upper bound for `continuation_words`
const MAX_CONTINUATION_WORDS: usize = 10;

/// Query parameters of the `/v1/suggest` endpoint
#[derive(Deserialize)]
struct SuggestParams {
	lang: Option<String>,
	prefix: String,
	/// Category predicted upstream
	category: Option<String>,
	/// Raw classifier scores, `Needs:0.2,Feelings:0.7`; used when `category` is absent
	scores: Option<String>,
	limit: Option<usize>,
	raw_limit: Option<usize>,
	continuation_words: Option<usize>,
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
}

#[derive(Serialize)]
struct SuggestResponse {
	language: Language,
	category: Option<String>,
	raw: Vec<String>,
	suggestions: Vec<String>,
}

struct SharedData {
	model_dir: PathBuf,
	models: HashMap<Language, BackoffModel>,
}

/// `raw_limit`, `limit` and `continuation_words` after defaults and clamping.
#[derive(Debug, PartialEq)]
struct Limits {
	raw: usize,
	suggestions: usize,
	continuation_words: usize,
}

impl SuggestParams {
	fn limits(&self) -> Limits {
		Limits {
			raw: self.raw_limit.unwrap_or(8).min(MAX_SUGGESTIONS),
			suggestions: self.limit.unwrap_or(5).min(MAX_SUGGESTIONS),
			continuation_words: self.continuation_words.unwrap_or(3).min(MAX_CONTINUATION_WORDS),
		}
	}

	fn language(&self) -> Result<Language, String> {
		self.lang.as_deref().unwrap_or("en").parse().map_err(|e| format!("{e}"))
	}

	/// Explicit category first, else the arg-max of the given scores.
	fn category(&self) -> Result<Option<String>, String> {
		if let Some(category) = self.category.as_deref().filter(|c| !c.trim().is_empty()) {
			return Ok(Some(category.trim().to_owned()));
		}
		let Some(scores) = &self.scores else { return Ok(None) };

		let parsed = scores
			.split(',')
			.filter(|s| !s.trim().is_empty())
			.map(|entry| {
				let (label, score) = entry.split_once(':').ok_or_else(|| format!("Malformed score entry: {entry}"))?;
				let score: f64 = score.trim().parse().map_err(|_| format!("Score must be a number: {entry}"))?;
				Ok((label.trim().to_owned(), score))
			})
			.collect::<Result<Vec<(String, f64)>, String>>()?;

		Ok(arg_max(&parsed).map(str::to_owned))
	}
}

fn load_language(model_dir: &Path, lang: Language) -> Result<BackoffModel, String> {
	BackoffModel::load(artifact_path(model_dir, lang, Artifact::Backoff)).map_err(|e| format!("Failed to load model '{lang}': {e}"))
}

/// HTTP GET endpoint `/v1/suggest`
///
/// Fuses n-gram continuation and backoff candidates for the prefix, then
/// reranks them with the predicted category.
#[get("/v1/suggest")]
async fn get_suggestions(data: web::Data<Mutex<SharedData>>, query: web::Query<SuggestParams>) -> impl Responder {
	let lang = match query.language() {
		Ok(lang) => lang,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let category = match query.category() {
		Ok(category) => category,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let Some(backoff) = shared_data.models.get(&lang) else {
		return HttpResponse::NotFound().body(format!("No model loaded for '{lang}'"));
	};

	let limits = query.limits();
	let sequence_model = NgramContinuation::new(backoff, limits.continuation_words);
	let predictor = Predictor::new(&sequence_model, backoff, lang);
	let prediction = predictor.suggest(&query.prefix, category.as_deref(), limits.raw, limits.suggestions);

	HttpResponse::Ok().json(SuggestResponse { language: lang, category, raw: prediction.raw, suggestions: prediction.suggestions })
}

#[get("/v1/models")]
async fn get_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let model_dir = match data.lock() {
		Ok(m) => m.model_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match list_files(&model_dir, "json") {
		Ok(files) => {
			let names: Vec<&str> = files.iter().filter_map(|f| f.strip_suffix(BACKOFF_SUFFIX)).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models"),
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let mut names: Vec<&str> = shared_data.models.keys().map(|lang| lang.tag()).collect();
	names.sort();
	HttpResponse::Ok().body(names.join("\n"))
}

#[put("/v1/load_models")]
async fn put_model(data: web::Data<Mutex<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let mut models = HashMap::new();
	for name in query_names.split(',').map(str::trim).filter(|s| !s.is_empty()) {
		let lang: Language = match name.parse() {
			Ok(lang) => lang,
			Err(e) => return HttpResponse::BadRequest().body(format!("{e}")),
		};
		match load_language(&shared_data.model_dir, lang) {
			Ok(model) => {
				models.insert(lang, model);
			}
			Err(e) => return HttpResponse::InternalServerError().body(e),
		}
	}

	shared_data.models = models;
	HttpResponse::Ok().body("Models loaded successfully")
}

/// Main entry point for the server.
///
/// Loads the backoff artifacts found in the model directory, wraps them in a
/// `Mutex` and starts an Actix-web HTTP server.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - The model directory is `$WORDPRED_MODEL_DIR`, or `./models`; `.` means
///   the working directory.
/// - Languages without artifacts can be loaded later with `PUT /v1/load_models`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let model_dir = normalize_folder(&std::env::var(MODEL_DIR_ENV).unwrap_or_else(|_| MODEL_DIR.to_owned()));
	log::info!("Model directory: {}", model_dir.display());
	let mut models = HashMap::new();
	for lang in [Language::English, Language::Hebrew] {
		match load_language(&model_dir, lang) {
			Ok(model) => {
				log::info!("Loaded backoff model for '{lang}' (max_context={})", model.max_context());
				models.insert(lang, model);
			}
			Err(e) => log::warn!("{e}"),
		}
	}

	let shared_data = web::Data::new(Mutex::new(SharedData { model_dir, models }));

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_suggestions)
			.service(get_models)
			.service(get_loaded_models)
			.service(put_model)
	})
	.bind(("127.0.0.1", 5000))?
	.run()
	.await
}
