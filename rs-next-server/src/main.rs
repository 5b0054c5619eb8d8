use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use rs_next_core::config::AdaptiveSettings;
use rs_next_core::config::ServerSettings;
use rs_next_core::io::{history_path, list_histories, History};
use rs_next_core::model::EligibilityFrequencyModel;
use rs_next_core::{ModelKind, PredictError, PredictResult, PredictionModel, Settings};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Query parameters for the `/v1/predict` endpoint
#[derive(Deserialize)]
struct PredictParams {
	model: Option<String>,
	context: String,
	n: Option<usize>,
}

#[derive(Deserialize)]
struct ObserveQuery {
	symbol: Option<String>,
}

/// Query parameters for the `/v1/rank` endpoint
///
/// `eligible` is a comma separated list of currently invocable symbols;
/// without it every symbol is eligible. Listed symbols become known to the
/// model, so they are ranked even before their first use.
#[derive(Deserialize)]
struct RankParams {
	eligible: Option<String>,
	limit: Option<usize>,
}

#[derive(Deserialize)]
struct HistoryQuery {
	name: Option<String>,
}

/// Models owned by the service. Every observed symbol reaches all of them.
struct SharedData {
	adaptive: AdaptiveSettings,
	data_dir: PathBuf,
	default_model: ModelKind,
	models: HashMap<ModelKind, Box<dyn PredictionModel + Send>>,
	eligibility: EligibilityFrequencyModel,
}

impl SharedData {
	fn new(adaptive: AdaptiveSettings, server: &ServerSettings) -> PredictResult<Self> {
		let mut shared_data = Self {
			adaptive,
			data_dir: server.data_dir.clone(),
			default_model: server.default_model,
			models: HashMap::new(),
			eligibility: EligibilityFrequencyModel::new(),
		};
		shared_data.reset()?;
		Ok(shared_data)
	}

	/// Replaces every model with an empty one.
	fn reset(&mut self) -> PredictResult<()> {
		self.models.clear();
		for kind in ModelKind::ALL {
			if kind != ModelKind::Eligibility {
				self.models.insert(kind, kind.build(&self.adaptive)?);
			}
		}
		self.eligibility = EligibilityFrequencyModel::new();
		Ok(())
	}

	fn observe(&mut self, symbol: &str) {
		for model in self.models.values_mut() {
			model.update(symbol);
		}
		self.eligibility.update(symbol);
	}

	fn model(&self, kind: ModelKind) -> Option<&dyn PredictionModel> {
		match kind {
			ModelKind::Eligibility => Some(&self.eligibility),
			kind => self.models.get(&kind).map(|model| &**model as &dyn PredictionModel),
		}
	}
}

/// HTTP GET endpoint `/v1/models`
#[get("/v1/models")]
async fn get_models() -> impl Responder {
	let names: Vec<&str> = ModelKind::ALL.iter().map(ModelKind::as_str).collect();
	HttpResponse::Ok().body(names.join("\n"))
}

/// HTTP PUT endpoint `/v1/observe`
///
/// Feeds one observed symbol to every model.
#[put("/v1/observe")]
async fn put_observe(data: web::Data<Mutex<SharedData>>, query: web::Query<ObserveQuery>) -> impl Responder {
	let symbol = match &query.symbol {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty symbol"),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.observe(symbol);
	HttpResponse::Ok().finish()
}

/// HTTP GET endpoint `/v1/predict`
///
/// Returns up to `n` (default 3) symbols likely to follow `context`, one per line.
/// Without `model`, the configured default model answers.
#[get("/v1/predict")]
async fn get_predict(data: web::Data<Mutex<SharedData>>, query: web::Query<PredictParams>) -> impl Responder {
	let n = query.n.unwrap_or(3);

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let kind = match query.model.as_deref().map(str::parse::<ModelKind>) {
		None => shared_data.default_model,
		Some(Ok(kind)) => kind,
		Some(Err(e)) => return HttpResponse::BadRequest().body(e.to_string()),
	};
	match shared_data.model(kind) {
		Some(model) => HttpResponse::Ok().body(model.predict(&query.context, n).join("\n")),
		None => HttpResponse::InternalServerError().body(format!("Model {kind} not loaded")),
	}
}

/// HTTP GET endpoint `/v1/rank`
///
/// Ranks every known symbol after the last observed one, eligible first.
/// Each line is `symbol<TAB>rating`.
#[get("/v1/rank")]
async fn get_rank(data: web::Data<Mutex<SharedData>>, query: web::Query<RankParams>) -> impl Responder {
	// Listed order decides discovery order for symbols seen here first
	let listed: Option<Vec<&str>> = query.eligible.as_deref().map(|list| {
		list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
	});

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	if let Some(listed) = &listed {
		shared_data.eligibility.register_known(listed);
	}
	let eligible: Option<HashSet<&str>> = listed.map(|listed| listed.into_iter().collect());
	let ranking = shared_data.eligibility.rank(|symbol| {
		eligible.as_ref().is_none_or(|eligible| eligible.contains(symbol))
	});

	let lines: Vec<String> = ranking
		.take(query.limit.unwrap_or(usize::MAX))
		.map(|ranked| format!("{}\t{}", ranked.symbol, ranked.rating))
		.collect();
	HttpResponse::Ok().body(lines.join("\n"))
}

/// HTTP GET endpoint `/v1/histories`
///
/// Lists the histories available in the data directory.
#[get("/v1/histories")]
async fn get_histories(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let data_dir = match data.lock() {
		Ok(m) => m.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match list_histories(&data_dir) {
		Ok(names) => HttpResponse::Ok().body(names.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list histories"),
	}
}

/// HTTP PUT endpoint `/v1/load_history`
///
/// Resets every model and trains it on `<data_dir>/<name>.txt`.
#[put("/v1/load_history")]
async fn put_load_history(data: web::Data<Mutex<SharedData>>, query: web::Query<HistoryQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty history name"),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let path = match history_path(&shared_data.data_dir, name) {
		Ok(path) => path,
		Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
	};
	let history = match History::load(&path, true) {
		Ok(history) => history,
		Err(PredictError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
			return HttpResponse::NotFound().body(format!("No history named {name}"));
		}
		Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load history: {e}")),
	};

	if let Err(e) = shared_data.reset() {
		return HttpResponse::InternalServerError().body(format!("Failed to reset models: {e}"));
	}
	for symbol in history.symbols() {
		shared_data.observe(symbol);
	}
	tracing::info!(name, symbols = history.len(), "history loaded");

	HttpResponse::Ok().body(format!("Trained on {} symbols", history.len()))
}

/// Registers every `/v1` route.
fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_models)
		.service(put_observe)
		.service(get_predict)
		.service(get_rank)
		.service(get_histories)
		.service(put_load_history);
}

/// Main entry point for the server.
///
/// Reads settings from `$RS_NEXT_CONFIG` or `rs-next.toml` when present,
/// wraps the models in a `Mutex` and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> io::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config_path = std::env::var("RS_NEXT_CONFIG").unwrap_or_else(|_| "rs-next.toml".to_owned());
	let settings = if Path::new(&config_path).exists() {
		Settings::load(&config_path).map_err(io::Error::other)?
	} else {
		Settings::default()
	};

	let shared_data = SharedData::new(settings.adaptive.clone(), &settings.server).map_err(io::Error::other)?;
	let shared_models = web::Data::new(Mutex::new(shared_data));

	let host = settings.server.host.clone();
	let port = settings.server.port;
	tracing::info!(host = %host, port, "prediction service starting");

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET", "PUT"]))
			.app_data(shared_models.clone())
			.configure(routes)
	})
		.bind((host.as_str(), port))?
		.run()
		.await
}
