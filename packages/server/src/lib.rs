#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the Bengaluru area dashboard.
//!
//! Serves the area endpoints from the static dataset loaded at startup,
//! the salary and rent distributions from third-party sources, and the
//! chat assistant via SSE streaming from `/api/chat/completions`.

mod chat;
pub mod error;
mod handlers;
pub mod interactive;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use area_insights_ai::providers::{LlmProvider, create_provider_from_env};
use area_insights_area::dataset::Dataset;
use area_insights_area::summary::{SummaryClient, WikipediaClient};
use area_insights_chat::config::ChatConfig;
use area_insights_market::rent::RentService;
use area_insights_market::salary::SalaryService;

pub use area_insights_area::dataset::DEFAULT_DATA_DIR;

/// Shared application state.
pub struct AppState {
    /// Static area tables, read-only after startup.
    pub dataset: Arc<Dataset>,
    /// Encyclopedia summaries for unserved areas.
    pub summaries: Arc<dyn SummaryClient>,
    /// Completion service. `None` disables the chat endpoints.
    pub provider: Option<Arc<dyn LlmProvider>>,
    /// Prompts and limits for the chat assistant.
    pub chat: Arc<ChatConfig>,
    /// Salary distributions.
    pub salary: SalaryService,
    /// Rent distributions.
    pub rent: RentService,
}

/// Registers the `/api` routes and the JSON body configuration.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(error::json_config())
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .service(
                    web::scope("/areas")
                        .route("/allAreas", web::get().to(handlers::all_areas))
                        .route("/served", web::get().to(handlers::served_areas))
                        .route(
                            "/servedArea-with-data",
                            web::get().to(handlers::served_with_data),
                        )
                        .route(
                            "/area-stats/{pinCode}",
                            web::get().to(handlers::area_stats),
                        )
                        .route("/getSalary", web::post().to(handlers::salary))
                        .route("/getRentPrice", web::post().to(handlers::rent_price)),
                )
                .service(
                    web::scope("/chat")
                        .route("/completions", web::post().to(chat::completions))
                        .route("/summarise", web::post().to(chat::summarise)),
                ),
        )
        .default_service(web::to(handlers::not_found));
}

/// Reads the data directory from `AREA_DATA_DIR`, defaulting to
/// [`DEFAULT_DATA_DIR`].
#[must_use]
pub fn data_dir_from_env() -> PathBuf {
    std::env::var("AREA_DATA_DIR").map_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from)
}

/// Builds the application state from the dataset in `data_dir` and the
/// environment.
///
/// A missing completion-service key only disables the chat endpoints.
///
/// # Errors
///
/// Returns an `std::io::Error` if the dataset cannot be loaded or an HTTP
/// client cannot be built.
pub fn state_from_env(data_dir: &std::path::Path) -> std::io::Result<AppState> {
    log::info!("Loading area dataset from {}...", data_dir.display());
    let dataset = Dataset::load_from_dir(data_dir).map_err(std::io::Error::other)?;

    let summaries = WikipediaClient::from_env().map_err(std::io::Error::other)?;
    let chat = ChatConfig::from_env();

    let provider = match create_provider_from_env(&chat.models) {
        Ok(provider) => Some(Arc::from(provider)),
        Err(e) => {
            log::warn!("Chat endpoints disabled: {e}");
            None
        }
    };

    Ok(AppState {
        dataset: Arc::new(dataset),
        summaries: Arc::new(summaries),
        provider,
        chat: Arc::new(chat),
        salary: SalaryService::from_env().map_err(std::io::Error::other)?,
        rent: RentService::from_env().map_err(std::io::Error::other)?,
    })
}

/// Starts the area dashboard API server.
///
/// Loads the dataset from `data_dir`, connects the external services
/// configured in the environment and starts the Actix-Web HTTP server.
/// The caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset cannot be loaded, or
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(data_dir: PathBuf) -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let state = web::Data::new(state_from_env(&data_dir)?);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let cors_origin = std::env::var("CORS_ORIGIN").ok();

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = cors_origin.as_deref().map_or_else(Cors::permissive, |origin| {
            Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
        });

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
