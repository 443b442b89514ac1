use actix_cors::Cors;
use actix_web::{App, HttpServer};
use backend::analysis::{AnalysisService, GeminiClient};
use backend::config::AppConfig;
use backend::routes::configure_routes;
use backend::{spawn_janitor, AppState};
use std::env;
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    if config.api_key.is_none() {
        log::warn!("GEMINI_API_KEY not set. The application may not function correctly.");
    }

    let gemini = GeminiClient::from_config(&config).map_err(|e| {
        log::error!("Failed to build Gemini client: {}", e);
        std::io::Error::other(format!("Gemini client error: {}", e))
    })?;
    log::info!("Using model {}", gemini.model());

    let state = AppState::new(&config, AnalysisService::new(Arc::new(gemini)));
    state.uploads.ensure_dir().await.map_err(std::io::Error::other)?;
    log::info!("Uploads stored in {}", state.uploads.upload_dir().display());

    let sweep_every = Duration::from_secs((config.result_ttl_secs / 4).max(60));
    spawn_janitor(state.sessions.clone(), state.uploads.clone(), sweep_every);

    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .configure(|cfg| {
                state.configure(cfg);
                configure_routes(cfg, static_dir.clone());
            })
    })
    .bind(&bind_address)?
    .run()
    .await
}
