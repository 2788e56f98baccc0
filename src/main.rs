use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sportbook::config::AppConfig;
use sportbook::db;
use sportbook::handlers;
use sportbook::services::ai::fpt::FptProvider;
use sportbook::services::ai::ollama::OllamaProvider;
use sportbook::services::ai::LlmProvider;
use sportbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "fpt" => {
            anyhow::ensure!(
                !config.fpt_api_key.is_empty(),
                "FPT_API_KEY must be set when LLM_PROVIDER=fpt"
            );
            tracing::info!("using FPT LLM provider (model: {})", config.fpt_model);
            Box::new(FptProvider::new(
                config.fpt_api_key.clone(),
                config.fpt_api_url.clone(),
                config.fpt_model.clone(),
            ))
        }
        _ => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                "llama3.2".to_string(),
            ))
        }
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        llm,
        chat_sessions: Mutex::new(HashMap::new()),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/booking/bulk-create-day",
            post(handlers::bookings::bulk_create_day),
        )
        .route(
            "/api/booking/bulk-create-month",
            post(handlers::bookings::bulk_create_month),
        )
        .route(
            "/api/booking/bulk-create-range",
            post(handlers::bookings::bulk_create_range),
        )
        .route("/api/booking/available", get(handlers::bookings::available))
        .route("/api/booking/stats", get(handlers::stats::booking_stats))
        .route("/api/booking/:id/cancel", post(handlers::bookings::cancel))
        .route("/api/chat", post(handlers::chat::chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
