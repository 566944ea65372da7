mod constants;
mod error;
mod handlers;
mod models;
mod services;
mod utils;

use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use log::{error, info};
use tower_http::{compression::CompressionLayer, cors::CorsLayer};

use crate::models::{App, Config};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    info!("🚀 Pet Assist backend starting...");
    info!("   Generation model: {}", cfg.gemini_model);
    info!("   Text model: {}", cfg.hf_model);
    info!("   Backend Timeout: {}s", cfg.backend_timeout_secs);
    info!("   Cache cap: {} entries/feature", cfg.cache_max_entries);

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(1024)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(cfg.backend_timeout_secs))
        .build()
        .unwrap();

    let port = cfg.port;
    let app = App {
        client,
        features: std::sync::Arc::new(models::Features::new(cfg.cache_max_entries)),
        cfg: std::sync::Arc::new(cfg),
    };

    // Credentialed CORS needs explicit origins; wildcard panics at runtime.
    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:5173".parse::<HeaderValue>().unwrap(),
            "http://127.0.0.1:5173".parse::<HeaderValue>().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    let router = Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/predict", post(handlers::predict))
        .route("/api/voice/analyze", post(handlers::analyze_voice))
        .route("/generate-caption", post(handlers::generate_caption))
        .route("/api/train", post(handlers::generate_training_plan))
        .route("/api/recommend", post(handlers::recommend_pets))
        .route("/api/food/analyze", post(handlers::analyze_food))
        .route("/api/health/analyze-logs", post(handlers::analyze_health_logs))
        .layer(axum::extract::DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB limit
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(app);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();
    info!("   Listening on: 0.0.0.0:{}", port);
    axum::serve(listener, router).await.unwrap();
}
