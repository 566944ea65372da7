use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::models::App;

/// Health check endpoint
pub async fn health_check(State(app): State<App>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "gemini": !app.cfg.gemini_api_key.is_empty(),
        "huggingface_model": app.cfg.hf_model,
    }))
}
