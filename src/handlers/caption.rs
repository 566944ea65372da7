use axum::{
    extract::{Multipart, State},
    response::Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::models::App;
use crate::services::cache::fingerprint;
use crate::services::gateway::{self, inline_data_part, text_part};
use crate::utils::{collect_form, truncate_chars};

/// `POST /generate-caption` — short styled caption for a pet photo.
pub async fn generate_caption(
    State(app): State<App>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = collect_form(multipart).await?;
    // text fields first: taking the image moves it out of the form
    let category = form.text("category").unwrap_or_default();
    let image = form
        .image
        .ok_or_else(|| ApiError::BadRequest("image file is required".into()))?;

    let digest = fingerprint(&[&image.bytes, category.as_bytes()]);
    let key = format!("{digest}:{category}");

    let gw = app.clone();
    let prompt = format!(
        "Write a {category} style stylish caption (<=80 chars) with emoji and simple English."
    );
    let data_b64 = BASE64.encode(&image.bytes);
    let parts = vec![text_part(prompt), inline_data_part(&image.mime, &data_b64)];

    let out = app
        .features
        .caption
        .run(
            key,
            || async move { gateway::generate_json(&gw, parts, 0.3).await.into_option() },
            normalize_caption,
            fallback_caption,
        )
        .await;
    Ok(Json(out))
}

fn normalize_caption(raw: Value) -> Value {
    let cap = match &raw {
        Value::String(s) => s.clone(),
        Value::Object(_) => raw["caption"].as_str().unwrap_or("").to_string(),
        _ => String::new(),
    };
    let cap = cap.trim();
    let cap = if cap.is_empty() { "Best boy energy ✨" } else { cap };
    let cap = truncate_chars(cap, 120);
    let cap = if cap.trim().is_empty() {
        "Pet vibes ✨".to_string()
    } else {
        cap
    };
    json!({ "caption": cap })
}

fn fallback_caption() -> Value {
    json!({ "caption": "Cuteness overload 🌟" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_taken_from_object_or_bare_string() {
        assert_eq!(
            normalize_caption(json!({"caption": "Sunny zoomies ☀️"})),
            json!({"caption": "Sunny zoomies ☀️"})
        );
        assert_eq!(
            normalize_caption(json!("Nap champion 💤")),
            json!({"caption": "Nap champion 💤"})
        );
    }

    #[test]
    fn empty_caption_gets_a_default() {
        assert_eq!(normalize_caption(json!({})), json!({"caption": "Best boy energy ✨"}));
        assert_eq!(
            normalize_caption(json!({"caption": "   "})),
            json!({"caption": "Best boy energy ✨"})
        );
    }

    #[test]
    fn long_captions_are_capped() {
        let long = "x".repeat(500);
        let out = normalize_caption(json!({ "caption": long }));
        assert_eq!(out["caption"].as_str().unwrap().chars().count(), 120);
    }
}
