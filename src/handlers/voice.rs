use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::models::{App, VoiceIn};
use crate::services::cache::fingerprint_str;
use crate::services::gateway::{self, inline_data_part, text_part};
use crate::utils::{clamp01, str_field, string_list, truncate_chars};

/// `POST /api/voice/analyze` — classify a short pet audio clip.
pub async fn analyze_voice(
    State(app): State<App>,
    Json(body): Json<VoiceIn>,
) -> Result<Json<Value>, ApiError> {
    if body.audio_b64.is_empty() {
        return Err(ApiError::BadRequest("audio_b64 is required".into()));
    }
    let mime = body
        .mime
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("audio/webm")
        .to_string();

    let key = fingerprint_str(&format!("{mime}:{}", body.audio_b64));

    let gw = app.clone();
    let schema = json!({
        "type": "object",
        "properties": {
            "disease": { "type": "string" },
            "confidence": { "type": "number" },
            "advice": { "type": "array", "items": { "type": "string" } },
            "danger": { "type": "string", "enum": ["low", "medium", "high"] },
            "raw": { "type": "array", "items": {
                "type": "object",
                "properties": { "label": { "type": "string" }, "prob": { "type": "number" } },
                "required": ["label", "prob"], "additionalProperties": false
            }}
        },
        "required": ["disease", "confidence", "advice", "danger"],
        "additionalProperties": false
    });
    let parts = vec![
        text_part("You are a careful veterinary assistant listening to short pet audio. Return STRICT JSON only."),
        text_part("Schema:"),
        text_part(schema.to_string()),
        text_part("Instructions:"),
        text_part("Pick the single most likely issue; give 2–5 short tips; set danger properly; confidence 0–1."),
        inline_data_part(&mime, &body.audio_b64),
    ];

    let out = app
        .features
        .voice
        .run(
            key,
            || async move { gateway::generate_json(&gw, parts, 0.2).await.into_option() },
            normalize_voice,
            fallback_voice,
        )
        .await;
    Ok(Json(out))
}

fn normalize_voice(data: Value) -> Value {
    let disease = str_field(&data, "disease", "Unknown", 64);
    let confidence = clamp01(data.get("confidence"));
    let mut advice = string_list(&data["advice"], 5, 160);
    let danger = match data["danger"].as_str().map(str::to_lowercase).as_deref() {
        Some(d @ ("low" | "medium" | "high")) => d.to_string(),
        _ => "low".to_string(),
    };
    let raw_preds: Vec<Value> = data["raw"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|r| {
                    json!({
                        "label": truncate_chars(r["label"].as_str().unwrap_or(""), 64),
                        "prob": clamp01(r.get("prob")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    if advice.is_empty() {
        advice = vec![
            "Monitor breathing tonight.".into(),
            "Keep the room calm & ventilated.".into(),
            "Offer fresh water; avoid strong scents.".into(),
        ];
    }

    json!({
        "disease": disease,
        "confidence": confidence,
        "advice": advice,
        "danger": danger,
        "raw": raw_preds,
    })
}

fn fallback_voice() -> Value {
    json!({
        "disease": "Unknown",
        "confidence": 0.0,
        "advice": [
            "Keep the room quiet & ventilated.",
            "Offer fresh water; avoid strong scents.",
            "If symptoms persist or worsen, see a vet."
        ],
        "danger": "low",
        "raw": [
            { "label": "cough", "prob": 0.25 },
            { "label": "stress", "prob": 0.22 },
            { "label": "allergy", "prob": 0.18 },
        ],
    })
}
