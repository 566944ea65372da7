use axum::{
    extract::{Multipart, State},
    response::Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::models::App;
use crate::services::cache::fingerprint;
use crate::services::gateway::{self, inline_data_part, text_part, ProviderReply};
use crate::utils::{clamp01, collect_form, str_field, truncate_chars};

/// A gate verdict of `is_pet=false` blocks only at or above this confidence.
/// An undecided gate (provider unavailable) must never block.
const GATE_BLOCK_CONFIDENCE: f64 = 0.6;

/// `POST /api/predict` — dermatology triage for a pet photo.
pub async fn predict(
    State(app): State<App>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = collect_form(multipart).await?;
    // text fields first: taking the image moves it out of the form
    let animal = form.text("animal").unwrap_or_else(|| "unknown".into());
    let sex = form.text("sex").unwrap_or_else(|| "unknown".into());
    let image = form
        .image
        .ok_or_else(|| ApiError::BadRequest("image file is required".into()))?;
    let img_b64 = BASE64.encode(&image.bytes);

    // Gate before cache or limiter: a confident non-pet verdict short-circuits
    // the whole pipeline with a friendly rejection.
    let gate = pet_gate_check(&app, &img_b64, &image.mime).await;
    if gate_blocks(&gate) {
        return Err(ApiError::NotPetImage {
            message: "This photo doesn't seem to be a pet. Please upload a clear photo of \
                      your pet's skin/wound area (dog/cat, good lighting, close-up)."
                .into(),
            gate,
        });
    }

    let key = format!("{}:{animal}:{sex}", fingerprint(&[&image.bytes]));

    let gw = app.clone();
    let schema_hint = json!({
        "predictions": [{ "label": "string", "probability": 0.0 }],
        "clip_scores": [{ "text": "string", "score": 0.0 }],
        "meta": { "animal": animal, "sex": sex, "notes": "Short plain sentence." },
    });
    let parts = vec![
        text_part("You are a veterinary assistant analyzing pet skin/wound issues. Return STRICT JSON only."),
        text_part(schema_hint.to_string()),
        text_part(format!(
            "Animal: {animal}\nSex: {sex}\n\nReturn top 3 likely dermatology issues with probabilities and 3 clip hints (0–1)."
        )),
        inline_data_part(&image.mime, &img_b64),
    ];

    let out = app
        .features
        .predict
        .run(
            key,
            || async move { gateway::generate_json(&gw, parts, 0.2).await.into_option() },
            |raw| normalize_prediction(raw, &animal, &sex, &gate),
            || {
                let mut data = predict_fallback(&animal, &sex);
                data["gate"] = gate.clone();
                data
            },
        )
        .await;
    Ok(Json(out))
}

/// Separate vision call deciding whether the upload plausibly shows a pet.
/// `is_pet` is `null` when the checker could not decide (quota, parse
/// failure); absence of a verdict is not a "no".
async fn pet_gate_check(app: &App, img_b64: &str, mime: &str) -> Value {
    let parts = vec![
        text_part(
            "You are an image gatekeeper. Decide if this image PRIMARILY shows a PET \
             (dog, cat, rabbit, hamster/guinea pig, bird, reptile, or fish). \
             Return STRICT JSON: \
             {\"is_pet\": boolean, \"animal\": string|null, \"confidence\": number, \"reason\": string}.",
        ),
        inline_data_part(mime, img_b64),
    ];
    match gateway::generate_json(app, parts, 0.0).await {
        ProviderReply::Json(data) if data.is_object() => gate_from_value(&data),
        _ => json!({ "is_pet": null, "animal": null, "confidence": 0.0, "reason": "model_fallback" }),
    }
}

fn gate_from_value(data: &Value) -> Value {
    let confidence = clamp01(data.get("confidence"));
    let reason = truncate_chars(data["reason"].as_str().unwrap_or(""), 200);
    match data["is_pet"].as_bool() {
        Some(is_pet) => json!({
            "is_pet": is_pet,
            "animal": data["animal"].clone(),
            "confidence": confidence,
            "reason": reason,
        }),
        None => json!({ "is_pet": null, "animal": null, "confidence": confidence, "reason": reason }),
    }
}

fn gate_blocks(gate: &Value) -> bool {
    gate["is_pet"] == json!(false)
        && gate["confidence"].as_f64().unwrap_or(0.0) >= GATE_BLOCK_CONFIDENCE
}

fn normalize_prediction(data: Value, animal: &str, sex: &str, gate: &Value) -> Value {
    let predictions: Vec<Value> = data["predictions"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|p| {
                    json!({
                        "label": str_field(p, "label", "Unknown", 64),
                        "probability": clamp01(p.get("probability")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    let clip_scores: Vec<Value> = data["clip_scores"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|c| {
                    json!({
                        "text": str_field(c, "text", "", 80),
                        "score": clamp01(c.get("score")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let mut meta = match &data["meta"] {
        Value::Object(m) => Value::Object(m.clone()),
        _ => json!({ "animal": animal, "sex": sex }),
    };
    if meta["notes"].is_null() {
        meta["notes"] = json!("AI helper, not diagnosis.");
    }

    json!({
        "predictions": predictions,
        "clip_scores": clip_scores,
        "meta": meta,
        "gate": gate.clone(),
    })
}

fn predict_fallback(animal: &str, sex: &str) -> Value {
    json!({
        "predictions": [
            { "label": "Skin irritation (unsure)", "probability": 0.34 },
            { "label": "Allergic dermatitis (unsure)", "probability": 0.33 },
            { "label": "Hot spot / moisture lesion (unsure)", "probability": 0.22 },
        ],
        "clip_scores": [
            { "text": "redness near wound", "score": 0.52 },
            { "text": "hair loss patch", "score": 0.49 },
            { "text": "moist area / licking", "score": 0.41 },
        ],
        "meta": { "animal": animal, "sex": sex, "notes": "Model unavailable; heuristic fallback." },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confident_negative_gate_blocks() {
        let gate = json!({ "is_pet": false, "confidence": 0.9, "reason": "a car" });
        assert!(gate_blocks(&gate));
    }

    #[test]
    fn undecided_gate_never_blocks() {
        let gate = json!({ "is_pet": null, "confidence": 0.0, "reason": "model_fallback" });
        assert!(!gate_blocks(&gate));
    }

    #[test]
    fn low_confidence_negative_does_not_block() {
        let gate = json!({ "is_pet": false, "confidence": 0.5, "reason": "unsure" });
        assert!(!gate_blocks(&gate));
        let positive = json!({ "is_pet": true, "confidence": 0.99, "reason": "a beagle" });
        assert!(!gate_blocks(&positive));
    }

    #[test]
    fn gate_values_are_shaped_and_clamped() {
        let gate = gate_from_value(&json!({
            "is_pet": true, "animal": "dog", "confidence": 1.8, "reason": "clearly a dog"
        }));
        assert_eq!(gate["confidence"], json!(1.0));
        assert_eq!(gate["is_pet"], json!(true));

        // non-boolean verdicts degrade to undecided
        let odd = gate_from_value(&json!({ "is_pet": "maybe", "confidence": 0.7 }));
        assert_eq!(odd["is_pet"], json!(null));
        assert_eq!(odd["animal"], json!(null));
    }

    #[test]
    fn probabilities_are_clamped_into_unit_range() {
        let gate = json!({ "is_pet": true, "confidence": 0.9, "reason": "" });
        let out = normalize_prediction(
            json!({
                "predictions": [
                    { "label": "Dermatitis", "probability": 1.7 },
                    { "label": "Hot spot", "probability": -0.2 },
                ],
                "clip_scores": [{ "text": "redness", "score": 2.0 }],
            }),
            "dog",
            "male",
            &gate,
        );
        assert_eq!(out["predictions"][0]["probability"], json!(1.0));
        assert_eq!(out["predictions"][1]["probability"], json!(0.0));
        assert_eq!(out["clip_scores"][0]["score"], json!(1.0));
        assert_eq!(out["gate"], gate);
    }

    #[test]
    fn missing_meta_and_notes_are_defaulted() {
        let gate = json!({ "is_pet": true, "confidence": 0.9, "reason": "" });
        let out = normalize_prediction(json!({}), "cat", "female", &gate);
        assert_eq!(out["predictions"], json!([]));
        assert_eq!(out["meta"]["animal"], json!("cat"));
        assert_eq!(out["meta"]["notes"], json!("AI helper, not diagnosis."));

        let kept = normalize_prediction(
            json!({ "meta": { "animal": "dog", "sex": "male", "notes": "mild case" } }),
            "dog",
            "male",
            &gate,
        );
        assert_eq!(kept["meta"]["notes"], json!("mild case"));
    }
}
