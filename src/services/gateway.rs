use log::{error, warn};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::App;
use crate::services::json_repair::parse_loose;
use crate::utils::truncate_chars;

/// Outcome of a call to the JSON-generation provider. Predictable failure
/// modes never become errors: quota exhaustion is a distinguishable marker so
/// pipelines can substitute a local fallback, everything else collapses to
/// `Empty` after logging.
#[derive(Debug)]
pub enum ProviderReply {
    Json(Value),
    QuotaExhausted,
    Empty,
}

impl ProviderReply {
    /// Collapse quota and empty outcomes into `None` for pipelines that treat
    /// both as "serve the local fallback".
    pub fn into_option(self) -> Option<Value> {
        match self {
            ProviderReply::Json(v) => Some(v),
            ProviderReply::QuotaExhausted | ProviderReply::Empty => None,
        }
    }
}

/// Hard errors from the schema-constrained chat provider. Unlike
/// [`ProviderReply`], these propagate so the training-plan pipeline can move
/// on to its secondary provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HF API {status}: {body}")]
    Status { status: u16, body: String },
    #[error("HF returned no text content")]
    EmptyBody,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub fn text_part(text: impl Into<String>) -> Value {
    json!({ "text": text.into() })
}

pub fn inline_data_part(mime: &str, data_b64: &str) -> Value {
    json!({ "inline_data": { "mime_type": mime, "data": data_b64 } })
}

fn looks_like_quota(status: u16, body: &str) -> bool {
    status == 429 || body.contains("RESOURCE_EXHAUSTED") || body.to_lowercase().contains("quota")
}

/// Classify a provider response by status. `None` means success; quota
/// markers are only consulted on the error path, so generated text that
/// happens to mention "quota" is never misread as exhaustion.
fn classify_failure(status: u16, body: &str) -> Option<ProviderReply> {
    if (200..300).contains(&status) {
        return None;
    }
    if looks_like_quota(status, body) {
        warn!("⚠️ Provider 429/quota hit; returning fallback marker");
        return Some(ProviderReply::QuotaExhausted);
    }
    error!(
        "❌ Generation endpoint returned {} - response: {}",
        status,
        truncate_chars(body, 200)
    );
    Some(ProviderReply::Empty)
}

/// Ask the vision/language provider for a JSON response.
///
/// Empty text is an empty result, not an error. The raw text goes through the
/// strict-then-repair parser; repair exhaustion is logged and also treated as
/// an empty result.
pub async fn generate_json(app: &App, parts: Vec<Value>, temperature: f64) -> ProviderReply {
    let url = format!(
        "{}/v1beta/{}:generateContent?key={}",
        app.cfg.gemini_base_url.trim_end_matches('/'),
        app.cfg.gemini_model,
        app.cfg.gemini_api_key
    );
    let body = json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "temperature": temperature,
            "responseMimeType": "application/json",
        },
    });

    let res = match app.client.post(&url).json(&body).send().await {
        Ok(res) => res,
        Err(e) => {
            error!("Generation request failed unexpectedly: {e}");
            return ProviderReply::Empty;
        }
    };
    let status = res.status().as_u16();
    let text = res.text().await.unwrap_or_default();

    if let Some(reply) = classify_failure(status, &text) {
        return reply;
    }

    let raw = extract_candidate_text(&text);
    let raw = raw.trim();
    if raw.is_empty() {
        return ProviderReply::Empty;
    }
    match parse_loose(raw) {
        Ok(v) => ProviderReply::Json(v),
        Err(e) => {
            warn!("Provider text resisted repair: {e}");
            ProviderReply::Empty
        }
    }
}

/// Pull the concatenated text parts out of a `generateContent` response body.
fn extract_candidate_text(body: &str) -> String {
    let Ok(v) = serde_json::from_str::<Value>(body) else {
        return String::new();
    };
    let Some(parts) = v["candidates"][0]["content"]["parts"].as_array() else {
        return String::new();
    };
    parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("")
}

/// Call the chat-completions provider with an optional JSON-schema response
/// format and return the raw assistant text.
pub async fn chat_completion_text(
    app: &App,
    system: &str,
    user: &str,
    response_format: Option<Value>,
) -> Result<String, ProviderError> {
    let mut payload = json!({
        "model": app.cfg.hf_model,
        "messages": [
            { "role": "system", "content": system },
            { "role": "user", "content": user },
        ],
        "temperature": 0.2,
        "max_tokens": 900,
    });
    if let Some(format) = response_format {
        payload["response_format"] = format;
    }

    let res = app
        .client
        .post(&app.cfg.hf_chat_url)
        .bearer_auth(&app.cfg.hf_token)
        .header("Accept", "application/json")
        .json(&payload)
        .send()
        .await?;
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    if status != 200 {
        return Err(ProviderError::Status { status, body });
    }

    let data: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let choice = &data["choices"][0];
    let raw = choice["message"]["content"]
        .as_str()
        .or_else(|| choice["text"].as_str())
        .unwrap_or("");
    if raw.trim().is_empty() {
        return Err(ProviderError::EmptyBody);
    }
    Ok(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_detection_covers_status_and_markers() {
        assert!(looks_like_quota(429, ""));
        assert!(looks_like_quota(400, "error RESOURCE_EXHAUSTED for project"));
        assert!(looks_like_quota(403, "Quota exceeded for requests"));
        assert!(!looks_like_quota(500, "internal error"));
    }

    #[test]
    fn success_body_mentioning_quota_is_not_a_failure() {
        let body = r#"{"advice": ["stay within your daily quota of treats"]}"#;
        assert!(classify_failure(200, body).is_none());
    }

    #[test]
    fn error_statuses_classify_quota_vs_empty() {
        assert!(matches!(
            classify_failure(429, ""),
            Some(ProviderReply::QuotaExhausted)
        ));
        assert!(matches!(
            classify_failure(403, "Quota exceeded for requests"),
            Some(ProviderReply::QuotaExhausted)
        ));
        assert!(matches!(classify_failure(500, "boom"), Some(ProviderReply::Empty)));
    }

    #[test]
    fn multibyte_error_bodies_are_truncated_safely() {
        let body = "é".repeat(300);
        assert!(matches!(classify_failure(500, &body), Some(ProviderReply::Empty)));
    }

    #[test]
    fn candidate_text_is_concatenated() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\""},{"text":": 1}"}]}}]}"#;
        assert_eq!(extract_candidate_text(body), "{\"a\": 1}");
        assert_eq!(extract_candidate_text("not json"), "");
        assert_eq!(extract_candidate_text("{}"), "");
    }

    #[test]
    fn parts_have_the_wire_shape() {
        assert_eq!(text_part("hi"), json!({"text": "hi"}));
        assert_eq!(
            inline_data_part("image/png", "QUJD"),
            json!({"inline_data": {"mime_type": "image/png", "data": "QUJD"}})
        );
    }
}
