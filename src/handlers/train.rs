use axum::{extract::State, response::Json};
use log::warn;
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::models::{App, TrainIn};
use crate::services::cache::fingerprint_str;
use crate::services::gateway::{self, text_part};
use crate::services::json_repair::parse_loose;
use crate::utils::truncate_chars;

/// Seven days of gentle default activities, used by the static plan and to
/// rebuild a provider plan that came back with the wrong arity.
const DEFAULT_ACTIVITIES: [[&str; 2]; 7] = [
    ["Short play + name recall", "Reward calm behavior"],
    ["Leash walk 10–15 min", "Sit/Stay basics"],
    ["Targeting (hand touch)", "Crate/Mat training"],
    ["Impulse control (wait)", "Gentle grooming"],
    ["Recall games (indoors)", "Loose-leash practice"],
    ["Novel sound socialization", "Calm enrichment"],
    ["Review + easy challenge", "Celebrate progress"],
];

/// `POST /api/train` — 7-day training plan. Primary text provider first,
/// secondary generation provider next, deterministic static plan last.
pub async fn generate_training_plan(
    State(app): State<App>,
    Json(body): Json<TrainIn>,
) -> Result<Json<Value>, ApiError> {
    if body.pet_type.trim().is_empty() || body.problem.trim().is_empty() {
        return Err(ApiError::BadRequest("petType and problem are required".into()));
    }

    let prompt = build_prompt(&body);
    let key = fingerprint_str(&prompt);

    let gw = app.clone();
    let attempt_prompt = prompt.clone();
    let out = app
        .features
        .train
        .run(
            key,
            || async move { attempt_plan(&gw, &attempt_prompt).await },
            |raw| normalize_plan(raw, &body),
            || fallback_plan(&body),
        )
        .await;
    Ok(Json(out))
}

async fn attempt_plan(app: &App, prompt: &str) -> Option<Value> {
    match gateway::chat_completion_text(
        app,
        "Return a SINGLE VALID JSON object matching the schema. No prose/markdown.",
        prompt,
        Some(hf_response_format()),
    )
    .await
    {
        Ok(raw) => match parse_loose(&raw) {
            Ok(plan) => return Some(plan),
            Err(e) => warn!("Primary plan text resisted repair: {e}"),
        },
        Err(e) => warn!("Primary plan provider failed; trying secondary: {e}"),
    }

    let parts = vec![text_part("Return STRICT JSON only."), text_part(prompt)];
    gateway::generate_json(app, parts, 0.2).await.into_option()
}

fn build_prompt(body: &TrainIn) -> String {
    format!(
        r#"You are a certified pet trainer. Create a gentle, stepwise 7-day training plan.

Return STRICT JSON ONLY:
{{
  "title": string,
  "summary": string,
  "dailyRoutine": string[],
  "sevenDay": [{{"day": number, "activities": string[]}}],
  "rewards": string[],
  "videoLinks": [{{"title": string, "url": string}}],
  "notes": string[],
  "meta": {{"seed": string}},
  "friendlyName": string
}}

Rules:
- friendlyName: "pup" for Dog, "kitty" for Cat, else "pet".
- 7 entries in sevenDay; 2–3 activities each.
- 2 videoLinks (placeholders ok).
- meta.seed = slug(petType + problem).
- Never use a double-quote inside values; use backticks if needed.

Context:
Pet type: {}
Age: {}
Problem: {}
Desired outcome: {}"#,
        body.pet_type,
        body.age.as_deref().unwrap_or("unknown"),
        body.problem,
        body.goal.as_deref().unwrap_or("not specified"),
    )
}

fn hf_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "PetTrainingPlan",
            "schema": {
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "summary": { "type": "string" },
                    "dailyRoutine": { "type": "array", "items": { "type": "string" } },
                    "sevenDay": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "day": { "type": "integer", "minimum": 1, "maximum": 7 },
                                "activities": {
                                    "type": "array", "items": { "type": "string" },
                                    "minItems": 2, "maxItems": 3
                                }
                            },
                            "required": ["day", "activities"],
                            "additionalProperties": false
                        },
                        "minItems": 7, "maxItems": 7
                    },
                    "rewards": { "type": "array", "items": { "type": "string" } },
                    "videoLinks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": { "title": { "type": "string" }, "url": { "type": "string" } },
                            "required": ["title", "url"], "additionalProperties": false
                        },
                        "minItems": 2, "maxItems": 2
                    },
                    "notes": { "type": "array", "items": { "type": "string" } },
                    "meta": {
                        "type": "object",
                        "properties": { "seed": { "type": "string" } },
                        "required": ["seed"], "additionalProperties": false
                    },
                    "friendlyName": { "type": "string" }
                },
                "required": [
                    "title", "summary", "dailyRoutine", "sevenDay", "rewards",
                    "videoLinks", "notes", "meta", "friendlyName"
                ],
                "additionalProperties": false
            },
            "strict": true
        }
    })
}

fn friendly_name(pet_type: &str) -> &'static str {
    match pet_type {
        "Dog" => "pup",
        "Cat" => "kitty",
        _ => "pet",
    }
}

fn plan_seed(body: &TrainIn) -> String {
    let raw = format!("{}-{}", body.pet_type, body.problem)
        .to_lowercase()
        .replace(' ', "-");
    truncate_chars(&raw, 24)
}

fn default_seven_day() -> Value {
    Value::Array(
        DEFAULT_ACTIVITIES
            .iter()
            .enumerate()
            .map(|(i, acts)| json!({ "day": i + 1, "activities": acts }))
            .collect(),
    )
}

fn default_video_links() -> Vec<Value> {
    vec![
        json!({ "title": "Marker & timing basics", "url": "https://youtu.be/dQw4w9WgXcQ" }),
        json!({ "title": "Loose leash intro", "url": "https://youtu.be/o-YBDTqX_ZU" }),
    ]
}

/// Whatever the providers produced becomes an object with every contract
/// field present; `sevenDay` is forced to exactly 7 entries and `videoLinks`
/// to exactly 2, since the consumer indexes into both.
fn normalize_plan(raw: Value, body: &TrainIn) -> Value {
    let mut plan: Map<String, Value> = match raw {
        Value::Object(map) => map,
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(map)) => map,
            Ok(other) => one_entry("_data", other),
            Err(_) => one_entry("raw", Value::String(s)),
        },
        Value::Array(items) => one_entry("_data", Value::Array(items)),
        other => one_entry("value", other),
    };

    plan.entry("title".to_string())
        .or_insert_with(|| json!("Personalized Training Plan"));
    plan.entry("summary".to_string()).or_insert_with(|| json!(""));
    plan.entry("dailyRoutine".to_string()).or_insert_with(|| json!([]));
    plan.entry("rewards".to_string()).or_insert_with(|| json!([]));
    plan.entry("notes".to_string()).or_insert_with(|| json!([]));

    let seven_ok = plan
        .get("sevenDay")
        .and_then(Value::as_array)
        .map(|a| a.len() == 7)
        .unwrap_or(false);
    if !seven_ok {
        plan.insert("sevenDay".to_string(), default_seven_day());
    }

    let mut links = plan
        .get("videoLinks")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    links.truncate(2);
    for default in default_video_links().into_iter().skip(links.len()) {
        links.push(default);
    }
    plan.insert("videoLinks".to_string(), Value::Array(links));

    if !plan.get("meta").map(Value::is_object).unwrap_or(false) {
        plan.insert("meta".to_string(), json!({}));
    }
    if let Some(meta) = plan.get_mut("meta").and_then(Value::as_object_mut) {
        meta.entry("seed".to_string())
            .or_insert_with(|| json!(plan_seed(body)));
    }

    plan.entry("friendlyName".to_string())
        .or_insert_with(|| json!(friendly_name(&body.pet_type)));

    Value::Object(plan)
}

fn one_entry(key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}

/// Deterministic plan used when both providers are out.
fn fallback_plan(body: &TrainIn) -> Value {
    json!({
        "title": format!("7-Day {} Plan", body.pet_type),
        "summary": format!(
            "Goal: {}. Gentle, reward-based steps.",
            body.goal.as_deref().unwrap_or(&body.problem)
        ),
        "dailyRoutine": ["3–5 short sessions/day", "Fresh water & rest", "End on success"],
        "sevenDay": default_seven_day(),
        "rewards": ["Tiny treats", "Praise", "Play break"],
        "videoLinks": default_video_links(),
        "notes": ["Keep sessions <10 min", "If stress signs appear, pause."],
        "meta": { "seed": plan_seed(body) },
        "friendlyName": friendly_name(&body.pet_type),
    })
}
