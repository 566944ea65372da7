use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::models::{AnalyzeLogsIn, App, HealthEntry};
use crate::services::cache::fingerprint_str;
use crate::services::gateway::{self, text_part};
use crate::utils::{clamp01_or, string_list};

/// The analysis window; older journal entries are ignored.
const MAX_DAYS: usize = 7;

const TIPS: [&str; 4] = [
    "Keep fresh water available all day.",
    "Aim for 20–30 min of gentle activity.",
    "Note any diet change and what followed it.",
    "If symptoms persist over 48h, see a vet.",
];

/// `POST /api/health/analyze-logs` — weekly journal triage. Provider summary
/// when available, deterministic rule verdict otherwise.
pub async fn analyze_health_logs(
    State(app): State<App>,
    Json(body): Json<AnalyzeLogsIn>,
) -> Result<Json<Value>, ApiError> {
    if body.logs.is_empty() {
        return Err(ApiError::BadRequest("logs are required".into()));
    }

    let rows: Vec<Value> = body.logs.iter().take(MAX_DAYS).map(entry_row).collect();
    let rows_json = Value::Array(rows.clone());
    let key = fingerprint_str(&rows_json.to_string());

    let gw = app.clone();
    let parts = vec![
        text_part(
            "You are a veterinary triage assistant reviewing a week of pet health logs. \
             Return STRICT JSON: {\"status\": \"good\"|\"watch\"|\"bad\", \
             \"score\": number (0-1, higher is healthier), \
             \"reasons\": string[], \"tips\": string[]}.",
        ),
        text_part("Logs (most recent first):"),
        text_part(rows_json.to_string()),
    ];

    let out = app
        .features
        .health_logs
        .run(
            key,
            || async move {
                gateway::generate_json(&gw, parts, 0.1)
                    .await
                    .into_option()
                    // a reply without a verdict is as useless as no reply
                    .filter(|v| v.get("status").is_some())
            },
            normalize_health,
            || rule_health(&rows),
        )
        .await;
    Ok(Json(out))
}

fn entry_row(e: &HealthEntry) -> Value {
    json!({
        "date": e.date_iso,
        "food": e.food,
        "water_ml": e.water,
        "vomit": e.vomit,
        "diarrhea": e.diarrhea,
        "activity_min": e.activity,
        "notes": e.notes,
    })
}

fn normalize_health(data: Value) -> Value {
    let status = match data["status"].as_str().map(str::to_lowercase).as_deref() {
        Some(s @ ("good" | "watch" | "bad")) => s.to_string(),
        _ => "watch".to_string(),
    };
    json!({
        "status": status,
        "score": clamp01_or(data.get("score"), 0.5),
        "reasons": string_list(&data["reasons"], 6, 160),
        "tips": string_list(&data["tips"], 6, 160),
    })
}

fn is_yes(v: &Value) -> bool {
    v.as_str().map(str::trim).map_or(false, |s| s.eq_ignore_ascii_case("yes"))
}

/// Deterministic verdict over the raw rows: GI symptoms are hard flags,
/// low intake/activity are soft ones.
fn rule_health(rows: &[Value]) -> Value {
    let mut vomit_days = 0usize;
    let mut diarrhea_days = 0usize;
    let mut low_water_days = 0usize;
    let mut low_activity_days = 0usize;

    for row in rows {
        if is_yes(&row["vomit"]) {
            vomit_days += 1;
        }
        if is_yes(&row["diarrhea"]) {
            diarrhea_days += 1;
        }
        if row["water_ml"].as_f64().map_or(false, |w| w < 100.0) {
            low_water_days += 1;
        }
        if row["activity_min"].as_f64().map_or(false, |a| a < 10.0) {
            low_activity_days += 1;
        }
    }

    let bad_flags = vomit_days + diarrhea_days;
    let warn_flags = low_water_days + low_activity_days;

    let status = if bad_flags >= 2 {
        "bad"
    } else if bad_flags == 1 || warn_flags >= 3 {
        "watch"
    } else {
        "good"
    };

    let base: f64 = match status {
        "bad" => 0.3,
        "watch" => 0.55,
        _ => 0.8,
    };
    let score = (base - 0.05 * bad_flags as f64 - 0.02 * warn_flags as f64).clamp(0.1, 0.98);

    let mut reasons = Vec::new();
    if vomit_days > 0 {
        reasons.push(format!("Vomiting on {vomit_days} day(s)."));
    }
    if diarrhea_days > 0 {
        reasons.push(format!("Diarrhea on {diarrhea_days} day(s)."));
    }
    if low_water_days > 0 {
        reasons.push(format!("Low water intake on {low_water_days} day(s)."));
    }
    if low_activity_days > 0 {
        reasons.push(format!("Low activity on {low_activity_days} day(s)."));
    }
    if reasons.is_empty() {
        reasons.push("All good!".to_string());
    }

    json!({
        "status": status,
        "score": score,
        "reasons": reasons,
        "tips": TIPS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vomit: &str, diarrhea: &str, water: f64, activity: f64) -> Value {
        json!({
            "date": "2025-01-01",
            "food": "kibble",
            "water_ml": water,
            "vomit": vomit,
            "diarrhea": diarrhea,
            "activity_min": activity,
            "notes": null,
        })
    }

    #[test]
    fn quiet_week_is_good() {
        let rows = vec![row("no", "no", 400.0, 30.0); 7];
        let out = rule_health(&rows);
        assert_eq!(out["status"], json!("good"));
        assert_eq!(out["reasons"], json!(["All good!"]));
        assert_eq!(out["score"], json!(0.8));
        assert_eq!(out["tips"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn two_gi_flags_are_bad_one_is_watch() {
        let bad = rule_health(&[row("yes", "yes", 400.0, 30.0)]);
        assert_eq!(bad["status"], json!("bad"));

        let watch = rule_health(&[row("yes", "no", 400.0, 30.0)]);
        assert_eq!(watch["status"], json!("watch"));
        assert!(watch["reasons"]
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r.as_str().unwrap().starts_with("Vomiting")));
    }

    #[test]
    fn three_soft_flags_are_watch() {
        let rows = vec![
            row("no", "no", 50.0, 5.0),  // two soft flags
            row("no", "no", 80.0, 30.0), // one more
        ];
        let out = rule_health(&rows);
        assert_eq!(out["status"], json!("watch"));
    }

    #[test]
    fn score_never_leaves_its_band() {
        let rows = vec![row("yes", "yes", 10.0, 0.0); 7];
        let out = rule_health(&rows);
        let score = out["score"].as_f64().unwrap();
        assert!((0.1..=0.98).contains(&score));
        assert_eq!(out["status"], json!("bad"));
    }

    #[test]
    fn provider_reply_is_normalized() {
        let out = normalize_health(json!({
            "status": "GOOD",
            "score": 1.4,
            "reasons": ["hydrated", "active"],
            "tips": ["keep it up"],
        }));
        assert_eq!(out["status"], json!("good"));
        assert_eq!(out["score"], json!(1.0));
        assert_eq!(out["reasons"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn junk_status_degrades_to_watch() {
        let out = normalize_health(json!({ "status": "fantastic" }));
        assert_eq!(out["status"], json!("watch"));
        assert_eq!(out["score"], json!(0.5));
        assert_eq!(out["reasons"], json!([]));
    }

    #[test]
    fn missing_fields_never_count_as_flags() {
        let rows = vec![json!({
            "date": null, "food": null, "water_ml": null,
            "vomit": null, "diarrhea": null, "activity_min": null, "notes": null,
        })];
        let out = rule_health(&rows);
        assert_eq!(out["status"], json!("good"));
    }
}
