use std::collections::HashSet;

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    response::Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::constants::{CatalogPet, CATALOG};
use crate::error::ApiError;
use crate::models::{App, RecommendIn};
use crate::services::cache::{fingerprint, fingerprint_str};
use crate::services::gateway::{self, inline_data_part, text_part};
use crate::utils::{
    collect_form, parse_int_loose, placeholder_for, seeded_fallback, str_field, UploadedImage,
};

const RESULT_COUNT: usize = 5;

#[derive(Debug, Clone)]
struct RecoPayload {
    house: String,
    budget: String,
    lifestyle: String,
    allergies: String,
    time: String,
    name: Option<String>,
}

impl From<RecommendIn> for RecoPayload {
    fn from(body: RecommendIn) -> Self {
        Self {
            house: body.house,
            budget: body.budget,
            lifestyle: body.lifestyle,
            allergies: body.allergies,
            time: body.time,
            name: body.name,
        }
    }
}

impl RecoPayload {
    /// Canonical request string used for fingerprinting; whitespace and case
    /// differences must not fragment the cache.
    fn canonical(&self) -> String {
        [
            &self.house,
            &self.budget,
            &self.lifestyle,
            &self.allergies,
            &self.time,
            self.name.as_deref().unwrap_or(""),
        ]
        .iter()
        .map(|s| s.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("|")
    }
}

/// `POST /api/recommend` — five adoption matches for a household profile.
/// Accepts either a JSON body or a multipart form with an optional photo of
/// the asker's current home/pet.
pub async fn recommend_pets(
    State(app): State<App>,
    req: Request,
) -> Result<Json<Value>, ApiError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let (payload, upload) = if content_type.starts_with("application/json") {
        let Json(body): Json<RecommendIn> = Json::from_request(req, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?;
        (RecoPayload::from(body), None)
    } else {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?;
        let form = collect_form(multipart).await?;
        let (house, budget, lifestyle, time) = match (
            form.text("house"),
            form.text("budget"),
            form.text("lifestyle"),
            form.text("time"),
        ) {
            (Some(h), Some(b), Some(l), Some(t)) => (h, b, l, t),
            _ => return Err(ApiError::BadRequest("Missing required fields in form".into())),
        };
        let payload = RecoPayload {
            house,
            budget,
            lifestyle,
            time,
            allergies: form.text("allergies").unwrap_or_else(|| "no".into()),
            name: form.text("name"),
        };
        (payload, form.image)
    };

    let img_digest = upload
        .as_ref()
        .map(|img| fingerprint(&[&img.bytes]))
        .unwrap_or_else(|| "noimg".into());
    let key = fingerprint_str(&format!("{}|{img_digest}", payload.canonical()));

    let gw = app.clone();
    let parts = build_parts(&payload, upload.as_ref());

    let norm_payload = payload.clone();
    let norm_upload = upload.as_ref();
    let fb_payload = payload.clone();
    let out = app
        .features
        .recommend
        .run(
            key,
            || async move { gateway::generate_json(&gw, parts, 0.3).await.into_option() },
            |raw| {
                let picked = raw["results"].as_array().cloned().unwrap_or_default();
                json!({ "results": finalize_results(picked, &norm_payload, norm_upload) })
            },
            || {
                json!({
                    "results": finalize_results(rule_based(&fb_payload), &fb_payload, norm_upload)
                })
            },
        )
        .await;
    Ok(Json(out))
}

fn build_parts(payload: &RecoPayload, upload: Option<&UploadedImage>) -> Vec<Value> {
    let prompt = format!(
        r#"You are an adoption counselor in India. Recommend exactly 5 pets for this household.

Return STRICT JSON ONLY:
{{ "results": [{{ "pet": string, "reason": string, "monthly_cost": string, "hypoallergenic": boolean, "img": string }}] }}

Rules:
- Real breeds/species suited to the household; avoid high-energy breeds when time is low.
- If allergies is "yes", recommend hypoallergenic pets only.
- monthly_cost: a rupee range like "₹2,000–₹4,000".
- reason: one short friendly sentence.
- img: leave "" (the server fills it).

Household:
House: {}
Monthly budget: {}
Lifestyle: {}
Allergies: {}
Time available: {}
Name: {}"#,
        payload.house,
        payload.budget,
        payload.lifestyle,
        payload.allergies,
        payload.time,
        payload.name.as_deref().unwrap_or("friend"),
    );
    let mut parts = vec![text_part(prompt)];
    if let Some(img) = upload {
        let b64 = BASE64.encode(&img.bytes);
        parts.push(inline_data_part(&img.mime, &b64));
    }
    parts
}

static RUPEE_AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"₹\s*([\d,]+)").unwrap());

fn first_rupee_amount(s: &str) -> Option<i64> {
    RUPEE_AMOUNT
        .captures(s)
        .map(|c| parse_int_loose(&c[1]))
        .filter(|n| *n > 0)
}

fn catalog_entry(pet: &CatalogPet, reason: &str) -> Value {
    json!({
        "pet": pet.pet,
        "reason": reason,
        "monthly_cost": pet.monthly_cost,
        "hypoallergenic": pet.hypoallergenic,
        "img": "",
    })
}

/// Deterministic catalog filter used when the provider is out and as pad
/// material when the provider returns fewer than five picks.
fn rule_based(payload: &RecoPayload) -> Vec<Value> {
    let budget = parse_int_loose(&payload.budget);
    // 20% slack (at least ₹1,000): ranges are estimates, not hard ceilings
    let slack = (budget as f64 * 1.2).max(budget as f64 + 1000.0) as i64;
    let allergic = payload.allergies.trim().eq_ignore_ascii_case("yes");
    let busy = payload.time.trim().eq_ignore_ascii_case("low")
        || payload.lifestyle.trim().eq_ignore_ascii_case("calm");

    let picks: Vec<Value> = CATALOG
        .iter()
        .filter(|p| !allergic || p.hypoallergenic)
        .filter(|p| {
            budget <= 0
                || first_rupee_amount(p.monthly_cost)
                    .map(|low| low <= slack)
                    .unwrap_or(true)
        })
        .filter(|p| {
            let name = p.pet.to_lowercase();
            !(busy && (name.contains("poodle") || name.contains("labrador")))
        })
        .map(|p| {
            catalog_entry(
                p,
                if allergic {
                    "Low-dander pick that fits your budget and routine."
                } else {
                    "Fits your home, budget and daily routine."
                },
            )
        })
        .collect();

    if picks.is_empty() {
        CATALOG
            .iter()
            .map(|p| catalog_entry(p, "A classic, adaptable companion."))
            .collect()
    } else {
        picks
    }
}

/// Shape provider picks into exactly five well-formed results with distinct
/// images. An uploaded photo becomes the first empty `img`; remaining blanks
/// get a stock photo by breed, else a seeded placeholder.
fn finalize_results(
    picked: Vec<Value>,
    payload: &RecoPayload,
    upload: Option<&UploadedImage>,
) -> Vec<Value> {
    let mut results: Vec<Value> = picked
        .into_iter()
        .filter(|v| v.is_object())
        .map(|v| {
            json!({
                "pet": str_field(&v, "pet", "Pet", 60),
                "reason": str_field(&v, "reason", "Fits your lifestyle.", 200),
                "monthly_cost": str_field(&v, "monthly_cost", "₹1,000–₹5,000", 40),
                "hypoallergenic": v["hypoallergenic"].as_bool().unwrap_or(false),
                "img": v["img"].as_str().unwrap_or("").to_string(),
            })
        })
        .take(RESULT_COUNT)
        .collect();

    let mut have: HashSet<String> = results
        .iter()
        .map(|r| r["pet"].as_str().unwrap_or("").to_lowercase())
        .collect();
    for pad in rule_based(payload)
        .into_iter()
        .chain(CATALOG.iter().map(|p| catalog_entry(p, "A classic, adaptable companion.")))
    {
        if results.len() >= RESULT_COUNT {
            break;
        }
        let name = pad["pet"].as_str().unwrap_or("").to_lowercase();
        if have.insert(name) {
            results.push(pad);
        }
    }
    results.truncate(RESULT_COUNT);

    // the asker's own photo always fronts the list
    if let Some(img) = upload {
        let data_url = format!("data:{};base64,{}", img.mime, BASE64.encode(&img.bytes));
        if let Some(first) = results.first_mut() {
            first["img"] = json!(data_url);
        }
    }

    let mut used: HashSet<String> = HashSet::new();
    for (i, r) in results.iter_mut().enumerate() {
        let pet = r["pet"].as_str().unwrap_or("").to_string();
        let mut url = r["img"].as_str().unwrap_or("").to_string();
        if url.is_empty() {
            url = placeholder_for(&pet)
                .map(str::to_string)
                .unwrap_or_else(|| seeded_fallback(&pet, i));
        }
        if !used.insert(url.clone()) {
            url = seeded_fallback(&pet, i + 100);
            used.insert(url.clone());
        }
        r["img"] = json!(url);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> RecoPayload {
        RecoPayload {
            house: "apartment".into(),
            budget: "4000".into(),
            lifestyle: "active".into(),
            allergies: "no".into(),
            time: "medium".into(),
            name: Some("Asha".into()),
        }
    }

    #[test]
    fn canonical_ignores_case_and_whitespace() {
        let mut a = payload();
        let mut b = payload();
        a.house = "  Apartment ".into();
        b.house = "apartment".into();
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn rupee_amounts_parse_with_commas() {
        assert_eq!(first_rupee_amount("₹4,000–₹7,000"), Some(4000));
        assert_eq!(first_rupee_amount("₹ 500/month"), Some(500));
        assert_eq!(first_rupee_amount("free"), None);
    }

    #[test]
    fn allergies_filter_keeps_hypoallergenic_only() {
        let mut p = payload();
        p.allergies = "yes".into();
        p.budget = String::new();
        for r in rule_based(&p) {
            assert_eq!(r["hypoallergenic"], json!(true), "{}", r["pet"]);
        }
    }

    #[test]
    fn low_time_excludes_high_energy_breeds() {
        let mut p = payload();
        p.time = "low".into();
        p.budget = String::new();
        for r in rule_based(&p) {
            let name = r["pet"].as_str().unwrap().to_lowercase();
            assert!(!name.contains("poodle") && !name.contains("labrador"), "{name}");
        }
    }

    #[test]
    fn impossible_filters_fall_back_to_full_catalog() {
        let mut p = payload();
        p.budget = "1".into();
        p.allergies = "yes".into();
        p.time = "low".into();
        assert!(!rule_based(&p).is_empty());
    }

    #[test]
    fn results_are_exactly_five_with_unique_images() {
        let sparse = vec![json!({ "pet": "Beagle", "reason": "Friendly", "img": "" })];
        let out = finalize_results(sparse, &payload(), None);
        assert_eq!(out.len(), RESULT_COUNT);

        let imgs: HashSet<_> = out
            .iter()
            .map(|r| r["img"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(imgs.len(), RESULT_COUNT);
        for r in &out {
            assert!(!r["img"].as_str().unwrap().is_empty());
            assert!(!r["reason"].as_str().unwrap().is_empty());
        }
    }

    #[test]
    fn duplicate_provider_images_are_reseeded() {
        let same = "https://example.com/same.jpg";
        let picked = (0..5)
            .map(|i| json!({ "pet": format!("Pet {i}"), "img": same }))
            .collect();
        let out = finalize_results(picked, &payload(), None);
        let imgs: HashSet<_> = out
            .iter()
            .map(|r| r["img"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(imgs.len(), RESULT_COUNT);
    }

    #[test]
    fn uploaded_photo_lands_on_the_first_result() {
        let upload = UploadedImage {
            bytes: vec![0xff, 0xd8, 0xff, 0xe0],
            mime: "image/jpeg".into(),
        };
        let picked = vec![
            json!({ "pet": "Beagle", "img": "https://example.com/a.jpg" }),
            json!({ "pet": "Pug", "img": "" }),
        ];
        let out = finalize_results(picked, &payload(), Some(&upload));
        assert!(out[0]["img"].as_str().unwrap().starts_with("data:image/jpeg;base64,"));
        // later slots keep their own imagery
        assert!(!out[1]["img"].as_str().unwrap().starts_with("data:"));
    }

    #[test]
    fn junk_provider_entries_are_defaulted() {
        let picked = vec![json!({}), json!("not an object")];
        let out = finalize_results(picked, &payload(), None);
        assert_eq!(out.len(), RESULT_COUNT);
        assert_eq!(out[0]["pet"], json!("Pet"));
        assert_eq!(out[0]["reason"], json!("Fits your lifestyle."));
        assert_eq!(out[0]["monthly_cost"], json!("₹1,000–₹5,000"));
    }
}
