use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    response::Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};

use crate::constants::{BETTER_BRANDS, CAT_HARMFUL, DOG_HARMFUL, FOOD_DB, UNIVERSAL_CAUTION};
use crate::error::ApiError;
use crate::models::{App, FoodIn};
use crate::services::cache::{fingerprint, fingerprint_str};
use crate::services::gateway::{self, inline_data_part, text_part, ProviderReply};
use crate::utils::{collect_form, UploadedImage};

const MAX_INGREDIENTS: usize = 60;
const MAX_FLAGGED: usize = 12;
const HIGH_KCAL_PER_G: f64 = 3.5;

#[derive(Debug, Clone)]
struct FoodPayload {
    mode: String,
    ingredients: Option<String>,
    animal: String,
    weight_kg: Option<f64>,
}

/// `POST /api/food/analyze` — label/ingredient safety check, from pasted text
/// or a photo of the packet or plate.
pub async fn analyze_food(
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
        let Json(body): Json<FoodIn> = Json::from_request(req, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?;
        let payload = FoodPayload {
            mode: body.mode,
            ingredients: body.ingredients,
            animal: body.animal,
            weight_kg: body.weight_kg,
        };
        (payload, None)
    } else {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?;
        let form = collect_form(multipart).await?;
        let payload = FoodPayload {
            mode: form.text("mode").unwrap_or_else(|| "text".into()),
            ingredients: form.text("ingredients"),
            animal: form.text("animal").unwrap_or_else(|| "dog".into()),
            weight_kg: form.text("weight_kg").and_then(|s| s.parse().ok()),
        };
        (payload, form.image)
    };

    let image_mode = payload.mode.trim().eq_ignore_ascii_case("image");
    if image_mode && upload.is_none() {
        return Err(ApiError::BadRequest("image required for mode=image".into()));
    }
    let text = payload
        .ingredients
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .to_string();
    if !image_mode && text.is_empty() {
        return Err(ApiError::BadRequest("ingredients text required for mode=text".into()));
    }

    let key = match &upload {
        Some(img) if image_mode => format!("I:{}", fingerprint(&[&img.bytes])),
        _ => format!("T:{}", fingerprint_str(&text.to_lowercase())),
    };

    let gw = app.clone();
    let attempt_payload = payload.clone();
    let fb_payload = payload.clone();
    let out = app
        .features
        .food
        .run(
            key,
            || async move {
                let (ocr_text, vision_items) = match (&upload, image_mode) {
                    (Some(img), true) => vision_calls(&gw, img).await,
                    _ => (String::new(), Vec::new()),
                };
                let from = if image_mode { "image" } else { "text" };
                Some(analyze(&attempt_payload, &ocr_text, &vision_items, from))
            },
            |raw| raw,
            || analyze(&fb_payload, "", &[], "rate-limit"),
        )
        .await;
    Ok(Json(out))
}

/// Two independent vision passes: one reads the ingredient label, one detects
/// food items with gram estimates. Either may come back empty; the rule
/// engine below copes with whatever survived.
async fn vision_calls(app: &App, img: &UploadedImage) -> (String, Vec<Value>) {
    let b64 = BASE64.encode(&img.bytes);

    let ocr_parts = vec![
        text_part(
            "Extract the ingredient list from this pet-food label. \
             Return STRICT JSON: {\"ingredients\": string} (comma-separated, \
             empty string if no label is visible).",
        ),
        inline_data_part(&img.mime, &b64),
    ];
    let ocr_text = match gateway::generate_json(app, ocr_parts, 0.0).await {
        ProviderReply::Json(v) => v["ingredients"].as_str().unwrap_or("").to_string(),
        _ => String::new(),
    };

    let detect_parts = vec![
        text_part(
            "Detect the food items visible in this photo with rough portion sizes. \
             Return STRICT JSON: {\"items\": [{\"name\": string, \"grams\": number}]}.",
        ),
        inline_data_part(&img.mime, &b64),
    ];
    let vision_items = match gateway::generate_json(app, detect_parts, 0.0).await {
        ProviderReply::Json(v) => v["items"].as_array().cloned().unwrap_or_default(),
        _ => Vec::new(),
    };

    (ocr_text, vision_items)
}

/// Deterministic rule engine over whatever text and vision output we have.
fn analyze(payload: &FoodPayload, ocr_text: &str, vision_items: &[Value], from: &str) -> Value {
    let mut combined = payload.ingredients.clone().unwrap_or_default();
    if !ocr_text.trim().is_empty() {
        combined.push('\n');
        combined.push_str(ocr_text);
    }
    let ingredients = split_ingredients(&combined);
    let (text_rating, harmful) = score_food(&ingredients, &payload.animal);

    let daily = daily_kcal(&payload.animal, payload.weight_kg);
    let daily_qty_g = estimate_qty_grams(payload.weight_kg, daily);
    let table = items_to_table(vision_items, daily);

    let rating = if !table.is_empty() {
        if table.iter().any(|t| t["pet_ok"] == json!(false)) {
            "bad".to_string()
        } else if table
            .iter()
            .any(|t| t["kcal_g"].as_f64().unwrap_or(0.0) >= HIGH_KCAL_PER_G)
        {
            "caution".to_string()
        } else {
            text_rating
        }
    } else {
        text_rating
    };

    json!({
        "rating": rating,
        "harmful": harmful,
        "better": BETTER_BRANDS,
        "daily_qty_g": daily_qty_g,
        "source": {
            "from": from,
            "ocr_text": ocr_text,
            "vision_items": table,
        },
        "ingredients": ingredients,
    })
}

/// Tokenize a pasted or OCR'd ingredient blob into clean lowercase entries.
fn split_ingredients(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || matches!(c, ',' | ' ' | '-' | '(' | ')' | '/' | '.')
            {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut seen = Vec::new();
    for piece in cleaned.split(',') {
        let trimmed = piece.trim_matches(|c: char| c.is_whitespace() || c == '.');
        let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() && !seen.contains(&collapsed) {
            seen.push(collapsed);
        }
        if seen.len() >= MAX_INGREDIENTS {
            break;
        }
    }
    seen
}

fn harmful_set(animal: &str) -> Vec<&'static str> {
    match animal.trim().to_lowercase().as_str() {
        "dog" => DOG_HARMFUL.to_vec(),
        "cat" => CAT_HARMFUL.to_vec(),
        _ => {
            let mut all = DOG_HARMFUL.to_vec();
            for c in CAT_HARMFUL {
                if !all.contains(c) {
                    all.push(c);
                }
            }
            all
        }
    }
}

/// Overall rating is "bad" on any harmful hit, "caution" on two or more
/// caution hits, else "good". Only harmful-set matches are reported back to
/// the caller, as plain ingredient strings; caution hits feed the rating only.
fn score_food(ingredients: &[String], animal: &str) -> (String, Vec<String>) {
    let harmful = harmful_set(animal);
    let mut flagged: Vec<String> = Vec::new();
    let mut caution_hits = 0usize;

    for item in ingredients {
        if harmful.iter().any(|h| item.contains(h)) {
            if flagged.len() < MAX_FLAGGED {
                flagged.push(item.clone());
            }
        } else if UNIVERSAL_CAUTION.iter().any(|c| item.contains(c)) {
            caution_hits += 1;
        }
    }

    let rating = if !flagged.is_empty() {
        "bad"
    } else if caution_hits >= 2 {
        "caution"
    } else {
        "good"
    };
    (rating.to_string(), flagged)
}

/// Resting-energy formula (70 * kg^0.75) with a species activity multiplier.
fn daily_kcal(animal: &str, weight_kg: Option<f64>) -> f64 {
    let kg = weight_kg.filter(|w| *w > 0.0).unwrap_or(8.0);
    let factor = if animal.trim().eq_ignore_ascii_case("cat") {
        1.2
    } else {
        1.4
    };
    70.0 * kg.powf(0.75) * factor
}

fn estimate_qty_grams(weight_kg: Option<f64>, daily_kcal: f64) -> i64 {
    if weight_kg.filter(|w| *w > 0.0).is_none() {
        return 180;
    }
    (daily_kcal / HIGH_KCAL_PER_G).clamp(60.0, 400.0).round() as i64
}

fn grams_of(v: &Value) -> Option<f64> {
    match &v["grams"] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|g| *g != 0.0)
}

/// Map detected items onto the energy-density table, flag each one and
/// suggest a treat budget from the pet's daily energy need.
fn items_to_table(items: &[Value], daily_kcal: f64) -> Vec<Value> {
    items
        .iter()
        .filter_map(|item| {
            let name = item["name"].as_str()?.trim().to_lowercase();
            if name.is_empty() {
                return None;
            }
            let grams = grams_of(item);

            let info = FOOD_DB
                .iter()
                .find(|f| name.contains(f.name) || f.name.contains(name.as_str()));
            let (kcal_per_g, pet_ok, tags): (f64, bool, Vec<String>) = match info {
                Some(f) => (f.kcal_per_g, f.pet_ok, f.tags.iter().map(|t| t.to_string()).collect()),
                None => (2.5, false, vec!["unknown".to_string()]),
            };

            let est_kcal = (kcal_per_g * grams.unwrap_or(100.0)).round() as i64;
            let flag = if !pet_ok {
                "unsafe"
            } else if kcal_per_g >= HIGH_KCAL_PER_G {
                "high-calorie"
            } else {
                "ok"
            };
            let max_g = (0.1 * daily_kcal / kcal_per_g.max(0.1)).round() as i64;
            let suggestion = if pet_ok {
                format!("≤ {max_g} g (treat budget).")
            } else {
                "Skip this; not pet-safe.".to_string()
            };

            Some(json!({
                "name": name,
                "grams": grams,
                "kcal_g": kcal_per_g,
                "est_kcal": est_kcal,
                "pet_ok": pet_ok,
                "tags": tags,
                "flag": flag,
                "suggestion": suggestion,
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_payload(ingredients: &str, animal: &str) -> FoodPayload {
        FoodPayload {
            mode: "text".into(),
            ingredients: Some(ingredients.into()),
            animal: animal.into(),
            weight_kg: Some(8.0),
        }
    }

    #[test]
    fn ingredient_splitting_cleans_and_dedupes() {
        let items = split_ingredients("Chicken Meal, SALT!, salt, corn syrup.,  rice  flour ");
        assert_eq!(items, vec!["chicken meal", "salt", "corn syrup", "rice flour"]);
    }

    #[test]
    fn ingredient_list_is_capped() {
        let blob = (0..100).map(|i| format!("item{i}")).collect::<Vec<_>>().join(", ");
        assert_eq!(split_ingredients(&blob).len(), MAX_INGREDIENTS);
    }

    #[test]
    fn harmful_hit_rates_bad() {
        let (rating, flagged) =
            score_food(&split_ingredients("chicken, dark chocolate, rice"), "dog");
        assert_eq!(rating, "bad");
        assert_eq!(flagged, vec!["dark chocolate".to_string()]);
    }

    #[test]
    fn two_caution_hits_rate_caution_one_stays_good() {
        let (rating, flagged) = score_food(&split_ingredients("salt, corn syrup, rice"), "dog");
        assert_eq!(rating, "caution");
        // caution hits drive the rating but stay out of the harmful list
        assert!(flagged.is_empty());
        let (rating, _) = score_food(&split_ingredients("salt, rice"), "dog");
        assert_eq!(rating, "good");
    }

    #[test]
    fn harmful_list_is_plain_ingredient_strings() {
        let payload = text_payload("chicken, chocolate, salt, corn syrup", "dog");
        let out = analyze(&payload, "", &[], "text");
        assert_eq!(out["harmful"], json!(["chocolate"]));
        assert_eq!(out["rating"], json!("bad"));
    }

    #[test]
    fn unknown_species_gets_the_union_of_harm_sets() {
        // ethylene glycol is cat-specific, bht dog-specific
        let (rating, _) = score_food(&split_ingredients("ethylene glycol"), "rabbit");
        assert_eq!(rating, "bad");
        let (rating, _) = score_food(&split_ingredients("bht"), "rabbit");
        assert_eq!(rating, "bad");
    }

    #[test]
    fn daily_quantity_defaults_and_clamps() {
        assert_eq!(estimate_qty_grams(None, daily_kcal("dog", None)), 180);
        let tiny = estimate_qty_grams(Some(0.5), daily_kcal("dog", Some(0.5)));
        assert_eq!(tiny, 60);
        let huge = estimate_qty_grams(Some(100.0), daily_kcal("dog", Some(100.0)));
        assert_eq!(huge, 400);
    }

    #[test]
    fn vision_table_flags_unsafe_and_unknown_items() {
        let items = vec![
            json!({ "name": "donut", "grams": 50 }),
            json!({ "name": "boiled chicken", "grams": "120" }),
            json!({ "name": "mystery paste" }),
            json!({ "grams": 10 }),
        ];
        let table = items_to_table(&items, 466.0);
        assert_eq!(table.len(), 3);
        assert_eq!(table[0]["flag"], json!("unsafe"));
        assert_eq!(table[0]["est_kcal"], json!(215));
        assert_eq!(table[0]["kcal_g"], json!(4.3));
        assert_eq!(table[1]["flag"], json!("ok"));
        assert_eq!(table[1]["grams"], json!(120.0));
        assert_eq!(table[2]["tags"], json!(["unknown"]));
        assert_eq!(table[2]["est_kcal"], json!(250));
    }

    #[test]
    fn vision_verdict_overrides_text_score() {
        let payload = text_payload("rice", "dog");
        let items = vec![json!({ "name": "chocolate", "grams": 20 })];
        let out = analyze(&payload, "", &items, "image");
        assert_eq!(out["rating"], json!("bad"));
        assert_eq!(out["source"]["from"], json!("image"));
    }

    #[test]
    fn high_calorie_table_rates_caution_over_good_text() {
        let payload = text_payload("rice", "dog");
        let items = vec![json!({ "name": "cookies", "grams": 30 })];
        let out = analyze(&payload, "", &items, "image");
        assert_eq!(out["rating"], json!("bad")); // cookies are not pet_ok
        assert_eq!(out["daily_qty_g"], json!(133));
    }

    #[test]
    fn rate_limit_fallback_is_rule_only() {
        let payload = text_payload("chicken, chocolate", "dog");
        let out = analyze(&payload, "", &[], "rate-limit");
        assert_eq!(out["rating"], json!("bad"));
        assert_eq!(out["source"]["from"], json!("rate-limit"));
        assert_eq!(out["source"]["vision_items"], json!([]));
        assert_eq!(out["better"], json!(BETTER_BRANDS));
    }

    #[test]
    fn ocr_text_is_merged_into_ingredients() {
        // the newline join lands inside the first comma-separated token
        let payload = text_payload("rice,", "dog");
        let out = analyze(&payload, "salt, corn syrup", &[], "image");
        let list = out["ingredients"].as_array().unwrap();
        assert!(list.contains(&json!("rice")));
        assert!(list.contains(&json!("salt")));
        assert!(list.contains(&json!("corn syrup")));
        assert_eq!(out["rating"], json!("caution"));
    }
}
