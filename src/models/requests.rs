use serde::Deserialize;

/// Body for `POST /api/train`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainIn {
    #[serde(rename = "petType")]
    pub pet_type: String,
    #[serde(default)]
    pub age: Option<String>,
    pub problem: String,
    #[serde(default)]
    pub goal: Option<String>,
}

/// Body for `POST /api/voice/analyze`.
#[derive(Debug, Deserialize)]
pub struct VoiceIn {
    pub audio_b64: String,
    #[serde(default)]
    pub mime: Option<String>,
}

/// Body for `POST /api/recommend` (JSON variant; the multipart variant
/// carries the same fields plus an optional photo).
#[derive(Debug, Deserialize)]
pub struct RecommendIn {
    pub house: String,
    pub budget: String,
    pub lifestyle: String,
    #[serde(default = "default_no")]
    pub allergies: String,
    pub time: String,
    #[serde(default)]
    pub name: Option<String>,
}

fn default_no() -> String {
    "no".into()
}

/// Body for `POST /api/food/analyze` (JSON variant).
#[derive(Debug, Deserialize)]
pub struct FoodIn {
    #[serde(default = "default_text_mode")]
    pub mode: String,
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default = "default_dog")]
    pub animal: String,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

fn default_text_mode() -> String {
    "text".into()
}

fn default_dog() -> String {
    "dog".into()
}

/// One daily entry from the frontend's health journal.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthEntry {
    #[serde(rename = "dateISO", default)]
    pub date_iso: Option<String>,
    #[serde(default)]
    pub food: Option<String>,
    #[serde(default)]
    pub water: Option<f64>,
    #[serde(default)]
    pub vomit: Option<String>,
    #[serde(default)]
    pub diarrhea: Option<String>,
    #[serde(default)]
    pub activity: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body for `POST /api/health/analyze-logs`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeLogsIn {
    pub logs: Vec<HealthEntry>,
}
