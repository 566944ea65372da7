use std::{env, sync::Arc};

use reqwest::Client;

use crate::constants;
use crate::services::pipeline::FeatureChannel;

/// Environment-derived configuration, read once at startup.
#[derive(Debug)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub hf_token: String,
    pub hf_model: String,
    pub hf_chat_url: String,
    pub backend_timeout_secs: u64,
    pub cache_max_entries: usize,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let gemini_api_key =
            env::var("GEMINI_API_KEY").map_err(|_| "Set GEMINI_API_KEY in .env".to_string())?;
        let hf_token = env::var("HF_TOKEN").map_err(|_| "Set HF_TOKEN in .env".to_string())?;

        Ok(Self {
            gemini_api_key,
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "models/gemini-2.5-flash".into()),
            hf_token,
            hf_model: env::var("HF_TEXT_MODEL")
                .unwrap_or_else(|_| "HuggingFaceH4/zephyr-7b-beta:featherless-ai".into()),
            hf_chat_url: env::var("HF_CHAT_URL").unwrap_or_else(|_| {
                "https://api-inference.huggingface.co/v1/chat/completions".into()
            }),
            backend_timeout_secs: env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(90),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(constants::DEFAULT_CACHE_MAX_ENTRIES),
            port: env::var("HOST_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
        })
    }
}

/// One limiter + cache pair per feature, constructed at startup and injected
/// through axum state. Keeps admission and memoization isolated per feature.
pub struct Features {
    pub predict: FeatureChannel,
    pub voice: FeatureChannel,
    pub caption: FeatureChannel,
    pub recommend: FeatureChannel,
    pub train: FeatureChannel,
    pub food: FeatureChannel,
    pub health_logs: FeatureChannel,
}

impl Features {
    pub fn new(cache_max_entries: usize) -> Self {
        Self {
            predict: FeatureChannel::new("predict", constants::PREDICT_BUCKET, cache_max_entries),
            voice: FeatureChannel::new("voice", constants::VOICE_BUCKET, cache_max_entries),
            caption: FeatureChannel::new("caption", constants::CAPTION_BUCKET, cache_max_entries),
            recommend: FeatureChannel::new(
                "recommend",
                constants::RECOMMEND_BUCKET,
                cache_max_entries,
            ),
            train: FeatureChannel::new("train", constants::TRAIN_BUCKET, cache_max_entries),
            food: FeatureChannel::new("food", constants::FOOD_BUCKET, cache_max_entries),
            health_logs: FeatureChannel::new(
                "health-logs",
                constants::HEALTH_LOG_BUCKET,
                cache_max_entries,
            ),
        }
    }
}

#[derive(Clone)]
pub struct App {
    pub client: Client,
    pub cfg: Arc<Config>,
    pub features: Arc<Features>,
}
