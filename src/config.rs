use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/ledger.json";
pub const DEFAULT_PREDICTOR_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_PREDICTOR_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub predictor: Option<PredictorConfig>,
}

#[derive(Debug, Clone)]
pub struct PredictorConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so it can be tested
    /// without touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = non_empty("PORT")
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_path = non_empty("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let predictor = non_empty("PREDICTOR_API_KEY").map(|api_key| PredictorConfig {
            api_url: non_empty("PREDICTOR_API_URL")
                .unwrap_or_else(|| DEFAULT_PREDICTOR_URL.to_string()),
            api_key: api_key.trim().to_string(),
            model: non_empty("PREDICTOR_MODEL")
                .unwrap_or_else(|| DEFAULT_PREDICTOR_MODEL.to_string()),
            timeout: Duration::from_secs(
                non_empty("PREDICTOR_TIMEOUT_SECS")
                    .and_then(|value| value.trim().parse().ok())
                    .unwrap_or(30),
            ),
        });

        Self {
            port,
            data_path,
            predictor,
        }
    }
}
