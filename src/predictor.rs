use crate::config::PredictorConfig;
use crate::errors::AppError;
use crate::models::{Prediction, PredictionRequest};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are an expert horse racing analyst. Given a race name and date, \
predict the horse with the highest expected value. Consider past performance, track conditions, \
jockey, and odds. Reply with a JSON object with the string fields \"predicted_horse\" and \
\"reasoning\" (a brief explanation).";

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct PredictorClient {
    http: reqwest::Client,
    config: PredictorConfig,
}

impl PredictorClient {
    pub fn new(http: reqwest::Client, config: PredictorConfig) -> Self {
        Self { http, config }
    }

    pub async fn predict(&self, request: &PredictionRequest) -> Result<Prediction, AppError> {
        let start = Instant::now();
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(request),
                },
            ],
            temperature: Some(0.4),
        };

        let resp = self
            .http
            .post(&self.config.api_url)
            .timeout(self.config.timeout)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!("predictor request failed: {err}");
                AppError::bad_gateway(format!("predictor request failed: {err}"))
            })?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let snippet: String = text.chars().take(400).collect();
            warn!("predictor returned {}: {snippet}", status.as_u16());
            return Err(AppError::bad_gateway(format!(
                "predictor returned {}",
                status.as_u16()
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|err| {
            warn!("predictor response was not valid json: {err}");
            AppError::bad_gateway("predictor response was not valid json")
        })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .map(|message| message.content)
            .unwrap_or_default();

        let prediction = parse_prediction(&content)
            .ok_or_else(|| AppError::bad_gateway("predictor returned an empty answer"))?;
        info!(
            race = %request.race_name,
            latency_ms = start.elapsed().as_millis() as u64,
            "prediction ready"
        );
        Ok(prediction)
    }
}

fn user_prompt(request: &PredictionRequest) -> String {
    format!(
        "Race Name: {}\nDate: {}",
        request.race_name.trim(),
        request.date.trim()
    )
}

/// Reads the model's answer. Accepts a bare JSON object or one inside a
/// fenced code block; anything else is treated as free text whose first
/// non-empty line names the horse.
pub fn parse_prediction(content: &str) -> Option<Prediction> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(prediction) = serde_json::from_str::<Prediction>(&trimmed[start..=end]) {
                return Some(prediction);
            }
        }
    }

    let horse = trimmed
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string();
    Some(Prediction {
        predicted_horse: horse,
        reasoning: trimmed.to_string(),
    })
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}
