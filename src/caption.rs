use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::excerpt;

pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

/// Caption used when generation fails for any reason.
pub const CAPTION_FALLBACK: &str = "Error generating description.";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("request to generation service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("generation service returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Outbound caption-generation capability.
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    /// Produces one sentence describing an image that contains `labels`.
    async fn describe(&self, labels: &[String]) -> Result<String, GenerateError>;
}

pub fn build_prompt(labels: &[String]) -> String {
    format!(
        "Based on these detected objects in an image: {}. Please provide a natural, \
         descriptive sentence about what this image likely contains. Keep it concise.",
        labels.join(", ")
    )
}

/// Pulls `candidates[0].content.parts[0].text` out of a generateContent
/// response. Missing keys give an empty caption.
pub fn extract_caption(result: &Value) -> String {
    result["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiCaptioner {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiCaptioner {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl CaptionGenerator for GeminiCaptioner {
    async fn describe(&self, labels: &[String]) -> Result<String, GenerateError> {
        let payload = serde_json::json!({
            "contents": [{
                "parts": [{ "text": build_prompt(labels) }]
            }]
        });

        debug!("sending prompt to Gemini");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        debug!(%status, body = %excerpt(&response_text, 500), "Gemini responded");

        if !status.is_success() {
            return Err(GenerateError::Status {
                status,
                body: excerpt(&response_text, 500),
            });
        }

        let result: Value = serde_json::from_str(&response_text)?;
        Ok(extract_caption(&result))
    }
}
