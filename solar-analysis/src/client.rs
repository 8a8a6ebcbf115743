use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{AnalyzerError, Result};
use crate::ingest::EncodedImagePayload;
use crate::prompt::solar_analysis_prompt;

/// Generation budget for the reply; the prompt asks for one JSON object.
const MAX_COMPLETION_TOKENS: u32 = 1500;

/// Near-deterministic sampling keeps repeated estimates stable.
const TEMPERATURE: f64 = 0.1;

/// Client for the vision-capable chat-completion endpoint.
///
/// Exactly one upstream call per invocation: no retry, no streaming, and no
/// locally configured timeout (the transport's defaults apply).
#[derive(Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnalysisClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Send the fixed prompt plus the encoded image and return the raw reply
    /// text of the single completion.
    ///
    /// Transport, authentication, and upstream failures all come back as
    /// [`AnalyzerError::Upstream`] values rather than panics.
    pub async fn request_analysis(&self, image: &EncodedImagePayload) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": solar_analysis_prompt() },
                        { "type": "image_url", "image_url": { "url": image.data_url() } }
                    ]
                }
            ],
            "max_tokens": MAX_COMPLETION_TOKENS,
            "temperature": TEMPERATURE,
        });

        debug!(model = %self.model, "sending analysis request");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| AnalyzerError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalyzerError::Upstream(format!(
                "analysis API request failed: {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AnalyzerError::Upstream(e.to_string()))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                AnalyzerError::Upstream("invalid response format from model".to_string())
            })?;

        info!(reply_chars = content.len(), "analysis reply received");
        Ok(content.to_string())
    }
}
