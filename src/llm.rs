//! Generation gateway.
//!
//! [`LlmGateway`] is the seam the pipeline talks through; the concrete
//! [`OpenAiGateway`] targets the OpenAI chat-completions API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::errors::SummarizeError;

const OPENAI_API: &str = "https://api.openai.com/v1/chat/completions";
const TEMPERATURE: f64 = 0.2;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// A chat-completion backend.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a system + user prompt pair and return the completion text.
    /// With `json_mode` the backend is asked to emit a JSON object.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        json_mode: bool,
    ) -> Result<String, SummarizeError>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: String,
}

/// OpenAI chat-completions client.
pub struct OpenAiGateway {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiGateway {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        json_mode: bool,
    ) -> Result<String, SummarizeError> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "temperature": TEMPERATURE,
        });
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(OPENAI_API)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SummarizeError::Generation(format!("LLM call failed: {e}")))?;

        match response.status().as_u16() {
            200 => {}
            401 => {
                return Err(SummarizeError::Generation(
                    "invalid OpenAI API key, set a valid key in OPENAI_API_KEY".to_string(),
                ));
            }
            429 => {
                let detail = response.text().await.unwrap_or_default();
                error!(detail = %detail, "OpenAI rate limit");
                return Err(SummarizeError::Generation(format!(
                    "OpenAI rate limit / quota error: {detail}"
                )));
            }
            status => {
                return Err(SummarizeError::Generation(format!(
                    "OpenAI returned HTTP {status}"
                )));
            }
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::Generation(format!("malformed completion response: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(SummarizeError::Generation(
                "LLM returned an empty response".to_string(),
            ));
        }

        Ok(content)
    }
}
