use crate::config::toml_config::ModelConfig;
use crate::core::{VisionModel, VisionReply, VisionRequest};
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Anthropic Messages API client. Model id and output bound come from
/// configuration and are the same for every request.
pub struct AnthropicClient {
    client: Client,
    url: String,
    api_key: String,
    api_version: String,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: [RequestBlock<'a>; 2],
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RequestBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ReplyBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplyBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl AnthropicClient {
    pub fn new(config: &ModelConfig, api_key: String) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| ScanError::ConfigValidationError {
            field: "model".to_string(),
            message: format!("cannot build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            url: format!("{}/v1/messages", config.endpoint.trim_end_matches('/')),
            api_key,
            api_version: config.api_version.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl VisionModel for AnthropicClient {
    async fn complete(&self, request: VisionRequest) -> Result<VisionReply> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [UserMessage {
                role: "user",
                content: [
                    RequestBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type: request.media_type,
                            data: &request.image_base64,
                        },
                    },
                    RequestBlock::Text {
                        text: &request.prompt,
                    },
                ],
            }],
        };

        tracing::debug!(url = %self.url, model = %self.model, "Sending messages request");
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::extraction(format!("request to model failed: {}", e)))?;

        let status = response.status();
        tracing::debug!(%status, "Model response status");
        let text = response
            .text()
            .await
            .map_err(|e| ScanError::extraction(format!("cannot read model response: {}", e)))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => format!("{}: {} (HTTP {})", envelope.error.kind, envelope.error.message, status.as_u16()),
                Err(_) => format!("HTTP {}: {}", status.as_u16(), text),
            };
            return Err(ScanError::extraction(message));
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| ScanError::extraction(format!("unexpected model response shape: {}", e)))?;

        let text_blocks = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ReplyBlock::Text { text } => Some(text),
                ReplyBlock::Other => None,
            })
            .collect();

        Ok(VisionReply { text_blocks })
    }
}
