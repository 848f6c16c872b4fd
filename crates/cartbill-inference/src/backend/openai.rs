//! OpenAI-compatible chat completions backend.
//!
//! Works with any server exposing `/chat/completions` and accepting image
//! content parts as `data:` URLs: Ollama, vLLM, LM Studio and hosted APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::InferenceProvider;
use crate::{ImagePayload, InferenceError, Result};

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// API root including the version segment, e.g. `http://localhost:11434/v1`.
    pub base_url: String,
    /// Model name, e.g. `llava`.
    pub model: String,
    /// Bearer token. Local servers ignore it, so a placeholder is sent when absent.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat completions client.
pub struct OpenAiBackend {
    client: Client,
    settings: OpenAiSettings,
}

impl OpenAiBackend {
    /// Create a new backend with its own HTTP client.
    pub fn new(settings: OpenAiSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

fn build_request<'a>(model: &'a str, image: &ImagePayload, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: vec![
                ContentPart::Text { text: prompt },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.to_data_url(),
                    },
                },
            ],
        }],
        temperature: 0.0,
    }
}

fn response_text(response: ChatResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| InferenceError::MalformedResponse("no choices".to_string()))?;

    match choice.message.content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(InferenceError::EmptyResponse),
    }
}

#[async_trait]
impl InferenceProvider for OpenAiBackend {
    async fn infer(&self, image: &ImagePayload, prompt: &str) -> Result<String> {
        let api_key = self.settings.api_key.as_deref().unwrap_or("none");

        debug!(
            url = %self.settings.base_url,
            model = %self.settings.model,
            image_bytes = image.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&build_request(&self.settings.model, image, prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api { status, body });
        }

        response_text(response.json().await?)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}
