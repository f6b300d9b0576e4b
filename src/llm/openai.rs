use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, LlmError};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: OpenAiMessage,
}

/// Non-streaming chat-completion client for an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    config: OpenAiConfig,
    model: String,
}

impl ChatClient {
    pub fn new(config: OpenAiConfig, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            config,
            model: model.into(),
        }
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|m| OpenAiMessage {
                    role: m.role.clone(),
                    content: m.content.clone(),
                })
                .collect(),
            // Answers must stay grounded in the retrieved context.
            temperature: 0.0,
        };

        let mut req = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Content-Type", "application/json")
            .json(&body);

        if !self.config.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.config.api_key));
        }

        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status,
                message: text,
            });
        }

        let data: ChatCompletionResponse = resp.json().await?;
        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("chat completion returned no choices".into()))
    }
}
