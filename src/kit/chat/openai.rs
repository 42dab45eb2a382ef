// SPDX-License-Identifier: MIT

//! OpenAI-compatible chat-completions client

use super::{ChatCompletion, ChatModel, ChatRequest};
use crate::kit::error::ChatError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat client for any endpoint speaking the OpenAI wire format
pub struct OpenAiChat {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiChat {
    /// Create a new client.
    ///
    /// `timeout` bounds the whole request, connect through body.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ChatError::ApiKeyMissing);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn request_body(request: &ChatRequest) -> serde_json::Value {
        json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "top_p": request.top_p,
            "stream": false
        })
    }

    /// Parse a chat-completions response body
    fn parse_response(response: &serde_json::Value) -> Result<ChatCompletion, ChatError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ChatError::InvalidResponse("no choices in response".to_string()))?;

        let text = choice["message"]["content"]
            .as_str()
            .ok_or_else(|| ChatError::InvalidResponse("choice has no text content".to_string()))?
            .to_string();

        let total_tokens = response["usage"]["total_tokens"].as_u64().unwrap_or(0);

        Ok(ChatCompletion { text, total_tokens })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(request);

        log::debug!(
            "Chat request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let resp_json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
        log::debug!("Chat response: {}", resp_json);

        Self::parse_response(&resp_json)
    }
}
