// SPDX-License-Identifier: MIT

//! Environment-driven settings

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::kit::chat::openai::{OpenAiChat, DEFAULT_BASE_URL};
use crate::kit::chat::ChatModel;
use crate::kit::error::WeftError;
use crate::weft::engine::DEFAULT_CHAT_TIMEOUT;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `OPENAI_API_KEY`; blank counts as unset
    pub api_key: Option<String>,
    /// `OPENAI_BASE_URL`
    pub base_url: String,
    /// `WEFT_CHAT_TIMEOUT_SECS`
    pub chat_timeout: Duration,
    /// `WEFT_PORT`
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self, WeftError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key -> value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WeftError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        let base_url = lookup("OPENAI_BASE_URL")
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let chat_timeout = match lookup("WEFT_CHAT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse(&raw, "WEFT_CHAT_TIMEOUT_SECS")?),
            None => DEFAULT_CHAT_TIMEOUT,
        };
        let port = match lookup("WEFT_PORT") {
            Some(raw) => parse(&raw, "WEFT_PORT")?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_key,
            base_url,
            chat_timeout,
            port,
        })
    }

    /// The configured chat provider, `None` without an API key
    pub fn chat_model(&self) -> Result<Option<Arc<dyn ChatModel>>, WeftError> {
        let Some(key) = &self.api_key else {
            return Ok(None);
        };
        let client = OpenAiChat::new(key.as_str(), self.base_url.as_str(), self.chat_timeout)
            .map_err(|e| WeftError::config(e.to_string()))?;
        Ok(Some(Arc::new(client)))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
            port: DEFAULT_PORT,
        }
    }
}

/// A positive integer; zero is rejected like any other malformed value
fn parse<T>(raw: &str, key: &str) -> Result<T, WeftError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(WeftError::config(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
    }
}
