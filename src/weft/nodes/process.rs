// SPDX-License-Identifier: MIT

//! Per-type node processing

use std::collections::BTreeMap;

use super::template;
use super::NodeKind;
use crate::kit::chat::{ChatCompletion, ChatMessage, ChatRequest};
use crate::kit::error::{ChatError, ExecutionError};
use crate::weft::engine::ProcessContext;
use crate::weft::graph::{Node, Value};

/// Compute a node's value, pulling upstream inputs through `ctx`
pub async fn process(node: &Node, ctx: &ProcessContext<'_>) -> Result<Value, ExecutionError> {
    match &node.kind {
        NodeKind::Text { value } => Ok(Value::Text(templated(value, ctx).await?)),
        NodeKind::Number { value } => {
            let text = templated(value, ctx).await?;
            text.trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| ExecutionError::process(node.id, format!("'{}' is not a number", text)))
        }
        NodeKind::Boolean { value } => {
            let text = templated(value, ctx).await?;
            parse_bool(&text).map(Value::Boolean).ok_or_else(|| {
                ExecutionError::process(node.id, format!("'{}' is not a boolean", text))
            })
        }
        NodeKind::Image { source } => Ok(Value::Image(source.clone())),
        NodeKind::Add { a, b } => {
            let (lhs, rhs) = futures::try_join!(ctx.input_at(0), ctx.input_at(1))?;
            let lhs = lhs.and_then(|v| v.to_number()).unwrap_or(*a);
            let rhs = rhs.and_then(|v| v.to_number()).unwrap_or(*b);
            Ok(Value::Number(lhs + rhs))
        }
        NodeKind::Join { separator } => {
            let pulls = (0..node.inputs().count()).map(|i| ctx.input_at(i));
            let parts: Vec<String> = futures::future::try_join_all(pulls)
                .await?
                .into_iter()
                .flatten()
                .map(|v| v.to_text())
                .filter(|s| !s.is_empty())
                .collect();
            let separator = template::unescape_separator(separator);
            Ok(Value::Text(parts.join(separator.as_str())))
        }
        NodeKind::Chat {
            model,
            system,
            prompt,
        } => {
            let (system_in, prompt_in) = futures::try_join!(ctx.input_at(0), ctx.input_at(1))?;
            let system = system_in.map(|v| v.to_text()).unwrap_or_else(|| system.clone());
            let prompt = prompt_in.map(|v| v.to_text()).unwrap_or_else(|| prompt.clone());

            let (response, tokens) = match complete(ctx, model, &system, &prompt).await {
                Ok(completion) => (completion.text, completion.total_tokens as f64),
                Err(e) => {
                    log::warn!("Chat node {} failed: {}", node.id, e);
                    (format!("Error: {}", e), 0.0)
                }
            };

            let mut outputs = BTreeMap::new();
            if let Some(socket) = node.output_at(0) {
                outputs.insert(socket.id, Value::Text(response));
            }
            if let Some(socket) = node.output_at(1) {
                outputs.insert(socket.id, Value::Number(tokens));
            }
            Ok(Value::Outputs(outputs))
        }
    }
}

/// Short-circuits on values without a placeholder; the input is never pulled
async fn templated(value: &str, ctx: &ProcessContext<'_>) -> Result<String, ExecutionError> {
    if !template::has_placeholder(value) {
        return Ok(value.to_string());
    }
    let input = ctx.input_at(0).await?.map(|v| v.to_text());
    Ok(template::render(value, input.as_deref()))
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

async fn complete(
    ctx: &ProcessContext<'_>,
    model: &str,
    system: &str,
    prompt: &str,
) -> Result<ChatCompletion, ChatError> {
    let client = ctx.chat().ok_or(ChatError::ApiKeyMissing)?;

    let mut messages = Vec::with_capacity(2);
    if !system.trim().is_empty() {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(prompt));

    let request = ChatRequest::new(model, messages);
    let limit = ctx.chat_timeout();
    tokio::time::timeout(limit, client.complete(&request))
        .await
        .map_err(|_| ChatError::Timeout(limit))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" no "), Some(false));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("maybe"), None);
    }
}
