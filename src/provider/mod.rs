use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::errors::WizardError;

pub mod openrouter;
pub mod retry;

#[cfg(test)]
pub mod mock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the gateway for `response_format: json_object`.
    pub json_mode: bool,
}

impl ChatRequest {
    pub fn json(cfg: &Config, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: cfg.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            json_mode: true,
        }
    }

    pub fn user_prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, req: &ChatRequest) -> Result<ChatResponse, WizardError>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(cfg: &Config) -> Result<DynProvider> {
    let key = cfg
        .openrouter_api_key
        .clone()
        .ok_or_else(|| anyhow!("OPENROUTER_API_KEY env var is not set"))?;
    Ok(Box::new(openrouter::OpenRouterProvider::new(cfg, key)?))
}

/// Completion parsed as a JSON object, with the prose/code-fence fallback applied.
pub async fn complete_json(provider: &dyn Provider, req: &ChatRequest) -> Result<(Value, ChatResponse), WizardError> {
    let resp = provider.complete(req).await?;
    let value = parse_json_content(&resp.content)?;
    Ok((value, resp))
}

pub fn parse_json_content(content: &str) -> Result<Value, WizardError> {
    if let Ok(v) = serde_json::from_str::<Value>(content.trim()) {
        if v.is_object() || v.is_array() {
            return Ok(v);
        }
    }
    if let Some(obj) = extract_json_object(content) {
        if let Ok(v) = serde_json::from_str::<Value>(obj) {
            return Ok(v);
        }
    }
    let preview: String = content.chars().take(400).collect();
    Err(WizardError::Parse(format!(
        "model did not return a valid JSON object\n--- content start ---\n{preview}\n--- content end ---"
    )))
}

/// First balanced top-level `{...}` in `s`. Braces inside JSON strings are ignored.
pub fn extract_json_object(s: &str) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if start.is_some() => in_string = true,
            '{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|st| &s[st..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
