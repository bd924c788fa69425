use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::retry::{with_retry, RetryPolicy};
use super::{ChatRequest, ChatResponse, Provider};
use crate::config::Config;
use crate::errors::WizardError;

/// OpenRouter-compatible chat-completions client.
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
    app_url: String,
    app_title: String,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct ChatMessageOut {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessageOut,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionBody {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl OpenRouterProvider {
    pub fn new(cfg: &Config, api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(cfg.timeout()).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: cfg.openrouter_base_url.clone(),
            app_url: cfg.app_url.clone(),
            app_title: cfg.app_title.clone(),
            retry: cfg.retry_policy(),
        })
    }

    fn body(req: &ChatRequest) -> Value {
        let mut body = json!({
            "model": req.model,
            "messages": req.messages,
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
        });
        if req.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }

    async fn send_once(&self, url: &str, body: &Value) -> Result<ChatResponse, WizardError> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.app_url)
            .header("X-Title", &self.app_title)
            .json(body)
            .send()
            .await
            .map_err(|e| WizardError::Provider(format!("openrouter request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| WizardError::Provider(format!("openrouter read body failed: {e}")))?;
        debug!(%status, bytes = text.len(), "openrouter response");

        if !status.is_success() {
            return Err(WizardError::Http { status: status.as_u16(), body: text });
        }
        parse_completion(&text, body["model"].as_str().unwrap_or_default())
    }
}

fn parse_completion(text: &str, requested_model: &str) -> Result<ChatResponse, WizardError> {
    let parsed: CompletionBody = serde_json::from_str(text)
        .map_err(|e| WizardError::Parse(format!("failed to parse OpenRouter response: {e}")))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| WizardError::Parse("OpenRouter returned no content".into()))?;
    let usage = parsed.usage.unwrap_or_default();
    Ok(ChatResponse {
        content,
        model: parsed.model.unwrap_or_else(|| requested_model.to_string()),
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
    })
}

#[async_trait]
impl Provider for OpenRouterProvider {
    async fn complete(&self, req: &ChatRequest) -> Result<ChatResponse, WizardError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = Self::body(req);
        debug!(%url, model = %req.model, prompt_chars = req.user_prompt().len(), "POST chat completion");
        with_retry(&self.retry, "openrouter", |_| self.send_once(&url, &body)).await
    }
}
