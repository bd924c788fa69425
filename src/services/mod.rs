use serde_json::Value;
use tracing::info;

use crate::config::Config;
use crate::errors::WizardError;
use crate::log::ArtifactLog;
use crate::prompt;
use crate::provider::{complete_json, ChatRequest, ChatResponse, Provider};

pub mod apify;
pub mod content;
pub mod narratives;
pub mod rag;
pub mod thumbnail;
pub mod video_titles;
pub mod youtube_seo;

/// What every LLM-backed service needs for one call.
#[derive(Clone, Copy)]
pub struct ServiceCtx<'a> {
    pub provider: &'a dyn Provider,
    pub cfg: &'a Config,
    pub artifacts: Option<&'a ArtifactLog>,
}

impl<'a> ServiceCtx<'a> {
    pub fn new(provider: &'a dyn Provider, cfg: &'a Config) -> Self {
        Self { provider, cfg, artifacts: None }
    }

    pub fn with_artifacts(mut self, artifacts: Option<&'a ArtifactLog>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn request(&self, user_prompt: impl Into<String>) -> ChatRequest {
        ChatRequest::json(self.cfg, prompt::system_prompt(), user_prompt)
    }

    /// One JSON completion, recorded as `<stage>` in the run's artifacts.
    pub async fn call_json(&self, stage: &str, req: &ChatRequest) -> Result<(Value, ChatResponse), WizardError> {
        let started = std::time::Instant::now();
        let result = complete_json(self.provider, req).await;
        match &result {
            Ok((_, resp)) => {
                info!(stage, model = %resp.model, elapsed_ms = started.elapsed().as_millis() as u64, "llm call finished");
                if let Some(a) = self.artifacts {
                    a.record(stage, req, resp);
                }
            }
            Err(e) => info!(stage, error = %e, "llm call failed"),
        }
        result
    }
}
