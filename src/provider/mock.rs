use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ChatRequest, ChatResponse, Provider};
use crate::errors::WizardError;

/// Replays canned completions in order and records every request it saw.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, WizardError>>>,
    pub seen: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, WizardError>>) -> Self {
        Self { replies: Mutex::new(replies.into()), seen: Mutex::new(Vec::new()) }
    }

    pub fn replying(contents: &[&str]) -> Self {
        Self::new(contents.iter().map(|c| Ok(c.to_string())).collect())
    }

    pub fn last_prompt(&self) -> String {
        self.seen.lock().unwrap().last().map(|r| r.user_prompt().to_string()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, req: &ChatRequest) -> Result<ChatResponse, WizardError> {
        self.seen.lock().unwrap().push(req.clone());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(ChatResponse {
                content,
                model: req.model.clone(),
                prompt_tokens: 0,
                completion_tokens: 0,
            }),
            Some(Err(e)) => Err(e),
            None => Err(WizardError::Provider("script exhausted".into())),
        }
    }
}
