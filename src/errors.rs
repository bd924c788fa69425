use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("provider error: {0}")] Provider(String),
    #[error("http {status}: {body}")] Http { status: u16, body: String },
    #[error("parse error: {0}")] Parse(String),
    #[error(transparent)] Validation(#[from] ValidationError),
    #[error("config error: {0}")] Config(String),
}

impl WizardError {
    /// Transport failures, rate limits and gateway errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            WizardError::Provider(_) => true,
            WizardError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
