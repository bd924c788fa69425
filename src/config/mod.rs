use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::provider::retry::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: String,
    pub root: String,
    pub output_dir: String,
    pub model: String,
    pub openrouter_base_url: String,
    #[serde(skip_serializing)]
    pub openrouter_api_key: Option<String>,
    pub app_url: String,
    pub app_title: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub apify_base_url: String,
    #[serde(skip_serializing)]
    pub apify_token: Option<String>,
    pub apify_actor: String,
    pub apify_poll_interval_secs: u64,
    pub apify_max_polls: u32,
    pub rag_url: Option<String>,
    pub rag_index: Option<String>,
    pub save_artifacts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: "2025-10-01".into(),
            root: ".".into(),
            output_dir: "wizard-out".into(),
            model: "google/gemini-2.5-flash".into(),
            openrouter_base_url: "https://openrouter.ai/api/v1".into(),
            openrouter_api_key: None,
            app_url: "https://tribal.local".into(),
            app_title: "Tribal Content Wizard".into(),
            temperature: 0.7,
            max_tokens: 8000,
            timeout_secs: 120,
            max_retries: 3,
            retry_base_ms: 1000,
            apify_base_url: "https://api.apify.com/v2".into(),
            apify_token: None,
            apify_actor: "pintostudio~youtube-transcript-scraper".into(),
            apify_poll_interval_secs: 5,
            apify_max_polls: 60,
            rag_url: None,
            rag_index: None,
            save_artifacts: true,
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then the environment (`.env` included).
    pub fn load(path: Option<&str>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = match path {
            Some(p) => {
                let s = fs::read_to_string(p)?;
                toml::from_str::<Config>(&s).with_context(|| format!("parsing config {p}"))?
            }
            None => Config::default(),
        };
        cfg.apply_env_with(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    pub fn apply_env_with(&mut self, get: impl Fn(&str) -> Option<String>) {
        let non_empty = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty("OPENROUTER_API_KEY") { self.openrouter_api_key = Some(v); }
        if let Some(v) = non_empty("OPENROUTER_BASE_URL") { self.openrouter_base_url = v; }
        if let Some(v) = non_empty("WIZARD_MODEL") { self.model = v; }
        if let Some(v) = non_empty("APIFY_API_TOKEN") { self.apify_token = Some(v); }
        if let Some(v) = non_empty("WIZARD_RAG_URL") { self.rag_url = Some(v); }
        if let Some(v) = non_empty("WIZARD_RAG_INDEX") { self.rag_index = Some(v); }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: Config = toml::from_str("model = \"anthropic/claude-sonnet-4\"\nmax_retries = 1\n").unwrap();
        assert_eq!(cfg.model, "anthropic/claude-sonnet-4");
        assert_eq!(cfg.max_retries, 1);
        assert_eq!(cfg.openrouter_base_url, "https://openrouter.ai/api/v1");
        assert_eq!(cfg.retry_policy().base_delay, Duration::from_secs(1));
    }

    #[test]
    fn env_overrides_file_values_and_skips_blanks() {
        let env: HashMap<&str, &str> = [
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("WIZARD_MODEL", "  "),
            ("WIZARD_RAG_URL", "http://localhost:8787"),
        ]
        .into_iter()
        .collect();
        let mut cfg = Config::default();
        cfg.apply_env_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.openrouter_api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(cfg.model, "google/gemini-2.5-flash");
        assert_eq!(cfg.rag_url.as_deref(), Some("http://localhost:8787"));
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut cfg = Config::default();
        cfg.openrouter_api_key = Some("secret".into());
        let out = toml::to_string(&cfg).unwrap();
        assert!(!out.contains("secret"));
    }
}
