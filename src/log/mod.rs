use crate::config::Config;
use crate::provider::{ChatRequest, ChatResponse};
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Install the fmt subscriber. `WIZARD_LOG` wins over `--debug`.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "tribal_wizard=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_env("WIZARD_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone)]
pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: PathBuf,
    pub response: PathBuf,
}

/// Request/response pairs of one wizard run, kept under `<root>/.wizard/runs/<run id>/`.
#[derive(Debug, Clone)]
pub struct ArtifactLog {
    pub run_id: Uuid,
    dir: PathBuf,
}

#[derive(Serialize)]
struct StageResponse<'a> {
    model: &'a str,
    prompt_tokens: u32,
    completion_tokens: u32,
    content: &'a str,
}

pub fn run_dir(root: &Path, run_id: Uuid) -> PathBuf {
    root.join(".wizard").join("runs").join(run_id.to_string())
}

impl ArtifactLog {
    pub fn new(cfg: &Config, run_id: Uuid) -> Self {
        Self { run_id, dir: run_dir(Path::new(&cfg.root), run_id) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_stage(&self, stage: &str, req: &ChatRequest, resp: &ChatResponse) -> anyhow::Result<SavedPaths> {
        fs::create_dir_all(&self.dir)?;
        let request = self.dir.join(format!("{stage}.request.json"));
        fs::write(&request, to_string_pretty(req)?)?;
        let response = self.dir.join(format!("{stage}.response.json"));
        let body = StageResponse {
            model: &resp.model,
            prompt_tokens: resp.prompt_tokens,
            completion_tokens: resp.completion_tokens,
            content: &resp.content,
        };
        fs::write(&response, to_string_pretty(&body)?)?;
        debug!(stage, dir = %self.dir.display(), "artifacts saved");
        Ok(SavedPaths { dir: self.dir.clone(), request, response })
    }

    /// Artifacts are a debugging aid; failing to write them never fails the run.
    pub fn record(&self, stage: &str, req: &ChatRequest, resp: &ChatResponse) {
        if let Err(e) = self.save_stage(stage, req, resp) {
            warn!(stage, error = %e, "could not save artifacts");
        }
    }

    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let p = self.dir.join(format!("{name}.json"));
        fs::write(&p, to_string_pretty(value)?)?;
        Ok(p)
    }
}
