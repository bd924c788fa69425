use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::wire::ServiceResult;

static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|embed/|shorts/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[?&#/]|$)",
    )
    .expect("static regex")
});

/// 11-character video id from `watch?v=`, `youtu.be/`, `embed/` or `shorts/` URLs.
pub fn extract_youtube_video_id(url: &str) -> Option<String> {
    YOUTUBE_ID.captures(url.trim()).map(|c| c[1].to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub text: String,
    pub segments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Succeeded,
    Failed,
}

pub fn classify_status(status: &str) -> RunStatus {
    match status {
        "SUCCEEDED" => RunStatus::Succeeded,
        "FAILED" | "ABORTED" | "TIMED-OUT" | "ABORTING" | "TIMING-OUT" => RunStatus::Failed,
        _ => RunStatus::Pending,
    }
}

/// Join transcript segments from the dataset shapes the scraper actors emit:
/// `{text}`, `{transcript: string|[{text}]}` or `{data: [{text}]}`.
pub fn transcript_from_items(items: &[Value]) -> (String, usize) {
    let mut parts: Vec<String> = Vec::new();
    for item in items {
        if let Some(arr) = item.get("data").and_then(Value::as_array) {
            push_segments(arr, &mut parts);
        } else if let Some(arr) = item.get("transcript").and_then(Value::as_array) {
            push_segments(arr, &mut parts);
        } else if let Some(t) = item.get("transcript").or_else(|| item.get("text")).and_then(Value::as_str) {
            if !t.trim().is_empty() {
                parts.push(t.trim().to_string());
            }
        }
    }
    let n = parts.len();
    (parts.join(" "), n)
}

fn push_segments(arr: &[Value], parts: &mut Vec<String>) {
    for seg in arr {
        if let Some(t) = seg.get("text").and_then(Value::as_str).or_else(|| seg.as_str()) {
            let t = t.trim();
            if !t.is_empty() {
                parts.push(t.to_string());
            }
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorRun {
    id: String,
    status: String,
    #[serde(default)]
    default_dataset_id: Option<String>,
}

pub struct ApifyClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    actor: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl ApifyClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(cfg.timeout()).build()?,
            base_url: cfg.apify_base_url.trim_end_matches('/').to_string(),
            token: cfg.apify_token.clone(),
            actor: cfg.apify_actor.clone(),
            poll_interval: Duration::from_secs(cfg.apify_poll_interval_secs),
            max_polls: cfg.apify_max_polls,
        })
    }

    /// Never fails: missing token, bad URL or a failed run all yield `success: true` with no data.
    pub async fn transcribe(&self, url: &str) -> ServiceResult<Transcript> {
        let Some(video_id) = extract_youtube_video_id(url) else {
            warn!(url, "not a youtube url; skipping transcript");
            return ServiceResult::empty();
        };
        let Some(token) = self.token.as_deref() else {
            warn!("APIFY_API_TOKEN not set; skipping transcript");
            return ServiceResult::empty();
        };
        match self.run_transcript(token, url, &video_id).await {
            Ok(t) if !t.text.is_empty() => ServiceResult::ok(t),
            Ok(_) => {
                warn!(%video_id, "transcript came back empty");
                ServiceResult::empty()
            }
            Err(e) => {
                warn!(%video_id, error = %e, "transcript failed; continuing without it");
                ServiceResult::empty()
            }
        }
    }

    async fn run_transcript(&self, token: &str, url: &str, video_id: &str) -> Result<Transcript> {
        let start_url = format!("{}/acts/{}/runs", self.base_url, self.actor);
        let run: Envelope<ActorRun> = self
            .client
            .post(&start_url)
            .query(&[("token", token)])
            .json(&json!({ "videoUrl": url }))
            .send()
            .await
            .context("apify start run failed")?
            .error_for_status()?
            .json()
            .await
            .context("apify start run parse failed")?;
        info!(run_id = %run.data.id, video_id, "apify run started");

        let status = HttpRunStatus { apify: self, token };
        let finished = wait_for_run(&status, run.data, self.poll_interval, self.max_polls).await?;
        let dataset = finished
            .default_dataset_id
            .ok_or_else(|| anyhow!("apify run {} has no dataset", finished.id))?;

        let items: Vec<Value> = self
            .client
            .get(format!("{}/datasets/{}/items", self.base_url, dataset))
            .query(&[("token", token), ("format", "json")])
            .send()
            .await
            .context("apify dataset fetch failed")?
            .error_for_status()?
            .json()
            .await
            .context("apify dataset parse failed")?;

        let (text, segments) = transcript_from_items(&items);
        Ok(Transcript { video_id: video_id.to_string(), text, segments })
    }
}

/// Where the current state of an actor run comes from.
#[async_trait]
trait RunStatusSource: Send + Sync {
    async fn fetch_run(&self, run_id: &str) -> Result<ActorRun>;
}

struct HttpRunStatus<'a> {
    apify: &'a ApifyClient,
    token: &'a str,
}

#[async_trait]
impl RunStatusSource for HttpRunStatus<'_> {
    async fn fetch_run(&self, run_id: &str) -> Result<ActorRun> {
        let next: Envelope<ActorRun> = self
            .apify
            .client
            .get(format!("{}/actor-runs/{}", self.apify.base_url, run_id))
            .query(&[("token", self.token)])
            .send()
            .await
            .context("apify run status failed")?
            .error_for_status()?
            .json()
            .await?;
        Ok(next.data)
    }
}

/// Poll at a fixed interval until the run succeeds, fails, or `max_polls` status fetches are spent.
async fn wait_for_run(
    source: &dyn RunStatusSource,
    mut run: ActorRun,
    interval: Duration,
    max_polls: u32,
) -> Result<ActorRun> {
    for poll in 0..=max_polls {
        match classify_status(&run.status) {
            RunStatus::Succeeded => return Ok(run),
            RunStatus::Failed => bail!("apify run {} ended with {}", run.id, run.status),
            RunStatus::Pending if poll == max_polls => break,
            RunStatus::Pending => {}
        }
        tokio::time::sleep(interval).await;
        run = source.fetch_run(&run.id).await?;
        debug!(run_id = %run.id, status = %run.status, poll, "apify run status");
    }
    bail!("apify run {} still {} after {} polls", run.id, run.status, max_polls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[test]
    fn all_supported_url_shapes_yield_the_same_id() {
        let id = "dQw4w9WgXcQ";
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://m.youtube.com/shorts/dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_youtube_video_id(url).as_deref(), Some(id), "{url}");
        }
    }

    #[test]
    fn non_youtube_urls_are_rejected() {
        for url in [
            "https://vimeo.com/123456789",
            "https://example.com/watch?v=dQw4w9WgXcQ",
            "https://notyoutube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=short",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQextra",
            "",
        ] {
            assert_eq!(extract_youtube_video_id(url), None, "{url}");
        }
    }

    #[test]
    fn status_classification() {
        assert_eq!(classify_status("SUCCEEDED"), RunStatus::Succeeded);
        assert_eq!(classify_status("TIMED-OUT"), RunStatus::Failed);
        assert_eq!(classify_status("RUNNING"), RunStatus::Pending);
        assert_eq!(classify_status("READY"), RunStatus::Pending);
    }

    #[test]
    fn joins_segments_from_each_dataset_shape() {
        let items = vec![
            json!({ "data": [{ "start": "0", "text": "Olá" }, { "text": " pessoal " }] }),
            json!({ "transcript": [{ "text": "segundo" }, "terceiro"] }),
            json!({ "transcript": "quarto" }),
            json!({ "text": "" }),
        ];
        let (text, n) = transcript_from_items(&items);
        assert_eq!(text, "Olá pessoal segundo terceiro quarto");
        assert_eq!(n, 5);
    }

    struct ScriptedRuns {
        statuses: Mutex<Vec<&'static str>>,
        calls: AtomicU32,
    }

    impl ScriptedRuns {
        fn new(statuses: &[&'static str]) -> Self {
            Self { statuses: Mutex::new(statuses.to_vec()), calls: AtomicU32::new(0) }
        }
    }

    #[async_trait]
    impl RunStatusSource for ScriptedRuns {
        async fn fetch_run(&self, run_id: &str) -> Result<ActorRun> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut left = self.statuses.lock().unwrap();
            let status = if left.is_empty() { "RUNNING" } else { left.remove(0) };
            Ok(run(run_id, status))
        }
    }

    fn run(id: &str, status: &str) -> ActorRun {
        ActorRun { id: id.into(), status: status.into(), default_dataset_id: Some("ds-1".into()) }
    }

    #[tokio::test]
    async fn polls_until_succeeded() {
        let source = ScriptedRuns::new(&["RUNNING", "RUNNING", "SUCCEEDED"]);
        let done = wait_for_run(&source, run("r1", "READY"), Duration::ZERO, 10).await.unwrap();
        assert_eq!(done.status, "SUCCEEDED");
        assert_eq!(done.default_dataset_id.as_deref(), Some("ds-1"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn already_finished_run_needs_no_poll() {
        let source = ScriptedRuns::new(&[]);
        wait_for_run(&source, run("r1", "SUCCEEDED"), Duration::ZERO, 10).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_or_aborted_run_stops_polling() {
        for terminal in ["FAILED", "ABORTED"] {
            let source = ScriptedRuns::new(&["RUNNING", terminal, "SUCCEEDED"]);
            let err = wait_for_run(&source, run("r2", "READY"), Duration::ZERO, 10).await.unwrap_err();
            assert_eq!(err.to_string(), format!("apify run r2 ended with {terminal}"));
            assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        }
    }

    #[tokio::test]
    async fn gives_up_after_max_polls() {
        let source = ScriptedRuns::new(&[]);
        let err = wait_for_run(&source, run("r3", "READY"), Duration::ZERO, 3).await.unwrap_err();
        assert_eq!(err.to_string(), "apify run r3 still RUNNING after 3 polls");
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_token_degrades() {
        let client = ApifyClient::new(&Config::default()).unwrap();
        let r = client.transcribe("https://youtu.be/dQw4w9WgXcQ").await;
        assert!(r.success && r.data.is_none());
        let r = client.transcribe("https://vimeo.com/1").await;
        assert!(r.success && r.data.is_none());
    }
}
