use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::Config;
use crate::context::ChunkIndex;
use crate::wire::{RagConfig, RagResult, RagSource, ServiceResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagChunk {
    pub document_id: String,
    pub title: String,
    pub content: String,
    pub similarity: f32,
}

#[async_trait]
pub trait RagBackend: Send + Sync {
    async fn search(&self, query: &str, cfg: &RagConfig) -> Result<Vec<RagChunk>>;
    async fn document_count(&self) -> Result<usize>;
}

pub type DynRagBackend = Box<dyn RagBackend + Send + Sync>;

/// HTTP retrieval endpoint, if configured; otherwise the local JSONL index, if configured.
pub fn make_rag_backend(cfg: &Config) -> Result<Option<DynRagBackend>> {
    if let Some(url) = &cfg.rag_url {
        return Ok(Some(Box::new(HttpRagBackend::new(url.clone(), cfg.timeout())?)));
    }
    Ok(cfg
        .rag_index
        .as_ref()
        .map(|p| Box::new(LocalRagBackend { path: PathBuf::from(p) }) as DynRagBackend))
}

pub struct HttpRagBackend {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    document_ids: &'a [String],
    collection_ids: &'a [String],
    limit: usize,
    threshold: f32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    chunks: Vec<RagChunk>,
}

#[derive(Deserialize)]
struct CountResponse {
    count: usize,
}

impl HttpRagBackend {
    pub fn new(base_url: String, timeout: std::time::Duration) -> Result<Self> {
        Ok(Self { client: Client::builder().timeout(timeout).build()?, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl RagBackend for HttpRagBackend {
    async fn search(&self, query: &str, cfg: &RagConfig) -> Result<Vec<RagChunk>> {
        let body = SearchRequest {
            query,
            document_ids: &cfg.document_ids,
            collection_ids: &cfg.collection_ids,
            limit: cfg.max_chunks,
            threshold: cfg.similarity_threshold,
        };
        let resp: SearchResponse = self
            .client
            .post(self.url("search"))
            .json(&body)
            .send()
            .await
            .context("rag search request failed")?
            .error_for_status()?
            .json()
            .await
            .context("rag search response parse failed")?;
        Ok(resp.chunks)
    }

    async fn document_count(&self) -> Result<usize> {
        let resp: CountResponse = self
            .client
            .get(self.url("documents/count"))
            .send()
            .await
            .context("rag count request failed")?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.count)
    }
}

/// Reads the JSONL index on every call so edits to the file are picked up between steps.
pub struct LocalRagBackend {
    pub path: PathBuf,
}

impl LocalRagBackend {
    async fn load(&self) -> Result<ChunkIndex> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || ChunkIndex::load(&path))
            .await
            .context("rag index loader panicked")?
    }
}

#[async_trait]
impl RagBackend for LocalRagBackend {
    async fn search(&self, query: &str, cfg: &RagConfig) -> Result<Vec<RagChunk>> {
        let index = self.load().await?;
        Ok(index
            .search(query, &cfg.document_ids, &cfg.collection_ids, cfg.max_chunks)
            .into_iter()
            .map(|s| RagChunk {
                document_id: s.chunk.document_id,
                title: s.chunk.title,
                content: s.chunk.text,
                similarity: s.score,
            })
            .collect())
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.load().await?.document_count())
    }
}

/// Rough token estimate used for the context budget: one token per four characters.
pub fn estimate_tokens(s: &str) -> usize {
    s.chars().count().div_ceil(4)
}

/// Pack the best chunks into a prompt context within `cfg`'s chunk and token budgets.
pub fn assemble_context(mut chunks: Vec<RagChunk>, cfg: &RagConfig) -> Option<RagResult> {
    chunks.retain(|c| c.similarity >= cfg.similarity_threshold && !c.content.trim().is_empty());
    chunks.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));

    let mut context = String::new();
    let mut token_count = 0usize;
    let mut used = 0usize;
    let mut sources: Vec<RagSource> = Vec::new();
    let mut by_doc: HashMap<String, usize> = HashMap::new();

    for c in chunks {
        if used >= cfg.max_chunks {
            break;
        }
        let block = format!("### {}\n{}\n\n", c.title, c.content.trim());
        let tokens = estimate_tokens(&block);
        if token_count + tokens > cfg.max_tokens {
            break;
        }
        context.push_str(&block);
        token_count += tokens;
        used += 1;
        match by_doc.get(&c.document_id) {
            Some(&i) => {
                if c.similarity > sources[i].similarity {
                    sources[i].similarity = c.similarity;
                }
            }
            None => {
                by_doc.insert(c.document_id.clone(), sources.len());
                sources.push(RagSource { id: c.document_id, title: c.title, similarity: c.similarity });
            }
        }
    }

    if used == 0 {
        return None;
    }
    Some(RagResult { context: context.trim_end().to_string(), token_count, sources })
}

/// Never fails: a missing or broken backend yields `success: true` with no data.
pub async fn is_wizard_rag_available(backend: Option<&dyn RagBackend>) -> ServiceResult<bool> {
    let Some(backend) = backend else {
        return ServiceResult::ok(false);
    };
    match backend.document_count().await {
        Ok(n) => ServiceResult::ok(n > 0),
        Err(e) => {
            warn!(error = %e, "rag availability check failed; continuing without rag");
            ServiceResult::empty()
        }
    }
}

/// Never fails: on any backend error the wizard proceeds without enrichment.
pub async fn generate_wizard_rag_context(
    backend: Option<&dyn RagBackend>,
    query: &str,
    cfg: &RagConfig,
) -> ServiceResult<RagResult> {
    let Some(backend) = backend else {
        return ServiceResult::empty();
    };
    if query.trim().is_empty() {
        return ServiceResult::empty();
    }
    match backend.search(query, cfg).await {
        Ok(chunks) => {
            debug!(found = chunks.len(), "rag search finished");
            match assemble_context(chunks, cfg) {
                Some(r) => ServiceResult::ok(r),
                None => ServiceResult::empty(),
            }
        }
        Err(e) => {
            warn!(error = %e, "rag search failed; continuing without rag");
            ServiceResult::empty()
        }
    }
}
