use anyhow::{Context, Result};
use fs_err as fs;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// One retrievable passage of a creator's reference document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub collection_id: Option<String>,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Share of query tokens found in the chunk, in `[0, 1]`.
    pub score: f32,
}

/// Local reference-document index read from a JSONL file, ranked lexically.
#[derive(Debug, Default)]
pub struct ChunkIndex {
    pub chunks: Vec<Chunk>,
}

impl ChunkIndex {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Lines that are not JSON objects with a document id and text are skipped.
    pub fn parse(jsonl: &str) -> Self {
        let mut chunks = Vec::new();
        for (n, line) in jsonl.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let Ok(val) = serde_json::from_str::<Value>(line) else {
                continue;
            };
            if let Some(chunk) = extract_chunk(&val, n) {
                chunks.push(chunk);
            }
        }
        Self { chunks }
    }

    pub fn document_count(&self) -> usize {
        self.chunks.iter().map(|c| c.document_id.as_str()).collect::<HashSet<_>>().len()
    }

    /// Chunks matching the id filters, best first. Empty filters match everything.
    pub fn search(&self, query: &str, document_ids: &[String], collection_ids: &[String], limit: usize) -> Vec<ScoredChunk> {
        let qtokens: HashSet<String> = tokenize(query).into_iter().collect();
        if qtokens.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .filter(|c| document_ids.is_empty() || document_ids.contains(&c.document_id))
            .filter(|c| {
                collection_ids.is_empty()
                    || c.collection_id.as_ref().map(|id| collection_ids.contains(id)).unwrap_or(false)
            })
            .filter_map(|c| {
                let score = score_text(&c.text, &qtokens);
                (score > 0.0).then(|| ScoredChunk { chunk: c.clone(), score })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.text.len().cmp(&b.chunk.text.len()))
        });
        scored.truncate(limit);
        scored
    }
}

fn extract_chunk(v: &Value, line: usize) -> Option<Chunk> {
    let s = |k: &str| v.get(k).and_then(|x| x.as_str()).map(str::to_string);
    let document_id = s("document_id")?;
    let text = s("text").or_else(|| s("content")).filter(|t| !t.trim().is_empty())?;
    Some(Chunk {
        id: s("id").unwrap_or_else(|| format!("{document_id}#{line}")),
        title: s("title").unwrap_or_else(|| document_id.clone()),
        collection_id: s("collection_id"),
        document_id,
        text,
    })
}

pub fn tokenize(s: &str) -> Vec<String> {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c.to_lowercase().next().unwrap_or(c) } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .map(|s| s.to_string())
        .collect()
}

fn score_text(text: &str, qtokens: &HashSet<String>) -> f32 {
    let ttoks: HashSet<String> = tokenize(text).into_iter().collect();
    if ttoks.is_empty() {
        return 0.0;
    }
    let hits = qtokens.iter().filter(|q| ttoks.contains(*q)).count();
    hits as f32 / qtokens.len() as f32
}
