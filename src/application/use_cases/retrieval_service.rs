use crate::domain::error::{AppError, Result};
use crate::domain::rag_entities::{RagChunk, RagPattern};
use crate::infrastructure::csv::{ChunkRow, ChunkRowParser};
use crate::infrastructure::rag_clients::RagClient;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

const SPEC_KEYS: &[&str] = &["spec", "Spec"];
const CATEGORY_KEYS: &[&str] = &["subgroup", "Subgroup"];
const ITEM_DESCRIPTION_KEYS: &[&str] = &["ItemDescription", "item_description"];

/// Looks up reference patterns in the knowledge base for the fixer steps.
pub struct RetrievalService {
    rag_client: Arc<dyn RagClient + Send + Sync>,
    top_k: usize,
    timeout: Duration,
}

impl RetrievalService {
    pub fn new(rag_client: Arc<dyn RagClient + Send + Sync>, top_k: usize, timeout: Duration) -> Self {
        Self {
            rag_client,
            top_k,
            timeout,
        }
    }

    /// Patterns for `query`, in the order the knowledge base ranked them.
    pub async fn query(&self, query: &str) -> Result<Vec<RagPattern>> {
        let chunks = timeout(self.timeout, self.rag_client.retrieve(query, self.top_k))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "retrieval after {}s (top_k={})",
                    self.timeout.as_secs(),
                    self.top_k
                ))
            })??;

        debug!(query = %query, hits = chunks.len(), "Retrieved reference chunks");
        Ok(chunks.iter().map(extract_pattern).collect())
    }

    /// Like [`query`](Self::query), but a failed or slow lookup yields no patterns.
    pub async fn query_or_empty(&self, query: &str) -> Vec<RagPattern> {
        match self.query(query).await {
            Ok(patterns) => patterns,
            Err(err) => {
                warn!(query = %query, error = %err, "Retrieval failed, continuing without patterns");
                Vec::new()
            }
        }
    }
}

/// Recovers catalog columns from a chunk: top-level fields first, then `metadata`,
/// then the `headers:values` text of the chunk itself.
pub fn extract_pattern(chunk: &RagChunk) -> RagPattern {
    let parsed = ChunkRowParser::new().parse(chunk.text());

    RagPattern {
        spec: lookup(chunk, &parsed, SPEC_KEYS),
        category: lookup(chunk, &parsed, CATEGORY_KEYS),
        item_description: lookup(chunk, &parsed, ITEM_DESCRIPTION_KEYS),
        similarity: chunk.similarity.unwrap_or(0.0),
        vector_similarity: chunk.vector_similarity,
        term_similarity: chunk.term_similarity,
    }
}

fn lookup(chunk: &RagChunk, parsed: &ChunkRow, keys: &[&str]) -> Option<String> {
    from_map(&chunk.extra, keys)
        .or_else(|| chunk.metadata().and_then(|meta| from_map(meta, keys)))
        .or_else(|| from_row(parsed, keys))
        .filter(|value| !value.trim().is_empty())
}

/// Lowercase alphanumerics only, so `"Item Description"` matches `item_description`.
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn from_map(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = map.get(*key).and_then(value_text) {
            return Some(value);
        }
    }
    let wanted: Vec<String> = keys.iter().map(|k| normalize_key(k)).collect();
    map.iter()
        .find(|(k, _)| wanted.contains(&normalize_key(k)))
        .and_then(|(_, v)| value_text(v))
}

fn from_row(row: &ChunkRow, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = row.get(key) {
            return Some(value.to_string());
        }
    }
    let wanted: Vec<String> = keys.iter().map(|k| normalize_key(k)).collect();
    row.fields()
        .find(|(k, _)| wanted.contains(&normalize_key(k)))
        .map(|(_, v)| v.to_string())
}
