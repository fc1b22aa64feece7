pub mod ragflow;

use crate::domain::error::Result;
use crate::domain::rag_entities::RagChunk;
use async_trait::async_trait;

pub use ragflow::{RagFlowClient, RagFlowSettings};

#[async_trait]
pub trait RagClient {
    /// Ranked hits for `question`, at most `top_k` of them.
    async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RagChunk>>;
}

/// Stand-in used when no knowledge base is configured; every query comes back empty.
pub struct DisabledRagClient;

#[async_trait]
impl RagClient for DisabledRagClient {
    async fn retrieve(&self, _question: &str, _top_k: usize) -> Result<Vec<RagChunk>> {
        Ok(Vec::new())
    }
}
