use super::RagClient;
use crate::domain::error::{AppError, Result};
use crate::domain::rag_entities::RagChunk;
use crate::infrastructure::config::AppConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
pub struct RagFlowSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub dataset_ids: Vec<String>,
    pub similarity_threshold: f32,
    pub vector_similarity_weight: f32,
}

impl RagFlowSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.ragflow_url.clone(),
            api_key: config.ragflow_api_key.clone().filter(|k| !k.is_empty()),
            dataset_ids: config.dataset_ids(),
            similarity_threshold: config.rag_similarity_threshold,
            vector_similarity_weight: config.rag_vector_similarity_weight,
        }
    }
}

#[derive(Deserialize)]
struct RetrievalResponse {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    /// RAGFlow sends `false` here on errors, so it is decoded only once `code` is 0.
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct RetrievalData {
    #[serde(default)]
    chunks: Vec<RagChunk>,
}

/// Client for the RAGFlow HTTP retrieval API.
pub struct RagFlowClient {
    client: reqwest::Client,
    settings: RagFlowSettings,
}

impl RagFlowClient {
    pub fn new(settings: RagFlowSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/api/v1/retrieval",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl RagClient for RagFlowClient {
    async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RagChunk>> {
        let body = json!({
            "question": question,
            "dataset_ids": self.settings.dataset_ids,
            "top_k": top_k,
            "similarity_threshold": self.settings.similarity_threshold,
            "vector_similarity_weight": self.settings.vector_similarity_weight,
            "page": 1,
            "page_size": top_k,
        });

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(api_key) = &self.settings.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::RagError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::RagError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let parsed: RetrievalResponse = response
            .json()
            .await
            .map_err(|e| AppError::RagError(format!("Failed to parse JSON: {}", e)))?;

        if parsed.code != 0 {
            return Err(AppError::RagError(format!(
                "Retrieval failed (code {}): {}",
                parsed.code,
                parsed.message.unwrap_or_default()
            )));
        }

        if parsed.data.is_null() {
            return Ok(Vec::new());
        }
        let data: RetrievalData = serde_json::from_value(parsed.data)
            .map_err(|e| AppError::RagError(format!("Unexpected retrieval payload: {}", e)))?;
        Ok(data.chunks)
    }
}
