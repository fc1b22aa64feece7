use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw retrieval hit as returned by the knowledge base.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RagChunk {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub vector_similarity: Option<f64>,
    #[serde(default)]
    pub term_similarity: Option<f64>,
    /// Remaining top-level fields, including `metadata` when the dataset stores columns there.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RagChunk {
    pub fn with_content(content: impl Into<String>, similarity: f64) -> Self {
        Self {
            content: content.into(),
            similarity: Some(similarity),
            ..Default::default()
        }
    }

    /// Text to parse as a `headers:values` row when no structured field matched.
    pub fn text(&self) -> &str {
        if !self.content.is_empty() {
            return &self.content;
        }
        self.extra
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.extra.get("metadata").and_then(Value::as_object)
    }
}

/// Catalog reference row recovered from a retrieval hit.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RagPattern {
    pub spec: Option<String>,
    pub category: Option<String>,
    pub item_description: Option<String>,
    pub similarity: f64,
    pub vector_similarity: Option<f64>,
    pub term_similarity: Option<f64>,
}
