//! Offline doubles for the model and knowledge base, wired through the real bootstrap.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_fixer::domain::error::{AppError, Result};
use catalog_fixer::domain::llm_config::LLMConfig;
use catalog_fixer::domain::rag_entities::RagChunk;
use catalog_fixer::infrastructure::bootstrap::assemble;
use catalog_fixer::infrastructure::config::AppConfig;
use catalog_fixer::infrastructure::llm_clients::LLMClient;
use catalog_fixer::infrastructure::prompts::PromptSet;
use catalog_fixer::infrastructure::rag_clients::RagClient;
use catalog_fixer::interfaces::AppState;
use serde_json::json;
use std::sync::Arc;

pub fn line_prompts() -> PromptSet {
    PromptSet {
        predict_item: "PREDICT\n{description}".to_string(),
        fix_category: "CATEGORY\n{description}\n{category}\n{item}\n{rag_categories}".to_string(),
        fix_spec: "FIX_SPEC\n{description}\n{spec_pred}\n{item_pred}\n{category_fixed}\n{spec_patterns}"
            .to_string(),
        remove_multi_items: "REMOVE\n{description}\n{spec_pred_fixed}\n{category_fixed}".to_string(),
        validate_spec: "VALIDATE\n{description}\n{spec_pred_remove_items}".to_string(),
    }
}

fn line(user: &str, index: usize) -> &str {
    user.split('\n').nth(index).unwrap_or("")
}

/// Model that knows pumps and valves.
///
/// Descriptions containing `pump` get item `pump`, category `Pumps` and a spec
/// filled from the description. Descriptions containing `broken` fail the
/// prediction step. Everything else is echoed back unchanged.
pub struct CatalogModel;

#[async_trait]
impl LLMClient for CatalogModel {
    async fn generate(&self, _config: &LLMConfig, _system: &str, user: &str) -> Result<String> {
        let description = line(user, 1);
        let answer = match line(user, 0) {
            "PREDICT" if description.contains("broken") => {
                return Err(AppError::LLMError("model returned 500".to_string()))
            }
            "PREDICT" if description.contains("pump") => json!({ "item_pred": "pump" }),
            "PREDICT" => json!({ "item_pred": "valve" }),
            "CATEGORY" if description.contains("pump") => json!({ "category_fixed": "Pumps" }),
            "CATEGORY" => json!({ "category_fixed": line(user, 2) }),
            "FIX_SPEC" if description.contains("pump") => {
                json!({ "spec_pred_fixed": "item pump|power 2hp|brand ?" })
            }
            "FIX_SPEC" => json!({ "spec_pred_fixed": line(user, 2) }),
            "REMOVE" => json!({ "spec_pred_remove_items": line(user, 2) }),
            "VALIDATE" => json!({ "spec_pred_fixed_validated": line(user, 2) }),
            other => return Err(AppError::LLMError(format!("unknown prompt {}", other))),
        };
        Ok(answer.to_string())
    }
}

pub struct StaticRag(pub Vec<RagChunk>);

#[async_trait]
impl RagClient for StaticRag {
    async fn retrieve(&self, _question: &str, top_k: usize) -> Result<Vec<RagChunk>> {
        Ok(self.0.iter().take(top_k).cloned().collect())
    }
}

pub fn pump_chunks() -> Vec<RagChunk> {
    vec![RagChunk::with_content(
        "Subgroup,spec:Pumps,item pump|power 1hp|brand grundfos",
        0.88,
    )]
}

pub fn test_state(config: AppConfig) -> AppState {
    assemble(
        &config,
        Arc::new(CatalogModel),
        Arc::new(StaticRag(pump_chunks())),
        line_prompts(),
    )
}
