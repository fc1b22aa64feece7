use crate::application::use_cases::catalog_llm::{CatalogLlm, FixCategoryInput, FixSpecInput};
use crate::application::use_cases::prompt_engine::PromptEngine;
use crate::application::use_cases::retrieval_service::RetrievalService;
use crate::domain::catalog_row::{is_changed, CatalogRow, FixResult};
use crate::domain::error::Result;
use crate::domain::spec_pred::{align_spec_keys, extract_item, UNKNOWN_VALUE};
use std::sync::Arc;
use tracing::{debug, warn};

const LOG_DESCRIPTION_CHARS: usize = 80;

fn short(description: &str) -> String {
    description.chars().take(LOG_DESCRIPTION_CHARS).collect()
}

/// Repairs one catalog row:
/// predict item → retrieve categories → fix category → fix spec →
/// drop duplicate `item` keys → validate spec → extract item.
///
/// Only the item prediction can fail the row (on anything but a timeout).
/// Every later step falls back to the value it was given.
pub struct FixerUseCase {
    llm: Arc<CatalogLlm>,
    retrieval: Arc<RetrievalService>,
    fix_category_enabled: bool,
}

impl FixerUseCase {
    pub fn new(llm: Arc<CatalogLlm>, retrieval: Arc<RetrievalService>, fix_category_enabled: bool) -> Self {
        Self {
            llm,
            retrieval,
            fix_category_enabled,
        }
    }

    pub async fn fix_row(&self, row: &CatalogRow) -> Result<FixResult> {
        let description = row.description.as_str();
        let original_spec = row.spec_pred_text();

        let item_pred = self.predict_item(description).await?;

        let (category_fixed, category_changed) = self.fix_category(row, item_pred.as_deref()).await;

        let spec_query = PromptEngine::spec_query(
            category_fixed.as_deref(),
            item_pred.as_deref(),
            description,
        );
        let spec_patterns =
            PromptEngine::format_spec_patterns(&self.retrieval.query_or_empty(&spec_query).await);

        let spec_after_fix = match self
            .llm
            .fix_spec(FixSpecInput {
                description,
                spec_pred: original_spec,
                item_pred: item_pred.as_deref().unwrap_or(""),
                category_fixed: category_fixed.as_deref().unwrap_or(""),
                spec_patterns: &spec_patterns,
            })
            .await
        {
            Ok(spec) => spec,
            Err(err) => {
                warn!(step = "fix_spec", description = %short(description), error = %err, "Keeping original spec");
                original_spec.to_string()
            }
        };

        let spec_after_remove = match self
            .llm
            .remove_multi_items(
                description,
                &spec_after_fix,
                category_fixed.as_deref().unwrap_or(""),
            )
            .await
        {
            Ok(spec) => spec,
            Err(err) => {
                warn!(step = "remove_multi_items", description = %short(description), error = %err, "Keeping fixed spec");
                spec_after_fix
            }
        };

        let final_spec = match self.llm.validate_spec(description, &spec_after_remove).await {
            Ok(validated) => align_spec_keys(row.spec_pred.as_deref(), &validated),
            Err(err) => {
                warn!(step = "validate_spec", description = %short(description), error = %err, "Keeping unvalidated spec");
                spec_after_remove
            }
        };

        let spec_changed = is_changed(row.spec_pred.as_deref(), Some(&final_spec));
        let item_extracted = if final_spec.is_empty() {
            None
        } else {
            extract_item(Some(&final_spec))
        };

        debug!(
            description = %short(description),
            spec_changed,
            category_changed,
            "Row fixed"
        );

        Ok(FixResult {
            description: row.description.clone(),
            spec_pred: row.spec_pred.clone(),
            category: row.category.clone(),
            item_pred,
            item_extracted,
            spec_pred_fixed: Some(final_spec),
            category_fixed,
            spec_changed,
            category_changed,
        })
    }

    async fn predict_item(&self, description: &str) -> Result<Option<String>> {
        match self.llm.predict_item(description).await {
            // The model answers `-` when the description names no item.
            Ok(item) => Ok(Some(item).filter(|i| {
                let i = i.trim();
                !i.is_empty() && i != UNKNOWN_VALUE
            })),
            Err(err) if err.is_timeout() => {
                warn!(step = "predict_item", description = %short(description), "Timed out, continuing without item");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn fix_category(&self, row: &CatalogRow, item_pred: Option<&str>) -> (Option<String>, bool) {
        if !self.fix_category_enabled {
            return (row.category.clone(), false);
        }

        let query = item_pred.unwrap_or(row.description.as_str());
        let rag_categories = PromptEngine::join_categories(&self.retrieval.query_or_empty(query).await);

        let fixed = match self
            .llm
            .fix_category(FixCategoryInput {
                description: &row.description,
                category: row.category_text(),
                item: item_pred.unwrap_or(""),
                rag_categories: &rag_categories,
            })
            .await
        {
            Ok(category) if !category.trim().is_empty() => Some(category),
            Ok(_) => row.category.clone(),
            Err(err) => {
                warn!(step = "fix_category", description = %short(&row.description), error = %err, "Keeping original category");
                row.category.clone()
            }
        };

        let changed = is_changed(row.category.as_deref(), fixed.as_deref());
        (fixed, changed)
    }
}
