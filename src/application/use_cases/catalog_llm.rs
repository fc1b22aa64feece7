use crate::application::use_cases::prompt_engine::{PromptEngine, FIX_SPEC_SYSTEM, VALIDATE_SPEC_SYSTEM};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::spec_pred::clean_missing_values;
use crate::infrastructure::config::StepTimeouts;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::prompts::PromptSet;
use crate::infrastructure::response::extract_field;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Inputs of the spec-fixing prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixSpecInput<'a> {
    pub description: &'a str,
    pub spec_pred: &'a str,
    pub item_pred: &'a str,
    pub category_fixed: &'a str,
    pub spec_patterns: &'a str,
}

/// Inputs of the category-fixing prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixCategoryInput<'a> {
    pub description: &'a str,
    pub category: &'a str,
    pub item: &'a str,
    pub rag_categories: &'a str,
}

/// One method per model-backed step. Each renders its template, calls the model
/// under a timeout and reads the single structured field the step produces.
pub struct CatalogLlm {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    config: LLMConfig,
    prompts: Arc<PromptSet>,
    timeouts: StepTimeouts,
}

impl CatalogLlm {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        config: LLMConfig,
        prompts: Arc<PromptSet>,
        timeouts: StepTimeouts,
    ) -> Self {
        Self {
            llm_client,
            config,
            prompts,
            timeouts,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn predict_item(&self, description: &str) -> Result<String> {
        let user = PromptEngine::render(&self.prompts.predict_item, &[("description", description)]);
        let raw = self
            .call("predict_item", self.timeouts.llm, self.llm_client.generate(&self.config, "", &user))
            .await?;
        extract_field(&raw, "item_pred")
    }

    pub async fn fix_category(&self, input: FixCategoryInput<'_>) -> Result<String> {
        let user = PromptEngine::render(
            &self.prompts.fix_category,
            &[
                ("description", input.description),
                ("category", input.category),
                ("item", input.item),
                ("rag_categories", input.rag_categories),
            ],
        );
        let raw = self
            .call("fix_category", self.timeouts.llm, self.llm_client.generate(&self.config, "", &user))
            .await?;
        extract_field(&raw, "category_fixed")
    }

    pub async fn fix_spec(&self, input: FixSpecInput<'_>) -> Result<String> {
        let user = PromptEngine::render(
            &self.prompts.fix_spec,
            &[
                ("description", input.description),
                ("spec_pred", input.spec_pred),
                ("item_pred", input.item_pred),
                ("category_fixed", input.category_fixed),
                ("spec_patterns", input.spec_patterns),
            ],
        );
        let raw = self
            .call(
                "fix_spec",
                self.timeouts.fix_spec,
                self.llm_client.generate(&self.config, FIX_SPEC_SYSTEM, &user),
            )
            .await?;
        extract_field(&raw, "spec_pred_fixed")
    }

    pub async fn remove_multi_items(
        &self,
        description: &str,
        spec_pred_fixed: &str,
        category_fixed: &str,
    ) -> Result<String> {
        let user = PromptEngine::render(
            &self.prompts.remove_multi_items,
            &[
                ("description", description),
                ("spec_pred_fixed", spec_pred_fixed),
                ("category_fixed", category_fixed),
            ],
        );
        let raw = self
            .call(
                "remove_multi_items",
                self.timeouts.llm,
                self.llm_client.generate(&self.config, "", &user),
            )
            .await?;
        extract_field(&raw, "spec_pred_remove_items")
    }

    /// Fact-checks the spec at temperature 0 and returns it normalized
    /// (lowercase, no inner spaces, `?` mapped to `-`).
    pub async fn validate_spec(&self, description: &str, spec_pred_remove_items: &str) -> Result<String> {
        let vars = [
            ("description", description),
            ("spec_pred_remove_items", spec_pred_remove_items),
        ];
        let system = PromptEngine::render(VALIDATE_SPEC_SYSTEM, &vars);
        let user = PromptEngine::render(&self.prompts.validate_spec, &vars);
        let config = self.config.with_temperature(0.0);

        let raw = self
            .call(
                "validate_spec",
                self.timeouts.llm,
                self.llm_client.generate(&config, &system, &user),
            )
            .await?;
        let validated = extract_field(&raw, "spec_pred_fixed_validated")?;
        Ok(clean_missing_values(&validated))
    }

    async fn call<F>(&self, step: &str, limit: Duration, fut: F) -> Result<String>
    where
        F: Future<Output = Result<String>>,
    {
        let raw = timeout(limit, fut)
            .await
            .map_err(|_| AppError::Timeout(format!("{} after {}s", step, limit.as_secs())))??;
        debug!(step, chars = raw.len(), "Model answered");
        Ok(raw)
    }
}
