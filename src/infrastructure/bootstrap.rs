use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::application::{BatchFixUseCase, CatalogLlm, FixerUseCase, RetrievalService};
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::llm_clients::{LLMClient, OpenAIClient};
use crate::infrastructure::prompts::PromptSet;
use crate::infrastructure::rag_clients::{DisabledRagClient, RagClient, RagFlowClient, RagFlowSettings};
use crate::interfaces::http::add_log;
use crate::interfaces::AppState;

/// Builds the application state with the real model and knowledge-base clients.
pub fn setup(config: AppConfig) -> Result<AppState> {
    let prompts = PromptSet::resolve(config.prompts_dir.as_deref())?;
    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(OpenAIClient::new());

    let rag_client: Arc<dyn RagClient + Send + Sync> = if config.rag_enabled() {
        if config.dataset_ids().is_empty() {
            warn!("RAGFLOW_PO_DATASET_IDS is empty, retrieval will search no datasets");
        }
        Arc::new(RagFlowClient::new(RagFlowSettings::from_config(&config)))
    } else {
        warn!("RAGFLOW_URL is not set, fixing without reference patterns");
        Arc::new(DisabledRagClient)
    };

    Ok(assemble(&config, llm_client, rag_client, prompts))
}

/// Wires the use cases around the given clients.
pub fn assemble(
    config: &AppConfig,
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    rag_client: Arc<dyn RagClient + Send + Sync>,
    prompts: PromptSet,
) -> AppState {
    let timeouts = config.timeouts();
    let catalog_llm = Arc::new(CatalogLlm::new(
        llm_client,
        config.llm_config(),
        Arc::new(prompts),
        timeouts,
    ));
    let retrieval = Arc::new(RetrievalService::new(rag_client, config.top_k, timeouts.rag));
    let fixer = Arc::new(FixerUseCase::new(
        catalog_llm.clone(),
        retrieval,
        config.fix_category_enabled,
    ));
    let batch = Arc::new(BatchFixUseCase::new(fixer, config.concurrency));

    let logs = Arc::new(Mutex::new(Vec::new()));
    add_log(
        &logs,
        "INFO",
        "Bootstrap",
        &format!(
            "Model {} at {} (rag={} concurrency={} fix_category={})",
            config.model_name,
            config.model_url,
            config.rag_enabled(),
            config.concurrency,
            config.fix_category_enabled
        ),
    );
    info!(
        model = %config.model_name,
        rag = config.rag_enabled(),
        concurrency = config.concurrency,
        "Application state ready"
    );

    AppState {
        catalog_llm,
        batch,
        logs,
    }
}
