//! Scripted model and knowledge-base doubles shared by the use-case tests.

use crate::application::use_cases::catalog_llm::CatalogLlm;
use crate::application::use_cases::retrieval_service::RetrievalService;
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::domain::rag_entities::RagChunk;
use crate::infrastructure::config::StepTimeouts;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::prompts::PromptSet;
use crate::infrastructure::rag_clients::RagClient;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Templates that put the step name on the first line and one slot per line after it.
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

pub fn part(user: &str, index: usize) -> &str {
    user.split('\n').nth(index).unwrap_or("")
}

type Handler = dyn Fn(&str, &str) -> Result<String> + Send + Sync;

/// Answers each call through `handler(system, user)` after `delay`,
/// tracking the peak number of overlapping calls.
pub struct ScriptedLlm {
    handler: Box<Handler>,
    delay: Duration,
    slow_step: Option<(&'static str, Duration)>,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(handler: impl Fn(&str, &str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            delay: Duration::ZERO,
            slow_step: None,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_slow_step(mut self, step: &'static str, delay: Duration) -> Self {
        self.slow_step = Some((step, delay));
        self
    }

    /// Happy path: every step succeeds and echoes what it was given where it can.
    pub fn happy() -> Self {
        Self::new(happy_answer)
    }

    pub fn steps(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|user| part(user, 0).to_string())
            .collect()
    }
}

pub fn happy_answer(_system: &str, user: &str) -> Result<String> {
    let answer = match part(user, 0) {
        "PREDICT" => json!({ "item_pred": "pump" }),
        "CATEGORY" => json!({ "category_fixed": "Pumps" }),
        "FIX_SPEC" => json!({ "spec_pred_fixed": "item pump|power 2hp|brand ?" }),
        "REMOVE" => json!({ "spec_pred_remove_items": part(user, 2) }),
        "VALIDATE" => json!({ "spec_pred_fixed_validated": part(user, 2) }),
        other => json!({ "unexpected": other }),
    };
    Ok(answer.to_string())
}

#[async_trait]
impl LLMClient for ScriptedLlm {
    async fn generate(&self, _config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        self.calls.lock().unwrap().push(user.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some((step, delay)) = self.slow_step {
            if part(user, 0) == step {
                tokio::time::sleep(delay).await;
            }
        }
        let answer = (self.handler)(system, user);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        answer
    }
}

/// Knowledge base that returns fixed chunks and records every question.
#[derive(Default)]
pub struct RecordingRag {
    pub chunks: Vec<RagChunk>,
    pub questions: Mutex<Vec<String>>,
}

impl RecordingRag {
    pub fn with_chunks(chunks: Vec<RagChunk>) -> Self {
        Self {
            chunks,
            questions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RagClient for RecordingRag {
    async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RagChunk>> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.chunks.iter().take(top_k).cloned().collect())
    }
}

pub fn catalog_llm(llm: Arc<ScriptedLlm>, timeouts: StepTimeouts) -> CatalogLlm {
    CatalogLlm::new(llm, LLMConfig::default(), Arc::new(line_prompts()), timeouts)
}

pub fn retrieval(rag: Arc<RecordingRag>) -> RetrievalService {
    RetrievalService::new(rag, 10, Duration::from_secs(5))
}
