use crate::application::{BatchFixUseCase, CatalogLlm};
use crate::interfaces::http::LogEntry;
use std::sync::{Arc, Mutex};

/// Everything the HTTP handlers need, shared across workers.
pub struct AppState {
    pub catalog_llm: Arc<CatalogLlm>,
    pub batch: Arc<BatchFixUseCase>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}
