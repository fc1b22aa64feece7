pub mod catalog_row;
pub mod error;
pub mod llm_config;
pub mod rag_entities;
pub mod spec_pred;
