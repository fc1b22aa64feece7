pub mod use_cases;

pub use use_cases::batch_fix::BatchFixUseCase;
pub use use_cases::catalog_llm::CatalogLlm;
pub use use_cases::fixer::FixerUseCase;
pub use use_cases::retrieval_service::RetrievalService;
