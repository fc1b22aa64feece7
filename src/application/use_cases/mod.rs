pub mod batch_fix;
pub mod catalog_llm;
pub mod fixer;
pub mod prompt_engine;
pub mod retrieval_service;

#[cfg(test)]
pub(crate) mod test_support;
