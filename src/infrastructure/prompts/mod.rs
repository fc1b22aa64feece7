use std::fs;
use std::path::Path;

use tracing::info;

use crate::domain::error::{AppError, Result};

const PREDICT_ITEM: &str = include_str!("../../../prompts/predict_item.txt");
const FIX_CATEGORY: &str = include_str!("../../../prompts/fix_category.txt");
const FIX_SPEC: &str = include_str!("../../../prompts/fix_spec.txt");
const REMOVE_MULTI_ITEMS: &str = include_str!("../../../prompts/remove_multi_items.txt");
const VALIDATE_SPEC: &str = include_str!("../../../prompts/validate_spec.txt");

/// The five user-prompt templates driving the fixer steps.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSet {
    pub predict_item: String,
    pub fix_category: String,
    pub fix_spec: String,
    pub remove_multi_items: String,
    pub validate_spec: String,
}

impl PromptSet {
    /// Templates compiled into the binary.
    pub fn embedded() -> Self {
        Self {
            predict_item: PREDICT_ITEM.to_string(),
            fix_category: FIX_CATEGORY.to_string(),
            fix_spec: FIX_SPEC.to_string(),
            remove_multi_items: REMOVE_MULTI_ITEMS.to_string(),
            validate_spec: VALIDATE_SPEC.to_string(),
        }
    }

    /// Reads `<name>.txt` for every template; all five must be present.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str| -> Result<String> {
            let path = dir.join(format!("{}.txt", name));
            fs::read_to_string(&path).map_err(|e| {
                AppError::ConfigError(format!(
                    "Failed to read prompt template {}: {}",
                    path.display(),
                    e
                ))
            })
        };

        let prompts = Self {
            predict_item: read("predict_item")?,
            fix_category: read("fix_category")?,
            fix_spec: read("fix_spec")?,
            remove_multi_items: read("remove_multi_items")?,
            validate_spec: read("validate_spec")?,
        };
        info!(dir = %dir.display(), "Loaded prompt templates");
        Ok(prompts)
    }

    pub fn resolve(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::load_dir(dir),
            None => Ok(Self::embedded()),
        }
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::embedded()
    }
}
