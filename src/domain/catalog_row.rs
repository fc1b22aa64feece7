use serde::{Deserialize, Serialize};

/// One product-catalog row as submitted for repair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogRow {
    pub description: String,
    #[serde(default)]
    pub spec_pred: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl CatalogRow {
    pub fn new(
        description: impl Into<String>,
        spec_pred: Option<&str>,
        category: Option<&str>,
    ) -> Self {
        Self {
            description: description.into(),
            spec_pred: spec_pred.map(str::to_string),
            category: category.map(str::to_string),
        }
    }

    /// Spec as fed to prompts: missing becomes an empty string.
    pub fn spec_pred_text(&self) -> &str {
        self.spec_pred.as_deref().unwrap_or("")
    }

    pub fn category_text(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }
}

/// Full outcome of the fixer workflow for a single row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixResult {
    pub description: String,
    pub spec_pred: Option<String>,
    pub category: Option<String>,
    pub item_pred: Option<String>,
    pub item_extracted: Option<String>,
    pub spec_pred_fixed: Option<String>,
    pub category_fixed: Option<String>,
    pub spec_changed: bool,
    pub category_changed: bool,
}

impl FixResult {
    /// Result used when the workflow for a row fails: the input passes through untouched.
    pub fn fallback(row: &CatalogRow) -> Self {
        Self {
            description: row.description.clone(),
            spec_pred: row.spec_pred.clone(),
            category: row.category.clone(),
            item_pred: None,
            item_extracted: None,
            spec_pred_fixed: row.spec_pred.clone(),
            category_fixed: row.category.clone(),
            spec_changed: false,
            category_changed: false,
        }
    }

    pub fn post_processed(&self) -> PostProcessedRow {
        PostProcessedRow {
            description: self.description.clone(),
            category: self.category_fixed.clone(),
            spec_pred: self.spec_pred_fixed.clone(),
        }
    }
}

/// Row reduced to its three final fields, with the fixed values in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostProcessedRow {
    pub description: String,
    pub category: Option<String>,
    pub spec_pred: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum BatchRowOutput {
    Full(FixResult),
    PostProcessed(PostProcessedRow),
}

impl BatchRowOutput {
    pub fn from_result(result: FixResult, post_process: bool) -> Self {
        if post_process {
            BatchRowOutput::PostProcessed(result.post_processed())
        } else {
            BatchRowOutput::Full(result)
        }
    }
}

/// Comparison form for change detection: missing becomes empty, then trimmed.
pub fn normalize_for_compare(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// True when `fixed` carries a non-empty value that differs from `original`.
pub fn is_changed(original: Option<&str>, fixed: Option<&str>) -> bool {
    let fixed = normalize_for_compare(fixed);
    !fixed.is_empty() && fixed != normalize_for_compare(original)
}
