use crate::domain::rag_entities::RagPattern;

/// System message for the spec-fixing step.
pub const FIX_SPEC_SYSTEM: &str = r#"You are a product specification expert who corrects and standardizes spec data.

CORE PRINCIPLES:
1. Extract values ONLY from the description - never hallucinate or copy from examples
2. Follow consistent naming patterns from spec_patterns while extracting real values from description
3. Distinguish between model codes and measurements with units
4. Use "-" for missing information, never guess

CRITICAL RULES:
- Values come from description ONLY (except "item" key which follows pattern style)
- Measurements (50kg, 100l, 220v) go to measurement keys, NOT model key
- Model codes are alphanumeric identifiers, NOT numbers with units
- Never add category, subgroup, or product type keys
- Return exact JSON format requested, no extra text"#;

/// System message for the validation step; rendered with the same slots as its user prompt.
pub const VALIDATE_SPEC_SYSTEM: &str = r#"You are a fact-checker correcting hallucinated data.

Another AI filled in values from a description. Some values may be WRONG (hallucinated).

## Description
{description}

## Current Spec Data (may contain hallucinations)
{spec_pred_remove_items}

Your job: Check each value against the description. Fix wrong values.

ABSOLUTE RULE: Return the EXACT SAME list of key-value pairs. Same keys, same order, same count.
NEVER add keys. NEVER remove keys. ONLY fix values that are hallucinated.

- Do NOT touch "-" values (already marked unknown)
- Do NOT touch "item" key

If unsure about a value, use "-" instead of guessing."#;

pub struct PromptEngine;

impl PromptEngine {
    /// Fills `{name}` slots from `vars`. `{{` and `}}` produce literal braces;
    /// slots without a matching variable are left as written.
    pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
            } else if tail.starts_with('{') {
                match tail[1..].find('}') {
                    Some(end) => {
                        let name = &tail[1..1 + end];
                        match vars.iter().find(|(k, _)| *k == name) {
                            Some((_, value)) => out.push_str(value),
                            None => out.push_str(&tail[..end + 2]),
                        }
                        rest = &tail[end + 2..];
                    }
                    None => {
                        out.push_str(tail);
                        rest = "";
                    }
                }
            } else {
                out.push('}');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }

    /// Spec patterns, most similar first, one `[Similarity: x] spec` line each.
    pub fn format_spec_patterns(patterns: &[RagPattern]) -> String {
        let mut ranked: Vec<&RagPattern> = patterns.iter().filter(|p| p.spec.is_some()).collect();
        ranked.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        ranked
            .iter()
            .map(|p| {
                format!(
                    "[Similarity: {:.4}] {}",
                    p.similarity,
                    p.spec.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Distinct categories in rank order, comma-separated.
    pub fn join_categories(patterns: &[RagPattern]) -> String {
        let mut seen: Vec<&str> = Vec::new();
        for category in patterns.iter().filter_map(|p| p.category.as_deref()) {
            if !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen.join(", ")
    }

    /// Query for spec patterns: category and predicted item, or the description when both are empty.
    pub fn spec_query(category_fixed: Option<&str>, item_pred: Option<&str>, description: &str) -> String {
        let query = [category_fixed, item_pred]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if query.is_empty() {
            description.to_string()
        } else {
            query
        }
    }
}
