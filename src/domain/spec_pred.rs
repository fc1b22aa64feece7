//! Spec strings are pipe-separated `key value` pairs, e.g.
//! `application -|brand sanden|item fridge|model tr25`.
//! The key is everything before the first space; `-` marks an unknown value.

/// Placeholder used for values that cannot be read from the description.
pub const UNKNOWN_VALUE: &str = "-";

const ITEM_KEY: &str = "item";

/// Ordered key/value view of a spec string. Keys are unique; a repeated key
/// keeps its first position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecPairs(Vec<(String, String)>);

impl SpecPairs {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn insert(&mut self, key: String, value: String) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }
}

fn clean_spec_pred(spec_pred: Option<&str>) -> Option<&str> {
    let trimmed = spec_pred?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return None;
    }
    Some(trimmed)
}

pub fn parse_spec(spec_pred: Option<&str>) -> SpecPairs {
    let mut pairs = SpecPairs::default();
    let Some(spec) = clean_spec_pred(spec_pred) else {
        return pairs;
    };

    for part in spec.split('|') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once(' ') {
            pairs.insert(key.to_string(), value.to_string());
        }
    }
    pairs
}

/// Item name carried by the spec, if any.
pub fn extract_item(spec_pred: Option<&str>) -> Option<String> {
    let pairs = parse_spec(spec_pred);
    let item = pairs.get(ITEM_KEY)?.trim();
    if item.is_empty() || item == UNKNOWN_VALUE {
        return None;
    }
    Some(item.to_string())
}

/// Strips spaces inside keys and values and lowercases both.
/// Pairs without a value are dropped.
pub fn fix_spec_format(spec: &str) -> String {
    if spec.is_empty() {
        return String::new();
    }

    spec.split('|')
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once(' ')?;
            Some(format!(
                "{} {}",
                key.replace(' ', "").to_lowercase(),
                value.replace(' ', "").to_lowercase()
            ))
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Normalizes the spec and replaces `?` values with `-`.
pub fn clean_missing_values(spec: &str) -> String {
    let normalized = fix_spec_format(spec);
    if normalized.is_empty() {
        return normalized;
    }

    normalized
        .split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let (key, value) = part.split_once(' ')?;
            let value = if value == "?" { UNKNOWN_VALUE } else { value };
            Some(format!("{} {}", key, value))
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Restricts `fixed_spec` to the keys of `original_spec`, in their original order.
/// Keys the fix dropped come back as `-`; keys it invented are removed.
pub fn align_spec_keys(original_spec: Option<&str>, fixed_spec: &str) -> String {
    let original = parse_spec(original_spec);
    if original.is_empty() {
        return String::new();
    }
    let fixed = parse_spec(Some(fixed_spec));

    original
        .keys()
        .map(|key| format!("{} {}", key, fixed.get(key).unwrap_or(UNKNOWN_VALUE)))
        .collect::<Vec<_>>()
        .join("|")
}
