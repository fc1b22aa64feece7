use std::path::PathBuf;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;

/// Environment variable naming an optional TOML file layered under the environment.
pub const CONFIG_FILE_ENV: &str = "CATALOG_FIXER_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "catalog-fixer.toml";

/// Environment keys read into [`AppConfig`]; anything else in the environment is ignored.
const ENV_KEYS: &[&str] = &[
    "host",
    "port",
    "model_url",
    "model_name",
    "model_api_key",
    "model_temperature",
    "model_max_tokens",
    "ragflow_url",
    "ragflow_api_key",
    "ragflow_po_dataset_ids",
    "top_k",
    "rag_similarity_threshold",
    "rag_vector_similarity_weight",
    "concurrency",
    "fix_category_enabled",
    "prompts_dir",
    "llm_timeout_secs",
    "fix_spec_timeout_secs",
    "rag_timeout_secs",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    pub model_url: String,
    #[serde(deserialize_with = "string_or_number")]
    pub model_name: String,
    #[serde(deserialize_with = "optional_string_or_number")]
    pub model_api_key: Option<String>,
    pub model_temperature: f32,
    pub model_max_tokens: Option<u32>,

    /// Empty disables retrieval; fixes then run without reference patterns.
    pub ragflow_url: String,
    #[serde(deserialize_with = "optional_string_or_number")]
    pub ragflow_api_key: Option<String>,
    /// Comma-separated dataset ids.
    #[serde(deserialize_with = "string_or_number")]
    pub ragflow_po_dataset_ids: String,
    pub top_k: usize,
    pub rag_similarity_threshold: f32,
    pub rag_vector_similarity_weight: f32,

    pub concurrency: usize,
    pub fix_category_enabled: bool,
    pub prompts_dir: Option<PathBuf>,

    pub llm_timeout_secs: u64,
    pub fix_spec_timeout_secs: u64,
    pub rag_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5500,
            model_url: "http://localhost:1234/v1".to_string(),
            model_name: "local-model".to_string(),
            model_api_key: None,
            model_temperature: 0.2,
            model_max_tokens: None,
            ragflow_url: String::new(),
            ragflow_api_key: None,
            ragflow_po_dataset_ids: String::new(),
            top_k: 10,
            rag_similarity_threshold: 0.2,
            rag_vector_similarity_weight: 0.3,
            concurrency: 5,
            fix_category_enabled: true,
            prompts_dir: None,
            llm_timeout_secs: 60,
            fix_spec_timeout_secs: 120,
            rag_timeout_secs: 45,
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file (if present), then the environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_figment(Self::figment(&path))
    }

    pub fn figment(config_file: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_file))
            .merge(Env::raw().only(ENV_KEYS))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.model_url)
            .map_err(|e| AppError::ConfigError(format!("MODEL_URL is not a valid URL: {}", e)))?;
        if !self.ragflow_url.is_empty() {
            url::Url::parse(&self.ragflow_url).map_err(|e| {
                AppError::ConfigError(format!("RAGFLOW_URL is not a valid URL: {}", e))
            })?;
        }
        if self.model_name.trim().is_empty() {
            return Err(AppError::ConfigError("MODEL_NAME must not be empty".to_string()));
        }
        if self.top_k == 0 {
            return Err(AppError::ConfigError("TOP_K must be at least 1".to_string()));
        }
        if self.concurrency == 0 {
            return Err(AppError::ConfigError("CONCURRENCY must be at least 1".to_string()));
        }
        for (name, value) in [
            ("RAG_SIMILARITY_THRESHOLD", self.rag_similarity_threshold),
            ("RAG_VECTOR_SIMILARITY_WEIGHT", self.rag_vector_similarity_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::ConfigError(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("LLM_TIMEOUT_SECS", self.llm_timeout_secs),
            ("FIX_SPEC_TIMEOUT_SECS", self.fix_spec_timeout_secs),
            ("RAG_TIMEOUT_SECS", self.rag_timeout_secs),
        ] {
            if value == 0 {
                return Err(AppError::ConfigError(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }

    pub fn llm_config(&self) -> LLMConfig {
        LLMConfig {
            base_url: self.model_url.clone(),
            model: self.model_name.clone(),
            api_key: self.model_api_key.clone().filter(|k| !k.is_empty()),
            max_tokens: self.model_max_tokens,
            temperature: Some(self.model_temperature),
        }
    }

    pub fn dataset_ids(&self) -> Vec<String> {
        self.ragflow_po_dataset_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn rag_enabled(&self) -> bool {
        !self.ragflow_url.trim().is_empty()
    }

    pub fn timeouts(&self) -> StepTimeouts {
        StepTimeouts {
            llm: Duration::from_secs(self.llm_timeout_secs),
            fix_spec: Duration::from_secs(self.fix_spec_timeout_secs),
            rag: Duration::from_secs(self.rag_timeout_secs),
        }
    }
}

// Environment values are parsed by figment, so an all-digit key or id
// arrives as a number (or `true`/`false` as a bool) and is read back as text.
struct TextValue(String);

impl<'de> Deserialize<'de> for TextValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TextVisitor;

        impl<'de> Visitor<'de> for TextVisitor {
            type Value = TextValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a string or a number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<TextValue, E> {
                Ok(TextValue(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<TextValue, E> {
                Ok(TextValue(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<TextValue, E> {
                Ok(TextValue(v.to_string()))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<TextValue, E> {
                Ok(TextValue(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<TextValue, E> {
                Ok(TextValue(v.to_string()))
            }

            fn visit_i128<E: de::Error>(self, v: i128) -> std::result::Result<TextValue, E> {
                Ok(TextValue(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<TextValue, E> {
                Ok(TextValue(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<TextValue, E> {
                Ok(TextValue(v.to_string()))
            }
        }

        deserializer.deserialize_any(TextVisitor)
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    TextValue::deserialize(deserializer).map(|text| text.0)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Option::<TextValue>::deserialize(deserializer).map(|text| text.map(|t| t.0))
}

/// Per-call timeouts for the remote steps of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimeouts {
    pub llm: Duration,
    pub fix_spec: Duration,
    pub rag: Duration,
}

impl Default for StepTimeouts {
    fn default() -> Self {
        AppConfig::default().timeouts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 5500);
        assert_eq!(config.concurrency, 5);
        assert!(!config.rag_enabled());
    }

    #[test]
    fn test_dataset_ids_split() {
        let config = AppConfig {
            ragflow_po_dataset_ids: " ds-1, ,ds-2 ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.dataset_ids(), vec!["ds-1", "ds-2"]);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = AppConfig {
            rag_similarity_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));

        let config = AppConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            model_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_llm_config_drops_empty_key() {
        let config = AppConfig {
            model_api_key: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.llm_config().api_key, None);
    }

    #[test]
    fn test_figment_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "fixer.toml",
                "model_name = \"from-file\"\ntop_k = 3\nconcurrency = 2\n",
            )?;
            jail.set_env("MODEL_NAME", "from-env");
            jail.set_env("RAG_SIMILARITY_THRESHOLD", "0.5");

            let config = AppConfig::from_figment(AppConfig::figment("fixer.toml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.model_name, "from-env");
            assert_eq!(config.top_k, 3);
            assert_eq!(config.concurrency, 2);
            assert_eq!(config.rag_similarity_threshold, 0.5);
            Ok(())
        });
    }

    #[test]
    fn test_numeric_env_values_read_as_text() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MODEL_NAME", "7");
            jail.set_env("RAGFLOW_API_KEY", "true");

            let config = AppConfig::from_figment(AppConfig::figment("absent.toml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.model_name, "7");
            assert_eq!(config.ragflow_api_key.as_deref(), Some("true"));
            assert_eq!(config.model_api_key, None);
            Ok(())
        });
    }
}
