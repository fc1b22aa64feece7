//! Layering of defaults, the TOML file and the environment.

use catalog_fixer::infrastructure::config::{AppConfig, CONFIG_FILE_ENV};
use std::time::Duration;

#[test]
fn environment_beats_file_beats_defaults() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
                port = 6000
                model_name = "file-model"
                ragflow_url = "http://ragflow.local"
                ragflow_po_dataset_ids = "a,b"
                fix_spec_timeout_secs = 90
            "#,
        )?;
        jail.set_env(CONFIG_FILE_ENV, "custom.toml");
        jail.set_env("MODEL_NAME", "env-model");
        jail.set_env("CONCURRENCY", "8");
        jail.set_env("FIX_CATEGORY_ENABLED", "false");

        let config = AppConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.port, 6000);
        assert_eq!(config.model_name, "env-model");
        assert_eq!(config.concurrency, 8);
        assert!(!config.fix_category_enabled);
        assert!(config.rag_enabled());
        assert_eq!(config.dataset_ids(), vec!["a", "b"]);
        assert_eq!(config.top_k, 10);
        assert_eq!(config.timeouts().fix_spec, Duration::from_secs(90));
        assert_eq!(config.timeouts().llm, Duration::from_secs(60));
        Ok(())
    });
}

#[test]
fn missing_file_falls_back_to_defaults() {
    figment::Jail::expect_with(|jail| {
        jail.set_env(CONFIG_FILE_ENV, "absent.toml");
        let config = AppConfig::load().map_err(|e| e.to_string())?;
        let defaults = AppConfig::default();
        assert_eq!(config.model_url, defaults.model_url);
        assert_eq!(config.top_k, defaults.top_k);
        assert_eq!(config.rag_similarity_threshold, defaults.rag_similarity_threshold);
        Ok(())
    });
}

#[test]
fn invalid_values_are_rejected() {
    figment::Jail::expect_with(|jail| {
        jail.set_env(CONFIG_FILE_ENV, "absent.toml");
        jail.set_env("TOP_K", "0");
        assert!(AppConfig::load().is_err());
        Ok(())
    });

    figment::Jail::expect_with(|jail| {
        jail.set_env(CONFIG_FILE_ENV, "absent.toml");
        jail.set_env("RAGFLOW_URL", "not a url");
        assert!(AppConfig::load().is_err());
        Ok(())
    });
}

#[test]
fn all_digit_keys_and_ids_load_as_text() {
    figment::Jail::expect_with(|jail| {
        jail.set_env(CONFIG_FILE_ENV, "absent.toml");
        jail.set_env("MODEL_API_KEY", "1234567890");
        jail.set_env("RAGFLOW_PO_DATASET_IDS", "42");

        let config = AppConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.model_api_key.as_deref(), Some("1234567890"));
        assert_eq!(config.llm_config().api_key.as_deref(), Some("1234567890"));
        assert_eq!(config.dataset_ids(), vec!["42"]);
        Ok(())
    });
}
