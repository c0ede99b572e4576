//! Integration tests for configuration loading and validation

use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use yalc_core::config::{
    load_from_json, load_from_yaml, ConfigError, ValidationErrorKind, DEFAULT_PRICING_URL,
    MAX_RETRIES_LIMIT,
};
use yalc_core::providers::{ClientError, ClientFactory};
use yalc_core::{Model, Provider};

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_valid_yaml_config() {
    env::set_var("YALC_TEST_YAML_OPENAI_KEY", "sk-from-env");

    let yaml = r#"
version: "0.1"
providers:
  - type: openai
    api_key: ${YALC_TEST_YAML_OPENAI_KEY}
    base_url: https://api.openai.com/v1
  - type: anthropic
    api_key: sk-ant-inline
    base_url: https://api.anthropic.com/v1
    max_tokens: 2048
pricing:
  cache_ttl_secs: 120
connection:
  request_timeout_secs: 30
"#;

    let dir = TempDir::new().unwrap();
    let config = load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml)).unwrap();

    assert_eq!(config.version, "0.1");
    assert_eq!(config.providers.len(), 2);

    let openai = config.provider(Provider::OpenAI).unwrap();
    assert_eq!(openai.api_key.as_ref().unwrap().expose_secret(), "sk-from-env");
    assert_eq!(openai.max_tokens, None);

    let anthropic = config.provider(Provider::Anthropic).unwrap();
    assert_eq!(anthropic.max_tokens, Some(2048));

    assert_eq!(config.pricing.source, DEFAULT_PRICING_URL);
    assert_eq!(config.pricing.cache_ttl().as_secs(), 120);
    assert_eq!(config.structured.max_retries, 3);
    assert_eq!(config.connection.request_timeout_secs, 30);
}

#[test]
fn test_load_valid_json_config() {
    let json = r#"{
        "version": "0.1",
        "providers": [
            {"type": "anthropic", "base_url": "https://api.anthropic.com/v1", "api_version": "2024-01-01"}
        ],
        "pricing": {"source": "/var/lib/yalc/prices.json", "max_entries": 10},
        "structured": {"max_retries": 0}
    }"#;

    let dir = TempDir::new().unwrap();
    let config = load_from_json(create_test_file(&dir, "yalc.json", json)).unwrap();

    assert!(config.provider(Provider::OpenAI).is_none());
    let anthropic = config.provider(Provider::Anthropic).unwrap();
    assert_eq!(anthropic.api_version, "2024-01-01");
    assert!(anthropic.api_key.is_none());
    assert_eq!(config.pricing.source, "/var/lib/yalc/prices.json");
    assert_eq!(config.pricing.max_entries, 10);
    assert_eq!(config.structured.max_retries, 0);
}

#[test]
fn test_missing_version_field() {
    let yaml = r#"
providers:
  - type: openai
    base_url: https://api.openai.com/v1
"#;

    let dir = TempDir::new().unwrap();
    let result = load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml));
    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_invalid_version() {
    let yaml = r#"
version: "2.0"
"#;

    let dir = TempDir::new().unwrap();
    match load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml)) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "version");
            assert!(matches!(e.kind, ValidationErrorKind::InvalidVersion { .. }));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_unknown_provider_type() {
    let yaml = r#"
version: "0.1"
providers:
  - type: mistral
    base_url: https://api.mistral.ai/v1
"#;

    let dir = TempDir::new().unwrap();
    let result = load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml));
    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_duplicate_provider() {
    let yaml = r#"
version: "0.1"
providers:
  - type: openai
    base_url: https://api.openai.com/v1
  - type: openai
    base_url: https://proxy.example.com/v1
"#;

    let dir = TempDir::new().unwrap();
    match load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml)) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "providers[1].type");
            assert!(matches!(e.kind, ValidationErrorKind::DuplicateValue { .. }));
        }
        other => panic!("expected duplicate error, got {:?}", other),
    }
}

#[test]
fn test_invalid_url_format() {
    let yaml = r#"
version: "0.1"
providers:
  - type: openai
    base_url: ftp://api.openai.com/v1
"#;

    let dir = TempDir::new().unwrap();
    match load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml)) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "providers[0].base_url");
            assert!(matches!(e.kind, ValidationErrorKind::InvalidUrl { .. }));
        }
        other => panic!("expected invalid url error, got {:?}", other),
    }
}

#[test]
fn test_zero_cache_ttl_rejected() {
    let yaml = r#"
version: "0.1"
pricing:
  cache_ttl_secs: 0
"#;

    let dir = TempDir::new().unwrap();
    match load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml)) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "pricing.cache_ttl_secs");
        }
        other => panic!("expected range error, got {:?}", other),
    }
}

#[test]
fn test_retry_budget_above_limit_rejected() {
    let yaml = r#"
version: "0.1"
structured:
  max_retries: 4294967295
"#;

    let dir = TempDir::new().unwrap();
    match load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml)) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "structured.max_retries");
            assert!(matches!(e.kind, ValidationErrorKind::OutOfRange { .. }));
        }
        other => panic!("expected range error, got {:?}", other),
    }

    let at_limit = format!(
        "version: \"0.1\"\nstructured:\n  max_retries: {}\n",
        MAX_RETRIES_LIMIT
    );
    let config = load_from_yaml(create_test_file(&dir, "limit.yaml", &at_limit)).unwrap();
    assert_eq!(config.structured.max_retries, MAX_RETRIES_LIMIT);
}

#[test]
fn test_zero_max_tokens_rejected() {
    let yaml = r#"
version: "0.1"
providers:
  - type: anthropic
    base_url: https://api.anthropic.com/v1
    max_tokens: 0
"#;

    let dir = TempDir::new().unwrap();
    match load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml)) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "providers[0].max_tokens");
        }
        other => panic!("expected range error, got {:?}", other),
    }
}

#[test]
fn test_missing_env_var() {
    let yaml = r#"
version: "0.1"
providers:
  - type: openai
    api_key: ${YALC_TEST_DEFINITELY_UNSET_KEY}
    base_url: https://api.openai.com/v1
"#;

    let dir = TempDir::new().unwrap();
    match load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml)) {
        Err(ConfigError::EnvVarNotFound { var }) => {
            assert_eq!(var, "YALC_TEST_DEFINITELY_UNSET_KEY")
        }
        other => panic!("expected env var error, got {:?}", other),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let result = load_from_yaml("/nonexistent/yalc.yaml");
    assert!(matches!(result, Err(ConfigError::IoError { .. })));
}

#[test]
fn test_api_key_redacted_in_debug() {
    let yaml = r#"
version: "0.1"
providers:
  - type: openai
    api_key: sk-very-secret-key-123
    base_url: https://api.openai.com/v1
"#;

    let dir = TempDir::new().unwrap();
    let config = load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml)).unwrap();
    let debug = format!("{:?}", config);
    assert!(!debug.contains("sk-very-secret-key-123"));
    assert!(debug.contains("[REDACTED]"));

    let openai = config.provider(Provider::OpenAI).unwrap();
    assert_eq!(openai.key_hint(), "sk-...-123");
}

#[test]
fn test_loaded_config_drives_factory() {
    let yaml = r#"
version: "0.1"
providers:
  - type: anthropic
    base_url: https://api.anthropic.com/v1
pricing:
  source: ./prices.json
"#;

    let dir = TempDir::new().unwrap();
    let config = load_from_yaml(create_test_file(&dir, "yalc.yaml", yaml)).unwrap();
    let factory = ClientFactory::new(config).unwrap();

    assert!(factory
        .create_client::<()>(Model::ClaudeSonnet45, vec![])
        .is_ok());
    assert!(matches!(
        factory.create_client::<()>(Model::Gpt4oMini, vec![]),
        Err(ClientError::UnsupportedProvider {
            provider: Provider::OpenAI,
            ..
        })
    ));
}
