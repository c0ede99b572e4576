//! Environment variable interpolation and environment-only configuration

use super::error::ConfigError;
use super::schema::{YalcConfig, DEFAULT_PRICING_URL};
use super::secrets::SecretString;
use regex::Regex;
use std::env;
use std::sync::LazyLock;

/// Environment variable overriding the cost table location
pub const PRICING_URL_ENV: &str = "YALC_PRICING_URL";

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
});

/// Interpolate environment variables in a configuration string
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = content.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(content) {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(value) => result = result.replace(&cap[0], &value),
            Err(_) => {
                return Err(ConfigError::EnvVarNotFound {
                    var: var_name.to_string(),
                })
            }
        }
    }

    Ok(result)
}

/// Interpolate environment variables left in secret fields after parsing
pub fn interpolate_config_env_vars(config: &mut YalcConfig) -> Result<(), ConfigError> {
    for provider in &mut config.providers {
        if let Some(key) = &provider.api_key {
            if ENV_VAR_PATTERN.is_match(key.expose_secret()) {
                provider.api_key = Some(SecretString::new(interpolate_env_vars(
                    key.expose_secret(),
                )?));
            }
        }
        if ENV_VAR_PATTERN.is_match(&provider.base_url) {
            provider.base_url = interpolate_env_vars(&provider.base_url)?;
        }
    }

    Ok(())
}

/// Build a configuration from the process environment.
///
/// Every built-in provider is registered. Keys come from each provider's
/// API key variable; a missing key is not an error here.
pub fn config_from_env() -> YalcConfig {
    let mut config = YalcConfig::with_default_providers();

    for provider in &mut config.providers {
        provider.api_key = env::var(provider.provider.api_key_env())
            .ok()
            .filter(|key| !key.is_empty())
            .map(SecretString::new);
    }

    config.pricing.source = env::var(PRICING_URL_ENV)
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_PRICING_URL.to_string());

    config
}
