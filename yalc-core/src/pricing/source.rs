//! Cost table sources
//!
//! The cost table uses LiteLLM's `model_prices_and_context_window.json`
//! layout: a JSON object keyed by model id whose entries carry
//! `input_cost_per_token` and `output_cost_per_token` among many other
//! fields. Entries are kept as raw JSON and only the requested one is
//! interpreted.

use super::error::{PricingError, PricingResult};
use crate::http::{HttpClient, RequestOptions};
use crate::protocol::TokenPricing;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Model id -> raw cost entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostTable {
    entries: Map<String, Value>,
}

impl CostTable {
    /// Parse a cost table document
    pub fn from_json_str(json: &str) -> PricingResult<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Build from an already-parsed document; it must be a JSON object
    pub fn from_value(value: Value) -> PricingResult<Self> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(PricingError::Parse(format!(
                "expected a JSON object keyed by model, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.entries.contains_key(model)
    }

    /// Per-token prices for `model`.
    ///
    /// A missing or null rate reads as zero. Negative or non-numeric rates
    /// are rejected.
    pub fn pricing_for(&self, model: &str) -> PricingResult<TokenPricing> {
        let entry = self.entries.get(model).ok_or_else(|| PricingError::NotFound {
            model: model.to_string(),
        })?;

        Ok(TokenPricing {
            input_cost_per_token: rate(model, entry, "input_cost_per_token")?,
            output_cost_per_token: rate(model, entry, "output_cost_per_token")?,
        })
    }
}

fn rate(model: &str, entry: &Value, field: &'static str) -> PricingResult<f64> {
    let invalid = |value: &Value| PricingError::InvalidRate {
        model: model.to_string(),
        field,
        value: value.to_string(),
    };

    match entry.get(field) {
        None | Some(Value::Null) => Ok(0.0),
        Some(value) => match value.as_f64() {
            Some(rate) if rate.is_finite() && rate >= 0.0 => Ok(rate),
            _ => Err(invalid(value)),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Somewhere a full cost table can be loaded from
#[async_trait]
pub trait CostTableSource: Send + Sync + fmt::Debug {
    /// Load the whole table
    async fn fetch(&self) -> PricingResult<CostTable>;

    /// URL or path, for logs and errors
    fn location(&self) -> &str;
}

/// Cost table downloaded over HTTP
#[derive(Debug, Clone)]
pub struct RemoteCostTable {
    http: HttpClient,
    url: String,
}

impl RemoteCostTable {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CostTableSource for RemoteCostTable {
    async fn fetch(&self) -> PricingResult<CostTable> {
        let options = RequestOptions::new().with_timeout(Duration::from_secs(30));
        let document: Value = self
            .http
            .get_json(&self.url, options)
            .await
            .map_err(|e| PricingError::Fetch {
                location: self.url.clone(),
                message: e.to_string(),
            })?;

        let table = CostTable::from_value(document)?;
        debug!("Loaded {} models from {}", table.len(), self.url);
        Ok(table)
    }

    fn location(&self) -> &str {
        &self.url
    }
}

/// Cost table read from a local JSON file
#[derive(Debug, Clone)]
pub struct FileCostTable {
    path: PathBuf,
    display: String,
}

impl FileCostTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display = path.to_string_lossy().to_string();
        Self { path, display }
    }
}

#[async_trait]
impl CostTableSource for FileCostTable {
    async fn fetch(&self) -> PricingResult<CostTable> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| PricingError::Io {
                path: self.display.clone(),
                source,
            })?;

        let table = CostTable::from_json_str(&content)?;
        debug!("Loaded {} models from {}", table.len(), self.display);
        Ok(table)
    }

    fn location(&self) -> &str {
        &self.display
    }
}

/// Fixed in-memory cost table
#[derive(Debug, Clone)]
pub struct StaticCostTable {
    table: CostTable,
}

impl StaticCostTable {
    pub fn new(table: CostTable) -> Self {
        Self { table }
    }

    /// Table from `(model, input_cost_per_token, output_cost_per_token)` rows
    pub fn from_rates<'a>(rates: impl IntoIterator<Item = (&'a str, f64, f64)>) -> Self {
        let entries = rates
            .into_iter()
            .map(|(model, input, output)| {
                (
                    model.to_string(),
                    serde_json::json!({
                        "input_cost_per_token": input,
                        "output_cost_per_token": output,
                    }),
                )
            })
            .collect();
        Self::new(CostTable { entries })
    }
}

#[async_trait]
impl CostTableSource for StaticCostTable {
    async fn fetch(&self) -> PricingResult<CostTable> {
        Ok(self.table.clone())
    }

    fn location(&self) -> &str {
        "static"
    }
}

/// Remote source for `http(s)://` locations, file source otherwise
pub fn source_from_location(location: &str, http: HttpClient) -> Arc<dyn CostTableSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Arc::new(RemoteCostTable::new(http, location))
    } else {
        Arc::new(FileCostTable::new(location))
    }
}
