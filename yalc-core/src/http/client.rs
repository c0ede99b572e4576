//! HTTP client implementation using reqwest

use crate::config::ConnectionConfig;
use crate::http::error::map_http_error;
use crate::http::RequestOptions;
use crate::providers::{ClientError, ClientResult};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Maximum response size; the LiteLLM cost map is well under this
const MAX_RESPONSE_SIZE: usize = 16 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("yalc/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with connection pooling
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Maximum response size to prevent OOM
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> ClientResult<Self> {
        Self::from_config(&ConnectionConfig::default())
    }

    /// Create a new HTTP client from connection settings
    pub fn from_config(config: &ConnectionConfig) -> ClientResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| ClientError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post_json<B, R>(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &B,
        options: RequestOptions,
    ) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut req_builder = self.client.post(url).json(body);
        for (key, value) in headers {
            req_builder = req_builder.header(key, value);
        }
        self.execute(req_builder, url, options).await
    }

    /// GET a JSON document
    pub async fn get_json<R>(&self, url: &str, options: RequestOptions) -> ClientResult<R>
    where
        R: DeserializeOwned,
    {
        let req_builder = self.client.get(url);
        self.execute(req_builder, url, options).await
    }

    async fn execute<R>(
        &self,
        mut req_builder: RequestBuilder,
        url: &str,
        options: RequestOptions,
    ) -> ClientResult<R>
    where
        R: DeserializeOwned,
    {
        let request_id = options.request_id;
        debug!("Request URL: {} [request_id: {}]", url, request_id);

        if let Some(timeout) = options.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        // Add request ID header for correlation
        req_builder = req_builder.header("X-Request-ID", request_id.to_string());

        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("Request timeout for {} [request_id: {}]", url, request_id);
                ClientError::Timeout
            } else if e.is_connect() {
                error!("Connection error for {} [request_id: {}]: {}", url, request_id, e);
                ClientError::Network(format!("Connection failed: {} [request_id: {}]", e, request_id))
            } else {
                error!("Request error for {} [request_id: {}]: {}", url, request_id, e);
                ClientError::Network(format!("{} [request_id: {}]", e, request_id))
            }
        })?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            // Capture headers for retry-after parsing
            let headers = response.headers().clone();
            let body = response.text().await.ok();

            warn!(
                "Request failed with status {} for {} [request_id: {}]",
                status, url, request_id
            );

            return Err(map_http_error(status, Some(&headers), body, request_id));
        }

        self.check_content_length(&response)?;

        let response_text = response.text().await.map_err(|e| {
            ClientError::Network(format!(
                "Failed to read response body: {} [request_id: {}]",
                e, request_id
            ))
        })?;

        if response_text.len() > self.max_response_size {
            return Err(ClientError::Parse(format!(
                "Response size {} exceeds maximum {} [request_id: {}]",
                response_text.len(),
                self.max_response_size,
                request_id
            )));
        }

        let parsed = serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse response from {} [request_id: {}]: {}", url, request_id, e);
            ClientError::Parse(format!("Invalid response format: {} [request_id: {}]", e, request_id))
        })?;

        info!("Request completed successfully for {} [request_id: {}]", url, request_id);

        Ok(parsed)
    }

    /// Check response size to prevent OOM
    fn check_content_length(&self, response: &Response) -> ClientResult<()> {
        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_size {
                return Err(ClientError::Parse(format!(
                    "Response size {} exceeds maximum {}",
                    content_length, self.max_response_size
                )));
            }
        }

        Ok(())
    }
}
