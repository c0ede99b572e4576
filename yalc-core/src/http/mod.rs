//! HTTP client module for provider and cost table requests
//!
//! This module implements the HTTP layer for yalc, handling:
//! - Connection pooling and client management
//! - Error mapping and retry hints
//! - Request ID generation and correlation

pub mod client;
pub mod error;

pub use client::HttpClient;

use std::time::Duration;
use uuid::Uuid;

/// Options for an HTTP request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Per-request timeout overriding the client default
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timeout: None,
        }
    }
}

impl RequestOptions {
    /// Create new request options with a generated request ID
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout for this request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
