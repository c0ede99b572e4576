//! Provider backend trait
//!
//! A backend knows one provider's wire format: how to ask for a tool call
//! that matches a [`ResponseModel`] schema and where that provider reports
//! token usage. Everything else a client does is shared.

use crate::models::{Model, Provider};
use crate::protocol::{InputMessage, TokenUsage};
use crate::providers::ClientResult;
use crate::structured::ResponseModel;
use async_trait::async_trait;
use std::fmt;

#[async_trait]
pub trait ProviderBackend: Send + Sync + fmt::Debug {
    /// Provider this backend talks to
    const PROVIDER: Provider;

    /// Raw provider response, kept for usage extraction
    type Raw: Send + Sync + fmt::Debug;

    /// Ask `model` for a `T`, re-asking up to `max_retries` times when the
    /// answer fails validation.
    ///
    /// Returns the raw response of every attempt, rejected ones first, so
    /// that the whole exchange can be priced.
    async fn respond<T: ResponseModel>(
        &self,
        model: Model,
        messages: &[InputMessage],
        max_retries: u32,
    ) -> ClientResult<(T, Vec<Self::Raw>)>;

    /// Token counts reported in `raw`.
    ///
    /// Fails with [`ClientError::MissingUsage`](crate::providers::ClientError::MissingUsage)
    /// when the response has no usage block.
    fn token_usage(&self, raw: &Self::Raw) -> ClientResult<TokenUsage>;
}
