//! Shared client over a provider backend
//!
//! The backend performs the provider round trip. This type turns the result
//! into a priced [`ClientCall`] and hands it either back to the caller or to
//! the registered metadata strategies.

use crate::models::{InvocationMode, Model, Provider};
use crate::pricing::PricingService;
use crate::protocol::{to_context_messages, ClientCall, ClientMessage, InputMessage, TokenUsage};
use crate::providers::backend::ProviderBackend;
use crate::providers::strategy::MetadataStrategy;
use crate::providers::{ClientError, ClientResult};
use crate::structured::{ResponseModel, DEFAULT_MAX_RETRIES};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Client bound to one model, with metadata strategies taking a `C` context
pub struct Client<B, C = ()>
where
    C: Sync,
{
    model: Model,
    backend: B,
    pricing: Arc<PricingService>,
    strategies: Vec<Arc<dyn MetadataStrategy<C>>>,
    max_retries: u32,
}

impl<B: fmt::Debug, C: Sync> fmt::Debug for Client<B, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategies: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("Client")
            .field("model", &self.model)
            .field("backend", &self.backend)
            .field("strategies", &strategies)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl<B, C> Client<B, C>
where
    B: ProviderBackend,
    C: Sync,
{
    /// Bind `backend` to `model`; the model must be served by the backend's
    /// provider
    pub fn new(
        model: Model,
        backend: B,
        pricing: Arc<PricingService>,
        strategies: Vec<Arc<dyn MetadataStrategy<C>>>,
    ) -> ClientResult<Self> {
        if model.provider() != B::PROVIDER {
            return Err(ClientError::ProviderMismatch {
                model,
                expected: model.provider(),
                actual: B::PROVIDER,
            });
        }

        Ok(Self {
            model,
            backend,
            pricing,
            strategies,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the validation re-ask budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn provider(&self) -> Provider {
        B::PROVIDER
    }

    pub fn mode(&self) -> InvocationMode {
        self.model.mode()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn strategies(&self) -> &[Arc<dyn MetadataStrategy<C>>] {
        &self.strategies
    }

    /// Parsed response plus its call record. No strategy is invoked.
    pub async fn structured_response<T: ResponseModel>(
        &self,
        messages: &[InputMessage],
    ) -> ClientResult<(T, ClientCall)> {
        self.complete(messages).await
    }

    /// Parsed response only. Every registered strategy receives the call
    /// record and `context`, one after another in registration order. The
    /// first strategy error stops the rest and is returned.
    pub async fn structured_response_with_context<T: ResponseModel>(
        &self,
        messages: &[InputMessage],
        context: &C,
    ) -> ClientResult<T> {
        let (parsed, call) = self.complete(messages).await?;

        for strategy in &self.strategies {
            debug!("Running metadata strategy '{}' for call {}", strategy.name(), call.id());
            strategy
                .handle(&call, context)
                .await
                .map_err(|source| ClientError::Strategy {
                    strategy: strategy.name().to_string(),
                    source,
                })?;
        }

        Ok(parsed)
    }

    async fn complete<T: ResponseModel>(
        &self,
        messages: &[InputMessage],
    ) -> ClientResult<(T, ClientCall)> {
        let (parsed, responses) = self
            .backend
            .respond::<T>(self.model, messages, self.max_retries)
            .await?;

        // Rejected attempts were billed too
        let usage = responses
            .iter()
            .map(|raw| self.backend.token_usage(raw))
            .sum::<ClientResult<TokenUsage>>()?;
        if responses.len() > 1 {
            debug!(
                "{} priced {} attempts as one call",
                self.model,
                responses.len()
            );
        }
        let stats = self.pricing.build_response_stats(self.model, usage).await?;
        let response = serde_json::to_value(&parsed)?;

        let call = ClientCall::new(
            stats,
            to_context_messages(messages),
            ClientMessage::assistant(response),
            self.model,
        );

        info!(
            "{} call {} completed: {} in / {} out tokens, cost {:.6}",
            self.model,
            call.id(),
            call.input_tokens(),
            call.output_tokens(),
            call.total_cost()
        );

        Ok((parsed, call))
    }
}
