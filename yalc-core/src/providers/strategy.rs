//! Metadata strategies
//!
//! Strategies observe every completed call. They receive the finished
//! [`ClientCall`] plus the caller's context value and can persist, log or
//! forward it. A client runs its strategies in registration order after the
//! provider response has been validated and priced.

use crate::protocol::ClientCall;
use async_trait::async_trait;
use std::fmt;
use tracing::info;

#[async_trait]
pub trait MetadataStrategy<C: Sync>: Send + Sync {
    /// Name used in logs and in [`ClientError::Strategy`](crate::providers::ClientError::Strategy)
    fn name(&self) -> &str;

    /// Handle one completed call
    async fn handle(&self, call: &ClientCall, context: &C) -> anyhow::Result<()>;
}

/// Logs each call's usage and cost through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStrategy;

#[async_trait]
impl<C> MetadataStrategy<C> for TracingStrategy
where
    C: fmt::Debug + Sync,
{
    fn name(&self) -> &str {
        "tracing"
    }

    async fn handle(&self, call: &ClientCall, context: &C) -> anyhow::Result<()> {
        info!(
            call_id = %call.id(),
            model = %call.model_name(),
            input_tokens = call.input_tokens(),
            output_tokens = call.output_tokens(),
            total_cost = call.total_cost(),
            context = ?context,
            "structured call completed"
        );
        Ok(())
    }
}
