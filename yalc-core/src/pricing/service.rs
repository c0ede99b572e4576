//! Pricing service: token counts to cost

use super::cache::{Clock, SystemClock, TtlCache};
use super::error::PricingResult;
use super::source::{source_from_location, CostTableSource};
use crate::config::PricingConfig;
use crate::http::HttpClient;
use crate::models::Model;
use crate::protocol::{ResponseStats, TokenPricing, TokenUsage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default time a fetched price stays valid
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default number of cached model prices
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Resolves per-token prices through a TTL cache in front of a cost table
/// source and turns token counts into costs.
#[derive(Debug)]
pub struct PricingService {
    cache: TtlCache<Model, TokenPricing>,
    source: Arc<dyn CostTableSource>,
}

impl PricingService {
    /// Service with the default TTL and capacity
    pub fn new(source: Arc<dyn CostTableSource>) -> Self {
        Self::with_clock(source, DEFAULT_CACHE_TTL, DEFAULT_MAX_ENTRIES, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn CostTableSource>,
        ttl: Duration,
        max_entries: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            "Pricing service using {} (ttl {:?})",
            source.location(),
            ttl
        );
        Self {
            cache: TtlCache::with_clock(ttl, max_entries, clock),
            source,
        }
    }

    /// Service configured from `pricing` settings
    pub fn from_config(config: &PricingConfig, http: HttpClient) -> Self {
        Self::with_clock(
            source_from_location(&config.source, http),
            config.cache_ttl(),
            config.max_entries,
            Arc::new(SystemClock),
        )
    }

    /// Per-token prices for `model`, fetched on a miss or after expiry
    pub async fn token_pricing(&self, model: Model) -> PricingResult<TokenPricing> {
        self.cache
            .get_or_fetch(model, move || async move {
                debug!("Fetching cost table for {}", model);
                let table = self.source.fetch().await?;
                table.pricing_for(model.as_str())
            })
            .await
    }

    /// `(input_cost, output_cost)` for the given token counts
    pub async fn cost(
        &self,
        model: Model,
        input_tokens: u64,
        output_tokens: u64,
    ) -> PricingResult<(f64, f64)> {
        let stats = self
            .build_response_stats(model, TokenUsage::new(input_tokens, output_tokens))
            .await?;
        Ok((stats.input_tokens_cost, stats.output_tokens_cost))
    }

    /// Token counts plus their cost
    pub async fn build_response_stats(
        &self,
        model: Model,
        usage: TokenUsage,
    ) -> PricingResult<ResponseStats> {
        let pricing = self.token_pricing(model).await?;
        Ok(ResponseStats::priced(usage, pricing))
    }

    /// Forget the cached price of one model
    pub fn invalidate(&self, model: Model) -> bool {
        self.cache.invalidate(&model)
    }

    /// Forget every cached price
    pub fn clear(&self) {
        self.cache.clear();
    }
}
