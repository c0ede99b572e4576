//! Token pricing
//!
//! Converts token counts into cost using a remote cost table, with prices
//! cached per model for a bounded time window.

pub mod cache;
pub mod error;
pub mod service;
pub mod source;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use error::{PricingError, PricingResult};
pub use service::{PricingService, DEFAULT_CACHE_TTL, DEFAULT_MAX_ENTRIES};
pub use source::{
    source_from_location, CostTable, CostTableSource, FileCostTable, RemoteCostTable,
    StaticCostTable,
};
