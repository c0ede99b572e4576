//! Protocol module for structured call records
//!
//! Provider-agnostic message, usage and call-record types shared by the
//! pricing service, the provider clients and metadata strategies.

pub mod types;

pub use types::{
    to_context_messages, ClientCall, ClientMessage, ContextMessage, InputMessage, ResponseStats,
    Role, TokenPricing, TokenUsage,
};
