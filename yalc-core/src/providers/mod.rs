//! Provider clients
//!
//! A [`Client`] pairs a model with a [`ProviderBackend`] that knows one
//! provider's structured-output API. The shared client prices each call,
//! records it as a [`ClientCall`](crate::protocol::ClientCall) and runs the
//! registered [`MetadataStrategy`] observers. [`ClientFactory`] picks the
//! backend for a model.

pub mod anthropic;
pub mod backend;
pub mod client;
pub mod error;
pub mod factory;
pub mod openai;
pub mod strategy;

pub use anthropic::AnthropicBackend;
pub use backend::ProviderBackend;
pub use client::Client;
pub use error::{ClientError, ClientResult};
pub use factory::{create_client, shared_factory, ClientFactory, ProviderClient};
pub use openai::OpenAIBackend;
pub use strategy::{MetadataStrategy, TracingStrategy};
