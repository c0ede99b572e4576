//! yalc core library
//!
//! Structured responses from LLM providers behind one client type. A caller
//! names a model from the registry and a [`ResponseModel`] type; the client
//! forces the provider to answer through a tool call matching that type's
//! schema, prices the call from the LiteLLM cost table and records it as a
//! [`ClientCall`].
//!
//! ```no_run
//! # use schemars::JsonSchema;
//! # use serde::{Deserialize, Serialize};
//! use yalc_core::{create_client, InputMessage, Model, ResponseModel};
//!
//! #[derive(Debug, Serialize, Deserialize, JsonSchema)]
//! struct Ping {
//!     message: String,
//! }
//!
//! impl ResponseModel for Ping {
//!     fn name() -> &'static str {
//!         "Ping"
//!     }
//! }
//!
//! # async fn run() -> Result<(), yalc_core::ClientError> {
//! let client = create_client::<()>(Model::Gpt4oMini, vec![])?;
//! let (ping, call) = client
//!     .structured_response::<Ping>(&[InputMessage::user("Say hello")])
//!     .await?;
//! println!("{} cost {}", ping.message, call.total_cost());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod http;
pub mod models;
pub mod pricing;
pub mod protocol;
pub mod providers;
pub mod structured;

pub use config::YalcConfig;
pub use models::{InvocationMode, Model, Provider};
pub use pricing::{PricingError, PricingService};
pub use protocol::{
    ClientCall, ClientMessage, ContextMessage, InputMessage, ResponseStats, Role, TokenUsage,
};
pub use providers::{
    create_client, Client, ClientError, ClientFactory, ClientResult, MetadataStrategy,
    ProviderClient, TracingStrategy,
};
pub use structured::ResponseModel;

/// Returns the version of the yalc core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
