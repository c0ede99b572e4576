//! Client factory
//!
//! Maps a model to its provider's backend, wires in the shared HTTP client
//! and pricing service, and returns a ready client. Providers are looked up
//! in the configuration's registration table; a provider missing from it (or
//! disabled) is unsupported.

use crate::config::{config_from_env, YalcConfig};
use crate::http::HttpClient;
use crate::models::{validate_registry, InvocationMode, Model, Provider};
use crate::pricing::PricingService;
use crate::protocol::{ClientCall, InputMessage};
use crate::providers::anthropic::AnthropicBackend;
use crate::providers::client::Client;
use crate::providers::openai::OpenAIBackend;
use crate::providers::strategy::MetadataStrategy;
use crate::providers::{ClientError, ClientResult};
use crate::structured::ResponseModel;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// A client for any supported provider
#[derive(Debug)]
pub enum ProviderClient<C: Sync = ()> {
    OpenAI(Client<OpenAIBackend, C>),
    Anthropic(Client<AnthropicBackend, C>),
}

impl<C: Sync> ProviderClient<C> {
    pub fn model(&self) -> Model {
        match self {
            ProviderClient::OpenAI(client) => client.model(),
            ProviderClient::Anthropic(client) => client.model(),
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            ProviderClient::OpenAI(client) => client.provider(),
            ProviderClient::Anthropic(client) => client.provider(),
        }
    }

    pub fn mode(&self) -> InvocationMode {
        match self {
            ProviderClient::OpenAI(client) => client.mode(),
            ProviderClient::Anthropic(client) => client.mode(),
        }
    }

    pub fn strategies(&self) -> &[Arc<dyn MetadataStrategy<C>>] {
        match self {
            ProviderClient::OpenAI(client) => client.strategies(),
            ProviderClient::Anthropic(client) => client.strategies(),
        }
    }

    /// See [`Client::structured_response`]
    pub async fn structured_response<T: ResponseModel>(
        &self,
        messages: &[InputMessage],
    ) -> ClientResult<(T, ClientCall)> {
        match self {
            ProviderClient::OpenAI(client) => client.structured_response(messages).await,
            ProviderClient::Anthropic(client) => client.structured_response(messages).await,
        }
    }

    /// See [`Client::structured_response_with_context`]
    pub async fn structured_response_with_context<T: ResponseModel>(
        &self,
        messages: &[InputMessage],
        context: &C,
    ) -> ClientResult<T> {
        match self {
            ProviderClient::OpenAI(client) => {
                client.structured_response_with_context(messages, context).await
            }
            ProviderClient::Anthropic(client) => {
                client.structured_response_with_context(messages, context).await
            }
        }
    }
}

/// Builds provider clients that share one HTTP pool and one price cache
#[derive(Debug, Clone)]
pub struct ClientFactory {
    config: Arc<YalcConfig>,
    http: HttpClient,
    pricing: Arc<PricingService>,
}

impl ClientFactory {
    /// Factory over `config`, pricing from `config.pricing`
    pub fn new(config: YalcConfig) -> ClientResult<Self> {
        let http = HttpClient::from_config(&config.connection)?;
        let pricing = Arc::new(PricingService::from_config(&config.pricing, http.clone()));
        Self::build(config, http, pricing)
    }

    /// Factory over `config` with an existing pricing service
    pub fn with_pricing(config: YalcConfig, pricing: Arc<PricingService>) -> ClientResult<Self> {
        let http = HttpClient::from_config(&config.connection)?;
        Self::build(config, http, pricing)
    }

    /// Factory configured from the process environment
    pub fn from_env() -> ClientResult<Self> {
        Self::new(config_from_env())
    }

    fn build(
        config: YalcConfig,
        http: HttpClient,
        pricing: Arc<PricingService>,
    ) -> ClientResult<Self> {
        validate_registry()?;
        config.validate().map_err(crate::config::ConfigError::from)?;

        let enabled: Vec<&str> = Provider::ALL
            .iter()
            .filter(|p| config.provider(**p).is_some())
            .map(|p| p.as_str())
            .collect();
        info!("Client factory ready with providers: {}", enabled.join(", "));

        Ok(Self {
            config: Arc::new(config),
            http,
            pricing,
        })
    }

    pub fn config(&self) -> &YalcConfig {
        &self.config
    }

    pub fn pricing(&self) -> &Arc<PricingService> {
        &self.pricing
    }

    /// Client bound to `model` and its provider's invocation mode
    pub fn create_client<C: Sync>(
        &self,
        model: Model,
        strategies: Vec<Arc<dyn MetadataStrategy<C>>>,
    ) -> ClientResult<ProviderClient<C>> {
        let provider = model.provider();
        let settings = self
            .config
            .provider(provider)
            .cloned()
            .ok_or(ClientError::UnsupportedProvider { provider, model })?;

        debug!(
            "Creating {} client for {} ({:?}, {} strateg{}, key {})",
            provider,
            model,
            model.mode(),
            strategies.len(),
            if strategies.len() == 1 { "y" } else { "ies" },
            settings.key_hint()
        );

        let max_retries = self.config.structured.max_retries;
        let client = match provider {
            Provider::OpenAI => ProviderClient::OpenAI(
                Client::new(
                    model,
                    OpenAIBackend::new(self.http.clone(), settings),
                    self.pricing.clone(),
                    strategies,
                )?
                .with_max_retries(max_retries),
            ),
            Provider::Anthropic => ProviderClient::Anthropic(
                Client::new(
                    model,
                    AnthropicBackend::new(self.http.clone(), settings),
                    self.pricing.clone(),
                    strategies,
                )?
                .with_max_retries(max_retries),
            ),
        };

        Ok(client)
    }
}

static SHARED_FACTORY: OnceLock<ClientFactory> = OnceLock::new();

/// Process-wide factory built from the environment on first use
pub fn shared_factory() -> ClientResult<&'static ClientFactory> {
    if let Some(factory) = SHARED_FACTORY.get() {
        return Ok(factory);
    }

    let factory = ClientFactory::from_env()?;
    Ok(SHARED_FACTORY.get_or_init(|| factory))
}

/// Client for `model` from the process-wide factory
pub fn create_client<C: Sync>(
    model: Model,
    strategies: Vec<Arc<dyn MetadataStrategy<C>>>,
) -> ClientResult<ProviderClient<C>> {
    shared_factory()?.create_client(model, strategies)
}
