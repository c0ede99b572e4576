//! Anthropic backend over the Messages API
//!
//! System turns go in the top-level `system` field; the remaining turns must
//! be `user` or `assistant`. The schema is offered as a tool and
//! `tool_choice` forces its use.

pub mod types;

use crate::config::{ProviderSettings, DEFAULT_ANTHROPIC_MAX_TOKENS};
use crate::http::{HttpClient, RequestOptions};
use crate::models::{Model, Provider};
use crate::protocol::{InputMessage, Role, TokenUsage};
use crate::providers::backend::ProviderBackend;
use crate::providers::{ClientError, ClientResult};
use crate::structured::{extract_with_reasks, Attempt, ResponseModel, ToolSpec};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;
use types::{AnthropicMessage, AnthropicTool, AnthropicToolChoice, MessagesRequest, MessagesResponse};

/// Backend for Anthropic models
#[derive(Debug, Clone)]
pub struct AnthropicBackend {
    http: HttpClient,
    settings: ProviderSettings,
}

impl AnthropicBackend {
    pub fn new(http: HttpClient, settings: ProviderSettings) -> Self {
        Self { http, settings }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.settings.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> ClientResult<HashMap<String, String>> {
        let key = self
            .settings
            .api_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ClientError::Authentication(format!(
                    "missing {}",
                    Provider::Anthropic.api_key_env()
                ))
            })?;

        let mut headers = HashMap::new();
        headers.insert("x-api-key".to_string(), key.expose_secret().to_string());
        headers.insert(
            "anthropic-version".to_string(),
            self.settings.api_version.clone(),
        );
        Ok(headers)
    }

    async fn send(
        &self,
        model: Model,
        conversation: &[InputMessage],
        tool: &ToolSpec,
    ) -> ClientResult<Attempt<MessagesResponse>> {
        let max_tokens = self
            .settings
            .max_tokens
            .unwrap_or(DEFAULT_ANTHROPIC_MAX_TOKENS);
        let request = build_request(model, conversation, tool, max_tokens);
        let options = RequestOptions::new();
        debug!(
            "Anthropic messages call for {} with {} message(s) [request_id: {}]",
            model,
            request.messages.len(),
            options.request_id
        );

        let response: MessagesResponse = self
            .http
            .post_json(&self.endpoint(), &self.headers()?, &request, options)
            .await?;

        let arguments = response.tool_input(&tool.name);
        Ok(Attempt {
            raw: response,
            arguments,
        })
    }
}

fn build_request<'a>(
    model: Model,
    conversation: &'a [InputMessage],
    tool: &'a ToolSpec,
    max_tokens: u32,
) -> MessagesRequest<'a> {
    let system: Vec<&str> = conversation
        .iter()
        .filter(|message| message.role == Role::System)
        .map(|message| message.content.as_str())
        .collect();

    let messages = conversation
        .iter()
        .filter_map(|message| {
            let role = match message.role {
                Role::System => return None,
                Role::Assistant => "assistant",
                Role::User | Role::Tool => "user",
            };
            Some(AnthropicMessage {
                role,
                content: &message.content,
            })
        })
        .collect();

    MessagesRequest {
        model: model.as_str(),
        max_tokens,
        system: (!system.is_empty()).then(|| system.join("\n\n")),
        messages,
        tools: vec![AnthropicTool {
            name: &tool.name,
            description: &tool.description,
            input_schema: &tool.parameters,
        }],
        tool_choice: AnthropicToolChoice {
            choice_type: "tool",
            name: &tool.name,
        },
    }
}

#[async_trait]
impl ProviderBackend for AnthropicBackend {
    const PROVIDER: Provider = Provider::Anthropic;
    type Raw = MessagesResponse;

    async fn respond<T: ResponseModel>(
        &self,
        model: Model,
        messages: &[InputMessage],
        max_retries: u32,
    ) -> ClientResult<(T, Vec<Self::Raw>)> {
        let tool = ToolSpec::of::<T>();
        let tool = &tool;
        extract_with_reasks(Self::PROVIDER, messages, max_retries, |conversation| async move {
            self.send(model, &conversation, tool).await
        })
        .await
    }

    fn token_usage(&self, raw: &Self::Raw) -> ClientResult<TokenUsage> {
        let usage = raw.usage.ok_or(ClientError::MissingUsage {
            provider: Self::PROVIDER,
        })?;
        Ok(TokenUsage::new(usage.input_tokens, usage.output_tokens))
    }
}
