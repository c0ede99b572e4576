//! OpenAI backend over the Responses API
//!
//! The schema is offered as a single function tool and `tool_choice` forces
//! the model to call it. Usage is optional in this API's response.

pub mod types;

use crate::config::ProviderSettings;
use crate::http::{HttpClient, RequestOptions};
use crate::models::{Model, Provider};
use crate::protocol::{InputMessage, Role, TokenUsage};
use crate::providers::backend::ProviderBackend;
use crate::providers::{ClientError, ClientResult};
use crate::structured::{extract_with_reasks, Attempt, ResponseModel, ToolSpec};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;
use types::{
    ResponsesInputMessage, ResponsesRequest, ResponsesResponse, ResponsesTool,
    ResponsesToolChoice,
};

/// Backend for OpenAI models
#[derive(Debug, Clone)]
pub struct OpenAIBackend {
    http: HttpClient,
    settings: ProviderSettings,
}

impl OpenAIBackend {
    pub fn new(http: HttpClient, settings: ProviderSettings) -> Self {
        Self { http, settings }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.settings.base_url.trim_end_matches('/'))
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
                    Provider::OpenAI.api_key_env()
                ))
            })?;

        let mut headers = HashMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", key.expose_secret()),
        );
        Ok(headers)
    }

    async fn send(
        &self,
        model: Model,
        conversation: &[InputMessage],
        tool: &ToolSpec,
    ) -> ClientResult<Attempt<ResponsesResponse>> {
        let request = build_request(model, conversation, tool, self.settings.max_tokens);
        let options = RequestOptions::new();
        debug!(
            "OpenAI responses call for {} with {} input message(s) [request_id: {}]",
            model,
            conversation.len(),
            options.request_id
        );

        let response: ResponsesResponse = self
            .http
            .post_json(&self.endpoint(), &self.headers()?, &request, options)
            .await?;

        let arguments = response.function_arguments(&tool.name);
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
    max_tokens: Option<u32>,
) -> ResponsesRequest<'a> {
    ResponsesRequest {
        model: model.as_str(),
        input: conversation
            .iter()
            .map(|message| ResponsesInputMessage {
                role: match message.role {
                    Role::Tool => Role::User.as_str(),
                    role => role.as_str(),
                },
                content: &message.content,
            })
            .collect(),
        tools: vec![ResponsesTool {
            tool_type: "function",
            name: &tool.name,
            description: &tool.description,
            parameters: &tool.parameters,
        }],
        tool_choice: ResponsesToolChoice {
            choice_type: "function",
            name: &tool.name,
        },
        max_output_tokens: max_tokens,
    }
}

#[async_trait]
impl ProviderBackend for OpenAIBackend {
    const PROVIDER: Provider = Provider::OpenAI;
    type Raw = ResponsesResponse;

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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> OpenAIBackend {
        OpenAIBackend::new(
            HttpClient::new().unwrap(),
            ProviderSettings::new(Provider::OpenAI).with_api_key("sk-test"),
        )
    }

    fn tool() -> ToolSpec {
        ToolSpec {
            name: "Ping".to_string(),
            description: "Reply".to_string(),
            parameters: json!({"type": "object"}),
        }
    }

    #[test]
    fn test_request_forces_function_call() {
        let conversation = vec![
            InputMessage::system("Be brief"),
            InputMessage::user("Say hello"),
        ];
        let tool = tool();
        let request = build_request(Model::Gpt4oMini, &conversation, &tool, Some(256));
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["input"][0], json!({"role": "system", "content": "Be brief"}));
        assert_eq!(body["input"][1]["role"], "user");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["name"], "Ping");
        assert_eq!(body["tools"][0]["parameters"], json!({"type": "object"}));
        assert_eq!(body["tool_choice"], json!({"type": "function", "name": "Ping"}));
        assert_eq!(body["max_output_tokens"], 256);
    }

    #[test]
    fn test_output_cap_only_when_configured() {
        let conversation = vec![InputMessage::user("Say hello")];
        let tool = tool();
        let request = build_request(Model::Gpt5Mini, &conversation, &tool, None);
        let body = serde_json::to_value(&request).unwrap();

        assert!(body.get("max_output_tokens").is_none());
    }

    #[test]
    fn test_tool_turns_sent_as_user() {
        let conversation = vec![
            InputMessage::user("Look this up"),
            InputMessage::new(Role::Tool, "{\"found\": true}"),
        ];
        let tool = tool();
        let request = build_request(Model::Gpt4oMini, &conversation, &tool, None);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["input"][1]["role"], "user");
        assert_eq!(body["input"][1]["content"], "{\"found\": true}");
    }

    #[test]
    fn test_function_arguments_extracted() {
        let response: ResponsesResponse = serde_json::from_value(json!({
            "id": "resp_1",
            "output": [
                {"type": "reasoning", "id": "rs_1", "summary": []},
                {"type": "function_call", "name": "Ping", "call_id": "call_1",
                 "arguments": "{\"message\": \"hello\"}"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();

        assert_eq!(
            response.function_arguments("Ping"),
            Some(json!({"message": "hello"}))
        );
        assert_eq!(response.function_arguments("Other"), None);
    }

    #[test]
    fn test_malformed_arguments_kept_as_text() {
        let response: ResponsesResponse = serde_json::from_value(json!({
            "id": "resp_1",
            "output": [{"type": "function_call", "name": "Ping", "arguments": "{oops"}]
        }))
        .unwrap();

        assert_eq!(response.function_arguments("Ping"), Some(json!("{oops")));
    }

    #[test]
    fn test_usage_extracted() {
        let response: ResponsesResponse = serde_json::from_value(json!({
            "id": "resp_1",
            "output": [],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .unwrap();

        assert_eq!(backend().token_usage(&response).unwrap(), TokenUsage::new(10, 5));
    }

    #[test]
    fn test_null_usage_is_missing_usage() {
        let response: ResponsesResponse = serde_json::from_value(json!({
            "id": "resp_1",
            "output": [],
            "usage": null
        }))
        .unwrap();

        assert!(matches!(
            backend().token_usage(&response),
            Err(ClientError::MissingUsage {
                provider: Provider::OpenAI
            })
        ));
    }

    #[test]
    fn test_missing_key_is_authentication_error() {
        let backend = OpenAIBackend::new(
            HttpClient::new().unwrap(),
            ProviderSettings::new(Provider::OpenAI),
        );
        match backend.headers() {
            Err(ClientError::Authentication(message)) => {
                assert!(message.contains("OPENAI_API_KEY"))
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }
}
