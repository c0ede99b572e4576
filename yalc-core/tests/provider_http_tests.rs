//! End-to-end provider tests against mocked OpenAI, Anthropic and cost
//! table endpoints

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yalc_core::config::{ProviderSettings, YalcConfig};
use yalc_core::{
    ClientError, ClientFactory, InputMessage, Model, Provider, ResponseModel, Role,
};

#[derive(Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
struct Ping {
    message: String,
}

impl ResponseModel for Ping {
    fn name() -> &'static str {
        "Ping"
    }
}

fn cost_table() -> Value {
    json!({
        "gpt-4o-mini": {
            "input_cost_per_token": 0.0001,
            "output_cost_per_token": 0.0002,
            "litellm_provider": "openai"
        },
        "claude-sonnet-4-5": {
            "input_cost_per_token": 0.000003,
            "output_cost_per_token": 0.000015,
            "litellm_provider": "anthropic"
        }
    })
}

async fn mount_cost_table(server: &MockServer, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path("/prices.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cost_table()))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

/// Log output for failing runs, filtered by `RUST_LOG`
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(server: &MockServer, max_retries: u32) -> YalcConfig {
    init_tracing();
    let mut config = YalcConfig::with_default_providers();
    config.providers = vec![
        ProviderSettings::new(Provider::OpenAI)
            .with_api_key("sk-test")
            .with_base_url(server.uri()),
        ProviderSettings::new(Provider::Anthropic)
            .with_api_key("sk-ant-test")
            .with_base_url(server.uri()),
    ];
    config.pricing.source = format!("{}/prices.json", server.uri());
    config.structured.max_retries = max_retries;
    config
}

fn openai_response(arguments: &str, usage: Value) -> Value {
    json!({
        "id": "resp_123",
        "object": "response",
        "status": "completed",
        "model": "gpt-4o-mini",
        "output": [{
            "type": "function_call",
            "id": "fc_1",
            "call_id": "call_1",
            "name": "Ping",
            "arguments": arguments
        }],
        "usage": usage
    })
}

#[tokio::test]
async fn test_openai_structured_response() {
    let server = MockServer::start().await;
    mount_cost_table(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "tool_choice": {"type": "function", "name": "Ping"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_response(
            r#"{"message": "hello"}"#,
            json!({"input_tokens": 10, "output_tokens": 5, "total_tokens": 15}),
        )))
        .expect(2)
        .mount(&server)
        .await;

    let factory = ClientFactory::new(config(&server, 3)).unwrap();
    let client = factory.create_client::<()>(Model::Gpt4oMini, vec![]).unwrap();

    let messages = vec![InputMessage::user("Say hello")];
    let (ping, call) = client.structured_response::<Ping>(&messages).await.unwrap();
    assert_eq!(ping.message, "hello");
    assert_eq!(call.input_tokens(), 10);
    assert_eq!(call.output_tokens(), 5);
    assert_eq!(call.input_tokens_cost(), 10.0 * 0.0001);
    assert_eq!(call.output_tokens_cost(), 5.0 * 0.0002);

    // Second call prices from the cache
    client.structured_response::<Ping>(&messages).await.unwrap();
}

#[tokio::test]
async fn test_openai_reasks_after_invalid_arguments() {
    let server = MockServer::start().await;
    mount_cost_table(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_response(
            r#"{"msg": "hello"}"#,
            json!({"input_tokens": 8, "output_tokens": 4}),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_response(
            r#"{"message": "hello"}"#,
            json!({"input_tokens": 20, "output_tokens": 6}),
        )))
        .mount(&server)
        .await;

    let factory = ClientFactory::new(config(&server, 3)).unwrap();
    let client = factory.create_client::<()>(Model::Gpt4oMini, vec![]).unwrap();

    let messages = vec![InputMessage::user("Say hello")];
    let (ping, call) = client.structured_response::<Ping>(&messages).await.unwrap();
    assert_eq!(ping.message, "hello");

    // Both round trips are billed
    assert_eq!(call.input_tokens(), 8 + 20);
    assert_eq!(call.output_tokens(), 4 + 6);
    assert_eq!(call.input_tokens_cost(), 28.0 * 0.0001);
    // The record keeps the caller's messages, not the re-ask turns
    assert_eq!(call.context_messages().len(), 1);
    assert_eq!(call.context_messages()[0].role(), Role::User);

    let requests = server.received_requests().await.unwrap();
    let asks: Vec<Value> = requests
        .iter()
        .filter(|r| r.url.path() == "/responses")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(asks.len(), 2);
    assert_eq!(asks[0]["input"].as_array().unwrap().len(), 1);

    let reask = asks[1]["input"].as_array().unwrap();
    assert_eq!(reask.len(), 3);
    assert_eq!(reask[1]["role"], "assistant");
    assert_eq!(reask[2]["role"], "user");
    assert!(reask[2]["content"].as_str().unwrap().contains("message"));
}

#[tokio::test]
async fn test_openai_validation_budget_exhausted() {
    let server = MockServer::start().await;
    mount_cost_table(&server, 0).await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_response(
            r#"{"msg": "hello"}"#,
            json!({"input_tokens": 8, "output_tokens": 4}),
        )))
        .expect(2)
        .mount(&server)
        .await;

    let factory = ClientFactory::new(config(&server, 1)).unwrap();
    let client = factory.create_client::<()>(Model::Gpt4oMini, vec![]).unwrap();

    let result = client
        .structured_response::<Ping>(&[InputMessage::user("Say hello")])
        .await;
    assert!(matches!(
        result,
        Err(ClientError::Validation { attempts: 2, .. })
    ));
}

#[tokio::test]
async fn test_openai_null_usage_is_missing_usage() {
    let server = MockServer::start().await;
    mount_cost_table(&server, 0).await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(openai_response(r#"{"message": "hello"}"#, Value::Null)),
        )
        .mount(&server)
        .await;

    let factory = ClientFactory::new(config(&server, 3)).unwrap();
    let client = factory.create_client::<()>(Model::Gpt4oMini, vec![]).unwrap();

    let result = client
        .structured_response::<Ping>(&[InputMessage::user("Say hello")])
        .await;
    assert!(matches!(
        result,
        Err(ClientError::MissingUsage {
            provider: Provider::OpenAI
        })
    ));
}

#[tokio::test]
async fn test_openai_unauthorized() {
    let server = MockServer::start().await;
    mount_cost_table(&server, 0).await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let factory = ClientFactory::new(config(&server, 3)).unwrap();
    let client = factory.create_client::<()>(Model::Gpt4oMini, vec![]).unwrap();

    match client
        .structured_response::<Ping>(&[InputMessage::user("Say hello")])
        .await
    {
        Err(ClientError::Authentication(message)) => {
            assert!(message.contains("Incorrect API key"))
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_anthropic_structured_response() {
    let server = MockServer::start().await;
    mount_cost_table(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-sonnet-4-5",
            "system": "Answer tersely",
            "messages": [{"role": "user", "content": "Say hello"}],
            "tool_choice": {"type": "tool", "name": "Ping"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-5",
            "content": [
                {"type": "tool_use", "id": "toolu_1", "name": "Ping", "input": {"message": "hello"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 100, "output_tokens": 20}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let factory = ClientFactory::new(config(&server, 3)).unwrap();
    let client = factory
        .create_client::<()>(Model::ClaudeSonnet45, vec![])
        .unwrap();
    assert_eq!(client.provider(), Provider::Anthropic);

    let messages = vec![
        InputMessage::system("Answer tersely"),
        InputMessage::user("Say hello"),
    ];
    let (ping, call) = client.structured_response::<Ping>(&messages).await.unwrap();

    assert_eq!(ping, Ping { message: "hello".to_string() });
    assert_eq!(call.input_tokens(), 100);
    assert_eq!(call.output_tokens(), 20);
    assert_eq!(call.input_tokens_cost(), 100.0 * 0.000003);
    assert_eq!(call.output_tokens_cost(), 20.0 * 0.000015);
    // The record keeps the system turn as sent by the caller
    assert_eq!(call.context_messages().len(), 2);
    assert_eq!(call.context_messages()[0].role(), Role::System);
}

fn anthropic_response(input: Value, usage: Option<Value>) -> Value {
    let mut body = json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-5",
        "content": [
            {"type": "tool_use", "id": "toolu_1", "name": "Ping", "input": input}
        ],
        "stop_reason": "tool_use"
    });
    if let Some(usage) = usage {
        body["usage"] = usage;
    }
    body
}

#[tokio::test]
async fn test_anthropic_reask_bills_every_attempt() {
    let server = MockServer::start().await;
    mount_cost_table(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response(
            json!({"reply": "hello"}),
            Some(json!({"input_tokens": 100, "output_tokens": 50})),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response(
            json!({"message": "hello"}),
            Some(json!({"input_tokens": 120, "output_tokens": 10})),
        )))
        .mount(&server)
        .await;

    let factory = ClientFactory::new(config(&server, 3)).unwrap();
    let client = factory
        .create_client::<()>(Model::ClaudeSonnet45, vec![])
        .unwrap();

    let (ping, call) = client
        .structured_response::<Ping>(&[InputMessage::user("Say hello")])
        .await
        .unwrap();

    assert_eq!(ping.message, "hello");
    assert_eq!((call.input_tokens(), call.output_tokens()), (220, 60));
    assert_eq!(call.input_tokens_cost(), 220.0 * 0.000003);
    assert_eq!(call.output_tokens_cost(), 60.0 * 0.000015);
}

#[tokio::test]
async fn test_anthropic_absent_usage_is_missing_usage() {
    let server = MockServer::start().await;
    mount_cost_table(&server, 0).await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(anthropic_response(json!({"message": "hello"}), None)),
        )
        .mount(&server)
        .await;

    let factory = ClientFactory::new(config(&server, 3)).unwrap();
    let client = factory
        .create_client::<()>(Model::ClaudeSonnet45, vec![])
        .unwrap();

    let result = client
        .structured_response::<Ping>(&[InputMessage::user("Say hello")])
        .await;
    assert!(matches!(
        result,
        Err(ClientError::MissingUsage {
            provider: Provider::Anthropic
        })
    ));
}

#[tokio::test]
async fn test_unpriced_model_fails_with_pricing_error() {
    let server = MockServer::start().await;
    mount_cost_table(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_response(
            r#"{"message": "hello"}"#,
            json!({"input_tokens": 1, "output_tokens": 1}),
        )))
        .mount(&server)
        .await;

    let factory = ClientFactory::new(config(&server, 3)).unwrap();
    let client = factory.create_client::<()>(Model::Gpt5Mini, vec![]).unwrap();

    let result = client
        .structured_response::<Ping>(&[InputMessage::user("Say hello")])
        .await;
    assert!(matches!(
        result,
        Err(ClientError::Pricing(yalc_core::PricingError::NotFound { ref model })) if model == "gpt-5-mini"
    ));
}

#[tokio::test]
async fn test_missing_api_key_fails_at_call_time() {
    let server = MockServer::start().await;
    let mut config = config(&server, 3);
    config.providers[0].api_key = None;

    let factory = ClientFactory::new(config).unwrap();
    let client = factory.create_client::<()>(Model::Gpt4oMini, vec![]).unwrap();

    match client
        .structured_response::<Ping>(&[InputMessage::user("Say hello")])
        .await
    {
        Err(ClientError::Authentication(message)) => assert!(message.contains("OPENAI_API_KEY")),
        other => panic!("expected authentication error, got {:?}", other),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}
