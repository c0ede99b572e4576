//! yalc-check - ping every registered model
//!
//! Sends one tiny structured request to each model concurrently and reports
//! which ones answer. Keys come from `OPENAI_API_KEY` and `ANTHROPIC_API_KEY`,
//! the cost table from `YALC_PRICING_URL` when set.

use futures::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::process::ExitCode;
use yalc_core::{ClientError, ClientFactory, InputMessage, Model, PricingError, ResponseModel};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct Ping {
    message: String,
}

impl ResponseModel for Ping {
    fn name() -> &'static str {
        "Ping"
    }
}

const PROMPT: &str = "Reply with the word 'pong' and nothing else.";

/// Outcome line for one model
struct Check {
    model: Model,
    ok: bool,
    detail: String,
}

async fn check_model(factory: &ClientFactory, model: Model) -> Check {
    let outcome = async {
        let client = factory.create_client::<()>(model, vec![])?;
        client
            .structured_response::<Ping>(&[InputMessage::user(PROMPT)])
            .await
    }
    .await;

    match outcome {
        Ok((ping, call)) => Check {
            model,
            ok: true,
            detail: format!(
                "'{}' ({}in/{}out, ${:.6})",
                ping.message,
                call.input_tokens(),
                call.output_tokens(),
                call.total_cost()
            ),
        },
        Err(e) => Check {
            model,
            ok: false,
            detail: condense_error(&e),
        },
    }
}

fn condense_error(err: &ClientError) -> String {
    match err {
        ClientError::Authentication(message) if message.starts_with("missing ") => {
            message.clone()
        }
        ClientError::Authentication(_) => "API key rejected".to_string(),
        ClientError::UnsupportedProvider { provider, .. } => {
            format!("not in provider map ({})", provider)
        }
        ClientError::ModelNotAvailable(message) => {
            format!("model not found: {}", truncate(message, 80))
        }
        ClientError::Pricing(PricingError::NotFound { model }) => {
            format!("no price for {} in cost table", model)
        }
        other => {
            let text = other.to_string();
            truncate(text.lines().next().unwrap_or_default(), 120).to_string()
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let factory = ClientFactory::from_env()?;
    let models = Model::ALL;
    println!("\nChecking {} models...\n", models.len());

    let checks = join_all(models.iter().map(|model| check_model(&factory, *model))).await;

    for check in &checks {
        let status = if check.ok { "ok  " } else { "FAIL" };
        println!("  {}  {:<24} {}", status, check.model.as_str(), check.detail);
    }

    let passed = checks.iter().filter(|check| check.ok).count();
    println!("\n{}/{} models OK\n", passed, checks.len());

    Ok(if passed == checks.len() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
