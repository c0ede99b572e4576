//! Structured output
//!
//! A caller describes the shape it wants by implementing [`ResponseModel`]
//! for a serde type. Providers are asked to call a single tool whose
//! parameters are that schema; the tool arguments are then deserialized into
//! the caller's type. When deserialization fails the model is shown its
//! output and the error and asked again, up to a retry budget.

use crate::models::Provider;
use crate::protocol::InputMessage;
use crate::providers::{ClientError, ClientResult};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

/// Default number of re-asks after a failed validation
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A type a model can be asked to produce
///
/// The tool parameters are derived from the type's [`JsonSchema`], so the
/// schema the model sees and the serde shape it is validated against cannot
/// drift apart. Field doc comments become property descriptions.
///
/// ```
/// use schemars::JsonSchema;
/// use serde::{Deserialize, Serialize};
/// use yalc_core::ResponseModel;
///
/// #[derive(Debug, Serialize, Deserialize, JsonSchema)]
/// struct Ping {
///     /// What the model says back
///     message: String,
/// }
///
/// impl ResponseModel for Ping {
///     fn name() -> &'static str {
///         "Ping"
///     }
/// }
///
/// let schema = <Ping as ResponseModel>::json_schema();
/// assert_eq!(schema["properties"]["message"]["type"], "string");
/// ```
pub trait ResponseModel:
    Serialize + DeserializeOwned + JsonSchema + Send + Sync + 'static
{
    /// Tool name; letters, digits, `_` and `-` only
    fn name() -> &'static str;

    /// JSON schema of the tool parameters
    fn json_schema() -> Value {
        let mut schema = schemars::schema_for!(Self).to_value();
        if let Value::Object(map) = &mut schema {
            map.remove("$schema");
        }
        schema
    }

    /// Tool description shown to the model
    fn description() -> String {
        format!("Correctly extracted `{}` with all the required parameters with correct types", Self::name())
    }
}

/// Tool definition derived from a [`ResponseModel`]
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSpec {
    pub fn of<T: ResponseModel>() -> Self {
        Self {
            name: T::name().to_string(),
            description: T::description(),
            parameters: <T as ResponseModel>::json_schema(),
        }
    }
}

/// What one provider round trip produced
#[derive(Debug)]
pub struct Attempt<R> {
    /// The provider's response
    pub raw: R,
    /// Arguments of the schema tool call, if the model made one
    pub arguments: Option<Value>,
}

/// Run `attempt` until its tool arguments deserialize into `T`.
///
/// The first attempt receives `messages` unchanged. After a failure the
/// offending output and the validation error are appended as an assistant
/// turn and a user turn. Transport errors from `attempt` end the loop
/// immediately; validation failures exhaust `max_retries` re-asks and then
/// fail with [`ClientError::Validation`].
///
/// On success the raw responses of every attempt are returned in order,
/// rejected ones included, since each of them was billed.
pub async fn extract_with_reasks<T, R, F, Fut>(
    provider: Provider,
    messages: &[InputMessage],
    max_retries: u32,
    mut attempt: F,
) -> ClientResult<(T, Vec<R>)>
where
    T: ResponseModel,
    F: FnMut(Vec<InputMessage>) -> Fut,
    Fut: Future<Output = ClientResult<Attempt<R>>>,
{
    let attempts = u64::from(max_retries) + 1;
    let mut conversation = messages.to_vec();
    let mut responses = Vec::new();
    let mut last_error = String::new();

    for n in 1..=attempts {
        let Attempt { raw, arguments } = attempt(conversation.clone()).await?;
        responses.push(raw);

        let (rejected, message) = match arguments {
            None => (
                String::new(),
                format!("no call to the '{}' tool in the response", T::name()),
            ),
            Some(arguments) => match serde_json::from_value::<T>(arguments.clone()) {
                Ok(parsed) => {
                    debug!("{} response validated on attempt {}", provider, n);
                    return Ok((parsed, responses));
                }
                Err(e) => (arguments.to_string(), e.to_string()),
            },
        };

        warn!(
            "{} response failed validation on attempt {}/{}: {}",
            provider, n, attempts, message
        );

        if !rejected.is_empty() {
            conversation.push(InputMessage::assistant(rejected));
        }
        conversation.push(InputMessage::user(format!(
            "Call the `{}` tool again and fix the errors: {}",
            T::name(),
            message
        )));
        last_error = message;
    }

    Err(ClientError::Validation {
        attempts,
        message: last_error,
    })
}
