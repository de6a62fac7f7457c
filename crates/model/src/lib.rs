use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub mod api_error;
pub mod env;
pub mod record;

pub use api_error::ApiError;
pub use record::Record;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Standard response of the HTTP handlers.
/// Sent to the caller as the JSON body of the proxy integration response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
}

/// The request that was handled alongside the response to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub request: Value,
    // Always an object, bare values are wrapped under `message`
    pub response: Map<String, Value>,
}

impl ResponseBody {
    pub fn new(request: Value, response: Value) -> Self {
        let response: Map<String, Value> = match response {
            Value::Object(map) => map,
            other => {
                let mut wrapped: Map<String, Value> = Map::new();
                wrapped.insert("message".to_string(), other);
                wrapped
            }
        };

        ResponseBody { request, response }
    }

    /// The `message` field of the response, if there is one.
    pub fn message(&self) -> Option<&str> {
        self.response.get("message").and_then(Value::as_str)
    }
}
