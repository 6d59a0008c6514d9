//! Activity request / result model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request handed to a dialog by its opener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    /// Correlates the request with its eventual result.
    pub request_id: String,
    /// Absolute URL the navigation channel returns to.
    pub return_url: String,
    /// Opaque application arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Map<String, Value>>,
}

impl ActivityRequest {
    pub fn new(request_id: impl Into<String>, return_url: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            return_url: return_url.into(),
            args: None,
        }
    }

    pub fn with_args(mut self, args: Map<String, Value>) -> Self {
        self.args = Some(args);
        self
    }
}

/// Terminal outcome code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultCode {
    Ok,
    Canceled,
    Failed,
}

impl ResultCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultCode::Ok => "ok",
            ResultCode::Canceled => "canceled",
            ResultCode::Failed => "failed",
        }
    }
}

/// Outcome sent back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResult {
    pub code: ResultCode,
    pub data: Value,
}

impl ActivityResult {
    pub fn ok(data: Value) -> Self {
        Self {
            code: ResultCode::Ok,
            data,
        }
    }

    /// Canceled results never carry data.
    pub fn canceled() -> Self {
        Self {
            code: ResultCode::Canceled,
            data: Value::Null,
        }
    }

    /// The failure cause travels as its display string.
    pub fn failed(error: &dyn fmt::Display) -> Self {
        Self {
            code: ResultCode::Failed,
            data: Value::String(error.to_string()),
        }
    }

    /// Payload of the `result` command.
    pub fn to_payload(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("code".into(), Value::String(self.code.as_str().into()));
        obj.insert("data".into(), self.data.clone());
        Value::Object(obj)
    }
}
