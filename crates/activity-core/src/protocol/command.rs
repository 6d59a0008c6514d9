//! Direct-channel command envelope (JSON).
//!
//! Every message exchanged over a live channel carries the protocol sentinel
//! so unrelated traffic on the same transport can be told apart.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker present on every command envelope. Shared by both protocol ends.
pub const SENTINEL: &str = "__ACTIVITIES__";

/// Command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// caller -> host: initiates the handshake, payload is the args object.
    Start,
    /// host -> caller: handshake acknowledgement.
    Connect,
    /// host -> caller: dialog UI is ready to be shown.
    Ready,
    /// host -> caller: terminal outcome `{code, data}`.
    Result,
    /// caller -> host: result received, host may tear down.
    Close,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Start => "start",
            CommandKind::Connect => "connect",
            CommandKind::Ready => "ready",
            CommandKind::Result => "result",
            CommandKind::Close => "close",
        }
    }
}

/// Command envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Protocol sentinel, always [`SENTINEL`] for accepted messages.
    pub sentinel: String,
    /// Command name (field name is `cmd` in JSON).
    pub cmd: CommandKind,
    /// Optional payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Command {
    pub fn new(cmd: CommandKind, payload: Option<Value>) -> Self {
        Self {
            sentinel: SENTINEL.to_string(),
            cmd,
            payload,
        }
    }

    /// Interpret a raw transport message as a command.
    ///
    /// Returns `None` for anything that is not an object carrying the
    /// sentinel and a known `cmd`; such traffic is expected noise.
    pub fn from_message(data: &Value) -> Option<Self> {
        let obj = data.as_object()?;
        if obj.get("sentinel").and_then(Value::as_str) != Some(SENTINEL) {
            return None;
        }
        serde_json::from_value(data.clone()).ok()
    }

    /// Structured message handed to the raw transport.
    pub fn to_message(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("sentinel".into(), Value::String(self.sentinel.clone()));
        obj.insert("cmd".into(), Value::String(self.cmd.as_str().into()));
        if let Some(payload) = &self.payload {
            obj.insert("payload".into(), payload.clone());
        }
        Value::Object(obj)
    }
}
