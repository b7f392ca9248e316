//! JSON envelopes exchanged between the router and the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use relayhub_core::types::Identity;

/// Controller → device command, as sent by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerCommand {
    /// Device the command is addressed to.
    pub target: Identity,
    /// Command text, published to the target verbatim.
    pub message: String,
}

impl ControllerCommand {
    /// Pulls `target` and `message` out of a parsed frame.
    ///
    /// Returns `None` unless the frame is an object with a non-empty string
    /// `target` and a non-empty `message`. A numeric `message` is published
    /// as its decimal text, except zero. Other fields are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let target = value
            .get("target")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())?;

        Some(Self {
            target: Identity::from(target),
            message: message_text(value.get("message")?)?,
        })
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Device → controller event, built by the router around the device's raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    /// Device that sent the message.
    pub sender: Identity,
    /// Raw frame text.
    pub message: String,
}
