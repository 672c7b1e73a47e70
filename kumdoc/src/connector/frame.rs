//! Wire frames and actor command responses

use super::error::ConnectorError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One message on the channel
///
/// Frames travel as JSON objects tagged by `type`, e.g.
/// `{"type":"reply","id":7,"values":["",42]}`. Blocking requests carry a
/// sequence `id` that the matching reply echoes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Runtime asks the IDE to display text
    Output { text: String },
    /// Runtime asks the IDE for one value sequence matching `format`
    Input { id: u64, format: String },
    /// Runtime reports an error at a source line
    Error { message: String, line: i32 },
    /// IDE asks the runtime to reinitialize one actor
    ResetActor { plugin: String },
    /// IDE asks the runtime to evaluate an actor command
    ActorCommand {
        id: u64,
        actor: String,
        command: String,
        #[serde(default)]
        arguments: Vec<Value>,
    },
    /// Answer to the `Input` or `ActorCommand` with the same `id`
    Reply {
        id: u64,
        #[serde(default)]
        values: Vec<Value>,
    },
}

impl Frame {
    /// Serialize for the wire
    pub fn encode(&self) -> Result<String, ConnectorError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a frame received from the wire
    pub fn decode(text: &str) -> Result<Self, ConnectorError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Outcome of an actor command: `[errorText, result?, extraResults...]`
#[derive(Debug, Clone, PartialEq)]
pub struct ActorResponse {
    /// Failure message; empty on success
    pub error: String,
    /// Primary result
    pub result: Option<Value>,
    /// Additional results (output arguments)
    pub extra: Vec<Value>,
}

impl ActorResponse {
    /// Interpret a raw response sequence
    ///
    /// Panics on an empty sequence: every response carries its error slot, so
    /// an empty one means the peer is broken.
    pub fn from_values(values: Vec<Value>) -> Self {
        assert!(
            !values.is_empty(),
            "actor command response must start with an error text"
        );
        let mut values = values.into_iter();
        let error = match values.next() {
            Some(Value::String(text)) => text,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let result = values.next();
        Self {
            error,
            result,
            extra: values.collect(),
        }
    }

    pub fn success(result: Option<Value>, extra: Vec<Value>) -> Self {
        Self {
            error: String::new(),
            result,
            extra,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            result: None,
            extra: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }

    /// Split into the result or the failure message
    pub fn into_result(self) -> Result<Option<Value>, String> {
        if self.is_success() {
            Ok(self.result)
        } else {
            Err(self.error)
        }
    }

    /// Wire representation; a missing result becomes `null` when extras follow
    pub fn into_values(self) -> Vec<Value> {
        let mut values = vec![Value::String(self.error)];
        match self.result {
            Some(result) => values.push(result),
            None if !self.extra.is_empty() => values.push(Value::Null),
            None => {}
        }
        values.extend(self.extra);
        values
    }
}
