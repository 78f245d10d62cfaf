//! Tool schema and canonical tool-call record definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name given to a schema that arrives without one.
pub const UNNAMED_FUNCTION: &str = "unnamed_function";

/// Tool definition in the OpenAI request wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String, // "function"
    pub function: ToolSchema,
}

impl ToolDefinition {
    pub fn function(schema: ToolSchema) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: schema,
        }
    }
}

/// A single callable function as described to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema object, or a list of `{name, ...}` parameter entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Permissive conversion from caller JSON.
    ///
    /// Accepts both `{"type": "function", "function": {...}}` and a bare
    /// `{name, description, parameters}` object. Missing or mistyped fields
    /// fall back to defaults instead of failing.
    pub fn from_value(value: &Value) -> Self {
        let inner = match value.get("function") {
            Some(f @ Value::Object(_)) => f,
            _ => value,
        };

        let name = match inner.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => {
                tracing::debug!("tool schema without a name, using {}", UNNAMED_FUNCTION);
                UNNAMED_FUNCTION.to_string()
            }
        };

        Self {
            name,
            description: inner
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            parameters: inner
                .get("parameters")
                .filter(|p| p.is_object() || p.is_array())
                .cloned(),
        }
    }
}

impl From<ToolDefinition> for ToolSchema {
    fn from(def: ToolDefinition) -> Self {
        def.function
    }
}

/// Tool call type tag; always `"function"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallType {
    Function,
}

/// Function half of a decoded record.
///
/// `arguments` is always a JSON-encoded string, never a raw object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalledFunction {
    pub name: String,
    pub arguments: String,
}

impl CalledFunction {
    /// Parse `arguments` back into a JSON value.
    pub fn arguments_value(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.arguments)
    }
}

/// Canonical record produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub tp: ToolCallType,
    pub function: CalledFunction,
}

impl ToolCallRecord {
    pub fn new(id: impl Into<String>, function: CalledFunction) -> Self {
        Self {
            id: id.into(),
            tp: ToolCallType::Function,
            function,
        }
    }
}
