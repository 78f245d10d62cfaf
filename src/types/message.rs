//! Chat message format shared by the caller and the rewritten history

use serde::{Deserialize, Deserializer, Serialize};

/// Chat message in OpenAI shape, extended with the `function` and
/// `observation` roles the target dialect uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }

    /// Assistant turn that issues tool calls instead of text.
    pub fn assistant_tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls: Some(calls),
            ..Self::new(MessageRole::Assistant, "")
        }
    }

    /// Result of a previously issued tool call.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(MessageRole::Tool, content)
        }
    }

    pub fn function(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Function, text)
    }

    pub fn observation(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Observation, text)
    }

    /// True when this is an assistant turn carrying at least one tool call.
    pub fn has_tool_calls(&self) -> bool {
        matches!(self.role, MessageRole::Assistant)
            && self.tool_calls.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
    Function,
    Observation,
}

/// Tool call issued by the assistant in an earlier turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    pub function: FunctionCallRequest,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            call_type: Some("function".to_string()),
            function: FunctionCallRequest {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// `arguments` is kept as whatever the caller supplied: a JSON-encoded
/// string (OpenAI) or an already structured object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roles_are_lowercase_on_the_wire() {
        let msg = Message::observation("<<observation>>[]");
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v, json!({"role": "observation", "content": "<<observation>>[]"}));
    }

    #[test]
    fn test_null_content_and_tool_calls() {
        let msg: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "lookup", "arguments": "{\"q\":\"rust\"}"}
            }]
        }))
        .unwrap();

        assert_eq!(msg.content, "");
        assert!(msg.has_tool_calls());
        let call = &msg.tool_calls.as_ref().unwrap()[0];
        assert_eq!(call.function.arguments, json!("{\"q\":\"rust\"}"));
    }

    #[test]
    fn test_object_arguments_are_accepted() {
        let call: ToolCallRequest = serde_json::from_value(json!({
            "id": "7",
            "function": {"name": "add", "arguments": {"a": 1, "b": 2}}
        }))
        .unwrap();
        assert_eq!(call.call_type, None);
        assert_eq!(call.function.arguments["b"], 2);
    }

    #[test]
    fn test_empty_tool_call_list_is_not_a_tool_turn() {
        let msg = Message::assistant_tool_calls(Vec::new());
        assert!(!msg.has_tool_calls());
    }
}
