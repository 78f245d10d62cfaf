//! 类型系统模块：定义消息、工具模式与规范化工具调用记录。
//!
//! # Types Module
//!
//! Core data types on both sides of the bridge: the OpenAI-style messages
//! and tool schemas the caller supplies, and the canonical tool-call records
//! the decoder hands back.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role, content and optional tool calls |
//! | [`MessageRole`] | system, user, assistant, tool, function, observation |
//! | [`ToolCallRequest`] | Tool call issued by the assistant in an earlier turn |
//! | [`ToolSchema`] | Function definition rendered into the prompt |
//! | [`ToolCallRecord`] | Canonical decoded tool call |
//!
//! ## Example
//!
//! ```rust
//! use toolcall_bridge::types::{Message, ToolCallRequest, ToolSchema};
//!
//! let history = vec![
//!     Message::user("What's the weather in Paris?"),
//!     Message::assistant_tool_calls(vec![ToolCallRequest::new(
//!         "call_0",
//!         "get_weather",
//!         serde_json::json!("{\"city\":\"Paris\"}"),
//!     )]),
//!     Message::tool("call_0", "18C and sunny"),
//! ];
//!
//! let tool = ToolSchema::new("get_weather")
//!     .with_description("Get current weather for a city")
//!     .with_parameters(serde_json::json!({
//!         "type": "object",
//!         "properties": {"city": {"type": "string"}},
//!         "required": ["city"]
//!     }));
//! # let _ = (history, tool);
//! ```

pub mod message;
pub mod tool;

pub use message::{FunctionCallRequest, Message, MessageRole, ToolCallRequest};
pub use tool::{CalledFunction, ToolCallRecord, ToolCallType, ToolDefinition, ToolSchema};
