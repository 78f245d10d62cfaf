//! 提示编码模块：渲染工具声明并改写对话历史。
//!
//! # Prompt Encoder
//!
//! Prepares a request for a model that speaks the sentinel dialect:
//!
//! - [`render_tool_block`] turns tool schemas into interface-style
//!   declarations wrapped in the instruction template
//! - [`rewrite_history`] replays earlier tool calls and their results using
//!   the `function` / `observation` roles
//!
//! ```rust
//! use serde_json::json;
//! use toolcall_bridge::encode::preprocess_input;
//! use toolcall_bridge::types::{Message, ToolCallRequest, ToolSchema};
//!
//! let tools = vec![ToolSchema::new("ping")];
//! let history = vec![
//!     Message::user("Is the host up?"),
//!     Message::assistant_tool_calls(vec![ToolCallRequest::new("c1", "ping", json!("{}"))]),
//!     Message::tool("c1", "pong"),
//! ];
//!
//! let rewritten = preprocess_input(&history, &tools);
//! assert_eq!(rewritten.len(), 4);
//! assert_eq!(rewritten[2].content, r#"<functions>{"name": "ping", "arguments": "{}"}"#);
//! assert_eq!(rewritten[3].content, r#"<<observation>>["pong"]"#);
//! ```

pub mod history;
pub mod json_style;
pub mod schema;

pub use history::{preprocess_input, rewrite_history, HistoryRewriter, PendingCallMap, Resolution};
pub use json_style::{to_spaced_string, SpacedFormatter};
pub use schema::{render_declaration, render_tool_block, render_tool_block_with};
