//! # toolcall-bridge
//!
//! 工具调用桥接：在 OpenAI 风格的工具调用与哨兵标记文本之间双向转换。
//!
//! Adapter between OpenAI-style tool calling and models trained to emit
//! tool calls as sentinel-delimited JSON in plain text.
//!
//! ## Overview
//!
//! Such models are told about tools through their system prompt and answer
//! with text like `<functions>{"name": "f", "arguments": {...}}`. This crate
//! converts in both directions:
//!
//! - **Output decoding**: raw completion text to canonical
//!   `{id, type: "function", function: {name, arguments}}` records, tolerant
//!   of the malformed JSON models actually produce
//! - **Prompt encoding**: tool schemas to interface-style declarations, and
//!   chat histories with `tool_calls` / `tool` turns to the `function` /
//!   `observation` turns the model was trained on
//!
//! Neither direction fails on malformed data; problems degrade to partial
//! results plus diagnostics logged through `tracing`.
//!
//! ## Quick Start
//!
//! ```rust
//! use toolcall_bridge::{decode, Message, ToolSchema};
//! use toolcall_bridge::encode::preprocess_input;
//!
//! let tools = vec![ToolSchema::new("get_time").with_description("Current time")];
//! let prompt = preprocess_input(&[Message::user("What time is it?")], &tools);
//! assert_eq!(prompt[0].role, toolcall_bridge::MessageRole::System);
//!
//! let records = decode("<functions>{\"name\": \"get_time\", \"arguments\": {}}");
//! assert_eq!(records[0].function.name, "get_time");
//! assert_eq!(records[0].function.arguments, "{}");
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`decode`] | Sentinel detection, JSON recovery and canonical records |
//! | [`encode`] | Tool declaration rendering and history rewriting |
//! | [`config`] | Sentinels, key aliases and prompt templates (YAML/JSON) |
//! | [`types`] | Messages, tool schemas and tool-call records |
//! | [`codec`] | Decoder and rewriter built from one configuration |

pub mod codec;
pub mod config;
pub mod decode;
pub mod encode;
pub mod types;

// Re-export main types for convenience
pub use codec::ToolCallCodec;
pub use config::{CodecConfig, DecoderConfig, EncoderConfig, PairedSentinel};
pub use decode::{DecodeDiagnostic, DecodeOutcome, Dialect, ToolCallDecoder};
pub use encode::{render_tool_block, rewrite_history, HistoryRewriter};
pub use types::{
    message::{Message, MessageRole},
    tool::{ToolCallRecord, ToolSchema},
};

use once_cell::sync::Lazy;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};

static DEFAULT_DECODER: Lazy<Option<ToolCallDecoder>> = Lazy::new(|| {
    ToolCallDecoder::from_config(&DecoderConfig::default())
        .map_err(|e| tracing::warn!("default decoder unavailable: {}", e))
        .ok()
});

/// Decode `raw` with the default sentinels, repair strategy and random ids.
pub fn decode(raw: &str) -> Vec<ToolCallRecord> {
    DEFAULT_DECODER
        .as_ref()
        .map(|decoder| decoder.decode(raw))
        .unwrap_or_default()
}
