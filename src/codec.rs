//! Decoder and rewriter built together from one [`CodecConfig`].

use crate::config::CodecConfig;
use crate::decode::{DecodeOutcome, IdGenerator, ToolCallDecoder};
use crate::encode::HistoryRewriter;
use crate::types::{Message, ToolCallRecord, ToolSchema};
use std::sync::Arc;

/// Both directions of the tool-call bridge.
#[derive(Debug)]
pub struct ToolCallCodec {
    decoder: ToolCallDecoder,
    rewriter: HistoryRewriter,
}

impl ToolCallCodec {
    /// Validate `config` and build both halves from it.
    pub fn from_config(config: &CodecConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            decoder: ToolCallDecoder::from_config(&config.decoder)?,
            rewriter: HistoryRewriter::new(config.encoder.clone()),
        })
    }

    /// Build from the file named by `TOOLCALL_BRIDGE_CONFIG`, or defaults.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_config(&CodecConfig::from_env()?)
    }

    /// Same as [`ToolCallCodec::from_config`] with a caller-supplied id source.
    pub fn with_id_generator(config: &CodecConfig, ids: Arc<dyn IdGenerator>) -> crate::Result<Self> {
        config.validate()?;
        let decoder = ToolCallDecoder::builder()
            .config(config.decoder.clone())
            .shared_id_generator(ids)
            .build()?;
        Ok(Self {
            decoder,
            rewriter: HistoryRewriter::new(config.encoder.clone()),
        })
    }

    pub fn decoder(&self) -> &ToolCallDecoder {
        &self.decoder
    }

    pub fn rewriter(&self) -> &HistoryRewriter {
        &self.rewriter
    }

    pub fn decode(&self, raw: &str) -> Vec<ToolCallRecord> {
        self.decoder.decode(raw)
    }

    pub fn decode_with_diagnostics(&self, raw: &str) -> DecodeOutcome {
        self.decoder.decode_with_diagnostics(raw)
    }

    pub fn render_tool_block(&self, tools: &[ToolSchema]) -> String {
        self.rewriter.render_tool_block(tools)
    }

    pub fn rewrite_history(&self, messages: &[Message], tool_block: &str) -> Vec<Message> {
        self.rewriter.rewrite_history(messages, tool_block)
    }

    pub fn preprocess_input(&self, messages: &[Message], tools: &[ToolSchema]) -> Vec<Message> {
        self.rewriter.preprocess_input(messages, tools)
    }
}
