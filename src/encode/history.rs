//! OpenAI-style history -> sentinel-dialect history.

use super::json_style::to_spaced_string;
use super::schema::render_tool_block_with;
use crate::config::EncoderConfig;
use crate::types::{Message, MessageRole, ToolSchema};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{debug, warn};

static DEFAULT_REWRITER: Lazy<HistoryRewriter> = Lazy::new(HistoryRewriter::default);

/// Outcome of [`PendingCallMap::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// First result for a registered id.
    Filled,
    /// The id already had a result; the new one was ignored.
    Duplicate,
    /// The id was never registered (or was already flushed).
    Orphan,
}

/// Call ids awaiting results, in the order the calls were issued.
#[derive(Debug, Clone, Default)]
pub struct PendingCallMap {
    results: IndexMap<String, Option<String>>,
}

impl PendingCallMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering an id that is already pending keeps its original slot.
    pub fn register(&mut self, id: impl Into<String>) {
        self.results.entry(id.into()).or_insert(None);
    }

    pub fn resolve(&mut self, id: &str, content: impl Into<String>) -> Resolution {
        match self.results.get_mut(id) {
            Some(slot) if slot.is_none() => {
                *slot = Some(content.into());
                Resolution::Filled
            }
            Some(_) => Resolution::Duplicate,
            None => Resolution::Orphan,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Take all results in call order, leaving the map empty.
    /// Unanswered ids yield an empty string.
    pub fn drain(&mut self) -> Vec<String> {
        self.results
            .drain(..)
            .map(|(id, result)| {
                result.unwrap_or_else(|| {
                    warn!("tool call '{}' has no result before the next turn, using empty result", id);
                    String::new()
                })
            })
            .collect()
    }
}

/// Rewrites chat histories into the role/sentinel layout the target model
/// expects: tool declarations in the system prompt, call batches as
/// `function` turns, and their results as `observation` turns.
#[derive(Debug, Clone, Default)]
pub struct HistoryRewriter {
    config: EncoderConfig,
}

impl HistoryRewriter {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Render `tools` into this rewriter's instruction template.
    pub fn render_tool_block(&self, tools: &[ToolSchema]) -> String {
        render_tool_block_with(tools, &self.config.tool_prompt_template)
    }

    /// Render `tools` and rewrite `messages` around the resulting block.
    pub fn preprocess_input(&self, messages: &[Message], tools: &[ToolSchema]) -> Vec<Message> {
        let tool_block = if tools.is_empty() {
            String::new()
        } else {
            self.render_tool_block(tools)
        };
        self.rewrite_history(messages, &tool_block)
    }

    /// Single forward pass over `messages`.
    ///
    /// Output messages carry only `role` and `content`. Tool results are
    /// buffered until the next non-`tool` message (or the end of the
    /// history) and emitted as one `observation` turn in call order.
    pub fn rewrite_history(&self, messages: &[Message], tool_block: &str) -> Vec<Message> {
        let Some((first, rest)) = messages.split_first() else {
            return Vec::new();
        };

        let mut out = Vec::with_capacity(messages.len() + 2);
        let mut pending = PendingCallMap::new();

        let first_is_system = first.role == MessageRole::System;
        if tool_block.is_empty() {
            debug!("empty tool block, system prompt left unchanged");
            self.push_turn(first, &mut pending, &mut out);
        } else if first_is_system {
            out.push(Message::system(format!("{}\n{}", first.content, tool_block)));
        } else {
            out.push(Message::system(format!(
                "{}\n{}",
                self.config.default_system_prompt, tool_block
            )));
            self.push_turn(first, &mut pending, &mut out);
        }

        for message in rest {
            self.push_turn(message, &mut pending, &mut out);
        }
        if !pending.is_empty() {
            out.push(self.observation(&mut pending));
        }
        out
    }

    fn push_turn(&self, message: &Message, pending: &mut PendingCallMap, out: &mut Vec<Message>) {
        if message.role == MessageRole::Tool {
            self.record_result(message, pending);
            return;
        }
        if !pending.is_empty() {
            out.push(self.observation(pending));
        }

        match message.tool_calls.as_deref() {
            Some(calls) if message.role == MessageRole::Assistant && !calls.is_empty() => {
                if !message.content.is_empty() {
                    debug!("dropping assistant text that accompanies {} tool calls", calls.len());
                }
                let lines: Vec<String> = calls
                    .iter()
                    .map(|call| {
                        pending.register(call.id.as_str());
                        self.spaced(&call.function)
                    })
                    .collect();
                out.push(Message::function(format!(
                    "{}{}",
                    self.config.call_sentinel,
                    lines.join("\n")
                )));
            }
            _ => out.push(Message::new(message.role, message.content.clone())),
        }
    }

    fn record_result(&self, message: &Message, pending: &mut PendingCallMap) {
        let Some(id) = message.tool_call_id.as_deref() else {
            warn!("tool result without tool_call_id dropped");
            return;
        };
        match pending.resolve(id, message.content.as_str()) {
            Resolution::Filled => {}
            Resolution::Duplicate => {
                warn!("duplicate result for tool call '{}' ignored", id)
            }
            Resolution::Orphan => {
                warn!("tool call id not found among pending calls: '{}', result dropped", id)
            }
        }
    }

    fn observation(&self, pending: &mut PendingCallMap) -> Message {
        let results = pending.drain();
        Message::observation(format!(
            "{}{}",
            self.config.observation_sentinel,
            self.spaced(&results)
        ))
    }

    fn spaced<T: ?Sized + Serialize>(&self, value: &T) -> String {
        to_spaced_string(value, self.config.ensure_ascii).unwrap_or_else(|e| {
            warn!("failed to serialize history entry: {}", e);
            String::new()
        })
    }
}

/// [`HistoryRewriter::rewrite_history`] with the default configuration.
pub fn rewrite_history(messages: &[Message], tool_block: &str) -> Vec<Message> {
    DEFAULT_REWRITER.rewrite_history(messages, tool_block)
}

/// [`HistoryRewriter::preprocess_input`] with the default configuration.
pub fn preprocess_input(messages: &[Message], tools: &[ToolSchema]) -> Vec<Message> {
    DEFAULT_REWRITER.preprocess_input(messages, tools)
}
