//! 输出解码模块：将模型原始输出解析为规范化的工具调用记录。
//!
//! # Output Decoder
//!
//! Turns one raw model completion into canonical [`ToolCallRecord`]s.
//!
//! The pipeline runs in five steps:
//!
//! 1. **Detect** which sentinel dialect (if any) introduces a tool-call block
//! 2. **Segment** the block into fragments (array elements, lines, or spans)
//! 3. **Recover** each fragment as JSON: strict parse, then [`JsonRepair`]
//! 4. **Normalize** every string leaf: stray escapes, wrapper quotes, and
//!    JSON nested inside strings. An array block that parses strictly skips
//!    this step, as does a string `arguments` that is already valid JSON
//! 5. **Canonicalize** into `{id, type: "function", function: {name, arguments}}`
//!    with `arguments` always a JSON-encoded string
//!
//! Decoding never fails. Text without a sentinel is an ordinary chat reply
//! and yields no records; a fragment that cannot be recovered is skipped with
//! a [`DecodeDiagnostic`] while its siblings are still returned.
//!
//! ```rust
//! use toolcall_bridge::decode::{SequentialIds, ToolCallDecoder};
//!
//! let decoder = ToolCallDecoder::builder()
//!     .id_generator(SequentialIds::new())
//!     .build()
//!     .unwrap();
//!
//! let records = decoder.decode(r#"<<functions>>[{"name":"f","arguments":"{\"a\":1}"}]"#);
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].id, "00000000");
//! assert_eq!(records[0].function.arguments, r#"{"a":1}"#);
//!
//! assert!(decoder.decode("Hello, how can I help?").is_empty());
//! ```

pub mod dialect;
pub mod ids;
pub mod recover;
pub mod repair;

pub use dialect::{Detection, Dialect, SentinelSet};
pub use ids::{IdGenerator, RandomHexIds, SequentialIds};
pub use recover::{clean_escapes, normalize_value, recover_json};
pub use repair::{BestEffortRepair, JsonRepair, NoRepair};

use crate::config::DecoderConfig;
use crate::types::{CalledFunction, ToolCallRecord};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const EXCERPT_CHARS: usize = 80;

/// Why part of a tool-call block produced no record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeDiagnostic {
    /// One fragment could not be coerced into `{name, arguments}`.
    #[error("tool-call fragment #{index} skipped: {reason} (fragment: {excerpt:?})")]
    FragmentUnrecoverable {
        index: usize,
        reason: String,
        excerpt: String,
    },

    /// The whole block was unreadable, even after repair.
    #[error("{dialect} tool-call block unrecoverable (block: {excerpt:?})")]
    BlockUnrecoverable { dialect: Dialect, excerpt: String },
}

/// Full result of one decode call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Detected dialect; `None` for a plain chat response
    pub dialect: Option<Dialect>,
    pub records: Vec<ToolCallRecord>,
    pub diagnostics: Vec<DecodeDiagnostic>,
}

impl DecodeOutcome {
    /// True when the text carried a tool-call sentinel, even if nothing parsed.
    pub fn has_tool_block(&self) -> bool {
        self.dialect.is_some()
    }

    pub fn into_records(self) -> Vec<ToolCallRecord> {
        self.records
    }
}

/// One fragment of a tool-call block.
#[derive(Debug)]
enum Fragment {
    /// Element of a block that parsed strictly; passed through untouched
    Verbatim(Value),
    /// Value that went through tolerant recovery, with the line or span it
    /// came from when there is one
    Recovered { value: Value, source: Option<String> },
}

impl Fragment {
    fn recovered(value: Value) -> Self {
        Fragment::Recovered { value, source: None }
    }
}

/// Decoder for sentinel-delimited tool calls.
///
/// Holds no per-call state; one instance can be shared across threads.
pub struct ToolCallDecoder {
    sentinels: SentinelSet,
    name_keys: Vec<String>,
    arguments_keys: Vec<String>,
    repair: Arc<dyn JsonRepair>,
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for ToolCallDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCallDecoder")
            .field("sentinels", &self.sentinels)
            .field("name_keys", &self.name_keys)
            .field("arguments_keys", &self.arguments_keys)
            .finish_non_exhaustive()
    }
}

impl ToolCallDecoder {
    pub fn builder() -> ToolCallDecoderBuilder {
        ToolCallDecoderBuilder::default()
    }

    /// Decoder with default repair and random ids for the given config.
    pub fn from_config(config: &DecoderConfig) -> crate::Result<Self> {
        Self::builder().config(config.clone()).build()
    }

    /// Decode `raw`, discarding diagnostics (they are still logged).
    pub fn decode(&self, raw: &str) -> Vec<ToolCallRecord> {
        self.decode_with_diagnostics(raw).records
    }

    pub fn decode_with_diagnostics(&self, raw: &str) -> DecodeOutcome {
        let Some(detection) = self.sentinels.detect(raw) else {
            debug!("no tool-call sentinel in model output");
            return DecodeOutcome::default();
        };
        let dialect = detection.dialect();
        debug!("detected {} tool-call block", dialect);

        let mut outcome = DecodeOutcome {
            dialect: Some(dialect),
            ..Default::default()
        };

        let fragments = match self.segment(detection) {
            Ok(fragments) => fragments,
            Err(diagnostic) => {
                warn!("{}", diagnostic);
                outcome.diagnostics.push(diagnostic);
                return outcome;
            }
        };

        for (index, fragment) in fragments.into_iter().enumerate() {
            let (value, source) = match fragment {
                Fragment::Verbatim(value) => (value, None),
                Fragment::Recovered { value, source } => (self.normalize_fragment(value), source),
            };

            match self.canonicalize(&value) {
                Ok(function) => outcome
                    .records
                    .push(ToolCallRecord::new(self.ids.next_id(), function)),
                Err(reason) => {
                    let source = source.unwrap_or_else(|| value.to_string());
                    let diagnostic = DecodeDiagnostic::FragmentUnrecoverable {
                        index,
                        reason,
                        excerpt: excerpt(&source),
                    };
                    warn!("{}", diagnostic);
                    outcome.diagnostics.push(diagnostic);
                }
            }
        }

        outcome
    }

    fn segment(&self, detection: Detection<'_>) -> Result<Vec<Fragment>, DecodeDiagnostic> {
        match detection {
            Detection::Leading {
                dialect: Dialect::BracketedArray,
                body,
            } => {
                let body = body.trim();
                if let Ok(value) = serde_json::from_str::<Value>(body) {
                    if let Some(fragments) = split_block(value, Fragment::Verbatim) {
                        return Ok(fragments);
                    }
                }
                split_block(recover_json(body, self.repair.as_ref()), Fragment::recovered).ok_or_else(
                    || DecodeDiagnostic::BlockUnrecoverable {
                        dialect: Dialect::BracketedArray,
                        excerpt: excerpt(body),
                    },
                )
            }
            Detection::Leading { body, .. } => Ok(self.segment_lines(body)),
            Detection::Paired { spans } => Ok(spans
                .into_iter()
                .map(|span| {
                    let span = span.trim();
                    Fragment::Recovered {
                        value: recover_json(span, self.repair.as_ref()),
                        source: Some(span.to_string()),
                    }
                })
                .collect()),
        }
    }

    /// A body of concatenated JSON values is taken whole (this covers
    /// pretty-printed objects spanning lines); otherwise each line that
    /// carries JSON is recovered on its own. Top-level arrays contribute
    /// their elements either way.
    fn segment_lines(&self, body: &str) -> Vec<Fragment> {
        let stream: Result<Vec<Value>, _> = serde_json::Deserializer::from_str(body)
            .into_iter::<Value>()
            .collect();
        if let Ok(values) = stream {
            if !values.is_empty() {
                return values
                    .into_iter()
                    .flat_map(|v| match v {
                        Value::Array(items) => items,
                        other => vec![other],
                    })
                    .map(Fragment::recovered)
                    .collect();
            }
        }

        body.lines()
            .map(|line| self.strip_leading_marker(line.trim()))
            .filter(|line| {
                let carries_json = line.contains('{') || line.contains('[');
                if !carries_json && !line.is_empty() {
                    debug!("ignoring non-JSON line in tool-call block: {:?}", line);
                }
                carries_json
            })
            .flat_map(|line| match recover_json(line, self.repair.as_ref()) {
                Value::Array(items) => items.into_iter().map(Fragment::recovered).collect::<Vec<_>>(),
                value => vec![Fragment::Recovered {
                    value,
                    source: Some(line.to_string()),
                }],
            })
            .collect()
    }

    /// Models sometimes repeat the marker on every line.
    fn strip_leading_marker<'a>(&self, line: &'a str) -> &'a str {
        self.sentinels
            .leading_markers()
            .find_map(|m| line.strip_prefix(m))
            .map(str::trim_start)
            .unwrap_or(line)
    }

    /// Normalize every string leaf, except a string `arguments` that is
    /// already valid JSON: that one is emitted exactly as the model wrote it.
    fn normalize_fragment(&self, value: Value) -> Value {
        let repair = self.repair.as_ref();
        let Value::Object(map) = value else {
            return normalize_value(value, repair);
        };
        Value::Object(
            map.into_iter()
                .map(|(key, v)| {
                    let verbatim = self.arguments_keys.contains(&key)
                        && matches!(&v, Value::String(s) if serde_json::from_str::<Value>(s).is_ok());
                    if verbatim {
                        (key, v)
                    } else {
                        (key, normalize_value(v, repair))
                    }
                })
                .collect(),
        )
    }

    fn canonicalize(&self, value: &Value) -> Result<CalledFunction, String> {
        let map = match value {
            Value::Object(map) => map,
            Value::String(_) => return Err("fragment could not be parsed as JSON".to_string()),
            _ => return Err("fragment is not a JSON object".to_string()),
        };

        let name = self
            .name_keys
            .iter()
            .find_map(|k| map.get(k))
            .ok_or_else(|| "missing function name".to_string())?;
        let name = match name.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err("function name is not a non-empty string".to_string()),
        };

        let arguments = self
            .arguments_keys
            .iter()
            .find_map(|k| map.get(k))
            .ok_or_else(|| format!("missing arguments for function '{}'", name))?;
        let arguments = match arguments {
            Value::String(s) => s.clone(),
            structured => serde_json::to_string(structured)
                .map_err(|e| format!("arguments could not be encoded: {}", e))?,
        };

        Ok(CalledFunction { name, arguments })
    }
}

/// Builder for [`ToolCallDecoder`]
#[derive(Default)]
pub struct ToolCallDecoderBuilder {
    config: Option<DecoderConfig>,
    repair: Option<Arc<dyn JsonRepair>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl ToolCallDecoderBuilder {
    pub fn config(mut self, config: DecoderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the default [`BestEffortRepair`] strategy.
    pub fn repair(mut self, repair: impl JsonRepair + 'static) -> Self {
        self.repair = Some(Arc::new(repair));
        self
    }

    /// Replace the default [`RandomHexIds`] generator.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    pub fn shared_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn build(self) -> crate::Result<ToolCallDecoder> {
        let config = self.config.unwrap_or_default();
        let sentinels = SentinelSet::from_config(&config)?;
        Ok(ToolCallDecoder {
            sentinels,
            repair: self.repair.unwrap_or_else(|| Arc::new(BestEffortRepair)),
            ids: self
                .ids
                .unwrap_or_else(|| Arc::new(RandomHexIds::new(config.id_length))),
            name_keys: config.name_keys,
            arguments_keys: config.arguments_keys,
        })
    }
}

/// Array blocks yield their elements, a lone object yields itself.
fn split_block(value: Value, wrap: fn(Value) -> Fragment) -> Option<Vec<Fragment>> {
    match value {
        Value::Array(items) => Some(items.into_iter().map(wrap).collect()),
        obj @ Value::Object(_) => Some(vec![wrap(obj)]),
        _ => None,
    }
}

fn excerpt(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
