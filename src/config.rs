//! Codec configuration: sentinel dialects, key aliases and prompt templates.
//!
//! Every field has a default matching the dialect the target models were
//! trained on, so an empty YAML document is a valid configuration.
//!
//! ```yaml
//! decoder:
//!   array_sentinels: ["<<functions>>"]
//!   line_sentinels: ["<functions>", "functions>"]
//!   paired_sentinels:
//!     - { start: "starttoolcall", end: "endtoolcall" }
//!   id_length: 8
//! encoder:
//!   call_sentinel: "<functions>"
//!   observation_sentinel: "<<observation>>"
//! ```

use crate::error::{Error, ErrorContext};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder in the tool prompt template replaced by the rendered declarations.
pub const TOOL_TEXT_PLACEHOLDER: &str = "{tool_text}";

/// Default instruction block wrapped around the rendered tool declarations.
pub const DEFAULT_TOOL_PROMPT_TEMPLATE: &str = concat!(
    "You have access to the following tools: {tool_text}\n",
    "You can choose to respond with one or more tool calls at once, or with a chat message back to the user. ",
    "Ensure you have all necessary details before making tool calls. If additional information is needed, ",
    "ask the user appropriately. Any tool call you make must correspond to the functions listed above.\n",
    "If you decide to call tools, format your response in JSONL. Start with the keyword `<functions>` followed by the JSON object:\n",
    "`<functions>{\"name\": \"<function_name>\", \"arguments\": {\"<arg1_name>\": \"<arg1_value>\", \"<arg2_name>\": \"<arg2_value>\", ...}}`",
);

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const MAX_ID_LENGTH: usize = 32;

/// A start/end marker pair, e.g. `starttoolcall` ... `endtoolcall`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedSentinel {
    pub start: String,
    pub end: String,
}

impl PairedSentinel {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Output decoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Leading markers followed by a JSON array of calls
    pub array_sentinels: Vec<String>,
    /// Leading markers followed by one JSON object per line
    pub line_sentinels: Vec<String>,
    /// Markers wrapping each call, anywhere in the text
    pub paired_sentinels: Vec<PairedSentinel>,
    /// Keys accepted for the function name, in priority order
    pub name_keys: Vec<String>,
    /// Keys accepted for the arguments, in priority order
    pub arguments_keys: Vec<String>,
    /// Number of hex characters in generated call ids
    pub id_length: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            array_sentinels: vec!["<<functions>>".to_string()],
            line_sentinels: vec!["<functions>".to_string(), "functions>".to_string()],
            paired_sentinels: vec![PairedSentinel::new("starttoolcall", "endtoolcall")],
            name_keys: vec!["name".to_string()],
            arguments_keys: vec!["arguments".to_string(), "parameters".to_string()],
            id_length: 8,
        }
    }
}

/// Prompt encoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Prefix of the synthetic `function` turn holding replayed calls
    pub call_sentinel: String,
    /// Prefix of the synthetic `observation` turn holding tool results
    pub observation_sentinel: String,
    /// System prompt used when the history does not start with one
    pub default_system_prompt: String,
    /// Instruction block; must contain `{tool_text}`
    pub tool_prompt_template: String,
    /// Escape non-ASCII characters in replayed calls and observations
    pub ensure_ascii: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            call_sentinel: "<functions>".to_string(),
            observation_sentinel: "<<observation>>".to_string(),
            default_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            tool_prompt_template: DEFAULT_TOOL_PROMPT_TEMPLATE.to_string(),
            ensure_ascii: true,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub decoder: DecoderConfig,
    pub encoder: EncoderConfig,
}

impl CodecConfig {
    /// Environment variable holding the path of a configuration file
    pub const ENV_VAR: &'static str = "TOOLCALL_BRIDGE_CONFIG";

    pub fn from_yaml_str(text: &str) -> crate::Result<Self> {
        // serde_yaml rejects an empty document; treat it as "all defaults"
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "json" => Self::from_json_str(&text),
            "yaml" | "yml" => Self::from_yaml_str(&text),
            other => Err(Error::configuration_with_context(
                "unsupported configuration file format",
                ErrorContext::new()
                    .with_details(format!(
                        "expected .json, .yaml or .yml, got '{}' ({})",
                        other,
                        path.display()
                    ))
                    .with_source("config_loader"),
            )),
        }
    }

    /// Load from the file named by [`CodecConfig::ENV_VAR`], or defaults when unset.
    pub fn from_env() -> crate::Result<Self> {
        match std::env::var(Self::ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                tracing::debug!("loading codec configuration from {}", path);
                Self::from_file(path.trim())
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        let d = &self.decoder;
        if d.array_sentinels.is_empty() && d.line_sentinels.is_empty() && d.paired_sentinels.is_empty()
        {
            return Err(invalid("decoder", "at least one sentinel must be configured"));
        }
        check_non_empty("decoder.array_sentinels", &d.array_sentinels)?;
        check_non_empty("decoder.line_sentinels", &d.line_sentinels)?;
        for (i, pair) in d.paired_sentinels.iter().enumerate() {
            if pair.start.is_empty() {
                return Err(invalid(
                    &format!("decoder.paired_sentinels[{}].start", i),
                    "sentinel must not be empty",
                ));
            }
            if pair.end.is_empty() {
                return Err(invalid(
                    &format!("decoder.paired_sentinels[{}].end", i),
                    "sentinel must not be empty",
                ));
            }
        }
        if d.name_keys.is_empty() {
            return Err(invalid("decoder.name_keys", "at least one name key is required"));
        }
        if d.arguments_keys.is_empty() {
            return Err(invalid(
                "decoder.arguments_keys",
                "at least one arguments key is required",
            ));
        }
        if d.id_length == 0 || d.id_length > MAX_ID_LENGTH {
            return Err(invalid(
                "decoder.id_length",
                &format!("must be between 1 and {}", MAX_ID_LENGTH),
            ));
        }

        let e = &self.encoder;
        if e.call_sentinel.is_empty() {
            return Err(invalid("encoder.call_sentinel", "sentinel must not be empty"));
        }
        if e.observation_sentinel.is_empty() {
            return Err(invalid("encoder.observation_sentinel", "sentinel must not be empty"));
        }
        if !e.tool_prompt_template.contains(TOOL_TEXT_PLACEHOLDER) {
            return Err(invalid(
                "encoder.tool_prompt_template",
                "template must contain {tool_text}",
            ));
        }
        Ok(())
    }
}

fn check_non_empty(field: &str, sentinels: &[String]) -> crate::Result<()> {
    match sentinels.iter().position(|s| s.is_empty()) {
        Some(i) => Err(invalid(
            &format!("{}[{}]", field, i),
            "sentinel must not be empty",
        )),
        None => Ok(()),
    }
}

fn invalid(field: &str, message: &str) -> Error {
    Error::validation_with_context(
        message,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("config_validator"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CodecConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.decoder.id_length, 8);
        assert_eq!(config.encoder.observation_sentinel, "<<observation>>");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(CodecConfig::from_yaml_str("").unwrap(), CodecConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = CodecConfig::from_yaml_str(
            r#"
decoder:
  paired_sentinels:
    - start: "<tool_call>"
      end: "</tool_call>"
"#,
        )
        .unwrap();

        assert_eq!(
            config.decoder.paired_sentinels,
            vec![PairedSentinel::new("<tool_call>", "</tool_call>")]
        );
        assert_eq!(config.decoder.array_sentinels, vec!["<<functions>>"]);
        assert_eq!(config.encoder, EncoderConfig::default());
    }

    #[test]
    fn test_rejects_empty_paired_end() {
        let mut config = CodecConfig::default();
        config.decoder.paired_sentinels[0].end.clear();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("decoder.paired_sentinels[0].end")
        );
    }

    #[test]
    fn test_rejects_template_without_placeholder() {
        let mut config = CodecConfig::default();
        config.encoder.tool_prompt_template = "Tools are available.".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_id_length() {
        let mut config = CodecConfig::default();
        config.decoder.id_length = 0;
        assert!(config.validate().is_err());
        config.decoder.id_length = 33;
        assert!(config.validate().is_err());
    }
}
