//! 错误类型：配置加载与校验失败时返回的统一错误。
//!
//! Decoding and prompt encoding never fail on malformed model output or
//! loose tool schemas; those degrade to diagnostics. [`Error`] only comes
//! from loading, validating and compiling a codec configuration.

use std::fmt;
use thiserror::Error;

/// Where in a codec configuration a failure was found.
///
/// Displays as ` (field: decoder.line_sentinels[0], source: config_validator)`,
/// or as nothing when empty, so it can trail an error message directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Config key path, e.g. `decoder.paired_sentinels[0].end`
    pub field_path: Option<String>,
    /// Offending value or underlying parser message
    pub details: Option<String>,
    /// Stage that raised it: `config_loader`, `config_validator` or `sentinel_compiler`
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.field_path.is_none() && self.details.is_none() && self.source.is_none()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labelled = [
            ("field", &self.field_path),
            ("details", &self.details),
            ("source", &self.source),
        ];
        let mut present = labelled
            .iter()
            .filter_map(|(label, value)| value.as_deref().map(|v| (label, v)))
            .peekable();
        if present.peek().is_none() {
            return Ok(());
        }
        f.write_str(" (")?;
        for (i, (label, value)) in present.enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", label, value)?;
        }
        f.write_str(")")
    }
}

/// Unified error type for toolcall-bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration cannot be used as given: unknown file format or a
    /// sentinel pair that does not compile into a pattern.
    #[error("Configuration error: {message}{context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// A configuration field holds a value outside its allowed range.
    #[error("Validation error: {message}{context}")]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Context of a configuration or validation failure.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}
