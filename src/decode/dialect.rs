//! Sentinel dialect detection

use crate::config::DecoderConfig;
use crate::error::{Error, ErrorContext};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;

/// The closed set of tool-call block grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `<<functions>>[{...}, {...}]`
    BracketedArray,
    /// `<functions>{...}\n{...}` (JSONL after a leading marker)
    NewlineDelimited,
    /// `starttoolcall{...}endtoolcall`, anywhere in the text
    PairedDelimiter,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::BracketedArray => "bracketed_array",
            Dialect::NewlineDelimited => "newline_delimited",
            Dialect::PairedDelimiter => "paired_delimiter",
        })
    }
}

/// A detected tool-call block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection<'a> {
    /// Leading-marker dialects: the text after the marker.
    Leading { dialect: Dialect, body: &'a str },
    /// Paired-delimiter dialect: the inner text of each span, in order.
    Paired { spans: Vec<&'a str> },
}

impl Detection<'_> {
    pub fn dialect(&self) -> Dialect {
        match self {
            Detection::Leading { dialect, .. } => *dialect,
            Detection::Paired { .. } => Dialect::PairedDelimiter,
        }
    }
}

/// Compiled sentinel markers.
#[derive(Debug, Clone)]
pub struct SentinelSet {
    /// (marker, default dialect), longest marker first
    leading: Vec<(String, Dialect)>,
    paired: Vec<Regex>,
}

impl SentinelSet {
    pub fn from_config(config: &DecoderConfig) -> crate::Result<Self> {
        let mut leading: Vec<(String, Dialect)> = config
            .array_sentinels
            .iter()
            .map(|m| (m.clone(), Dialect::BracketedArray))
            .chain(
                config
                    .line_sentinels
                    .iter()
                    .map(|m| (m.clone(), Dialect::NewlineDelimited)),
            )
            .filter(|(m, _)| !m.is_empty())
            .collect();
        // `<<functions>>` must be tried before `<functions>` and `functions>`
        leading.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let paired = config
            .paired_sentinels
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                let pattern = format!(
                    "{}(.*?){}",
                    regex::escape(&pair.start),
                    regex::escape(&pair.end)
                );
                RegexBuilder::new(&pattern)
                    .dot_matches_new_line(true)
                    .build()
                    .map_err(|e| {
                        Error::configuration_with_context(
                            "invalid paired sentinel",
                            ErrorContext::new()
                                .with_field_path(format!("decoder.paired_sentinels[{}]", i))
                                .with_details(e.to_string())
                                .with_source("sentinel_compiler"),
                        )
                    })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(Self { leading, paired })
    }

    /// Leading markers, longest first.
    pub fn leading_markers(&self) -> impl Iterator<Item = &str> {
        self.leading.iter().map(|(m, _)| m.as_str())
    }

    /// Find the tool-call block in `raw`, if any.
    ///
    /// Leading markers are matched against the left-trimmed text. A body
    /// that opens with `[` is read as an array whichever marker introduced
    /// it; any other body is read line by line.
    pub fn detect<'a>(&self, raw: &'a str) -> Option<Detection<'a>> {
        let trimmed = raw.trim_start();
        for (marker, _) in &self.leading {
            if let Some(body) = trimmed.strip_prefix(marker.as_str()) {
                let dialect = if body.trim_start().starts_with('[') {
                    Dialect::BracketedArray
                } else {
                    Dialect::NewlineDelimited
                };
                return Some(Detection::Leading { dialect, body });
            }
        }

        for pattern in &self.paired {
            let spans: Vec<&str> = pattern
                .captures_iter(raw)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str())
                .collect();
            if !spans.is_empty() {
                return Some(Detection::Paired { spans });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentinels() -> SentinelSet {
        SentinelSet::from_config(&DecoderConfig::default()).unwrap()
    }

    #[test]
    fn test_longest_marker_wins() {
        let set = sentinels();
        let markers: Vec<&str> = set.leading_markers().collect();
        assert_eq!(markers[0], "<<functions>>");

        match set.detect("  <<functions>>[{\"name\": \"f\"}]") {
            Some(Detection::Leading { dialect, body }) => {
                assert_eq!(dialect, Dialect::BracketedArray);
                assert_eq!(body, "[{\"name\": \"f\"}]");
            }
            other => panic!("unexpected detection: {other:?}"),
        }
    }

    #[test]
    fn test_line_markers() {
        let set = sentinels();
        for raw in ["<functions>{\"name\": \"f\"}", "functions>{\"name\": \"f\"}"] {
            let detection = set.detect(raw).unwrap();
            assert_eq!(detection.dialect(), Dialect::NewlineDelimited);
        }
        assert_eq!(
            set.detect("<functions>[{\"name\": \"f\"}]").unwrap().dialect(),
            Dialect::BracketedArray
        );
    }

    #[test]
    fn test_leading_marker_must_start_the_text() {
        assert!(sentinels().detect("Sure, <functions>{\"name\": \"f\"}").is_none());
    }

    #[test]
    fn test_paired_spans_are_non_greedy_and_multiline() {
        let raw = "I'll check.\nstarttoolcall{\"a\":\n1}endtoolcall and starttoolcall{\"b\":2}endtoolcall starttoolcall{\"c\"";
        match sentinels().detect(raw) {
            Some(Detection::Paired { spans }) => {
                assert_eq!(spans, vec!["{\"a\":\n1}", "{\"b\":2}"]);
            }
            other => panic!("unexpected detection: {other:?}"),
        }
    }

    #[test]
    fn test_no_sentinel() {
        assert!(sentinels().detect("Hello, how can I help?").is_none());
        assert!(sentinels().detect("").is_none());
    }
}
