//! Tolerant JSON recovery and string-escape normalization

use super::repair::JsonRepair;
use serde_json::Value;

/// Maximum depth for re-parsing JSON found inside string values.
pub const MAX_NESTED_RECOVERY: usize = 32;

/// Strict parse, then repaired parse; falls back to the original text as a
/// JSON string. Never fails.
pub fn recover_json(text: &str, repair: &dyn JsonRepair) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return value;
    }
    if let Some(fixed) = repair.repair(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&fixed) {
            return value;
        }
    }
    Value::String(text.to_string())
}

/// Clean one string value emitted by a model.
///
/// 1. Drop backslashes that do not start a legal JSON escape
///    (`\"`, `\\`, `\/`, `\b`, `\f`, `\n`, `\r`, `\t`, `\uXXXX`).
/// 2. Un-escape `\"`. Escapes are read pairwise, so `\\"` keeps its `\\`.
/// 3. Strip one pair of surrounding double quotes when no other quote
///    remains inside them.
///
/// Cleaning already-clean text is a no-op.
pub fn clean_escapes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut kept = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            kept.push(c);
            i += 1;
            continue;
        }
        match chars.get(i + 1) {
            Some('"') => {
                kept.push('"');
                i += 2;
            }
            Some(&next @ ('\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't')) => {
                kept.push('\\');
                kept.push(next);
                i += 2;
            }
            Some('u') if is_hex4(&chars, i + 2) => {
                kept.push_str("\\u");
                i += 2;
            }
            // stray backslash
            _ => i += 1,
        }
    }

    match kept
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) if !inner.contains('"') => inner.to_string(),
        _ => kept,
    }
}

fn is_hex4(chars: &[char], at: usize) -> bool {
    chars.len() >= at + 4 && chars[at..at + 4].iter().all(|c| c.is_ascii_hexdigit())
}

/// True when a string value should be re-parsed as embedded JSON.
pub fn looks_like_json(text: &str) -> bool {
    let t = text.trim_start();
    t.starts_with('{') || t.starts_with('[')
}

/// Walk a recovered value, cleaning every string leaf and re-recovering
/// leaves that hold JSON of their own (doubly-encoded arguments).
pub fn normalize_value(value: Value, repair: &dyn JsonRepair) -> Value {
    normalize_at(value, repair, 0)
}

fn normalize_at(value: Value, repair: &dyn JsonRepair, depth: usize) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_at(v, repair, depth)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| normalize_at(v, repair, depth))
                .collect(),
        ),
        Value::String(s) => {
            // well-formed embedded JSON is taken as is; cleaning would
            // unescape its inner quotes
            if depth < MAX_NESTED_RECOVERY && looks_like_json(&s) {
                if let Ok(nested @ (Value::Object(_) | Value::Array(_))) =
                    serde_json::from_str::<Value>(&s)
                {
                    return normalize_at(nested, repair, depth + 1);
                }
            }
            let cleaned = clean_escapes(&s);
            if depth >= MAX_NESTED_RECOVERY || !looks_like_json(&cleaned) {
                return Value::String(cleaned);
            }
            match recover_json(&cleaned, repair) {
                nested @ (Value::Object(_) | Value::Array(_)) => {
                    normalize_at(nested, repair, depth + 1)
                }
                _ => Value::String(cleaned),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::repair::{BestEffortRepair, NoRepair};
    use serde_json::json;

    #[test]
    fn test_recover_strict_first() {
        assert_eq!(recover_json(r#"{"a": 1}"#, &NoRepair), json!({"a": 1}));
    }

    #[test]
    fn test_recover_falls_back_to_repair_then_string() {
        assert_eq!(recover_json("{'a': 1,}", &BestEffortRepair), json!({"a": 1}));
        assert_eq!(recover_json("{'a': 1,}", &NoRepair), json!("{'a': 1,}"));
        assert_eq!(recover_json("plain words", &BestEffortRepair), json!("plain words"));
    }

    #[test]
    fn test_clean_escapes_drops_stray_backslashes() {
        assert_eq!(clean_escapes(r"San\ Francisco\!"), "San Francisco!");
        assert_eq!(clean_escapes(r"line\nbreak \u00e9"), r"line\nbreak \u00e9");
        assert_eq!(clean_escapes(r"\uZZZZ"), "uZZZZ");
        assert_eq!(clean_escapes("trailing\\"), "trailing");
    }

    #[test]
    fn test_clean_escapes_unescapes_quotes_and_strips_wrapper() {
        assert_eq!(clean_escapes(r#"{\"a\":1}"#), r#"{"a":1}"#);
        assert_eq!(clean_escapes(r#""quoted""#), "quoted");
        assert_eq!(clean_escapes("\""), "\"");
        assert_eq!(clean_escapes(r#"say "hi" now"#), r#"say "hi" now"#);
        assert_eq!(clean_escapes(r#""a" and "b""#), r#""a" and "b""#);
    }

    #[test]
    fn test_clean_escapes_keeps_escaped_backslash_before_quote() {
        assert_eq!(clean_escapes(r#"a\\"b"#), r#"a\\"b"#);
        assert_eq!(clean_escapes(r#"a\\\"b"#), r#"a\\"b"#);
    }

    #[test]
    fn test_clean_escapes_is_idempotent_on_clean_text() {
        for text in [
            "hello world",
            r#"{"a": [1, 2]}"#,
            r"C:\\tmp\\file",
            "multi\nline",
            r"tab\there",
            r#"a\\"b"#,
            r#"say \"hi\" to C:\\tmp"#,
            r#"\"\"nested\"\""#,
            r#""a" and "b""#,
        ] {
            let once = clean_escapes(text);
            assert_eq!(clean_escapes(&once), once, "not idempotent for {text:?}");
        }
    }

    #[test]
    fn test_normalize_recovers_doubly_encoded_arguments() {
        let value = json!({
            "name": "calculate_distance",
            "arguments": "{\"origin\":\"San Francisco\",\"destination\":\"Cupertino\"}"
        });
        assert_eq!(
            normalize_value(value, &BestEffortRepair),
            json!({
                "name": "calculate_distance",
                "arguments": {"origin": "San Francisco", "destination": "Cupertino"}
            })
        );
    }

    #[test]
    fn test_normalize_walks_sequences_and_nested_strings() {
        let value = json!([{"q": "\"wrapped\""}, "[1, 2]", 3, null]);
        assert_eq!(
            normalize_value(value, &BestEffortRepair),
            json!([{"q": "wrapped"}, [1, 2], 3, null])
        );
    }

    #[test]
    fn test_normalize_keeps_escaped_quotes_of_embedded_json() {
        let value = json!({"arguments": r#"{"inner": "{\"k\": 1}", "quote": "say \"hi\""}"#});
        assert_eq!(
            normalize_value(value, &BestEffortRepair),
            json!({"arguments": {"inner": {"k": 1}, "quote": "say \"hi\""}})
        );
    }

    #[test]
    fn test_normalize_keeps_unrecoverable_json_lookalikes() {
        let value = json!({"note": "{not json at all"});
        assert_eq!(
            normalize_value(value, &NoRepair),
            json!({"note": "{not json at all"})
        );
    }
}
