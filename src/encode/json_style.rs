//! JSON text in the spacing the target models were trained on:
//! `{"name": "f", "arguments": {"a": 1}}`, optionally ASCII-only.

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

/// `serde_json` formatter writing `", "` and `": "` separators.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedFormatter {
    ensure_ascii: bool,
}

impl SpacedFormatter {
    /// With `ensure_ascii`, non-ASCII characters are written as `\uXXXX`
    /// escapes (surrogate pairs above the BMP).
    pub fn new(ensure_ascii: bool) -> Self {
        Self { ensure_ascii }
    }
}

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !self.ensure_ascii || fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Serialize `value` with [`SpacedFormatter`].
pub fn to_spaced_string<T>(value: &T, ensure_ascii: bool) -> serde_json::Result<String>
where
    T: ?Sized + Serialize,
{
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter::new(ensure_ascii));
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spaced_separators() {
        let v = json!({"name": "f", "arguments": {"a": [1, 2], "b": {}}});
        assert_eq!(
            to_spaced_string(&v, false).unwrap(),
            r#"{"name": "f", "arguments": {"a": [1, 2], "b": {}}}"#
        );
        assert_eq!(to_spaced_string(&Vec::<String>::new(), false).unwrap(), "[]");
    }

    #[test]
    fn test_ensure_ascii() {
        let v = json!(["café", "日本", "🙂", "plain"]);
        assert_eq!(
            to_spaced_string(&v, true).unwrap(),
            r#"["caf\u00e9", "\u65e5\u672c", "\ud83d\ude42", "plain"]"#
        );
        assert_eq!(to_spaced_string(&v, false).unwrap(), r#"["café", "日本", "🙂", "plain"]"#);
    }

    #[test]
    fn test_escapes_survive() {
        let v = json!({"q": "say \"hi\"\n"});
        let text = to_spaced_string(&v, true).unwrap();
        assert_eq!(text, r#"{"q": "say \"hi\"\n"}"#);
        assert_eq!(serde_json::from_str::<serde_json::Value>(&text).unwrap(), v);
    }
}
