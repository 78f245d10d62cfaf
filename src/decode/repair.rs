//! Best-effort salvage of near-valid JSON.
//!
//! The decoder only needs "turn this almost-JSON into JSON", so the repair
//! strategy sits behind [`JsonRepair`] and can be swapped out.

/// Rewrites near-valid JSON into text a strict parser accepts.
pub trait JsonRepair: Send + Sync {
    /// Returns `None` when the input holds nothing worth salvaging.
    fn repair(&self, text: &str) -> Option<String>;
}

/// Strict-only mode: never repairs anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRepair;

impl JsonRepair for NoRepair {
    fn repair(&self, _text: &str) -> Option<String> {
        None
    }
}

/// Single-pass repairer for the malformations local models produce.
///
/// Handles:
/// - leading and trailing stray text around the first object/array
/// - single-quoted strings and unquoted keys
/// - Python literals (`True`, `False`, `None`) and other bare-word values
/// - trailing, doubled and missing commas; missing colons
/// - raw control characters, invalid escapes and unescaped quotes inside strings
/// - mismatched and unclosed brackets, unterminated strings
#[derive(Debug, Clone, Copy, Default)]
pub struct BestEffortRepair;

impl JsonRepair for BestEffortRepair {
    fn repair(&self, text: &str) -> Option<String> {
        let chars: Vec<char> = text.chars().collect();
        let start = chars.iter().position(|c| *c == '{' || *c == '[')?;
        let mut repairer = Repairer {
            chars,
            pos: start,
            out: String::with_capacity(text.len() + 8),
            stack: Vec::new(),
        };
        repairer.run();
        Some(repairer.out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Key,
    Colon,
    Value,
    CommaOrEnd,
}

#[derive(Debug)]
struct Frame {
    kind: Kind,
    expect: Expect,
    has_members: bool,
}

struct Repairer {
    chars: Vec<char>,
    pos: usize,
    out: String,
    stack: Vec<Frame>,
}

impl Repairer {
    fn run(&mut self) {
        // The caller guarantees chars[pos] opens a container.
        self.open(self.chars[self.pos]);
        self.pos += 1;

        while self.pos < self.chars.len() && !self.stack.is_empty() {
            let c = self.chars[self.pos];
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }
            let Some(frame) = self.stack.last() else {
                break;
            };
            match (frame.kind, frame.expect) {
                (Kind::Object, Expect::Key) => self.on_key(c),
                (Kind::Object, Expect::Colon) => self.on_colon(c),
                (_, Expect::Value) => self.on_value(c),
                (_, Expect::CommaOrEnd) => self.on_comma_or_end(c),
                (Kind::Array, _) => self.set_expect(Expect::Value),
            }
        }

        self.finish();
    }

    fn on_key(&mut self, c: char) {
        match c {
            '"' | '\'' => {
                self.begin_member();
                self.read_string(c);
                self.set_expect(Expect::Colon);
            }
            '}' | ']' => self.close(c),
            c if is_ident_char(c) => {
                self.begin_member();
                let word = self.take_while(|c| is_ident_char(c) || c == '-' || c == '.');
                self.push_json_string(&word);
                self.set_expect(Expect::Colon);
            }
            // stray commas and punctuation between members
            _ => self.pos += 1,
        }
    }

    fn on_colon(&mut self, c: char) {
        match c {
            ':' | '=' => {
                self.out.push(':');
                self.pos += 1;
                self.set_expect(Expect::Value);
            }
            ',' | '}' | ']' => {
                // key without a value
                self.out.push_str(":null");
                self.set_expect(Expect::CommaOrEnd);
            }
            _ => {
                self.out.push(':');
                self.set_expect(Expect::Value);
            }
        }
    }

    fn on_value(&mut self, c: char) {
        let in_array = matches!(self.top_kind(), Some(Kind::Array));
        match c {
            '{' | '[' => {
                self.begin_value();
                self.value_done();
                self.open(c);
                self.pos += 1;
            }
            '"' | '\'' => {
                self.begin_value();
                self.read_string(c);
                self.value_done();
            }
            '}' | ']' => {
                if !in_array {
                    self.out.push_str("null");
                    self.value_done();
                }
                self.close(c);
            }
            ',' => {
                if in_array {
                    // `[1,,2]`
                    self.pos += 1;
                } else {
                    self.out.push_str("null");
                    self.value_done();
                }
            }
            c if c == '-' || c.is_ascii_digit() => {
                self.begin_value();
                self.read_number_or_word();
                self.value_done();
            }
            c if is_ident_char(c) => {
                self.begin_value();
                self.read_bare_value();
                self.value_done();
            }
            _ => self.pos += 1,
        }
    }

    fn on_comma_or_end(&mut self, c: char) {
        match c {
            ',' => {
                self.pos += 1;
                self.reset_for_next_member();
            }
            '}' | ']' => self.close(c),
            // missing comma: reprocess this char as the next member
            _ => self.reset_for_next_member(),
        }
    }

    fn reset_for_next_member(&mut self) {
        match self.top_kind() {
            Some(Kind::Object) => self.set_expect(Expect::Key),
            Some(Kind::Array) => self.set_expect(Expect::Value),
            None => {}
        }
    }

    fn open(&mut self, c: char) {
        let (kind, expect) = if c == '{' {
            (Kind::Object, Expect::Key)
        } else {
            (Kind::Array, Expect::Value)
        };
        self.out.push(c);
        self.stack.push(Frame {
            kind,
            expect,
            has_members: false,
        });
    }

    /// Close the innermost frame matching `closer`, auto-closing frames
    /// opened after it. A closer with no matching frame is dropped.
    fn close(&mut self, closer: char) {
        self.pos += 1;
        let wanted = if closer == '}' { Kind::Object } else { Kind::Array };
        if !self.stack.iter().any(|f| f.kind == wanted) {
            return;
        }
        while let Some(kind) = self.top_kind() {
            self.close_top();
            if kind == wanted {
                break;
            }
        }
    }

    fn close_top(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match (frame.kind, frame.expect) {
            (Kind::Object, Expect::Colon) => self.out.push_str(":null"),
            (Kind::Object, Expect::Value) => self.out.push_str("null"),
            _ => {}
        }
        self.out.push(if frame.kind == Kind::Object { '}' } else { ']' });
    }

    fn finish(&mut self) {
        while !self.stack.is_empty() {
            self.close_top();
        }
    }

    fn begin_member(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            if frame.has_members {
                self.out.push(',');
            }
            frame.has_members = true;
        }
    }

    fn begin_value(&mut self) {
        if matches!(self.top_kind(), Some(Kind::Array)) {
            self.begin_member();
        }
    }

    fn value_done(&mut self) {
        self.set_expect(Expect::CommaOrEnd);
    }

    fn set_expect(&mut self, expect: Expect) {
        if let Some(frame) = self.stack.last_mut() {
            frame.expect = expect;
        }
    }

    fn top_kind(&self) -> Option<Kind> {
        self.stack.last().map(|f| f.kind)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.pos < self.chars.len() && pred(self.chars[self.pos]) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn push_json_string(&mut self, s: &str) {
        for c in std::iter::once('"').chain(escape_chars(s)).chain(std::iter::once('"')) {
            self.out.push(c);
        }
    }

    /// Read a string opened by `quote` at `self.pos`, emitting it double-quoted.
    fn read_string(&mut self, quote: char) {
        self.pos += 1;
        self.out.push('"');
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            self.pos += 1;
            match c {
                '\\' => {
                    let Some(&next) = self.chars.get(self.pos) else {
                        break;
                    };
                    self.pos += 1;
                    match next {
                        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => {
                            self.out.push('\\');
                            self.out.push(next);
                        }
                        'u' if self.has_hex4() => {
                            self.out.push_str("\\u");
                        }
                        // invalid escape: keep the character, drop the backslash
                        other => self.push_string_char(other),
                    }
                }
                c if c == quote => {
                    if self.quote_closes() {
                        break;
                    }
                    self.push_string_char(c);
                }
                c => self.push_string_char(c),
            }
        }
        self.out.push('"');
    }

    fn has_hex4(&self) -> bool {
        self.chars.len() >= self.pos + 4
            && self.chars[self.pos..self.pos + 4]
                .iter()
                .all(|c| c.is_ascii_hexdigit())
    }

    /// A quote only terminates the string when followed by a delimiter;
    /// otherwise it is an unescaped quote inside the text.
    fn quote_closes(&self) -> bool {
        match self.chars[self.pos..].iter().find(|c| !c.is_whitespace()) {
            None => true,
            Some(next) => matches!(next, ',' | '}' | ']' | ':' | '"' | '\''),
        }
    }

    fn push_string_char(&mut self, c: char) {
        for e in escape_chars(&c.to_string()) {
            self.out.push(e);
        }
    }

    fn read_number_or_word(&mut self) {
        let start = self.pos;
        let token =
            self.take_while(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
        let at_delimiter = self
            .chars
            .get(self.pos)
            .map_or(true, |c| c.is_whitespace() || matches!(c, ',' | '}' | ']'));
        if at_delimiter && serde_json::from_str::<serde_json::Number>(&token).is_ok() {
            self.out.push_str(&token);
        } else {
            self.pos = start;
            self.read_bare_value();
        }
    }

    /// Unquoted value: a literal, or free text up to the next delimiter.
    fn read_bare_value(&mut self) {
        let raw = self.take_while(|c| !matches!(c, ',' | '}' | ']' | '\n'));
        let word = raw.trim();
        match word {
            "true" | "True" | "TRUE" => self.out.push_str("true"),
            "false" | "False" | "FALSE" => self.out.push_str("false"),
            "null" | "None" | "NULL" | "undefined" | "nil" => self.out.push_str("null"),
            _ => self.push_json_string(word),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn escape_chars(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(|c| {
        let escaped: Vec<char> = match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            '\u{8}' => vec!['\\', 'b'],
            '\u{c}' => vec!['\\', 'f'],
            c if (c as u32) < 0x20 => format!("\\u{:04x}", c as u32).chars().collect(),
            c => vec![c],
        };
        escaped.into_iter()
    })
}
