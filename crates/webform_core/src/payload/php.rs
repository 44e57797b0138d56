//! Decoder for the legacy language-native serialization format.
//!
//! Only the value shapes the legacy `extra` column can contain are
//! supported: `N;`, `b:0;`, `i:42;`, `d:1.5;`, `s:3:"abc";`,
//! `a:1:{...}` and `O:8:"stdClass":1:{...}`. Arrays decode to JSON objects
//! with stringified keys so that list-shaped arrays keep their indices.

use serde_json::{Map, Number, Value};

use crate::error::DecodeError;

/// Deepest array/object nesting accepted, matching serde_json's limit.
pub(crate) const MAX_DEPTH: usize = 128;

pub(crate) fn parse(input: &[u8]) -> Result<Value, DecodeError> {
    let mut parser = Parser {
        input,
        pos: 0,
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_whitespace();
    if parser.pos != input.len() {
        return Err(parser.error("trailing data after value"));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> DecodeError {
        DecodeError::new(self.pos, message)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn next(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .input
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of payload"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<(), DecodeError> {
        let start = self.pos;
        let found = self.next()?;
        if found != expected {
            return Err(DecodeError::new(
                start,
                format!("expected '{}', found '{}'", expected as char, found as char),
            ));
        }
        Ok(())
    }

    /// Read up to (and consume) `delimiter`, returning the text before it.
    fn read_until(&mut self, delimiter: u8) -> Result<&'a str, DecodeError> {
        let input: &'a [u8] = self.input;
        let start = self.pos;
        let len = input[start..]
            .iter()
            .position(|b| *b == delimiter)
            .ok_or_else(|| self.error(format!("missing '{}'", delimiter as char)))?;
        let raw = &input[start..start + len];
        self.pos = start + len + 1;
        std::str::from_utf8(raw).map_err(|_| DecodeError::new(start, "invalid UTF-8 in scalar"))
    }

    fn integer(&mut self, delimiter: u8) -> Result<i64, DecodeError> {
        let start = self.pos;
        let text = self.read_until(delimiter)?;
        text.trim()
            .parse::<i64>()
            .map_err(|_| DecodeError::new(start, format!("invalid integer '{text}'")))
    }

    fn length(&mut self, delimiter: u8) -> Result<usize, DecodeError> {
        let start = self.pos;
        let value = self.integer(delimiter)?;
        usize::try_from(value).map_err(|_| DecodeError::new(start, format!("invalid length {value}")))
    }

    /// Body of `s:LEN:"...";` after the tag. LEN counts bytes, not characters.
    fn string_body(&mut self) -> Result<String, DecodeError> {
        self.expect(b':')?;
        let len = self.length(b':')?;
        self.expect(b'"')?;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| self.error(format!("string length {len} runs past the payload")))?;
        let text = String::from_utf8_lossy(&self.input[start..end]).into_owned();
        self.pos = end;
        self.expect(b'"')?;
        Ok(text)
    }

    fn value(&mut self) -> Result<Value, DecodeError> {
        let start = self.pos;
        match self.next()? {
            b'N' => {
                self.expect(b';')?;
                Ok(Value::Null)
            }
            b'b' => {
                self.expect(b':')?;
                match self.read_until(b';')? {
                    "0" => Ok(Value::Bool(false)),
                    "1" => Ok(Value::Bool(true)),
                    other => Err(DecodeError::new(start, format!("invalid boolean '{other}'"))),
                }
            }
            b'i' => {
                self.expect(b':')?;
                Ok(Value::from(self.integer(b';')?))
            }
            b'd' => {
                self.expect(b':')?;
                let text = self.read_until(b';')?;
                let number: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| DecodeError::new(start, format!("invalid float '{text}'")))?;
                // NAN and INF have no JSON representation
                Ok(Number::from_f64(number).map_or(Value::Null, Value::Number))
            }
            b's' => {
                let text = self.string_body()?;
                self.expect(b';')?;
                Ok(Value::String(text))
            }
            b'a' => {
                self.expect(b':')?;
                let count = self.length(b':')?;
                self.entries(count).map(Value::Object)
            }
            b'O' => {
                // Class name is discarded; properties decode like an array.
                self.string_body()?;
                self.expect(b':')?;
                let count = self.length(b':')?;
                self.entries(count).map(Value::Object)
            }
            other => Err(DecodeError::new(
                start,
                format!("unexpected tag '{}'", other as char),
            )),
        }
    }

    fn entries(&mut self, count: usize) -> Result<Map<String, Value>, DecodeError> {
        self.expect(b'{')?;
        if self.depth == MAX_DEPTH {
            return Err(self.error(format!("nesting deeper than {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        let mut map = Map::new();
        for _ in 0..count {
            let key = self.key()?;
            let value = self.value()?;
            map.insert(key, value);
        }
        self.expect(b'}')?;
        self.depth -= 1;
        Ok(map)
    }

    fn key(&mut self) -> Result<String, DecodeError> {
        let start = self.pos;
        match self.next()? {
            b'i' => {
                self.expect(b':')?;
                Ok(self.integer(b';')?.to_string())
            }
            b's' => {
                let key = self.string_body()?;
                self.expect(b';')?;
                Ok(key)
            }
            other => Err(DecodeError::new(
                start,
                format!("array keys must be integers or strings, found '{}'", other as char),
            )),
        }
    }
}
