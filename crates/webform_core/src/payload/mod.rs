//! Decoding of the legacy `extra` column.
//!
//! Legacy rows store type specific options as a serialized mapping. Older
//! rows use the language-native serialization format, rows touched by later
//! tooling use JSON. Both decode to the same [`ExtraOptions`].

mod php;

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Decoded extra options of one legacy field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraOptions {
    values: Map<String, Value>,
}

impl ExtraOptions {
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// String value of `key`; scalars are stringified, anything else is empty.
    pub fn text(&self, key: &str) -> Cow<'_, str> {
        match self.values.get(key) {
            Some(Value::String(text)) => Cow::Borrowed(text),
            Some(Value::Number(number)) => Cow::Owned(number.to_string()),
            Some(Value::Bool(true)) => Cow::Borrowed("1"),
            _ => Cow::Borrowed(""),
        }
    }

    /// Loose truthiness: `1`, `"1"` and `true` are set; `0`, `""`, `"0"`
    /// and absent keys are not.
    pub fn flag(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(text)) => !(text.is_empty() || text == "0"),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(entries)) => !entries.is_empty(),
            Some(Value::Null) | None => false,
        }
    }

    pub fn description(&self) -> Cow<'_, str> {
        self.text("description")
    }

    pub fn items(&self) -> Cow<'_, str> {
        self.text("items")
    }

    pub fn options(&self) -> Cow<'_, str> {
        self.text("options")
    }

    pub fn questions(&self) -> Cow<'_, str> {
        self.text("questions")
    }

    pub fn multiple(&self) -> bool {
        self.flag("multiple")
    }

    pub fn aslist(&self) -> bool {
        self.flag("aslist")
    }
}

/// Decode a legacy `extra` payload.
///
/// An empty (or whitespace only) payload decodes to empty options. The top
/// level value must be a mapping.
pub fn decode_extra(payload: &[u8]) -> Result<ExtraOptions, DecodeError> {
    let Some(start) = payload.iter().position(|b| !b.is_ascii_whitespace()) else {
        return Ok(ExtraOptions::default());
    };

    let value = if payload[start] == b'{' {
        serde_json::from_slice::<Value>(payload)
            .map_err(|e| DecodeError::new(start, format!("invalid JSON payload: {e}")))?
    } else {
        php::parse(&payload[start..]).map_err(|e| DecodeError::new(e.offset + start, e.message))?
    };

    match value {
        Value::Object(values) => Ok(ExtraOptions { values }),
        other => Err(DecodeError::new(
            start,
            format!("extra payload must be a mapping, found {}", value_kind(&other)),
        )),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_serialized_select() {
        let payload = br#"a:4:{s:5:"items";s:9:"a|Apple
b";s:8:"multiple";i:0;s:6:"aslist";s:1:"1";s:11:"description";s:4:"Pick";}"#;
        let extra = decode_extra(payload).unwrap();
        assert_eq!(extra.items(), "a|Apple\nb");
        assert!(!extra.multiple());
        assert!(extra.aslist());
        assert_eq!(extra.description(), "Pick");
        assert_eq!(extra.questions(), "");
    }

    #[test]
    fn test_decode_json_payload() {
        let extra =
            decode_extra(br#"  {"multiple": true, "items": "x", "description": 5}"#).unwrap();
        assert!(extra.multiple());
        assert!(!extra.aslist());
        assert_eq!(extra.items(), "x");
        assert_eq!(extra.description(), "5");
    }

    #[test]
    fn test_empty_payload_is_default() {
        assert_eq!(decode_extra(b"").unwrap(), ExtraOptions::default());
        assert_eq!(decode_extra(b" \n").unwrap(), ExtraOptions::default());
    }

    #[test]
    fn test_non_mapping_is_rejected() {
        let err = decode_extra(b"s:3:\"abc\";").unwrap_err();
        assert!(err.message.contains("must be a mapping"));

        let err = decode_extra(b"  garbage").unwrap_err();
        assert_eq!(err.offset, 2);

        assert!(decode_extra(b"{not json").is_err());
    }

    #[test]
    fn test_flag_coercion() {
        let extra = decode_extra(br#"{"a": "0", "b": "", "c": 2, "d": null, "e": "yes"}"#).unwrap();
        assert!(!extra.flag("a"));
        assert!(!extra.flag("b"));
        assert!(extra.flag("c"));
        assert!(!extra.flag("d"));
        assert!(extra.flag("e"));
        assert!(!extra.flag("missing"));
    }
}
