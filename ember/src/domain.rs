use serde_json::Value;
use shared::{Error, Result};
use std::borrow::Cow;
use tracing::debug;

/// Deepest array/object nesting `serde_json` will parse back with its default recursion limit
pub const MAX_NESTING: usize = 127;

/// Turn a cache value into the text stored under its key
///
/// Strings are stored verbatim, everything else as JSON. Values nested deeper
/// than [`MAX_NESTING`] are rejected, since they could not be read back.
pub fn encode(value: &Value) -> Result<Cow<'_, str>> {
    match value {
        Value::String(s) => Ok(Cow::Borrowed(s.as_str())),
        other if exceeds_nesting(other, MAX_NESTING) => Err(Error::Internal(format!(
            "Value nests deeper than {} levels and cannot be decoded",
            MAX_NESTING
        ))),
        other => serde_json::to_string(other)
            .map(Cow::Owned)
            .map_err(|e| Error::Internal(format!("Failed to serialize value: {}", e))),
    }
}

/// Turn stored text back into a cache value
///
/// Text that parses as JSON is returned structured. Anything else was written
/// as a plain string (by us or by another client) and is returned as one. A
/// string that happens to be valid JSON, such as `"42"` or `{"x":1}`, cannot be
/// told apart from a structured value and comes back structured. Bytes that are
/// not UTF-8 never reach here; the connection replaces invalid sequences with
/// U+FFFD first.
pub fn decode(payload: String) -> Value {
    match serde_json::from_str(&payload) {
        Ok(value) => value,
        Err(_) => {
            debug!("Payload is not JSON, returning it as a string");
            Value::String(payload)
        }
    }
}

// Iterative so that hostile depths cannot overflow the stack
fn exceeds_nesting(value: &Value, limit: usize) -> bool {
    let mut pending = vec![(value, 0usize)];
    while let Some((value, depth)) = pending.pop() {
        let depth = depth + 1;
        match value {
            Value::Array(_) | Value::Object(_) if depth > limit => return true,
            Value::Array(items) => pending.extend(items.iter().map(|child| (child, depth))),
            Value::Object(map) => pending.extend(map.values().map(|child| (child, depth))),
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_is_stored_verbatim() {
        let value = Value::String("hello".to_string());
        let encoded = encode(&value).unwrap();
        assert!(matches!(encoded, Cow::Borrowed(_)));
        assert_eq!(encoded, "hello");
    }

    #[test]
    fn test_structured_values_are_json() {
        assert_eq!(encode(&json!(42)).unwrap(), "42");
        assert_eq!(encode(&json!(true)).unwrap(), "true");
        assert_eq!(encode(&Value::Null).unwrap(), "null");
        assert_eq!(encode(&json!([1, "two"])).unwrap(), r#"[1,"two"]"#);
        assert_eq!(encode(&json!({"x": 1})).unwrap(), r#"{"x":1}"#);
    }

    #[test]
    fn test_structured_values_round_trip() {
        let values = [
            Value::Null,
            json!(false),
            json!(-17),
            json!(u64::MAX),
            json!(0.1),
            json!(1.0e-300),
            json!([]),
            json!([1, [2, [3]], null]),
            json!({}),
            json!({"name": "ember", "tags": ["a", "b"], "nested": {"ok": true, "n": 2.5}}),
        ];

        for value in values {
            let encoded = encode(&value).unwrap().into_owned();
            assert_eq!(decode(encoded), value);
        }
    }

    fn nested_arrays(depth: usize) -> Value {
        (0..depth).fold(json!(1), |inner, _| Value::Array(vec![inner]))
    }

    #[test]
    fn test_deepest_decodable_nesting_round_trips() {
        let value = nested_arrays(MAX_NESTING);
        let encoded = encode(&value).unwrap().into_owned();
        assert_eq!(decode(encoded), value);

        let mixed = (0..MAX_NESTING - 1).fold(json!(null), |inner, i| {
            if i % 2 == 0 { json!({"k": inner}) } else { json!([inner]) }
        });
        let encoded = encode(&mixed).unwrap().into_owned();
        assert_eq!(decode(encoded), mixed);
    }

    #[test]
    fn test_too_deep_value_is_rejected() {
        let value = nested_arrays(200);
        let result = encode(&value);
        assert!(matches!(result, Err(Error::Internal(_))));

        let object = (0..MAX_NESTING + 1).fold(json!(1), |inner, _| json!({"k": inner}));
        assert!(matches!(encode(&object), Err(Error::Internal(_))));
    }

    #[test]
    fn test_deep_text_in_a_string_is_stored_verbatim() {
        let text = "[".repeat(300);
        let binding = Value::String(text.clone());
        let encoded = encode(&binding).unwrap();
        assert_eq!(encoded, text.as_str());
        assert_eq!(decode(text.clone()), Value::String(text));
    }

    #[test]
    fn test_plain_text_falls_back_to_string() {
        assert_eq!(decode("hello".to_string()), json!("hello"));
        assert_eq!(decode(String::new()), json!(""));
        assert_eq!(decode("{not json".to_string()), json!("{not json"));
        assert_eq!(decode("1 2".to_string()), json!("1 2"));
    }

    #[test]
    fn test_json_looking_string_decodes_structured() {
        let stored = encode(&json!(r#"{"x":1}"#)).unwrap().into_owned();
        assert_eq!(stored, r#"{"x":1}"#);
        assert_eq!(decode(stored), json!({"x": 1}));

        assert_eq!(decode("42".to_string()), json!(42));
        assert_eq!(decode(r#""quoted""#.to_string()), json!("quoted"));
    }
}
