//! Remote value conversion.
//!
//! BiDi serializes script results as typed remote values
//! (`{"type": "string", "value": "..."}`). The facade exposes plain JSON,
//! so results are folded into [`serde_json::Value`] here.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Number, Value, json};

use crate::error::{Error, Result};
use crate::identifiers::ElementId;

// ============================================================================
// Remote → JSON
// ============================================================================

/// Converts a BiDi remote value into JSON.
///
/// | Remote type | JSON |
/// |-------------|------|
/// | `undefined`, `null` | `null` |
/// | `string`, `boolean` | same |
/// | `number` | number; `NaN`/`±Infinity` become `null`, `-0` becomes `0` |
/// | `bigint` | string |
/// | `array`, `set` | array |
/// | `object`, `map` | object (non-string keys are stringified) |
/// | `node` | `{"sharedId": ...}` |
/// | anything else | `null` |
#[must_use]
pub fn remote_to_json(remote: &Value) -> Value {
    let kind = remote.get("type").and_then(Value::as_str).unwrap_or("");
    let value = remote.get("value");

    match kind {
        "string" | "boolean" => value.cloned().unwrap_or(Value::Null),
        "number" => match value {
            Some(Value::Number(n)) => Value::Number(n.clone()),
            Some(Value::String(s)) if s == "-0" => Value::Number(Number::from(0)),
            _ => Value::Null,
        },
        "bigint" | "date" => value.cloned().unwrap_or(Value::Null),
        "array" | "set" | "nodelist" | "htmlcollection" => Value::Array(
            value
                .and_then(Value::as_array)
                .map(|items| items.iter().map(remote_to_json).collect())
                .unwrap_or_default(),
        ),
        "object" | "map" => {
            let mut object = Map::new();
            for pair in value.and_then(Value::as_array).into_iter().flatten() {
                let Some([key, item]) = pair.as_array().map(Vec::as_slice) else {
                    continue;
                };
                let key = match key {
                    Value::String(s) => s.clone(),
                    other => match remote_to_json(other) {
                        Value::String(s) => s,
                        converted => converted.to_string(),
                    },
                };
                object.insert(key, remote_to_json(item));
            }
            Value::Object(object)
        }
        "node" => match shared_id(remote) {
            Some(id) => json!({ "sharedId": id.as_str() }),
            None => Value::Null,
        },
        _ => Value::Null,
    }
}

/// Extracts the `sharedId` of a node remote value.
#[must_use]
pub fn shared_id(remote: &Value) -> Option<ElementId> {
    remote
        .get("sharedId")
        .and_then(Value::as_str)
        .map(ElementId::new)
}

/// Builds a local value referencing a node, for script arguments.
#[must_use]
pub fn node_argument(element: &ElementId) -> Value {
    json!({ "sharedId": element.as_str() })
}

/// Builds a local string value, for script arguments.
#[must_use]
pub fn string_argument(text: &str) -> Value {
    json!({ "type": "string", "value": text })
}

// ============================================================================
// Evaluate Result
// ============================================================================

/// Unwraps a `script.callFunction` result.
///
/// # Errors
///
/// Returns [`Error::ScriptError`] when the page threw, and
/// [`Error::Protocol`] for an unrecognized result shape.
pub fn script_result(result: Value) -> Result<Value> {
    match result.get("type").and_then(Value::as_str) {
        Some("success") => Ok(result
            .get("result")
            .map(remote_to_json)
            .unwrap_or(Value::Null)),
        Some("exception") => {
            let text = result
                .pointer("/exceptionDetails/text")
                .and_then(Value::as_str)
                .unwrap_or("script threw")
                .to_string();
            Err(Error::script_error(text))
        }
        _ => Err(Error::protocol(format!(
            "Unexpected script result: {result}"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives() {
        assert_eq!(
            remote_to_json(&json!({"type": "string", "value": "complete"})),
            json!("complete")
        );
        assert_eq!(
            remote_to_json(&json!({"type": "boolean", "value": true})),
            json!(true)
        );
        assert_eq!(remote_to_json(&json!({"type": "undefined"})), Value::Null);
        assert_eq!(remote_to_json(&json!({"type": "number", "value": 3})), json!(3));
    }

    #[test]
    fn test_special_numbers() {
        assert_eq!(
            remote_to_json(&json!({"type": "number", "value": "NaN"})),
            Value::Null
        );
        assert_eq!(
            remote_to_json(&json!({"type": "number", "value": "-0"})),
            json!(0)
        );
    }

    #[test]
    fn test_nested_object() {
        let remote = json!({
            "type": "object",
            "value": [
                ["count", {"type": "number", "value": 2}],
                ["items", {"type": "array", "value": [
                    {"type": "string", "value": "a"},
                    {"type": "null"}
                ]}]
            ]
        });
        assert_eq!(remote_to_json(&remote), json!({"count": 2, "items": ["a", null]}));
    }

    #[test]
    fn test_node_value() {
        let remote = json!({"type": "node", "sharedId": "n-1", "value": {"nodeType": 1}});
        assert_eq!(remote_to_json(&remote), json!({"sharedId": "n-1"}));
        assert_eq!(shared_id(&remote), Some(ElementId::new("n-1")));
    }

    #[test]
    fn test_script_result_exception() {
        let result = json!({
            "type": "exception",
            "exceptionDetails": {"text": "ReferenceError: jQuery is not defined"}
        });
        let err = script_result(result).expect_err("exception");
        assert!(err.to_string().contains("ReferenceError"));
    }

    #[test]
    fn test_script_result_success() {
        let result = json!({
            "type": "success",
            "realm": "r",
            "result": {"type": "boolean", "value": false}
        });
        assert_eq!(script_result(result).expect("success"), json!(false));
    }
}
