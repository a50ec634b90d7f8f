use serde_json::Value;

use crate::executor::ResponseSnapshot;

use super::model::{AssertionResult, AssertionSpec};

/// Runs every check against `snapshot`. Output order and length match
/// `tests`; a failing or malformed check never stops the others.
pub fn evaluate(tests: &[AssertionSpec], snapshot: &ResponseSnapshot) -> Vec<AssertionResult> {
    tests
        .iter()
        .map(|test| {
            let (passed, message) = check(test, snapshot);
            AssertionResult {
                kind: test.kind(),
                passed,
                message,
            }
        })
        .collect()
}

fn check(test: &AssertionSpec, snapshot: &ResponseSnapshot) -> (bool, String) {
    match test {
        AssertionSpec::StatusCode { expected } => {
            let passed = expected.as_f64() == Some(f64::from(snapshot.status_code));
            (
                passed,
                format!(
                    "expected {}, got {}",
                    display_value(expected),
                    snapshot.status_code
                ),
            )
        }
        AssertionSpec::JsonKey { key } => match (key.as_deref(), &snapshot.body) {
            (None | Some(""), _) => (false, "no key given".to_string()),
            (Some(key), Value::Object(map)) => {
                if map.contains_key(key) {
                    (true, format!("key '{key}' present"))
                } else {
                    (false, format!("missing key '{key}'"))
                }
            }
            (Some(key), _) => (
                false,
                format!("body is not a JSON object, cannot look up key '{key}'"),
            ),
        },
        AssertionSpec::Equals { actual, expected } => (
            json_eq(actual, expected),
            format!(
                "expected {}, got {}",
                display_value(expected),
                display_value(actual)
            ),
        ),
        AssertionSpec::Unknown(_) => (false, "unknown test".to_string()),
    }
}

/// Structural equality where numbers compare by value, so `1` equals `1.0`.
fn json_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_eq(x, y)))
        }
        _ => left == right,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn snapshot(status: u16, body: Value) -> ResponseSnapshot {
        ResponseSnapshot {
            status_code: status,
            headers: Default::default(),
            body,
            duration_ms: 3,
            size_bytes: 0,
            tests: Vec::new(),
        }
    }

    #[test]
    fn status_code_reports_both_values() {
        let results = evaluate(
            &[AssertionSpec::status_code(200), AssertionSpec::status_code(404)],
            &snapshot(200, Value::Null),
        );
        assert!(results[0].passed);
        assert_eq!(results[0].message, "expected 200, got 200");
        assert!(!results[1].passed);
        assert_eq!(results[1].message, "expected 404, got 200");
        assert_eq!(results[1].kind, json!("status_code"));
    }

    #[test]
    fn status_code_without_expected_fails() {
        let results = evaluate(
            &[AssertionSpec::StatusCode {
                expected: Value::Null,
            }],
            &snapshot(200, Value::Null),
        );
        assert!(!results[0].passed);
        assert_eq!(results[0].message, "expected null, got 200");
    }

    #[test]
    fn json_key_checks_object_bodies() {
        let snap = snapshot(200, json!({"id": 7}));
        let results = evaluate(
            &[AssertionSpec::json_key("id"), AssertionSpec::json_key("name")],
            &snap,
        );
        assert!(results[0].passed);
        assert_eq!(results[0].message, "key 'id' present");
        assert!(!results[1].passed);
        assert_eq!(results[1].message, "missing key 'name'");
    }

    #[test]
    fn json_key_on_text_body_fails_cleanly() {
        let results = evaluate(
            &[
                AssertionSpec::json_key("id"),
                AssertionSpec::JsonKey { key: None },
            ],
            &snapshot(200, json!("plain text")),
        );
        assert!(!results[0].passed);
        assert!(results[0].message.contains("not a JSON object"));
        assert!(!results[1].passed);
    }

    #[test]
    fn equals_compares_supplied_values_only() {
        let snap = snapshot(500, json!({"a": 1}));
        let results = evaluate(
            &[
                AssertionSpec::Equals {
                    actual: json!({"x": [1, 2]}),
                    expected: json!({"x": [1, 2]}),
                },
                AssertionSpec::Equals {
                    actual: json!("a"),
                    expected: json!("b"),
                },
            ],
            &snap,
        );
        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert_eq!(results[1].message, "expected b, got a");
    }

    #[test]
    fn equals_treats_integer_and_float_as_same_number() {
        let results = evaluate(
            &[
                AssertionSpec::Equals {
                    actual: json!(1),
                    expected: json!(1.0),
                },
                AssertionSpec::Equals {
                    actual: json!({"n": [2, {"m": 3}]}),
                    expected: json!({"n": [2.0, {"m": 3.0}]}),
                },
                AssertionSpec::Equals {
                    actual: json!(1),
                    expected: json!(1.5),
                },
                AssertionSpec::Equals {
                    actual: json!(1),
                    expected: json!("1"),
                },
            ],
            &snapshot(200, Value::Null),
        );
        assert!(results[0].passed);
        assert_eq!(results[0].message, "expected 1.0, got 1");
        assert!(results[1].passed);
        assert!(!results[2].passed);
        assert!(!results[3].passed);
    }

    #[test]
    fn unknown_kinds_fail_and_echo_type() {
        let tests = vec![
            AssertionSpec::Unknown(json!({"type": "header"})),
            AssertionSpec::status_code(200),
        ];
        let results = evaluate(&tests, &snapshot(200, Value::Null));
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            AssertionResult {
                kind: json!("header"),
                passed: false,
                message: "unknown test".to_string(),
            }
        );
        assert!(results[1].passed);
    }
}
