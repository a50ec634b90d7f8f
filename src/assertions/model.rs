use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A declarative check run against a response.
///
/// Stored as a flat object with a `type` discriminator. Entries with an
/// unrecognized `type` are kept verbatim in [`AssertionSpec::Unknown`] so they
/// survive a load/save cycle and evaluate as failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum AssertionSpec {
    StatusCode { expected: Value },
    JsonKey { key: Option<String> },
    Equals { actual: Value, expected: Value },
    Unknown(Value),
}

impl AssertionSpec {
    pub fn status_code(expected: u16) -> Self {
        AssertionSpec::StatusCode {
            expected: Value::from(expected),
        }
    }

    pub fn json_key(key: impl Into<String>) -> Self {
        AssertionSpec::JsonKey {
            key: Some(key.into()),
        }
    }

    /// The `type` value reported back in results.
    pub fn kind(&self) -> Value {
        match self {
            AssertionSpec::StatusCode { .. } => Value::from("status_code"),
            AssertionSpec::JsonKey { .. } => Value::from("json_key"),
            AssertionSpec::Equals { .. } => Value::from("equals"),
            AssertionSpec::Unknown(raw) => raw.get("type").cloned().unwrap_or(Value::Null),
        }
    }
}

impl From<Value> for AssertionSpec {
    fn from(value: Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str).map(str::to_owned);

        match kind.as_deref() {
            Some("status_code") => AssertionSpec::StatusCode {
                expected: field(&value, "expected"),
            },
            Some("json_key") => AssertionSpec::JsonKey {
                key: value.get("key").and_then(Value::as_str).map(str::to_owned),
            },
            Some("equals") => AssertionSpec::Equals {
                actual: field(&value, "actual"),
                expected: field(&value, "expected"),
            },
            _ => AssertionSpec::Unknown(value),
        }
    }
}

impl From<AssertionSpec> for Value {
    fn from(spec: AssertionSpec) -> Self {
        match spec {
            AssertionSpec::StatusCode { expected } => {
                json!({"type": "status_code", "expected": expected})
            }
            AssertionSpec::JsonKey { key } => json!({"type": "json_key", "key": key}),
            AssertionSpec::Equals { actual, expected } => {
                json!({"type": "equals", "actual": actual, "expected": expected})
            }
            AssertionSpec::Unknown(raw) => raw,
        }
    }
}

fn field(value: &Value, name: &str) -> Value {
    value.get(name).cloned().unwrap_or(Value::Null)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionResult {
    #[serde(rename = "type")]
    pub kind: Value,
    pub passed: bool,
    pub message: String,
}
