use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assertions::{AssertionResult, AssertionSpec};
use crate::auth::AuthConfig;
use crate::StringMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    #[default]
    None,
    Json,
    Form,
    Raw,
}

fn default_method() -> String {
    "GET".to_string()
}

/// A request definition as authored by the user, before any variable
/// substitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: StringMap,
    #[serde(default)]
    pub params: StringMap,
    #[serde(default)]
    pub body_type: BodyType,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub tests: Vec<AssertionSpec>,
}

impl RequestSpec {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: StringMap::new(),
            params: StringMap::new(),
            body_type: BodyType::None,
            body: None,
            auth: AuthConfig::None,
            tests: Vec::new(),
        }
    }
}

/// Input of one execution: the request plus the environment to resolve it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(flatten)]
    pub spec: RequestSpec,
    #[serde(default)]
    pub env_id: Option<u64>,
}

/// What was actually sent, with auth secrets masked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    pub headers: StringMap,
    pub params: StringMap,
    pub body_type: BodyType,
    pub body: Option<Value>,
    pub auth: AuthConfig,
}

/// Normalized response.
///
/// `headers` is flattened: when a name repeats, the last value in the
/// transport's iteration order wins. `body` is parsed JSON when the
/// content type says so and parsing succeeds, otherwise the decoded text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    pub headers: StringMap,
    pub body: Value,
    pub duration_ms: u64,
    pub size_bytes: u64,
    #[serde(default)]
    pub tests: Vec<AssertionResult>,
}

impl ResponseSnapshot {
    pub fn passed_tests(&self) -> usize {
        self.tests.iter().filter(|t| t.passed).count()
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub history_id: u64,
    pub request: RequestSnapshot,
    pub response: ResponseSnapshot,
}
