use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assertions::AssertionSpec;
use crate::auth::AuthConfig;
use crate::env::EnvMap;
use crate::error::{Error, Result};
use crate::executor::{BodyType, RequestSnapshot, RequestSpec, ResponseSnapshot};
use crate::StringMap;

const MAX_COLLECTION_NAME: usize = 150;
const MAX_DESCRIPTION: usize = 500;
const MAX_ENVIRONMENT_NAME: usize = 100;
const MAX_BASE_URL: usize = 500;
const MAX_REQUEST_NAME: usize = 150;
const MAX_URL: usize = 800;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCollection {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub variables: EnvMap,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewEnvironment {
    pub name: String,
    pub base_url: String,
    pub variables: EnvMap,
}

/// Partial update. Activation goes through
/// [`EnvironmentStore::set_active`](super::EnvironmentStore::set_active) only.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentUpdate {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub variables: Option<EnvMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRequest {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub collection_id: Option<u64>,
    #[serde(flatten)]
    pub spec: RequestSpec,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub name: String,
    pub collection_id: Option<u64>,
    pub spec: RequestSpec,
}

/// Partial update. `collection_id` and `body` take `Some(None)` to clear the
/// stored value.
#[derive(Debug, Clone, Default)]
pub struct RequestUpdate {
    pub name: Option<String>,
    pub collection_id: Option<Option<u64>>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub headers: Option<StringMap>,
    pub params: Option<StringMap>,
    pub body_type: Option<BodyType>,
    pub body: Option<Option<Value>>,
    pub auth: Option<AuthConfig>,
    pub tests: Option<Vec<AssertionSpec>>,
}

impl RequestUpdate {
    pub(super) fn apply(self, request: &mut StoredRequest) {
        if let Some(name) = self.name {
            request.name = name;
        }
        if let Some(collection_id) = self.collection_id {
            request.collection_id = collection_id;
        }
        let spec = &mut request.spec;
        if let Some(method) = self.method {
            spec.method = method;
        }
        if let Some(url) = self.url {
            spec.url = url;
        }
        if let Some(headers) = self.headers {
            spec.headers = headers;
        }
        if let Some(params) = self.params {
            spec.params = params;
        }
        if let Some(body_type) = self.body_type {
            spec.body_type = body_type;
        }
        if let Some(body) = self.body {
            spec.body = body;
        }
        if let Some(auth) = self.auth {
            spec.auth = auth;
        }
        if let Some(tests) = self.tests {
            spec.tests = tests;
        }
    }
}

/// One recorded execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub request_snapshot: RequestSnapshot,
    pub response_snapshot: ResponseSnapshot,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub request_snapshot: RequestSnapshot,
    pub response_snapshot: ResponseSnapshot,
    pub duration_ms: u64,
}

pub(super) fn check_name(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    check_max(field, value, max)?;
    Ok(())
}

pub(super) fn check_max(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub(super) fn validate_collection(name: &str, description: &str) -> Result<()> {
    check_name("collection name", name, MAX_COLLECTION_NAME)?;
    check_max("description", description, MAX_DESCRIPTION)
}

pub(super) fn validate_environment(name: &str, base_url: &str) -> Result<()> {
    check_name("environment name", name, MAX_ENVIRONMENT_NAME)?;
    check_max("base url", base_url, MAX_BASE_URL)
}

pub(super) fn validate_request(name: &str, spec: &RequestSpec) -> Result<()> {
    check_name("request name", name, MAX_REQUEST_NAME)?;
    check_name("url", &spec.url, MAX_URL)
}
