use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;

use crate::assertions::evaluate;
use crate::auth::{apply_auth, redact_auth};
use crate::config::Settings;
use crate::env::{substitute, substitute_map, expand_placeholders, EnvMap};
use crate::error::{DispatchError, Error, Result};
use crate::store::{EnvironmentStore, HistoryStore, NewHistoryEntry, RequestStore};

use super::dispatch::{dispatch, PreparedRequest};
use super::models::{ExecuteRequest, ExecutionResult, RequestSnapshot};

static SCHEME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("valid regex"));

/// Which environment a stored request runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvSelection {
    None,
    Id(u64),
    Active,
}

/// Runs one request end to end: environment lookup, variable substitution,
/// base URL joining, auth, dispatch, assertions and finally the history
/// record.
///
/// Nothing is written to history unless the call and the assertions both
/// complete.
pub async fn execute<S>(
    store: &S,
    settings: &Settings,
    request: &ExecuteRequest,
) -> Result<ExecutionResult>
where
    S: EnvironmentStore + HistoryStore + ?Sized,
{
    let (variables, base_url) = match request.env_id {
        Some(id) => {
            let environment = store.get_environment(id).map_err(|err| {
                if err.is_not_found() {
                    tracing::warn!(env_id = id, "environment not found");
                }
                err
            })?;
            (environment.variables, environment.base_url)
        }
        None => (EnvMap::new(), String::new()),
    };

    let spec = &request.spec;
    let url = expand_placeholders(&spec.url, &variables).into_owned();
    let mut headers = substitute_map(&spec.headers, &variables);
    let mut params = substitute_map(&spec.params, &variables);
    let body = spec.body.as_ref().map(|value| substitute(value, &variables));

    let url = resolve_url(&base_url, &url);
    tracing::debug!(%url, env_id = ?request.env_id, "request resolved");

    apply_auth(&mut headers, &mut params, &spec.auth);

    let prepared = PreparedRequest::new(
        &spec.method,
        url,
        headers,
        params,
        spec.body_type,
        body.as_ref(),
    )?;

    let client = Client::builder()
        .timeout(settings.request_timeout())
        .build()
        .map_err(|err| DispatchError::new(prepared.method.as_str(), &prepared.url, err))?;

    let mut response = match dispatch(&client, &prepared).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(method = %err.method, url = %err.url, cause = %err.cause, "dispatch failed");
            return Err(Error::Dispatch(err));
        }
    };
    tracing::info!(
        method = %prepared.method,
        url = %prepared.url,
        status = response.status_code,
        duration_ms = response.duration_ms,
        size_bytes = response.size_bytes,
        "request completed"
    );

    response.tests = evaluate(&spec.tests, &response);

    let request_snapshot = RequestSnapshot {
        method: prepared.method.as_str().to_string(),
        url: prepared.url,
        headers: prepared.headers,
        params: prepared.params,
        body_type: spec.body_type,
        body,
        auth: redact_auth(&spec.auth),
    };

    let history_id = store.append_history(NewHistoryEntry {
        request_snapshot: request_snapshot.clone(),
        response_snapshot: response.clone(),
        duration_ms: response.duration_ms,
    })?;

    Ok(ExecutionResult {
        history_id,
        request: request_snapshot,
        response,
    })
}

/// Runs a saved request by id.
pub async fn execute_saved_request<S>(
    store: &S,
    settings: &Settings,
    request_id: u64,
    env: EnvSelection,
) -> Result<ExecutionResult>
where
    S: RequestStore + EnvironmentStore + HistoryStore + ?Sized,
{
    let saved = store.get_request(request_id)?;
    let env_id = match env {
        EnvSelection::None => None,
        EnvSelection::Id(id) => Some(id),
        EnvSelection::Active => store.active_environment()?.map(|environment| environment.id),
    };

    execute(
        store,
        settings,
        &ExecuteRequest {
            spec: saved.spec,
            env_id,
        },
    )
    .await
}

/// Joins a request URL onto an environment base URL.
///
/// Paths starting with `/` are appended to the base. Relative paths get
/// exactly one `/` between base and path. URLs that already carry a scheme,
/// or an empty base, leave `url` as is.
pub fn resolve_url(base_url: &str, url: &str) -> String {
    if base_url.is_empty() {
        return url.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{base}{url}")
    } else if SCHEME_PATTERN.is_match(url) {
        url.to_string()
    } else {
        format!("{base}/{}", url.trim_start_matches('/'))
    }
}
