use std::time::Instant;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client, Method,
};
use serde_json::Value;
use url::Url;

use crate::error::{DispatchError, Error, Result};
use crate::StringMap;

use super::models::{BodyType, ResponseSnapshot};

/// Request body already encoded for the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Raw(String),
}

/// A fully resolved request that passed validation and is ready to send.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: StringMap,
    pub params: StringMap,
    pub body: PreparedBody,
}

impl PreparedRequest {
    /// Checks the method token and header table and encodes the body.
    /// Nothing touches the network here.
    pub fn new(
        method: &str,
        url: String,
        headers: StringMap,
        params: StringMap,
        body_type: BodyType,
        body: Option<&Value>,
    ) -> Result<Self> {
        let upper = method.trim().to_ascii_uppercase();
        let method = Method::from_bytes(upper.as_bytes())
            .map_err(|_| Error::validation(format!("invalid HTTP method {method:?}")))?;

        for (name, value) in &headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::validation(format!("invalid header name {name:?}")))?;
            HeaderValue::from_str(value)
                .map_err(|_| Error::validation(format!("invalid value for header {name:?}")))?;
        }

        Ok(Self {
            method,
            url,
            headers,
            params,
            body: encode_body(body_type, body)?,
        })
    }
}

fn encode_body(body_type: BodyType, body: Option<&Value>) -> Result<PreparedBody> {
    let body = body.filter(|value| !value.is_null());
    Ok(match body_type {
        BodyType::None => PreparedBody::Empty,
        BodyType::Json => match body {
            Some(value) => PreparedBody::Json(value.clone()),
            None => PreparedBody::Empty,
        },
        BodyType::Form => PreparedBody::Form(encode_form(body)?),
        BodyType::Raw => PreparedBody::Raw(match body {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }),
    })
}

fn encode_form(body: Option<&Value>) -> Result<Vec<(String, String)>> {
    let Some(body) = body else {
        return Ok(Vec::new());
    };
    let Value::Object(map) = body else {
        return Err(Error::validation("form body must be a JSON object"));
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), form_scalar(key, item)?));
                }
            }
            other => pairs.push((key.clone(), form_scalar(key, other)?)),
        }
    }
    Ok(pairs)
}

fn form_scalar(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Null => Ok(String::new()),
        Value::Bool(_) | Value::Number(_) => Ok(value.to_string()),
        Value::Array(_) | Value::Object(_) => Err(Error::validation(format!(
            "form field {key:?} cannot hold a nested value"
        ))),
    }
}

/// Sends `request` and normalizes the response. The reported duration covers
/// only the send and the body download.
pub async fn dispatch(
    client: &Client,
    request: &PreparedRequest,
) -> std::result::Result<ResponseSnapshot, DispatchError> {
    let method = request.method.as_str();
    let fail = |cause: &dyn std::fmt::Display| DispatchError::new(method, &request.url, cause);

    let url = Url::parse(&request.url).map_err(|err| fail(&err))?;

    let mut builder = client.request(request.method.clone(), url);
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    if !request.params.is_empty() {
        builder = builder.query(&request.params);
    }
    builder = match &request.body {
        PreparedBody::Empty => builder,
        PreparedBody::Json(value) => builder.json(value),
        PreparedBody::Form(pairs) => builder.form(pairs),
        PreparedBody::Raw(text) => builder.body(text.clone()),
    };
    let outbound = builder.build().map_err(|err| fail(&err))?;

    let start = Instant::now();
    let response = client.execute(outbound).await.map_err(|err| fail(&err))?;
    let status = response.status();
    let header_map = response.headers().clone();
    let bytes = response.bytes().await.map_err(|err| fail(&err))?;
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let headers = collect_headers(&header_map);
    let content_type = header_map
        .get(CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();

    Ok(ResponseSnapshot {
        status_code: status.as_u16(),
        headers,
        body: decode_body(&bytes, &content_type),
        duration_ms,
        size_bytes: bytes.len() as u64,
        tests: Vec::new(),
    })
}

fn collect_headers(headers: &HeaderMap) -> StringMap {
    let mut flat = StringMap::new();
    for (name, value) in headers {
        flat.insert(
            name.as_str().to_string(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    flat
}

fn decode_body(bytes: &[u8], content_type: &str) -> Value {
    if content_type.contains("application/json") {
        if let Ok(parsed) = serde_json::from_slice::<Value>(bytes) {
            return parsed;
        }
    }
    Value::String(String::from_utf8_lossy(bytes).into_owned())
}
