use base64::Engine;

use crate::StringMap;

use super::model::{ApiKeyLocation, AuthConfig, SECRET_MASK};

const AUTHORIZATION: &str = "Authorization";

/// Injects the credentials described by `auth` into the outgoing headers or
/// query parameters.
pub fn apply_auth(headers: &mut StringMap, params: &mut StringMap, auth: &AuthConfig) {
    match auth {
        AuthConfig::None => {}
        AuthConfig::Bearer { token } => {
            if !token.is_empty() {
                set_header(headers, AUTHORIZATION, format!("Bearer {token}"));
            }
        }
        AuthConfig::Basic { username, password } => {
            let credentials = format!("{username}:{password}");
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
            set_header(headers, AUTHORIZATION, format!("Basic {encoded}"));
        }
        AuthConfig::ApiKey {
            key,
            value,
            location,
        } => {
            if key.is_empty() || value.is_empty() {
                return;
            }
            match location {
                ApiKeyLocation::Query => {
                    params.insert(key.clone(), value.clone());
                }
                ApiKeyLocation::Header => set_header(headers, key, value.clone()),
            }
        }
    }
}

/// Copy of `auth` with every non-empty secret replaced by [`SECRET_MASK`].
pub fn redact_auth(auth: &AuthConfig) -> AuthConfig {
    auth.map_secrets(|_| SECRET_MASK.to_string())
}

// Header names are case-insensitive; drop any differently-cased duplicate so
// only one value goes out.
fn set_header(headers: &mut StringMap, name: &str, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}
