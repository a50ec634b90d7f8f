use serde::{Deserialize, Serialize};

/// Literal written in place of a secret in snapshots.
pub const SECRET_MASK: &str = "****";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyLocation {
    #[default]
    Header,
    Query,
}

/// Auth settings attached to a request.
///
/// On the wire this is a flat object with a `type` discriminator
/// (`none`, `bearer`, `basic`, `api_key`). Anything else, including a missing
/// `type`, reads back as [`AuthConfig::None`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", from = "RawAuth")]
pub enum AuthConfig {
    #[default]
    None,
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
    ApiKey {
        key: String,
        value: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
}

impl AuthConfig {
    /// Rewrites every non-empty secret field (`token`, `password`, `value`).
    /// Empty secrets are kept as they are.
    pub fn map_secrets(&self, mut f: impl FnMut(&str) -> String) -> AuthConfig {
        let mut apply = |secret: &str| {
            if secret.is_empty() {
                String::new()
            } else {
                f(secret)
            }
        };

        match self {
            AuthConfig::None => AuthConfig::None,
            AuthConfig::Bearer { token } => AuthConfig::Bearer {
                token: apply(token),
            },
            AuthConfig::Basic { username, password } => AuthConfig::Basic {
                username: username.clone(),
                password: apply(password),
            },
            AuthConfig::ApiKey {
                key,
                value,
                location,
            } => AuthConfig::ApiKey {
                key: key.clone(),
                value: apply(value),
                location: *location,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::ApiKey { .. } => "api_key",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAuth {
    #[serde(rename = "type")]
    kind: Option<String>,
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    key: Option<String>,
    value: Option<String>,
    #[serde(rename = "in")]
    location: Option<String>,
}

impl From<RawAuth> for AuthConfig {
    fn from(raw: RawAuth) -> Self {
        match raw.kind.as_deref() {
            Some("bearer") => AuthConfig::Bearer {
                token: raw.token.unwrap_or_default(),
            },
            Some("basic") => AuthConfig::Basic {
                username: raw.username.unwrap_or_default(),
                password: raw.password.unwrap_or_default(),
            },
            Some("api_key") => AuthConfig::ApiKey {
                key: raw.key.unwrap_or_default(),
                value: raw.value.unwrap_or_default(),
                location: match raw.location.as_deref() {
                    Some("query") => ApiKeyLocation::Query,
                    _ => ApiKeyLocation::Header,
                },
            },
            _ => AuthConfig::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn reads_flat_wire_shape() {
        let auth: AuthConfig = serde_json::from_value(json!({
            "type": "api_key",
            "key": "X-Api-Key",
            "value": "k1",
            "in": "query",
            "token": null
        }))
        .unwrap();
        assert_eq!(
            auth,
            AuthConfig::ApiKey {
                key: "X-Api-Key".to_string(),
                value: "k1".to_string(),
                location: ApiKeyLocation::Query,
            }
        );
    }

    #[test]
    fn unknown_or_missing_type_is_none() {
        let unknown: AuthConfig = serde_json::from_value(json!({"type": "oauth2"})).unwrap();
        let missing: AuthConfig = serde_json::from_value(json!({"token": "t"})).unwrap();
        assert_eq!(unknown, AuthConfig::None);
        assert_eq!(missing, AuthConfig::None);
    }

    #[test]
    fn api_key_location_defaults_to_header() {
        let auth: AuthConfig =
            serde_json::from_value(json!({"type": "api_key", "key": "k", "value": "v", "in": "cookie"}))
                .unwrap();
        assert!(matches!(
            auth,
            AuthConfig::ApiKey {
                location: ApiKeyLocation::Header,
                ..
            }
        ));
    }

    #[test]
    fn writes_tagged_shape() {
        let auth = AuthConfig::Basic {
            username: "ann".to_string(),
            password: "pw".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&auth).unwrap(),
            json!({"type": "basic", "username": "ann", "password": "pw"})
        );
        assert_eq!(
            serde_json::to_value(AuthConfig::None).unwrap(),
            json!({"type": "none"})
        );
    }

    #[test]
    fn map_secrets_skips_empty_fields() {
        let auth = AuthConfig::Basic {
            username: "ann".to_string(),
            password: String::new(),
        };
        let mapped = auth.map_secrets(|_| "changed".to_string());
        assert_eq!(mapped, auth);
    }
}
