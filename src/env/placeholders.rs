use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::env::EnvMap;

static VARIABLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid regex"));

/// Expands `{{ name }}` placeholders in a single string.
///
/// Unknown names are left in place, braces included. Inserted values are not
/// scanned again.
pub fn expand_placeholders<'a>(input: &'a str, vars: &EnvMap) -> Cow<'a, str> {
    VARIABLE_PATTERN.replace_all(input, |caps: &Captures<'_>| match vars.get(&caps[1]) {
        Some(value) => value.clone(),
        None => caps[0].to_string(),
    })
}

/// Recursively expands placeholders in every string leaf of a JSON value.
/// Object keys and non-string scalars are returned untouched.
pub fn substitute(value: &Value, vars: &EnvMap) -> Value {
    match value {
        Value::String(text) => Value::String(expand_placeholders(text, vars).into_owned()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), substitute(item, vars)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|item| substitute(item, vars)).collect()),
        other => other.clone(),
    }
}

/// Map flavour of [`substitute`] for header and query tables.
pub fn substitute_map<M>(map: &M, vars: &EnvMap) -> M
where
    for<'a> &'a M: IntoIterator<Item = (&'a String, &'a String)>,
    M: FromIterator<(String, String)>,
{
    map.into_iter()
        .map(|(key, value)| (key.clone(), expand_placeholders(value, vars).into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn vars() -> EnvMap {
        let mut env = EnvMap::new();
        env.insert("host".to_string(), "http://localhost:8080".to_string());
        env.insert("token".to_string(), "abc123".to_string());
        env
    }

    #[test]
    fn expands_known_names_with_optional_whitespace() {
        let rendered = expand_placeholders("{{host}}/users?t={{  token }}", &vars());
        assert_eq!(rendered, "http://localhost:8080/users?t=abc123");
    }

    #[test]
    fn leaves_unknown_names_verbatim() {
        let rendered = expand_placeholders("{{missing}} and {{ host }}", &vars());
        assert_eq!(rendered, "{{missing}} and http://localhost:8080");
    }

    #[test]
    fn ignores_malformed_placeholders() {
        let env = vars();
        assert_eq!(expand_placeholders("{{}}", &env), "{{}}");
        assert_eq!(expand_placeholders("{{host-name}}", &env), "{{host-name}}");
        assert_eq!(expand_placeholders("{host}", &env), "{host}");
    }

    #[test]
    fn does_not_rescan_inserted_values() {
        let mut env = EnvMap::new();
        env.insert("a".to_string(), "{{b}}".to_string());
        env.insert("b".to_string(), "nope".to_string());
        assert_eq!(expand_placeholders("{{a}}", &env), "{{b}}");
    }

    #[test]
    fn substitute_walks_objects_and_arrays() {
        let input = json!({
            "{{token}}": "{{token}}",
            "list": ["{{host}}", 1, null],
            "nested": {"flag": true, "url": "{{host}}/x"}
        });
        let output = substitute(&input, &vars());
        assert_eq!(
            output,
            json!({
                "{{token}}": "abc123",
                "list": ["http://localhost:8080", 1, null],
                "nested": {"flag": true, "url": "http://localhost:8080/x"}
            })
        );
    }

    #[test]
    fn substitute_keeps_scalars() {
        let env = vars();
        assert_eq!(substitute(&json!(42), &env), json!(42));
        assert_eq!(substitute(&json!(true), &env), json!(true));
        assert_eq!(substitute(&Value::Null, &env), Value::Null);
    }

    #[test]
    fn substitute_is_idempotent_for_plain_values() {
        let input = json!({"u": "{{host}}/{{unknown}}", "v": ["{{token}}"]});
        let once = substitute(&input, &vars());
        let twice = substitute(&once, &vars());
        assert_eq!(once, twice);
    }

    #[test]
    fn substitute_map_preserves_keys() {
        let mut headers = BTreeMap::new();
        headers.insert("X-{{token}}".to_string(), "Bearer {{token}}".to_string());
        headers.insert("Accept".to_string(), "*/*".to_string());

        let out = substitute_map(&headers, &vars());
        assert_eq!(
            out.keys().collect::<Vec<_>>(),
            headers.keys().collect::<Vec<_>>()
        );
        assert_eq!(out["X-{{token}}"], "Bearer abc123");
    }
}
