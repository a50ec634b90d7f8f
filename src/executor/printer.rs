use std::fmt::Write;

use colored::{Color, Colorize};
use serde_json::Value;

use crate::auth::AuthConfig;
use crate::store::HistoryEntry;

use super::models::{ExecutionResult, RequestSnapshot, ResponseSnapshot};

pub fn print_execution_result(result: &ExecutionResult) {
    print!("{}", render_execution_result(result));
}

pub fn print_history_entry(entry: &HistoryEntry) {
    print!("{}", render_history_entry(entry));
}

fn render_execution_result(result: &ExecutionResult) -> String {
    let mut out = render_exchange(&result.request, &result.response);
    let _ = writeln!(
        out,
        "{} {}",
        "History:".bold(),
        format!("#{}", result.history_id).dimmed()
    );
    out
}

fn render_history_entry(entry: &HistoryEntry) -> String {
    let mut out = format!(
        "{} {}\n",
        format!("#{}", entry.id).bold(),
        entry
            .created_at
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string()
            .dimmed()
    );
    out.push_str(&render_exchange(&entry.request_snapshot, &entry.response_snapshot));
    out
}

fn render_exchange(request: &RequestSnapshot, response: &ResponseSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", request.method.bold(), request.url.cyan());
    let _ = writeln!(
        out,
        "{} {} {}",
        "Status:".bold(),
        format!("{}", response.status_code).color(status_color(response.status_code)),
        format!(
            "({} ms, {} bytes)",
            response.duration_ms, response.size_bytes
        )
        .dimmed()
    );

    if request.auth != AuthConfig::None {
        let _ = writeln!(out, "{} {}", "Auth:".bold(), request.auth.kind().dimmed());
    }

    if !request.params.is_empty() {
        let _ = writeln!(out, "{}", "Query".bold());
        for (name, value) in &request.params {
            let _ = writeln!(out, "  {}={}", name.cyan(), value.dimmed());
        }
    }

    let _ = writeln!(out, "{}", "Response headers".bold());
    for (name, value) in &response.headers {
        let _ = writeln!(out, "  {}: {}", name.cyan(), value.dimmed());
    }

    let _ = writeln!(out, "{}", "Body".bold());
    let _ = writeln!(out, "{}", render_body(&response.body));

    if !response.tests.is_empty() {
        let _ = writeln!(
            out,
            "{} {}",
            "Tests:".bold(),
            format!("{}/{} passed", response.passed_tests(), response.tests.len()).dimmed()
        );
        for test in &response.tests {
            let kind = test
                .kind
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| test.kind.to_string());
            let mark = if test.passed {
                "PASS".green()
            } else {
                "FAIL".red()
            };
            let _ = writeln!(out, "  {} {} {}", mark, kind.bold(), test.message.dimmed());
        }
    }
    out
}

fn status_color(status: u16) -> Color {
    if status >= 400 {
        Color::Red
    } else if status >= 300 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn render_body(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::AssertionResult;
    use crate::auth::AuthConfig;
    use crate::executor::BodyType;
    use crate::StringMap;
    use serde_json::json;

    fn request() -> RequestSnapshot {
        RequestSnapshot {
            method: "GET".to_string(),
            url: "https://example.com/resource".to_string(),
            headers: StringMap::new(),
            params: [("page".to_string(), "2".to_string())].into_iter().collect(),
            body_type: BodyType::None,
            body: None,
            auth: AuthConfig::None,
        }
    }

    #[test]
    fn status_color_by_class() {
        assert_eq!(status_color(204), Color::Green);
        assert_eq!(status_color(302), Color::Yellow);
        assert_eq!(status_color(503), Color::Red);
    }

    #[test]
    fn render_body_pretty_prints_json() {
        assert_eq!(render_body(&json!("plain")), "plain");
        assert_eq!(render_body(&json!({"a": 1})), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn execution_result_lists_query_auth_and_tests() {
        colored::control::set_override(false);
        let mut request = request();
        request.auth = AuthConfig::Bearer {
            token: "****".to_string(),
        };
        let result = ExecutionResult {
            history_id: 3,
            request,
            response: ResponseSnapshot {
                status_code: 404,
                headers: [("x-trace".to_string(), "abc".to_string())].into_iter().collect(),
                body: json!({"error": "missing"}),
                duration_ms: 42,
                size_bytes: 20,
                tests: vec![AssertionResult {
                    kind: json!("status_code"),
                    passed: false,
                    message: "expected 200, got 404".to_string(),
                }],
            },
        };

        let rendered = render_execution_result(&result);
        assert!(rendered.starts_with("GET https://example.com/resource\n"));
        assert!(rendered.contains("Status: 404 (42 ms, 20 bytes)"));
        assert!(rendered.contains("Auth: bearer"));
        assert!(rendered.contains("  page=2"));
        assert!(rendered.contains("  x-trace: abc"));
        assert!(rendered.contains("\"error\": \"missing\""));
        assert!(rendered.contains("Tests: 0/1 passed"));
        assert!(rendered.contains("  FAIL status_code expected 200, got 404"));
        assert!(rendered.ends_with("History: #3\n"));
        assert!(!rendered.contains("****"));
    }
}
