//! Small string and clock helpers shared by config, auth and the remote.

/// Trim optional text, treating blank values as absent.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn is_http_url(value: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

const ERROR_EXCERPT_CHARS: usize = 180;

/// Leading slice of an HTTP error body, short enough for one log line.
pub fn error_excerpt(body: &str) -> String {
    body.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(ERROR_EXCERPT_CHARS)
        .collect()
}

/// Unix seconds; session expiry is expressed in these.
pub fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}
