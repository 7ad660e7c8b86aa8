//! HTTP and JSON helpers shared by the market services.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::MarketError;

/// Builds a [`reqwest::Client`] with default headers and a timeout.
///
/// # Errors
///
/// Returns [`MarketError::Parse`] for an invalid header, or
/// [`MarketError::Http`] if the client cannot be built.
pub fn build_client(
    headers: &BTreeMap<String, String>,
    timeout_secs: u64,
) -> Result<reqwest::Client, MarketError> {
    let mut header_map = reqwest::header::HeaderMap::new();
    for (key, value) in headers {
        let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| MarketError::Parse(format!("invalid header name '{key}': {e}")))?;
        let val = reqwest::header::HeaderValue::from_str(value)
            .map_err(|e| MarketError::Parse(format!("invalid header value '{value}': {e}")))?;
        header_map.insert(name, val);
    }
    reqwest::Client::builder()
        .default_headers(header_map)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(MarketError::Http)
}

/// Navigates a dot-separated path into a [`serde_json::Value`]. An empty
/// path returns the value itself.
#[must_use]
pub fn resolve_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            serde_json::Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            other => other.get(segment)?,
        };
    }
    Some(current)
}

/// Reads a number that may be stored as a JSON number or as a string with
/// currency symbols and thousands separators (`"₹ 25,000"`).
#[must_use]
pub fn number_from_value(value: &serde_json::Value) -> Option<f64> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().ok()
        }
        _ => None,
    };
    number.filter(|n| n.is_finite())
}
