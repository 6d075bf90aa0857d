use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

use crate::AdapterError;

/// Client with a per-request timeout covering connect, send and body read.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build venue http client")
}

/// Success body as JSON; non-2xx becomes [`AdapterError::Api`].
pub(crate) async fn read_json(resp: reqwest::Response) -> Result<Value, AdapterError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AdapterError::Api {
            status: status.as_u16(),
            message: truncate(&body, 200),
        });
    }
    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| AdapterError::Decode(e.to_string()))
}

/// `{"<key>": X}` -> `X`; anything else passes through.
pub(crate) fn unwrap_envelope(v: Value, key: &str) -> Value {
    match v {
        Value::Object(mut m) if m.contains_key(key) => m.remove(key).unwrap_or(Value::Null),
        other => other,
    }
}

/// Endpoint-level degradation: log and fall back to an empty value.
pub(crate) fn or_empty<T: Default>(
    r: Result<T, AdapterError>,
    venue: &str,
    account: u32,
    endpoint: &str,
) -> T {
    match r {
        Ok(v) => v,
        Err(e) => {
            warn!(venue, account, endpoint, error = %e, "endpoint fetch failed, using empty result");
            T::default()
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_unwraps_only_when_present() {
        assert_eq!(unwrap_envelope(json!({"result": [1]}), "result"), json!([1]));
        assert_eq!(unwrap_envelope(json!({"other": 1}), "result"), json!({"other": 1}));
        assert_eq!(unwrap_envelope(json!([1, 2]), "result"), json!([1, 2]));
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("账户失败了", 2), "账户...");
    }
}
