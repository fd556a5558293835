//! Helpers shared by the HTTP layer.

use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use super::error::ApiError;

/// Builds the message carried by an HTTP error.
///
/// A JSON body is re-serialized compactly, other text is JSON-quoted, and an
/// empty or unreadable body falls back to the transport's own wording.
pub fn error_body_message(status: StatusCode, body: Option<&str>) -> String {
    match body.map(str::trim) {
        Some(text) if !text.is_empty() => {
            let value = serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()));
            value.to_string()
        },
        _ => format!("Request failed with status code {}", status.as_u16()),
    }
}

/// Appends an endpoint path to the base URL.
///
/// Any path prefix on the base is kept: `http://host/api` + `/health` is
/// `http://host/api/health`.
pub(crate) fn endpoint_url(base_url: &Url, path: &str) -> Result<Url, ApiError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

/// Returns the full URL a call would hit, dropping empty parameters.
///
/// Used to preview a request before sending it.
pub fn request_url(base_url: &Url, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
    let mut url = endpoint_url(base_url, path)?;
    let kept: Vec<_> = params.iter().filter(|(_, value)| !value.is_empty()).collect();
    if !kept.is_empty() {
        url.query_pairs_mut().extend_pairs(kept.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}
