//! Error types for terminology API calls.
//!
//! Every operation of [`TerminologyClient`](super::TerminologyClient) fails
//! with exactly one [`ApiError`] kind, whatever the endpoint:
//!
//! - **HTTP errors**: the server answered with a non-success status
//! - **Network errors**: the request went out but no response came back
//! - **Generic errors**: anything else, including faults raised before the
//!   request was dispatched and undecodable response bodies

use reqwest::StatusCode;
use thiserror::Error;

/// Fixed message reported for every network-class failure.
pub const NETWORK_ERROR_MESSAGE: &str = "Network Error: No response received from server";

/// Message used when a generic failure carries no message of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

/// Classified failure of a single API call.
///
/// # Example
///
/// ```rust,no_run
/// use namaste_explorer::http::ApiError;
///
/// fn describe(err: &ApiError) -> String {
///     match err {
///         ApiError::Http { status, .. } => format!("server said {}", status.as_u16()),
///         ApiError::Network(_) => "server unreachable".to_string(),
///         ApiError::Generic(message) => message.clone(),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned a non-success HTTP status code.
    ///
    /// `message` is the serialized response body, or the transport's own
    /// description when the body was empty or unreadable.
    #[error("API Error: {} - {}", .status.as_u16(), .message)]
    Http {
        /// The HTTP status code returned by the server.
        status: StatusCode,
        /// Message derived from the response body.
        message: String,
    },

    /// The request was sent but no response was received.
    ///
    /// Covers connection refused, DNS failure and the 30 second timeout.
    /// The display text is fixed; the transport error is kept as the source.
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(#[source] reqwest::Error),

    /// Any other failure, such as a missing required parameter or a
    /// response body that does not match the expected shape.
    #[error("{0}")]
    Generic(String),
}

impl ApiError {
    /// Builds a generic error, substituting a fixed message when none is given.
    pub fn generic(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            ApiError::Generic(UNKNOWN_ERROR_MESSAGE.to_string())
        } else {
            ApiError::Generic(message)
        }
    }

    /// Classifies a transport failure.
    ///
    /// Builder errors happen before anything is put on the wire and are
    /// generic; every other transport failure means no response arrived.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::generic(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }

    /// Short label used in logs and by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Http { .. } => "http",
            ApiError::Network(_) => "network",
            ApiError::Generic(_) => "generic",
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::generic(format!("Invalid request URL: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_embeds_status_and_body() {
        let err = ApiError::Http {
            status: StatusCode::NOT_FOUND,
            message: r#"{"detail":"not found"}"#.to_string(),
        };
        assert_eq!(err.to_string(), r#"API Error: 404 - {"detail":"not found"}"#);
        assert_eq!(err.kind(), "http");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_generic_without_message_uses_fixed_text() {
        assert_eq!(ApiError::generic("").to_string(), UNKNOWN_ERROR_MESSAGE);
        assert_eq!(ApiError::generic("boom").to_string(), "boom");
    }

    #[test]
    fn test_json_error_is_generic() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ApiError = json_err.into();
        assert_eq!(err.kind(), "generic");
    }
}
