use std::time::Duration;

use log::{debug, warn};
use reqwest::{
    Method,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use url::Url;

use super::{
    error::ApiError,
    utils::{endpoint_url, error_body_message, request_url},
};
use crate::telemetry::RequestTelemetry;

pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_BASE_URL: &str = "https://namaste-icd-api.vercel.app";

/// One outbound request, consumed by [`HttpClient::send_request`].
#[derive(Debug, Clone)]
pub struct EndpointCall {
    pub method: Method,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub required: &'static [&'static str],
    pub body: Option<serde_json::Value>,
}

impl EndpointCall {
    pub fn get(path: &'static str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &'static str) -> Self {
        Self::new(Method::POST, path)
    }

    fn new(method: Method, path: &'static str) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            required: &[],
            body: None,
        }
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn query_opt(self, key: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Query parameters that must be present and non-blank.
    pub fn require(mut self, keys: &'static [&'static str]) -> Self {
        self.required = keys;
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    fn validate(&self) -> Result<(), ApiError> {
        for key in self.required {
            let present = self
                .query
                .iter()
                .any(|(k, value)| k == key && !value.trim().is_empty());
            if !present {
                return Err(ApiError::generic(format!("Missing required parameter: {}", key)));
            }
        }
        Ok(())
    }
}

/// Transport wrapper that times and counts every call.
pub(crate) struct HttpClient {
    base_url: Url,
    client: reqwest::Client,
    telemetry: RequestTelemetry,
}

impl HttpClient {
    pub fn new(base_url: Url) -> Result<Self, anyhow::Error> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, anyhow::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("namaste-explorer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            client,
            telemetry: RequestTelemetry::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn telemetry(&self) -> &RequestTelemetry {
        &self.telemetry
    }

    pub fn preview_url(&self, call: &EndpointCall) -> Result<Url, ApiError> {
        request_url(&self.base_url, call.path, &call.query)
    }

    /// Sends one call, bracketing it with start and completion telemetry.
    ///
    /// The start instant is local to this call, so concurrent calls never
    /// share timing state.
    pub async fn send_request<T: DeserializeOwned>(&self, call: EndpointCall) -> Result<T, ApiError> {
        let endpoint = call.label();
        let started = self.telemetry.begin_request().await;
        debug!(endpoint = &*endpoint; "HTTP: Request started");

        let outcome = self.dispatch(call).await;

        let elapsed_ms = self.telemetry.complete_request(started).await;
        match &outcome {
            Ok(_) => debug!(endpoint = &*endpoint, elapsed_ms = elapsed_ms; "HTTP: Request completed"),
            Err(e) => warn!(
                endpoint = &*endpoint,
                elapsed_ms = elapsed_ms,
                kind = e.kind(),
                status = e.status().map(|s| s.as_u16()).unwrap_or_default();
                "HTTP: Request failed: {}", e
            ),
        }
        outcome
    }

    async fn dispatch<T: DeserializeOwned>(&self, call: EndpointCall) -> Result<T, ApiError> {
        call.validate()?;
        let url = endpoint_url(&self.base_url, call.path)?;

        let mut req = self.client.request(call.method, url);
        if !call.query.is_empty() {
            req = req.query(&call.query);
        }
        if let Some(body) = &call.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(ApiError::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.ok();
            let message = error_body_message(status, body.as_deref());
            return Err(ApiError::Http { status, message });
        }

        // A response arrived, so body failures are generic.
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ApiError::generic(format!("Failed to read response body: {}", e)))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::generic(format!("Failed to decode response body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client_for(server: &MockServer) -> HttpClient {
        HttpClient::new(Url::parse(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_every_request_carries_json_content_type() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let value: Value = client.send_request(EndpointCall::get("/health")).await.unwrap();

        assert_eq!(value["status"], "healthy");
    }

    #[tokio::test]
    async fn test_missing_required_param_is_generic_and_counted() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;

        let call = EndpointCall::get("/api/v1/search").query("q", "  ").require(&["q"]);
        let err = client.send_request::<Value>(call).await.unwrap_err();

        assert!(matches!(err, ApiError::Generic(ref m) if m == "Missing required parameter: q"));
        assert_eq!(client.telemetry().request_count().await, 1);
        assert_eq!(client.telemetry().response_times().await.len(), 1);
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_generic() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let err = client
            .send_request::<Value>(EndpointCall::get("/health"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "generic");
    }

    #[tokio::test]
    async fn test_query_params_are_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/map"))
            .and(query_param("namaste_id", "NAM001"))
            .and(query_param("include_fhir", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let call = EndpointCall::post("/api/v1/map")
            .query("namaste_id", "NAM001")
            .query("include_fhir", false);
        client.send_request::<Value>(call).await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_is_a_network_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let client =
            HttpClient::with_timeout(Url::parse(&mock_server.uri()).unwrap(), Duration::from_millis(50)).unwrap();
        let err = client
            .send_request::<Value>(EndpointCall::get("/health"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(client.telemetry().request_count().await, 1);
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/namaste-api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let base = Url::parse(&format!("{}/namaste-api", mock_server.uri())).unwrap();
        let client = HttpClient::new(base).unwrap();
        let value: Value = client.send_request(EndpointCall::get("/health")).await.unwrap();

        assert_eq!(value["status"], "healthy");
    }

    #[tokio::test]
    async fn test_truncated_success_body_is_generic() {
        // Promises more bytes than it sends, then hangs up.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"status\":")
                .await;
            let _ = socket.shutdown().await;
        });

        let client = HttpClient::new(Url::parse(&format!("http://{}", addr)).unwrap()).unwrap();
        let err = client
            .send_request::<Value>(EndpointCall::get("/health"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Generic(ref m) if m.starts_with("Failed to read response body")));
        assert_eq!(client.telemetry().request_count().await, 1);
    }

    #[test]
    fn test_preview_url_matches_call() {
        let client = HttpClient::new(Url::parse(DEFAULT_BASE_URL).unwrap()).unwrap();
        let call = EndpointCall::get("/api/v1/fhir/condition")
            .query("namaste_id", "NAM001")
            .query("patient_id", "P001");

        assert_eq!(
            client.preview_url(&call).unwrap().as_str(),
            "https://namaste-icd-api.vercel.app/api/v1/fhir/condition?namaste_id=NAM001&patient_id=P001"
        );
    }
}
