//! High-level client for the NAMASTE/ICD-11 terminology API.
//!
//! This module provides the [`TerminologyClient`] struct, the only gateway
//! between the application and the remote API. Every operation goes through
//! the instrumented transport, so each one is counted and timed in the
//! client's local telemetry, and every failure surfaces as an [`ApiError`].
//!
//! # Example
//!
//! ```rust,no_run
//! use namaste_explorer::http::{SearchParams, TerminologyClient};
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let client = TerminologyClient::with_default_url()?;
//!
//! for result in client.search(&SearchParams::new("fever")).await? {
//!     println!("[{}] {:?} {}", result.source, result.code(), result.term);
//! }
//! println!("{} requests so far", client.get_request_count().await);
//! # Ok(())
//! # }
//! ```

use log::{debug, info};
use serde_json::Value;
use url::Url;

use super::{
    error::ApiError,
    http_client::{DEFAULT_BASE_URL, EndpointCall, HttpClient},
    normalize::normalize_search_response,
    types::{
        ApiStats, BulkMapRequest, FhirConditionParams, HealthStatus, MapParams, MappingResult, SearchApiResponse,
        SearchOutcome, SearchParams, SearchResult,
    },
};
use crate::{
    log::mask_identifier,
    telemetry::{RequestTelemetry, TelemetrySnapshot},
};

const HEALTH_PATH: &str = "/health";
const STATS_PATH: &str = "/api/v1/stats";
const SEARCH_PATH: &str = "/api/v1/search";
const MAP_PATH: &str = "/api/v1/map";
const BULK_MAP_PATH: &str = "/api/v1/bulk-map";
const FHIR_CONDITION_PATH: &str = "/api/v1/fhir/condition";

/// Instrumented client for the terminology mapping API.
///
/// Construct one per process and share it by reference (or behind an
/// [`Arc`](std::sync::Arc)) with everything that needs it. Calls may run
/// concurrently; each is timed independently.
///
/// The client never retries. Every failure is returned to the caller as an
/// [`ApiError`], and there is no fallback value on failure.
pub struct TerminologyClient {
    http_client: HttpClient,
}

impl TerminologyClient {
    /// Creates a client for the given base URL.
    ///
    /// The request timeout (30 s) and the `Content-Type: application/json`
    /// header are fixed.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be initialized.
    pub fn new(base_url: Url) -> Result<Self, anyhow::Error> {
        let http_client = HttpClient::new(base_url)?;
        Ok(Self { http_client })
    }

    /// Creates a client for the public deployment of the API.
    pub fn with_default_url() -> Result<Self, anyhow::Error> {
        Self::new(Url::parse(DEFAULT_BASE_URL)?)
    }

    pub fn base_url(&self) -> &Url {
        self.http_client.base_url()
    }

    /// Fetches the liveness/version payload from `/health`.
    pub async fn check_health(&self) -> Result<HealthStatus, ApiError> {
        debug!("API: Checking health");
        self.http_client.send_request(EndpointCall::get(HEALTH_PATH)).await
    }

    /// Fetches the server's own aggregate statistics.
    ///
    /// These are not merged with the local telemetry.
    pub async fn get_stats(&self) -> Result<ApiStats, ApiError> {
        debug!("API: Requesting server stats");
        self.http_client.send_request(EndpointCall::get(STATS_PATH)).await
    }

    /// Searches both vocabularies and returns one normalized, tagged sequence.
    ///
    /// NAMASTE entries come first, then ICD-11 entries, each in server order.
    /// A missing result array is treated as empty.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<SearchResult>, ApiError> {
        let response = self.search_raw(params).await?;
        let results = normalize_search_response(&response);
        debug!(query = &*params.q, results = results.len(); "API: Search normalized");
        Ok(results)
    }

    /// Issues the same search call as [`search`](Self::search) but returns the
    /// untransformed payload.
    ///
    /// This is a separate HTTP call. Callers that need both views of one
    /// response should use [`search_with_raw`](Self::search_with_raw).
    pub async fn search_raw(&self, params: &SearchParams) -> Result<SearchApiResponse, ApiError> {
        debug!(query = &*params.q, source = params.source.as_str(); "API: Searching");
        self.http_client.send_request(search_call(params)).await
    }

    /// Issues one search call and derives both the normalized and raw views.
    pub async fn search_with_raw(&self, params: &SearchParams) -> Result<SearchOutcome, ApiError> {
        let raw = self.search_raw(params).await?;
        let results = normalize_search_response(&raw);
        Ok(SearchOutcome { results, raw })
    }

    /// Maps one NAMASTE term to ICD-11.
    ///
    /// The parameters travel in the query string even though the verb is POST.
    pub async fn map_terminology(&self, params: &MapParams) -> Result<MappingResult, ApiError> {
        info!(namaste_id = &*params.namaste_id, include_fhir = params.include_fhir; "API: Mapping term");
        self.http_client.send_request(map_call(params)).await
    }

    /// Maps several terms in one call.
    ///
    /// Results are returned in the order the server sends them, which the
    /// server guarantees matches the input order.
    pub async fn bulk_map(&self, request: &BulkMapRequest) -> Result<Vec<MappingResult>, ApiError> {
        info!(terms = request.terms.len(); "API: Bulk mapping terms");
        let body = serde_json::to_value(request)?;
        self.http_client
            .send_request(EndpointCall::post(BULK_MAP_PATH).json(body))
            .await
    }

    /// Fetches a FHIR Condition resource, returned verbatim and unvalidated.
    pub async fn get_fhir_condition(&self, params: &FhirConditionParams) -> Result<Value, ApiError> {
        let patient = mask_identifier(&params.patient_id);
        debug!(namaste_id = &*params.namaste_id, patient_id = &*patient; "API: Requesting FHIR condition");
        self.http_client.send_request(fhir_condition_call(params)).await
    }

    /// Number of calls attempted since construction or the last reset.
    pub async fn get_request_count(&self) -> u64 {
        self.telemetry().request_count().await
    }

    /// Mean of the recorded latencies in milliseconds, 0 when none exist.
    pub async fn get_average_response_time(&self) -> u64 {
        self.telemetry().average_response_time().await
    }

    /// Copy of the recorded latencies (at most 100), oldest first.
    pub async fn get_response_times(&self) -> Vec<u64> {
        self.telemetry().response_times().await
    }

    /// Clears the request counter and the latency window together.
    pub async fn reset_stats(&self) {
        self.telemetry().reset().await;
        debug!("API: Local telemetry reset");
    }

    pub async fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.telemetry().snapshot().await
    }

    /// The URL a search with these parameters would hit.
    pub fn search_url(&self, params: &SearchParams) -> Result<Url, ApiError> {
        self.http_client.preview_url(&search_call(params))
    }

    pub fn map_url(&self, params: &MapParams) -> Result<Url, ApiError> {
        self.http_client.preview_url(&map_call(params))
    }

    pub fn fhir_condition_url(&self, params: &FhirConditionParams) -> Result<Url, ApiError> {
        self.http_client.preview_url(&fhir_condition_call(params))
    }

    fn telemetry(&self) -> &RequestTelemetry {
        self.http_client.telemetry()
    }
}

fn search_call(params: &SearchParams) -> EndpointCall {
    EndpointCall::get(SEARCH_PATH)
        .query("q", &params.q)
        .query("source", params.source)
        .query_opt("ayush_system", params.ayush_system)
        .require(&["q"])
}

fn map_call(params: &MapParams) -> EndpointCall {
    EndpointCall::post(MAP_PATH)
        .query("namaste_id", &params.namaste_id)
        .query("include_fhir", params.include_fhir)
        .require(&["namaste_id"])
}

fn fhir_condition_call(params: &FhirConditionParams) -> EndpointCall {
    EndpointCall::get(FHIR_CONDITION_PATH)
        .query("namaste_id", &params.namaste_id)
        .query("patient_id", &params.patient_id)
        .require(&["namaste_id", "patient_id"])
}

#[cfg(test)]
mod tests {
    use crate::http::{AyushSystem, SearchSource};

    use super::*;

    #[test]
    fn test_search_url_defaults_source_to_both() {
        let client = TerminologyClient::with_default_url().unwrap();
        let url = client.search_url(&SearchParams::new("jwara")).unwrap();
        assert_eq!(url.query(), Some("q=jwara&source=both"));
    }

    #[test]
    fn test_search_url_with_filters() {
        let client = TerminologyClient::with_default_url().unwrap();
        let params = SearchParams::new("kasa")
            .with_source(SearchSource::Namaste)
            .with_ayush_system(AyushSystem::Unani);
        let url = client.search_url(&params).unwrap();
        assert_eq!(url.query(), Some("q=kasa&source=namaste&ayush_system=unani"));
    }

    #[test]
    fn test_map_url_carries_params_in_query() {
        let client = TerminologyClient::with_default_url().unwrap();
        let url = client.map_url(&MapParams::new("NAM001").with_fhir(true)).unwrap();
        assert_eq!(url.path(), "/api/v1/map");
        assert_eq!(url.query(), Some("namaste_id=NAM001&include_fhir=true"));
    }
}
