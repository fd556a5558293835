//! HTTP client module for the NAMASTE/ICD-11 terminology API.
//!
//! This module provides the instrumented client used for every outbound call.
//! It normalizes search responses, tracks per-call latency and attempt counts
//! locally, and classifies every failure into a single error type.
//!
//! # Architecture
//!
//! - [`TerminologyClient`] - High-level client exposing one method per endpoint
//! - [`EndpointCall`] - Description of one outbound request
//! - [`ApiError`] - Classified failure (HTTP, network, generic)
//! - Wire types ([`SearchResult`], [`MappingResult`], [`ApiStats`], ...)
//!
//! # Endpoints
//!
//! | Operation | Method | Path |
//! |---|---|---|
//! | health | GET | `/health` |
//! | stats | GET | `/api/v1/stats` |
//! | search | GET | `/api/v1/search` |
//! | map | POST | `/api/v1/map` |
//! | bulk-map | POST | `/api/v1/bulk-map` |
//! | fhir condition | GET | `/api/v1/fhir/condition` |

mod error;
mod http_client;
mod lenient;
mod normalize;
mod terminology_client;
mod types;
mod utils;

pub use error::{ApiError, NETWORK_ERROR_MESSAGE, UNKNOWN_ERROR_MESSAGE};
pub use http_client::{DEFAULT_BASE_URL, EndpointCall, REQUEST_TIMEOUT};
pub use normalize::normalize_search_response;
pub use terminology_client::TerminologyClient;
pub use types::{
    ApiStats, AyushSystem, BulkMapRequest, BulkMapTerm, FhirConditionParams, HealthStatus, Icd11Match, MapParams,
    MappingResult, MatchInfo, NamasteTerm, RawSearchResult, SearchApiResponse, SearchOutcome, SearchParams, SearchResult,
    SearchSource, ServiceHealth, TermSource,
};
pub use utils::request_url;
