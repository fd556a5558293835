use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{error::ApiError, lenient};

/// Which vocabularies a search should cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Namaste,
    Icd11,
    #[default]
    Both,
}

impl SearchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSource::Namaste => "namaste",
            SearchSource::Icd11 => "icd11",
            SearchSource::Both => "both",
        }
    }
}

impl Display for SearchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "namaste" => Ok(SearchSource::Namaste),
            "icd11" => Ok(SearchSource::Icd11),
            "both" => Ok(SearchSource::Both),
            other => Err(format!("unknown search source '{}'", other)),
        }
    }
}

/// Traditional medicine discipline used as a search facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AyushSystem {
    Ayurveda,
    Yoga,
    Unani,
    Siddha,
    Homeopathy,
}

impl AyushSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            AyushSystem::Ayurveda => "ayurveda",
            AyushSystem::Yoga => "yoga",
            AyushSystem::Unani => "unani",
            AyushSystem::Siddha => "siddha",
            AyushSystem::Homeopathy => "homeopathy",
        }
    }
}

impl Display for AyushSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AyushSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ayurveda" => Ok(AyushSystem::Ayurveda),
            "yoga" => Ok(AyushSystem::Yoga),
            "unani" => Ok(AyushSystem::Unani),
            "siddha" => Ok(AyushSystem::Siddha),
            "homeopathy" => Ok(AyushSystem::Homeopathy),
            other => Err(format!("unknown AYUSH system '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub source: SearchSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ayush_system: Option<AyushSystem>,
}

impl SearchParams {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            source: SearchSource::default(),
            ayush_system: None,
        }
    }

    pub fn with_source(mut self, source: SearchSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_ayush_system(mut self, system: AyushSystem) -> Self {
        self.ayush_system = Some(system);
        self
    }
}

/// Vocabulary a normalized search result came from.
///
/// Always assigned by the client from the array the entry arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermSource {
    #[serde(rename = "NAMASTE")]
    Namaste,
    #[serde(rename = "ICD-11")]
    Icd11,
}

impl TermSource {
    pub fn label(&self) -> &'static str {
        match self {
            TermSource::Namaste => "NAMASTE",
            TermSource::Icd11 => "ICD-11",
        }
    }
}

impl Display for TermSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A search entry as the server sent it.
///
/// Fields the client does not know about are kept in `extra`, so
/// re-serializing yields the original entry. Known fields of the wrong shape
/// are read leniently: numeric identifiers become text, a null `term` is
/// empty and non-text synonyms are stringified or dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSearchResult {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_or_default")]
    pub term: String,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub term_hindi: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string_list", skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub namaste_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub icd11_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Untransformed `/api/v1/search` payload.
///
/// A result array that is not an array counts as missing, and entries that
/// are not objects are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchApiResponse {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_records", skip_serializing_if = "Option::is_none")]
    pub namaste_results: Option<Vec<RawSearchResult>>,
    #[serde(default, deserialize_with = "lenient::opt_records", skip_serializing_if = "Option::is_none")]
    pub icd11_results: Option<Vec<RawSearchResult>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Search entry after normalization, tagged with its vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub source: TermSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_hindi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namaste_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icd11_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    /// The identifier of this entry in its own vocabulary.
    pub fn code(&self) -> Option<&str> {
        match self.source {
            TermSource::Namaste => self.namaste_id.as_deref(),
            TermSource::Icd11 => self.icd11_code.as_deref(),
        }
    }
}

/// Normalized and raw views of one search response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub raw: SearchApiResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub icd11: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub namaste: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub fhir: Option<String>,
}

/// `/health` payload. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_record", skip_serializing_if = "Option::is_none")]
    pub services: Option<ServiceHealth>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HealthStatus {
    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }
}

/// Server-side aggregate statistics from `/api/v1/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiStats {
    #[serde(deserialize_with = "lenient::u64_or_default")]
    pub total_requests: u64,
    #[serde(deserialize_with = "lenient::f64_or_default")]
    pub average_response_time: f64,
    #[serde(deserialize_with = "lenient::f64_or_default")]
    pub min_response_time: f64,
    #[serde(deserialize_with = "lenient::f64_or_default")]
    pub max_response_time: f64,
    #[serde(deserialize_with = "lenient::f64_or_default")]
    pub success_rate: f64,
    #[serde(deserialize_with = "lenient::f64_or_default")]
    pub uptime_seconds: f64,
    #[serde(deserialize_with = "lenient::f64_list")]
    pub recent_response_times: Vec<f64>,
    #[serde(deserialize_with = "lenient::counts")]
    pub endpoint_counts: BTreeMap<String, u64>,
    #[serde(deserialize_with = "lenient::counts")]
    pub status_code_distribution: BTreeMap<String, u64>,
    #[serde(deserialize_with = "lenient::string_or_default")]
    pub timestamp: String,
}

impl ApiStats {
    /// Endpoint counts sorted by count (descending), at most `limit` entries.
    pub fn top_endpoints(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut endpoints: Vec<(&str, u64)> = self
            .endpoint_counts
            .iter()
            .map(|(endpoint, count)| (endpoint.as_str(), *count))
            .collect();
        endpoints.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        endpoints.truncate(limit);
        endpoints
    }

    /// Server-reported recent latencies, rounded to whole milliseconds.
    pub fn recent_response_times_ms(&self) -> Vec<u64> {
        self.recent_response_times
            .iter()
            .map(|t| if *t <= 0.0 { 0 } else { t.round() as u64 })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapParams {
    pub namaste_id: String,
    #[serde(default)]
    pub include_fhir: bool,
}

impl MapParams {
    pub fn new(namaste_id: impl Into<String>) -> Self {
        Self {
            namaste_id: namaste_id.into(),
            include_fhir: false,
        }
    }

    pub fn with_fhir(mut self, include_fhir: bool) -> Self {
        self.include_fhir = include_fhir;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Icd11Match {
    #[serde(default, deserialize_with = "lenient::bool_or_default")]
    pub found: bool,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The NAMASTE term a mapping was requested for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamasteTerm {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub term_hindi: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub ayush_system: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string_list", skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reads `namaste_term` as a record, or as a bare term name.
fn namaste_term<'de, D>(deserializer: D) -> Result<Option<NamasteTerm>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(term) => Some(NamasteTerm {
            term: Some(term),
            ..Default::default()
        }),
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Result of mapping one NAMASTE term, passed through as the server sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    #[serde(default, deserialize_with = "namaste_term", skip_serializing_if = "Option::is_none")]
    pub namaste_term: Option<NamasteTerm>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub icd11_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub icd11_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_record", skip_serializing_if = "Option::is_none")]
    pub best_icd11_match: Option<Icd11Match>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fhir_condition: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Display summary of a mapping's best match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchInfo {
    pub code: String,
    pub title: String,
    pub confidence: f64,
}

impl MappingResult {
    /// Name of the mapped NAMASTE term, if the server sent one.
    pub fn term_name(&self) -> Option<&str> {
        self.namaste_term.as_ref().and_then(|t| t.term.as_deref())
    }

    pub fn match_info(&self) -> MatchInfo {
        match &self.best_icd11_match {
            Some(m) if m.found => MatchInfo {
                code: m.code.clone().unwrap_or_else(|| "N/A".to_string()),
                title: m.title.clone().unwrap_or_else(|| "N/A".to_string()),
                confidence: m.confidence_score.unwrap_or(0.0),
            },
            Some(m) => MatchInfo {
                code: "N/A".to_string(),
                title: m.message.clone().unwrap_or_else(|| "No match found".to_string()),
                confidence: 0.0,
            },
            None => match &self.icd11_code {
                Some(code) => MatchInfo {
                    code: code.clone(),
                    title: self.icd11_title.clone().unwrap_or_else(|| "N/A".to_string()),
                    confidence: self.confidence.unwrap_or(0.0),
                },
                None => MatchInfo {
                    code: "N/A".to_string(),
                    title: "No match found".to_string(),
                    confidence: 0.0,
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkMapTerm {
    pub namaste_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkMapRequest {
    pub terms: Vec<BulkMapTerm>,
}

impl BulkMapRequest {
    /// Parses a caller-supplied request body.
    ///
    /// Malformed input is a generic error; nothing is sent.
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::generic(format!("Invalid JSON in request body: {}", e)))
    }
}

impl FromStr for BulkMapRequest {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FhirConditionParams {
    pub namaste_id: String,
    pub patient_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_search_result_keeps_unknown_fields() {
        let json = r#"{"id":"A1","term":"Fever","category":"Jwara","ayush_system":"ayurveda"}"#;
        let raw: RawSearchResult = serde_json::from_str(json).unwrap();

        assert_eq!(raw.id.as_deref(), Some("A1"));
        assert_eq!(raw.extra.get("category"), Some(&Value::from("Jwara")));

        let back: Value = serde_json::to_value(&raw).unwrap();
        let original: Value = serde_json::from_str(json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_term_source_labels() {
        assert_eq!(serde_json::to_value(TermSource::Namaste).unwrap(), Value::from("NAMASTE"));
        assert_eq!(serde_json::to_value(TermSource::Icd11).unwrap(), Value::from("ICD-11"));
    }

    #[test]
    fn test_search_filters_parse_case_insensitively() {
        assert_eq!("ICD11".parse::<SearchSource>().unwrap(), SearchSource::Icd11);
        assert_eq!("Siddha".parse::<AyushSystem>().unwrap(), AyushSystem::Siddha);
        assert!("acupuncture".parse::<AyushSystem>().is_err());
    }

    #[test]
    fn test_stats_missing_fields_default() {
        let stats: ApiStats = serde_json::from_str(r#"{"total_requests": 12}"#).unwrap();
        assert_eq!(stats.total_requests, 12);
        assert!(stats.endpoint_counts.is_empty());

        let sparse: ApiStats =
            serde_json::from_str(r#"{"total_requests": null, "success_rate": "99.5", "endpoint_counts": null}"#).unwrap();
        assert_eq!(sparse.total_requests, 0);
        assert_eq!(sparse.success_rate, 99.5);
        assert!(sparse.endpoint_counts.is_empty());
    }

    #[test]
    fn test_top_endpoints_sorted_and_limited() {
        let stats = ApiStats {
            endpoint_counts: BTreeMap::from([
                ("/health".to_string(), 3),
                ("/api/v1/search".to_string(), 10),
                ("/api/v1/map".to_string(), 7),
            ]),
            ..Default::default()
        };
        assert_eq!(stats.top_endpoints(2), vec![("/api/v1/search", 10), ("/api/v1/map", 7)]);
    }

    #[test]
    fn test_match_info_from_best_match() {
        let found: MappingResult = serde_json::from_str(
            r#"{"best_icd11_match":{"found":true,"code":"1A00","title":"Cholera","confidence_score":0.9}}"#,
        )
        .unwrap();
        let info = found.match_info();
        assert_eq!(info.code, "1A00");
        assert_eq!(info.title, "Cholera");
        assert!((info.confidence - 0.9).abs() < 1e-9);

        let missing: MappingResult =
            serde_json::from_str(r#"{"best_icd11_match":{"found":false,"message":"No ICD-11 equivalent"}}"#).unwrap();
        assert_eq!(missing.match_info().code, "N/A");
        assert_eq!(missing.match_info().title, "No ICD-11 equivalent");
        assert_eq!(missing.match_info().confidence, 0.0);
    }

    #[test]
    fn test_match_info_from_flat_fields() {
        let flat: MappingResult = serde_json::from_str(
            r#"{"namaste_term":{"id":"NAM001","term":"Jwara"},"icd11_code":"MG26","icd11_title":"Fever","confidence":0.8}"#,
        )
        .unwrap();
        assert_eq!(flat.match_info().code, "MG26");
        assert_eq!(flat.match_info().title, "Fever");
    }

    #[test]
    fn test_mapping_reads_nested_namaste_term() {
        let mapping: MappingResult = serde_json::from_value(serde_json::json!({
            "namaste_term": {
                "id": "NAM001",
                "term": "Jwara",
                "ayush_system": "ayurveda",
                "category": "Fever",
                "synonyms": ["Santapa", "Daha"]
            },
            "best_icd11_match": {"found": true, "code": "MG26", "title": "Fever", "confidence_score": 0.92},
            "mapping": {"method": "semantic", "validated": false}
        }))
        .unwrap();

        let term = mapping.namaste_term.as_ref().unwrap();
        assert_eq!(term.id.as_deref(), Some("NAM001"));
        assert_eq!(term.ayush_system.as_deref(), Some("ayurveda"));
        assert_eq!(term.category.as_deref(), Some("Fever"));
        assert_eq!(term.synonyms.as_ref().map(Vec::len), Some(2));
        assert_eq!(mapping.term_name(), Some("Jwara"));
        assert_eq!(mapping.mapping.as_ref().unwrap()["method"], "semantic");
        assert_eq!(mapping.match_info().code, "MG26");
    }

    #[test]
    fn test_mapping_accepts_bare_term_name() {
        let mapping: MappingResult = serde_json::from_str(r#"{"namaste_term":"Kasa","confidence":"0.5"}"#).unwrap();
        assert_eq!(mapping.term_name(), Some("Kasa"));
        assert_eq!(mapping.confidence, Some(0.5));
    }

    #[test]
    fn test_malformed_search_entry_does_not_drop_its_neighbours() {
        let response: SearchApiResponse = serde_json::from_value(serde_json::json!({
            "namaste_results": [{"id": "N1", "term": "Jwara"}, "not-an-entry"],
            "icd11_results": [{"id": 42, "term": null, "title": "Pyrexia", "synonyms": ["Fever", 7, null]}]
        }))
        .unwrap();

        let namaste = response.namaste_results.as_ref().unwrap();
        assert_eq!(namaste.len(), 1);
        assert_eq!(namaste[0].term, "Jwara");

        let icd11 = &response.icd11_results.as_ref().unwrap()[0];
        assert_eq!(icd11.id.as_deref(), Some("42"));
        assert_eq!(icd11.term, "");
        assert_eq!(icd11.extra.get("title"), Some(&Value::from("Pyrexia")));
        assert_eq!(icd11.synonyms, Some(vec!["Fever".to_string(), "7".to_string()]));
    }

    #[test]
    fn test_health_without_status_decodes() {
        let health: HealthStatus = serde_json::from_str(r#"{"version":"1.2.0"}"#).unwrap();
        assert!(health.status.is_none());
        assert_eq!(health.status_label(), "unknown");

        let null_status: HealthStatus = serde_json::from_str(r#"{"status":null,"timestamp":null}"#).unwrap();
        assert!(null_status.status.is_none());
        assert!(null_status.timestamp.is_none());
    }

    #[test]
    fn test_bulk_map_request_parsing() {
        let request =
            BulkMapRequest::from_json(r#"{"terms":[{"namaste_id":"NAM001"},{"namaste_id":"NAM002","patient_id":"P001"}]}"#)
                .unwrap();
        assert_eq!(request.terms.len(), 2);
        assert_eq!(request.terms[1].patient_id.as_deref(), Some("P001"));

        let err = BulkMapRequest::from_json("{terms: oops").unwrap_err();
        assert!(matches!(err, ApiError::Generic(ref m) if m.starts_with("Invalid JSON in request body")));
    }
}
