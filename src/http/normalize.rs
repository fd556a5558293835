//! Normalization of `/api/v1/search` payloads.
//!
//! The server answers with two independent arrays, one per vocabulary. The
//! client flattens them into one sequence, NAMASTE entries first, and tags
//! each entry with the vocabulary of the array it came from. Any `source`
//! field the server put on an entry is discarded.

use super::types::{RawSearchResult, SearchApiResponse, SearchResult, TermSource};

/// Flattens both result arrays into one tagged sequence.
///
/// Missing arrays count as empty.
pub fn normalize_search_response(response: &SearchApiResponse) -> Vec<SearchResult> {
    let namaste = response.namaste_results.iter().flatten();
    let icd11 = response.icd11_results.iter().flatten();

    namaste
        .map(|raw| normalize_entry(raw, TermSource::Namaste))
        .chain(icd11.map(|raw| normalize_entry(raw, TermSource::Icd11)))
        .collect()
}

fn normalize_entry(raw: &RawSearchResult, source: TermSource) -> SearchResult {
    let mut namaste_id = raw.namaste_id.clone();
    let mut icd11_code = raw.icd11_code.clone();

    // `id` takes precedence over the alias the server may have sent.
    let id = raw.id.clone().filter(|id| !id.is_empty());
    match source {
        TermSource::Namaste => namaste_id = id.or(namaste_id),
        TermSource::Icd11 => icd11_code = id.or(icd11_code),
    }

    SearchResult {
        source,
        id: raw.id.clone(),
        term: raw.term.clone(),
        term_hindi: raw.term_hindi.clone(),
        confidence: raw.confidence,
        description: raw.description.clone(),
        synonyms: raw.synonyms.clone(),
        namaste_id,
        icd11_code,
        extra: raw.extra.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(value: serde_json::Value) -> SearchApiResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_namaste_results_come_first_and_are_tagged() {
        let response = response(json!({
            "namaste_results": [{"id": "A1", "term": "Fever"}],
            "icd11_results": [{"id": "B2", "term": "Pyrexia"}]
        }));

        let results = normalize_search_response(&response);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, TermSource::Namaste);
        assert_eq!(results[0].namaste_id.as_deref(), Some("A1"));
        assert_eq!(results[0].term, "Fever");
        assert_eq!(results[1].source, TermSource::Icd11);
        assert_eq!(results[1].icd11_code.as_deref(), Some("B2"));
        assert_eq!(results[1].term, "Pyrexia");
    }

    #[test]
    fn test_missing_arrays_are_empty() {
        let response = response(json!({"icd11_results": []}));
        assert!(normalize_search_response(&response).is_empty());
    }

    #[test]
    fn test_alias_is_used_when_id_is_absent() {
        let response = response(json!({
            "namaste_results": [{"namaste_id": "NAM042", "term": "Kasa"}],
            "icd11_results": [{"icd11_code": "MD12", "term": "Cough"}]
        }));

        let results = normalize_search_response(&response);

        assert_eq!(results[0].code(), Some("NAM042"));
        assert_eq!(results[1].code(), Some("MD12"));
    }

    #[test]
    fn test_server_source_field_is_ignored() {
        let response = response(json!({
            "icd11_results": [{"id": "B2", "term": "Pyrexia", "source": "NAMASTE", "uri": "http://id.who.int/x"}]
        }));

        let results = normalize_search_response(&response);

        assert_eq!(results[0].source, TermSource::Icd11);
        assert_eq!(results[0].extra.get("uri"), Some(&json!("http://id.who.int/x")));
        let serialized = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(serialized["source"], json!("ICD-11"));
    }

    #[test]
    fn test_order_within_each_array_is_preserved() {
        let response = response(json!({
            "namaste_results": [{"id": "N1"}, {"id": "N2"}],
            "icd11_results": [{"id": "I1"}, {"id": "I2"}]
        }));

        let ids: Vec<_> = normalize_search_response(&response)
            .into_iter()
            .filter_map(|r| r.id)
            .collect();

        assert_eq!(ids, vec!["N1", "N2", "I1", "I2"]);
    }
}
