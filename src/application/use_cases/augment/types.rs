use crate::domain::test_case::TestInput;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Shape of a single AI-proposed test case before validation. Every field
/// except `name` is optional so partially filled proposals still land.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateCase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub input_data: TestInput,
    #[serde(default = "default_status")]
    pub expected_status_code: u16,
    #[serde(default)]
    pub test_script: Option<String>,
}

fn default_priority() -> String {
    "medium".to_string()
}

fn default_status() -> u16 {
    200
}

/// Bulk-generation payload: candidate lists keyed by `"METHOD_path"`.
pub type CandidateMap = BTreeMap<String, Vec<CandidateCase>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_defaults_fill_missing_fields() {
        let candidate: CandidateCase =
            serde_json::from_str(r#"{"name": "Boundary check"}"#).unwrap();
        assert_eq!(candidate.priority, "medium");
        assert_eq!(candidate.expected_status_code, 200);
        assert!(candidate.input_data.body.is_none());
        assert!(candidate.test_script.is_none());
    }

    #[test]
    fn test_candidate_map_deserializes_keyed_lists() {
        let raw = r#"{
            "GET_/users": [{"name": "a", "priority": "high"}],
            "POST_/users": [{"name": "b", "expected_status_code": 422}]
        }"#;
        let map: CandidateMap = serde_json::from_str(raw).unwrap();
        assert_eq!(map["GET_/users"][0].priority, "high");
        assert_eq!(map["POST_/users"][0].expected_status_code, 422);
    }
}
