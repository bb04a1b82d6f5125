//! Test Case Assembler
//!
//! Combines synthesizer output into up to five ordered test cases per
//! endpoint, each carrying a replayable curl command.

use crate::application::use_cases::synthesizer::{SchemaValueSynthesizer, SynthesisMode};
use crate::domain::endpoint::EndpointDescriptor;
use crate::domain::test_case::{TestCase, TestCategory, TestInput, TestPriority};
use rand::Rng;
use serde_json::Value;

pub const MAX_TEST_CASES_PER_ENDPOINT: usize = 5;

pub(crate) const SECURITY_PAYLOADS: [&str; 5] = [
    "'; DROP TABLE users; --",
    "<script>alert('XSS')</script>",
    "../../../etc/passwd",
    "admin' OR '1'='1",
    "javascript:alert('XSS')",
];

/// Strategy used when filling a test case's input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataMode {
    Normal,
    EdgeCase,
    MissingRequired,
    Security,
}

pub struct TestCaseAssembler {
    synthesizer: SchemaValueSynthesizer,
}

impl TestCaseAssembler {
    pub fn new() -> Self {
        Self {
            synthesizer: SchemaValueSynthesizer::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            synthesizer: SchemaValueSynthesizer::with_seed(seed),
        }
    }

    /// Produces 1..=5 test cases in fixed category order: normal, edge_case,
    /// missing_required (only when the endpoint takes input), security,
    /// performance.
    pub fn assemble(&mut self, endpoint: &EndpointDescriptor, base_url: &str) -> Vec<TestCase> {
        let mut cases = Vec::new();

        cases.push(self.build_case(
            endpoint,
            base_url,
            TestCategory::Normal,
            TestPriority::Medium,
            DataMode::Normal,
            format!("Normal {} {}", endpoint.method, endpoint.path),
            format!(
                "Test normal operation of {} {}",
                endpoint.method, endpoint.path
            ),
            200,
        ));

        cases.push(self.build_case(
            endpoint,
            base_url,
            TestCategory::EdgeCase,
            TestPriority::High,
            DataMode::EdgeCase,
            format!("Edge Case {} {}", endpoint.method, endpoint.path),
            format!("Test edge cases for {} {}", endpoint.method, endpoint.path),
            400,
        ));

        if endpoint.request_body.is_some() || !endpoint.parameters.is_empty() {
            cases.push(self.build_case(
                endpoint,
                base_url,
                TestCategory::MissingRequired,
                TestPriority::High,
                DataMode::MissingRequired,
                format!(
                    "Missing Required Fields {} {}",
                    endpoint.method, endpoint.path
                ),
                format!(
                    "Test missing required fields for {} {}",
                    endpoint.method, endpoint.path
                ),
                400,
            ));
        }

        cases.push(self.build_case(
            endpoint,
            base_url,
            TestCategory::Security,
            TestPriority::Critical,
            DataMode::Security,
            format!("Security Test {} {}", endpoint.method, endpoint.path),
            format!(
                "Test security vulnerabilities for {} {}",
                endpoint.method, endpoint.path
            ),
            400,
        ));

        // Placeholder category: reuses normal-mode data with no load
        // amplification.
        cases.push(self.build_case(
            endpoint,
            base_url,
            TestCategory::Performance,
            TestPriority::Medium,
            DataMode::Normal,
            format!("Performance Test {} {}", endpoint.method, endpoint.path),
            format!(
                "Test performance aspects for {} {}",
                endpoint.method, endpoint.path
            ),
            200,
        ));

        cases.truncate(MAX_TEST_CASES_PER_ENDPOINT);
        cases
    }

    #[allow(clippy::too_many_arguments)]
    fn build_case(
        &mut self,
        endpoint: &EndpointDescriptor,
        base_url: &str,
        category: TestCategory,
        priority: TestPriority,
        mode: DataMode,
        name: String,
        description: String,
        expected_status_code: u16,
    ) -> TestCase {
        let input_data = self.generate_input(endpoint, mode);
        let curl_command = build_curl_command(endpoint, base_url, &input_data);
        TestCase {
            name,
            description,
            category,
            priority,
            method: endpoint.method.clone(),
            path: endpoint.path.clone(),
            input_data,
            expected_status_code,
            curl_command,
            test_script: None,
            target: None,
        }
    }

    fn generate_input(&mut self, endpoint: &EndpointDescriptor, mode: DataMode) -> TestInput {
        let mut input = TestInput::default();

        if endpoint.is_mutating() {
            if let Some(schema) = endpoint.request_body_schema().cloned() {
                input.body = Some(self.generate_body(&schema, mode));
            }
        }

        for param in &endpoint.parameters {
            if param.location != "query" {
                continue;
            }
            let value = self.generate_value(&param.schema, mode);
            input.query_params.insert(param.name.clone(), value);
        }

        input
    }

    fn generate_body(&mut self, schema: &Value, mode: DataMode) -> Value {
        match mode {
            DataMode::Normal => self
                .synthesizer
                .synthesize_object(schema, SynthesisMode::Normal, false),
            DataMode::EdgeCase => self
                .synthesizer
                .synthesize_object(schema, SynthesisMode::EdgeCase, true),
            // Required-field omission only; remaining values stay valid.
            DataMode::MissingRequired => self
                .synthesizer
                .synthesize_object(schema, SynthesisMode::Normal, true),
            DataMode::Security => self.security_object(schema),
        }
    }

    fn generate_value(&mut self, schema: &Value, mode: DataMode) -> Value {
        match mode {
            DataMode::Normal | DataMode::MissingRequired => {
                self.synthesizer.synthesize(schema, SynthesisMode::Normal)
            }
            DataMode::EdgeCase => self.synthesizer.synthesize(schema, SynthesisMode::EdgeCase),
            DataMode::Security => {
                if schema.get("type").and_then(Value::as_str).unwrap_or("string") == "string" {
                    self.attack_payload()
                } else {
                    self.synthesizer.synthesize(schema, SynthesisMode::EdgeCase)
                }
            }
        }
    }

    /// String-typed properties get an attack payload; the rest go through
    /// edge-case synthesis.
    fn security_object(&mut self, schema: &Value) -> Value {
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return self.generate_value(schema, DataMode::Security);
        };
        let mut object = serde_json::Map::new();
        for (name, prop_schema) in properties {
            object.insert(name.clone(), self.generate_value(prop_schema, DataMode::Security));
        }
        Value::Object(object)
    }

    fn attack_payload(&mut self) -> Value {
        let index = rand::thread_rng().gen_range(0..SECURITY_PAYLOADS.len());
        Value::String(SECURITY_PAYLOADS[index].to_string())
    }
}

impl Default for TestCaseAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a reproducible curl command: method, content-type header, optional
/// bearer token, custom headers, JSON body for mutating methods, and a
/// percent-free query string.
pub fn build_curl_command(
    endpoint: &EndpointDescriptor,
    base_url: &str,
    input_data: &TestInput,
) -> String {
    let mut url = format!("{}{}", base_url, endpoint.path);
    let mut parts = vec![format!("curl -X {}", endpoint.method)];

    parts.push("-H \"Content-Type: application/json\"".to_string());

    if let Some(token) = &input_data.auth_token {
        parts.push(format!("-H \"Authorization: Bearer {}\"", token));
    }

    for (key, value) in &input_data.headers {
        parts.push(format!("-H \"{}: {}\"", key, value));
    }

    if endpoint.is_mutating() {
        if let Some(body) = &input_data.body {
            let body_json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
            parts.push(format!("-d '{}'", body_json));
        }
    }

    if !input_data.query_params.is_empty() {
        let query = input_data
            .query_params
            .iter()
            .map(|(key, value)| format!("{}={}", key, plain_value(value)))
            .collect::<Vec<_>>()
            .join("&");
        url = format!("{}?{}", url, query);
    }

    parts.push(format!("\"{}\"", url));
    parts.join(" ")
}

/// Renders a JSON value without surrounding quotes for query strings.
pub(crate) fn plain_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::endpoint::ParameterDescriptor;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn post_endpoint() -> EndpointDescriptor {
        EndpointDescriptor {
            method: "POST".to_string(),
            path: "/users".to_string(),
            parameters: vec![ParameterDescriptor {
                name: "verbose".to_string(),
                location: "query".to_string(),
                required: false,
                description: None,
                schema: json!({"type": "boolean"}),
            }],
            request_body: Some(json!({
                "content": {
                    "application/json": {
                        "schema": {
                            "type": "object",
                            "properties": {
                                "username": {"type": "string"},
                                "age": {"type": "integer", "minimum": 1, "maximum": 120}
                            },
                            "required": ["username"]
                        }
                    }
                }
            })),
            ..Default::default()
        }
    }

    fn get_endpoint() -> EndpointDescriptor {
        EndpointDescriptor {
            method: "GET".to_string(),
            path: "/health".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_assemble_returns_between_one_and_five_cases() {
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = assembler.assemble(&post_endpoint(), "http://localhost:8001");
        assert!(!cases.is_empty() && cases.len() <= MAX_TEST_CASES_PER_ENDPOINT);
        for case in &cases {
            assert!(!case.name.is_empty());
            assert!(!case.curl_command.is_empty());
        }
    }

    #[test]
    fn test_assemble_category_order_is_fixed() {
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = assembler.assemble(&post_endpoint(), "http://localhost:8001");
        let categories: Vec<TestCategory> = cases.iter().map(|c| c.category).collect();
        assert_eq!(
            categories,
            vec![
                TestCategory::Normal,
                TestCategory::EdgeCase,
                TestCategory::MissingRequired,
                TestCategory::Security,
                TestCategory::Performance,
            ]
        );
    }

    #[test]
    fn test_assemble_skips_missing_required_without_input() {
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = assembler.assemble(&get_endpoint(), "http://localhost:8001");
        assert!(cases
            .iter()
            .all(|c| c.category != TestCategory::MissingRequired));
        assert_eq!(cases.len(), 4);
    }

    #[test]
    fn test_expected_status_codes_per_category() {
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = assembler.assemble(&post_endpoint(), "http://localhost:8001");
        for case in cases {
            let expected = match case.category {
                TestCategory::Normal | TestCategory::Performance => 200,
                _ => 400,
            };
            assert_eq!(case.expected_status_code, expected);
        }
    }

    #[test]
    fn test_security_case_uses_attack_payload_for_strings() {
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = assembler.assemble(&post_endpoint(), "http://localhost:8001");
        let security = cases
            .iter()
            .find(|c| c.category == TestCategory::Security)
            .unwrap();
        let body = security.input_data.body.as_ref().unwrap();
        let username = body["username"].as_str().unwrap();
        assert!(SECURITY_PAYLOADS.contains(&username));
        // Non-string fields go through edge synthesis, not payloads.
        assert!(body["age"].is_number());
    }

    #[test]
    fn test_curl_command_shape() {
        let endpoint = post_endpoint();
        let mut query_params = BTreeMap::new();
        query_params.insert("limit".to_string(), json!(10));
        let input = TestInput {
            body: Some(json!({"username": "demo"})),
            query_params,
            headers: BTreeMap::new(),
            auth_token: Some("token123".to_string()),
        };
        let command = build_curl_command(&endpoint, "http://localhost:8001", &input);
        assert!(command.starts_with("curl -X POST"));
        assert!(command.contains("-H \"Content-Type: application/json\""));
        assert!(command.contains("-H \"Authorization: Bearer token123\""));
        assert!(command.contains("-d '{\"username\":\"demo\"}'"));
        assert!(command.ends_with("\"http://localhost:8001/users?limit=10\""));
    }

    #[test]
    fn test_curl_command_omits_body_for_get() {
        let input = TestInput::default();
        let command = build_curl_command(&get_endpoint(), "http://localhost:8001", &input);
        assert!(!command.contains("-d "));
        assert!(command.ends_with("\"http://localhost:8001/health\""));
    }

    #[test]
    fn test_missing_required_keeps_present_values_valid() {
        let mut assembler = TestCaseAssembler::with_seed(21);
        let cases = assembler.assemble(&post_endpoint(), "http://localhost:8001");
        let missing = cases
            .iter()
            .find(|c| c.category == TestCategory::MissingRequired)
            .unwrap();
        let body = missing.input_data.body.as_ref().unwrap().as_object().unwrap();
        if let Some(age) = body.get("age") {
            let age = age.as_i64().unwrap();
            assert!((1..=120).contains(&age));
        }
    }
}
