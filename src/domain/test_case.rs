use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Normal,
    EdgeCase,
    MissingRequired,
    Security,
    Performance,
    AiGenerated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TestPriority {
    /// Maps a provider-produced priority string; unrecognized values become Medium.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => TestPriority::Low,
            "high" => TestPriority::High,
            "critical" => TestPriority::Critical,
            _ => TestPriority::Medium,
        }
    }
}

/// Request material for one test case.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TestInput {
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub query_params: BTreeMap<String, Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// A single synthesized or AI-produced test case. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub description: String,
    pub category: TestCategory,
    pub priority: TestPriority,
    pub method: String,
    pub path: String,
    pub input_data: TestInput,
    pub expected_status_code: u16,
    pub curl_command: String,
    #[serde(default)]
    pub test_script: Option<String>,
    /// Declared target host or URL for multi-service execution.
    #[serde(default)]
    pub target: Option<String>,
}
