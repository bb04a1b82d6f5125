use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Error,
}

/// Outcome of dispatching one test case. Index-aligned with the submitted list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: TestStatus,
    pub response_status_code: Option<u16>,
    pub response_body: Option<String>,
    pub response_time_ms: u64,
    pub error_message: Option<String>,
    pub execution_log: Option<String>,
    #[serde(default)]
    pub service_calls: Vec<ServiceCallEdge>,
}

impl ExecutionResult {
    pub fn error(message: String, log: String, response_time_ms: u64) -> Self {
        Self {
            status: TestStatus::Error,
            response_status_code: None,
            response_body: None,
            response_time_ms,
            error_message: Some(message),
            execution_log: Some(log),
            service_calls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Sync,
    Async,
}

/// A downstream call the service under test reported making, as advertised
/// in the `X-Service-Calls` response header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCallEdge {
    #[serde(default)]
    pub source_service: String,
    pub target_service: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub response_time: Option<u64>,
    #[serde(rename = "type", default)]
    pub call_type: Option<CallKind>,
    #[serde(default)]
    pub error_propagated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationPatterns {
    pub synchronous_calls: usize,
    pub asynchronous_calls: usize,
    pub error_propagation: usize,
}

/// Aggregated view of inter-service traffic for one execution batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyReport {
    pub total_service_calls: usize,
    pub service_dependencies: BTreeMap<String, BTreeSet<String>>,
    pub patterns: CommunicationPatterns,
}

/// Result of replaying a single recorded command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayOutcome {
    pub status: TestStatus,
    pub output: Option<String>,
    pub error: Option<String>,
    pub response_time_ms: u64,
}
