//! Test Execution Scheduler
//!
//! Dispatches test cases over HTTP with bounded concurrency. Results are
//! index-aligned with the submitted cases, and one failing or panicking
//! case never disturbs its siblings.

use crate::application::use_cases::assembler::plain_value;
use crate::domain::execution::{ExecutionResult, ReplayOutcome, ServiceCallEdge, TestStatus};
use crate::domain::test_case::TestCase;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Name this engine reports as the caller in service-context headers.
pub const SOURCE_SERVICE: &str = "apiforge";

pub const SERVICE_CONTEXT_HEADER: &str = "X-Service-Context";
pub const SERVICE_CALLS_HEADER: &str = "X-Service-Calls";

/// Where a batch of test cases should be sent.
#[derive(Debug, Clone)]
pub enum ExecutionTarget {
    /// Every case goes to one base URL.
    Single(String),
    /// Cases are routed by their `target` field through a name-to-URL map.
    Services(BTreeMap<String, String>),
}

pub struct ExecutionScheduler {
    client: reqwest::Client,
    max_concurrent: usize,
    timeout: Duration,
}

impl ExecutionScheduler {
    pub fn new(max_concurrent: usize, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            max_concurrent: max_concurrent.max(1),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Runs every case, at most `max_concurrent` in flight. The returned
    /// vector has one result per case, in submission order.
    pub async fn execute(
        &self,
        cases: &[TestCase],
        target: &ExecutionTarget,
    ) -> Vec<ExecutionResult> {
        let batch_id = uuid::Uuid::new_v4();
        info!(%batch_id, count = cases.len(), "executing test suite");
        let gate = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(cases.len());

        for case in cases {
            let gate = Arc::clone(&gate);
            let client = self.client.clone();
            let timeout = self.timeout;
            let case = case.clone();
            let target = target.clone();
            handles.push(tokio::spawn(async move {
                let _permit = match gate.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return ExecutionResult::error(
                            "Concurrency gate closed before dispatch".to_string(),
                            "semaphore closed".to_string(),
                            0,
                        )
                    }
                };
                run_case(&client, timeout, &case, &target).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => results.push(ExecutionResult::error(
                    format!("Execution task panicked: {}", e),
                    "task join failed".to_string(),
                    0,
                )),
            }
        }
        results
    }

    /// Replays one recorded curl command through the shell. Exit code zero
    /// means passed, nonzero means failed, spawn failure means error.
    pub async fn execute_one(&self, command: &str) -> ReplayOutcome {
        let start = Instant::now();
        let spawned = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await;
        let elapsed = start.elapsed().as_millis() as u64;

        match spawned {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let status = if output.status.success() {
                    TestStatus::Passed
                } else {
                    TestStatus::Failed
                };
                ReplayOutcome {
                    status,
                    output: (!stdout.is_empty()).then_some(stdout),
                    error: (!stderr.is_empty()).then_some(stderr),
                    response_time_ms: elapsed,
                }
            }
            Err(e) => ReplayOutcome {
                status: TestStatus::Error,
                output: None,
                error: Some(format!("Failed to spawn command: {}", e)),
                response_time_ms: elapsed,
            },
        }
    }
}

async fn run_case(
    client: &reqwest::Client,
    timeout: Duration,
    case: &TestCase,
    target: &ExecutionTarget,
) -> ExecutionResult {
    let (base_url, service_name, context_header) = match target {
        ExecutionTarget::Single(url) => {
            if url.trim().is_empty() {
                return missing_base_url_error();
            }
            let base = normalize_base_url(url);
            let name = resolve_service_name(&base);
            (base, name, None)
        }
        ExecutionTarget::Services(services) => {
            let Some(name) = case.target.as_deref() else {
                return ExecutionResult::error(
                    format!("Test case '{}' declares no target service", case.name),
                    "routing failed before dispatch".to_string(),
                    0,
                );
            };
            // Direct key match first, then the host/port heuristic for
            // targets declared as URLs or hostnames.
            let entry = services.get_key_value(name).or_else(|| {
                services
                    .iter()
                    .find(|(_, url)| resolve_service_name(&normalize_base_url(url)) == name)
            });
            let Some((canonical, url)) = entry else {
                return ExecutionResult::error(
                    format!("Unknown target service '{}'", name),
                    "routing failed before dispatch".to_string(),
                    0,
                );
            };
            if url.trim().is_empty() {
                return missing_base_url_error();
            }
            let context = json!({
                "source_service": SOURCE_SERVICE,
                "target_service": canonical,
                "available_services": services.keys().collect::<Vec<_>>(),
            });
            (
                normalize_base_url(url),
                canonical.clone(),
                Some(context.to_string()),
            )
        }
    };

    let method = match case.method.parse::<reqwest::Method>() {
        Ok(method) => method,
        Err(_) => {
            return ExecutionResult::error(
                format!("Invalid HTTP method '{}'", case.method),
                "request construction failed".to_string(),
                0,
            )
        }
    };

    let url = format!("{}{}", base_url, case.path);
    let mut request = client
        .request(method, &url)
        .timeout(timeout)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .header(reqwest::header::ACCEPT, "application/json");

    if let Some(token) = &case.input_data.auth_token {
        request = request.bearer_auth(token);
    }
    for (key, value) in &case.input_data.headers {
        request = request.header(key, value);
    }
    if let Some(context) = context_header {
        request = request.header(SERVICE_CONTEXT_HEADER, context);
    }
    if !case.input_data.query_params.is_empty() {
        let pairs: Vec<(String, String)> = case
            .input_data
            .query_params
            .iter()
            .map(|(key, value)| (key.clone(), plain_value(value)))
            .collect();
        request = request.query(&pairs);
    }
    if matches!(case.method.as_str(), "POST" | "PUT" | "PATCH") {
        if let Some(body) = &case.input_data.body {
            request = request.json(body);
        }
    }

    let start = Instant::now();
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            let elapsed = start.elapsed().as_millis() as u64;
            let message = if e.is_timeout() {
                format!(
                    "Request to {} timed out after {}s; the service may be slow or hung",
                    url,
                    timeout.as_secs()
                )
            } else if e.is_connect() {
                format!("Connection to {} failed; is the service running?", url)
            } else {
                format!("Request to {} failed: {}", url, e)
            };
            return ExecutionResult::error(
                message,
                format!("{} {} dispatch failed", case.method, url),
                elapsed,
            );
        }
    };
    let elapsed = start.elapsed().as_millis() as u64;

    let status_code = response.status().as_u16();
    let service_calls = parse_service_calls(&response, &service_name);
    let body = response.text().await.ok();
    let (status, error_message) = classify_response(status_code, case.expected_status_code);

    ExecutionResult {
        status,
        response_status_code: Some(status_code),
        response_body: body,
        response_time_ms: elapsed,
        error_message,
        execution_log: Some(format!(
            "[{}] {} {} -> {} in {}ms",
            chrono::Utc::now().to_rfc3339(),
            case.method,
            url,
            status_code,
            elapsed
        )),
        service_calls,
    }
}

fn missing_base_url_error() -> ExecutionResult {
    ExecutionResult::error(
        "Base URL is required. Please provide a valid API endpoint URL (e.g., http://localhost:8001)"
            .to_string(),
        "routing failed before dispatch".to_string(),
        0,
    )
}

/// A received response is a pass exactly when its status matches the
/// expectation; everything else is a failure, never an error.
fn classify_response(actual: u16, expected: u16) -> (TestStatus, Option<String>) {
    if actual == expected {
        (TestStatus::Passed, None)
    } else {
        (
            TestStatus::Failed,
            Some(format!("Expected status {}, got {}", expected, actual)),
        )
    }
}

/// Reads reported downstream calls from the response headers. Absent or
/// malformed headers yield no edges. Edges missing a source get the service
/// that answered this request.
fn parse_service_calls(response: &reqwest::Response, service_name: &str) -> Vec<ServiceCallEdge> {
    let Some(raw) = response
        .headers()
        .get(SERVICE_CALLS_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return Vec::new();
    };
    let mut edges: Vec<ServiceCallEdge> = match serde_json::from_str(raw) {
        Ok(edges) => edges,
        Err(e) => {
            debug!(error = %e, "dropping malformed {} header", SERVICE_CALLS_HEADER);
            return Vec::new();
        }
    };
    for edge in &mut edges {
        if edge.source_service.is_empty() {
            edge.source_service = service_name.to_string();
        }
    }
    edges
}

/// Trims trailing slashes and defaults the scheme to http.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// Best-effort service name for a base URL: well-known local ports first,
/// then hostname keywords, then the hostname itself.
pub fn resolve_service_name(base_url: &str) -> String {
    let Ok(parsed) = url::Url::parse(base_url) else {
        return "unknown".to_string();
    };
    match parsed.port() {
        Some(8000) => return SOURCE_SERVICE.to_string(),
        Some(8001) => return "user-api".to_string(),
        Some(8002) => return "ecommerce-api".to_string(),
        _ => {}
    }
    let Some(host) = parsed.host_str() else {
        return "unknown".to_string();
    };
    if host.contains("user") {
        "user-api".to_string()
    } else if host.contains("ecommerce") || host.contains("shop") {
        "ecommerce-api".to_string()
    } else {
        host.to_string()
    }
}
