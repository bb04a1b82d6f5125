//! AI Augmentation
//!
//! Layers provider-generated test cases on top of the rule-based set. Every
//! failure mode here degrades to the rule-based cases alone, so callers
//! always receive a usable suite.

pub mod llm_output;
pub mod prompts;
pub mod types;

use crate::application::use_cases::assembler::{build_curl_command, TestCaseAssembler};
use crate::domain::endpoint::{ApiContext, EndpointDescriptor};
use crate::domain::llm_config::LlmConfig;
use crate::domain::test_case::{TestCase, TestCategory, TestPriority};
use crate::infrastructure::llm_clients::LlmClient;
use crate::infrastructure::response::clean_llm_response;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};
use types::{CandidateCase, CandidateMap};

/// Upper bound on AI-proposed cases accepted per endpoint, applied before
/// merging with the rule-based set.
pub const MAX_AI_CASES_PER_ENDPOINT: usize = 5;

pub struct AiAugmentor {
    client: Arc<dyn LlmClient>,
    config: LlmConfig,
}

impl AiAugmentor {
    pub fn new(client: Arc<dyn LlmClient>, config: LlmConfig) -> Self {
        Self { client, config }
    }

    /// Rule-based cases for one endpoint, extended with deduplicated AI
    /// proposals when the provider is reachable and returns decodable JSON.
    pub async fn augment(
        &self,
        context: &ApiContext,
        endpoint: &EndpointDescriptor,
        base_url: &str,
        assembler: &mut TestCaseAssembler,
    ) -> Vec<TestCase> {
        let rule_based = assembler.assemble(endpoint, base_url);

        if !self.client.is_available(&self.config).await {
            warn!(
                endpoint = %endpoint.key(),
                "AI provider unavailable, keeping rule-based cases only"
            );
            return rule_based;
        }

        let prompt = prompts::single_endpoint_prompt(context, endpoint);
        let candidates = match self.request_candidates::<Vec<CandidateCase>>(&prompt).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(endpoint = %endpoint.key(), error = %e, "AI generation failed");
                return rule_based;
            }
        };

        debug!(
            endpoint = %endpoint.key(),
            count = candidates.len(),
            "accepted AI candidates"
        );
        let ai_cases = candidates
            .into_iter()
            .take(MAX_AI_CASES_PER_ENDPOINT)
            .map(|candidate| self.candidate_to_case(candidate, endpoint, base_url))
            .collect();
        merge_deduplicated(rule_based, ai_cases)
    }

    /// Bulk variant: one provider call for many endpoints, keyed by
    /// `"METHOD_path"`. Endpoints absent from the reply, and the whole batch
    /// on provider failure, fall back to rule-based cases.
    pub async fn augment_all(
        &self,
        context: &ApiContext,
        endpoints: &[EndpointDescriptor],
        base_url: &str,
        assembler: &mut TestCaseAssembler,
    ) -> BTreeMap<String, Vec<TestCase>> {
        let mut candidate_map = CandidateMap::new();
        if self.client.is_available(&self.config).await {
            let prompt = prompts::bulk_prompt(context, endpoints);
            match self.request_candidates::<CandidateMap>(&prompt).await {
                Ok(map) => candidate_map = map,
                Err(e) => warn!(error = %e, "bulk AI generation failed"),
            }
        } else {
            warn!("AI provider unavailable, keeping rule-based cases only");
        }

        let mut suites = BTreeMap::new();
        for endpoint in endpoints {
            let rule_based = assembler.assemble(endpoint, base_url);
            let ai_cases = candidate_map
                .remove(&endpoint.key())
                .unwrap_or_default()
                .into_iter()
                .take(MAX_AI_CASES_PER_ENDPOINT)
                .map(|candidate| self.candidate_to_case(candidate, endpoint, base_url))
                .collect();
            suites.insert(endpoint.key(), merge_deduplicated(rule_based, ai_cases));
        }
        suites
    }

    async fn request_candidates<T: serde::de::DeserializeOwned>(
        &self,
        prompt: &str,
    ) -> crate::domain::error::Result<T> {
        let reply = self
            .client
            .complete(&self.config, prompts::SYSTEM_PROMPT, prompt)
            .await?;
        let cleaned = clean_llm_response(&reply);
        llm_output::decode(&cleaned)
    }

    /// Converts a validated candidate, regenerating the curl command so it
    /// always matches the input data regardless of what the model claimed.
    fn candidate_to_case(
        &self,
        candidate: CandidateCase,
        endpoint: &EndpointDescriptor,
        base_url: &str,
    ) -> TestCase {
        let curl_command = build_curl_command(endpoint, base_url, &candidate.input_data);
        TestCase {
            name: candidate.name,
            description: candidate.description,
            category: TestCategory::AiGenerated,
            priority: TestPriority::parse(&candidate.priority),
            method: endpoint.method.clone(),
            path: endpoint.path.clone(),
            input_data: candidate.input_data,
            expected_status_code: candidate.expected_status_code,
            curl_command,
            test_script: candidate.test_script,
            target: None,
        }
    }
}

/// Appends AI cases whose names do not exactly match an existing case.
fn merge_deduplicated(rule_based: Vec<TestCase>, ai_cases: Vec<TestCase>) -> Vec<TestCase> {
    let mut seen: BTreeSet<String> = rule_based
        .iter()
        .map(|case| case.name.clone())
        .collect();
    let mut merged = rule_based;
    for case in ai_cases {
        if seen.insert(case.name.clone()) {
            merged.push(case);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{AppError, Result};
    use async_trait::async_trait;
    use serde_json::json;

    struct StubClient {
        available: bool,
        reply: Option<String>,
    }

    #[async_trait]
    impl LlmClient for StubClient {
        async fn is_available(&self, _config: &LlmConfig) -> bool {
            self.available
        }

        async fn complete(&self, _config: &LlmConfig, _system: &str, _user: &str) -> Result<String> {
            self.reply
                .clone()
                .ok_or_else(|| AppError::LLMError("stub failure".to_string()))
        }
    }

    fn augmentor(available: bool, reply: Option<String>) -> AiAugmentor {
        AiAugmentor::new(
            Arc::new(StubClient { available, reply }),
            LlmConfig::default(),
        )
    }

    fn post_endpoint() -> EndpointDescriptor {
        EndpointDescriptor {
            method: "POST".to_string(),
            path: "/users".to_string(),
            request_body: Some(json!({
                "content": {
                    "application/json": {
                        "schema": {
                            "type": "object",
                            "properties": {"username": {"type": "string"}},
                            "required": ["username"]
                        }
                    }
                }
            })),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unavailable_provider_keeps_rule_based_only() {
        let augmentor = augmentor(false, None);
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = augmentor
            .augment(
                &ApiContext::default(),
                &post_endpoint(),
                "http://localhost:8001",
                &mut assembler,
            )
            .await;
        assert_eq!(cases.len(), 5);
        assert!(cases.iter().all(|c| c.category != TestCategory::AiGenerated));
    }

    #[tokio::test]
    async fn test_provider_error_falls_back_to_rule_based() {
        let augmentor = augmentor(true, None);
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = augmentor
            .augment(
                &ApiContext::default(),
                &post_endpoint(),
                "http://localhost:8001",
                &mut assembler,
            )
            .await;
        assert!(cases.iter().all(|c| c.category != TestCategory::AiGenerated));
    }

    #[tokio::test]
    async fn test_candidates_are_merged_and_deduplicated() {
        let reply = json!([
            {"name": "Normal POST /users", "priority": "high"},
            {"name": "Unicode username", "priority": "critical",
             "input_data": {"body": {"username": "日本語"}},
             "expected_status_code": 201}
        ])
        .to_string();
        let augmentor = augmentor(true, Some(reply));
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = augmentor
            .augment(
                &ApiContext::default(),
                &post_endpoint(),
                "http://localhost:8001",
                &mut assembler,
            )
            .await;

        // The first candidate collides with the rule-based normal case.
        assert_eq!(cases.len(), 6);
        let ai_case = cases.last().unwrap();
        assert_eq!(ai_case.category, TestCategory::AiGenerated);
        assert_eq!(ai_case.priority, TestPriority::Critical);
        assert_eq!(ai_case.expected_status_code, 201);
        assert!(ai_case.curl_command.contains("http://localhost:8001/users"));
    }

    #[tokio::test]
    async fn test_dedup_compares_names_exactly() {
        let reply = json!([
            {"name": "Normal POST /users"},
            {"name": "normal POST /users"}
        ])
        .to_string();
        let augmentor = augmentor(true, Some(reply));
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = augmentor
            .augment(
                &ApiContext::default(),
                &post_endpoint(),
                "http://localhost:8001",
                &mut assembler,
            )
            .await;

        // Only the byte-identical name is discarded; the differently-cased
        // one survives.
        assert_eq!(cases.len(), 6);
        assert!(cases.iter().any(|c| c.name == "normal POST /users"));
        assert_eq!(
            cases
                .iter()
                .filter(|c| c.name == "Normal POST /users")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_ai_candidates_capped_at_five() {
        let candidates: Vec<_> = (0..8)
            .map(|i| json!({"name": format!("Generated case {}", i)}))
            .collect();
        let augmentor = augmentor(true, Some(json!(candidates).to_string()));
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = augmentor
            .augment(
                &ApiContext::default(),
                &post_endpoint(),
                "http://localhost:8001",
                &mut assembler,
            )
            .await;
        let ai_count = cases
            .iter()
            .filter(|c| c.category == TestCategory::AiGenerated)
            .count();
        assert_eq!(ai_count, MAX_AI_CASES_PER_ENDPOINT);
    }

    #[tokio::test]
    async fn test_fenced_reply_is_decoded() {
        let reply = "```json\n[{\"name\": \"Fenced case\"}]\n```".to_string();
        let augmentor = augmentor(true, Some(reply));
        let mut assembler = TestCaseAssembler::with_seed(1);
        let cases = augmentor
            .augment(
                &ApiContext::default(),
                &post_endpoint(),
                "http://localhost:8001",
                &mut assembler,
            )
            .await;
        assert!(cases.iter().any(|c| c.name == "Fenced case"));
    }

    #[tokio::test]
    async fn test_bulk_covers_endpoints_missing_from_reply() {
        let get = EndpointDescriptor {
            method: "GET".to_string(),
            path: "/users".to_string(),
            ..Default::default()
        };
        let reply = json!({
            "POST_/users": [{"name": "Bulk generated", "priority": "low"}]
        })
        .to_string();
        let augmentor = augmentor(true, Some(reply));
        let mut assembler = TestCaseAssembler::with_seed(1);
        let suites = augmentor
            .augment_all(
                &ApiContext::default(),
                &[post_endpoint(), get],
                "http://localhost:8001",
                &mut assembler,
            )
            .await;

        assert_eq!(suites.len(), 2);
        assert!(suites["POST_/users"]
            .iter()
            .any(|c| c.category == TestCategory::AiGenerated));
        assert!(suites["GET_/users"]
            .iter()
            .all(|c| c.category != TestCategory::AiGenerated));
        assert!(!suites["GET_/users"].is_empty());
    }
}
