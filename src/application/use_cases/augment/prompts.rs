//! Prompt builders for AI test-case generation.

use crate::domain::endpoint::{ApiContext, EndpointDescriptor};
use std::fmt::Write;

pub const SYSTEM_PROMPT: &str = "You are an expert API testing engineer. \
You design thorough, realistic test cases for HTTP APIs. \
Return only valid JSON with no surrounding prose or markdown.";

/// Renders the API-level context block shared by all prompts.
pub fn api_context_block(context: &ApiContext) -> String {
    let mut block = String::from("API Information:\n");
    if let Some(title) = &context.title {
        let _ = writeln!(block, "- Title: {}", title);
    }
    if let Some(version) = &context.version {
        let _ = writeln!(block, "- Version: {}", version);
    }
    if let Some(description) = &context.description {
        let _ = writeln!(block, "- Description: {}", description);
    }
    block
}

fn endpoint_block(endpoint: &EndpointDescriptor) -> String {
    let mut block = String::new();
    let _ = writeln!(block, "Endpoint: {} {}", endpoint.method, endpoint.path);
    if let Some(summary) = &endpoint.summary {
        let _ = writeln!(block, "Summary: {}", summary);
    }
    if let Some(description) = &endpoint.description {
        let _ = writeln!(block, "Description: {}", description);
    }
    if !endpoint.tags.is_empty() {
        let _ = writeln!(block, "Tags: {}", endpoint.tags.join(", "));
    }

    if !endpoint.parameters.is_empty() {
        block.push_str("Parameters:\n");
        for param in &endpoint.parameters {
            let required = if param.required { " [REQUIRED]" } else { "" };
            let _ = writeln!(
                block,
                "- {} ({}){}: {}",
                param.name,
                param.location,
                required,
                param.description.as_deref().unwrap_or("no description")
            );
        }
    }

    if let Some(schema) = endpoint.request_body_schema() {
        let _ = writeln!(
            block,
            "Request body schema:\n{}",
            serde_json::to_string_pretty(schema).unwrap_or_default()
        );
    }

    for (status, _) in &endpoint.responses {
        if let Some(schema) = endpoint.response_schema(status) {
            let _ = writeln!(
                block,
                "Response {} schema:\n{}",
                status,
                serde_json::to_string_pretty(schema).unwrap_or_default()
            );
        }
    }

    block
}

/// Prompt requesting exactly five test cases for one endpoint, as a JSON
/// array of candidate objects.
pub fn single_endpoint_prompt(context: &ApiContext, endpoint: &EndpointDescriptor) -> String {
    format!(
        "{}\n{}\n\
        Generate exactly 5 diverse test cases for this endpoint, covering \
        realistic usage, boundary values, invalid input, and security probes.\n\
        Respond with a JSON array where each element has these fields:\n\
        - name: short unique test name\n\
        - description: what the test verifies\n\
        - priority: one of low, medium, high, critical\n\
        - input_data: object with optional body, query_params, headers, auth_token\n\
        - expected_status_code: integer HTTP status\n\
        - test_script: optional assertion notes\n\
        Return only the JSON array.",
        api_context_block(context),
        endpoint_block(endpoint)
    )
}

/// Prompt requesting test cases for many endpoints in one call. The reply
/// must be an object keyed by `"METHOD_path"`.
pub fn bulk_prompt(context: &ApiContext, endpoints: &[EndpointDescriptor]) -> String {
    let mut body = api_context_block(context);
    body.push('\n');
    for endpoint in endpoints {
        let _ = writeln!(body, "---\nKey: {}", endpoint.key());
        body.push_str(&endpoint_block(endpoint));
    }
    let _ = write!(
        body,
        "\nGenerate up to 5 test cases per endpoint.\n\
        Respond with a single JSON object whose keys are the endpoint keys \
        shown above (\"METHOD_path\") and whose values are JSON arrays of \
        test-case objects with fields: name, description, priority, \
        input_data, expected_status_code, test_script.\n\
        Return only the JSON object."
    );
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::endpoint::ParameterDescriptor;
    use serde_json::json;

    fn sample_endpoint() -> EndpointDescriptor {
        EndpointDescriptor {
            method: "POST".to_string(),
            path: "/orders".to_string(),
            summary: Some("Create an order".to_string()),
            parameters: vec![ParameterDescriptor {
                name: "dry_run".to_string(),
                location: "query".to_string(),
                required: true,
                description: Some("Validate without persisting".to_string()),
                schema: json!({"type": "boolean"}),
            }],
            request_body: Some(json!({
                "content": {
                    "application/json": {
                        "schema": {"type": "object", "properties": {"sku": {"type": "string"}}}
                    }
                }
            })),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_prompt_includes_endpoint_details() {
        let context = ApiContext {
            title: Some("Orders API".to_string()),
            version: Some("1.2.0".to_string()),
            description: None,
        };
        let prompt = single_endpoint_prompt(&context, &sample_endpoint());
        assert!(prompt.contains("Orders API"));
        assert!(prompt.contains("POST /orders"));
        assert!(prompt.contains("dry_run (query) [REQUIRED]"));
        assert!(prompt.contains("\"sku\""));
        assert!(prompt.contains("exactly 5"));
    }

    #[test]
    fn test_bulk_prompt_lists_endpoint_keys() {
        let context = ApiContext::default();
        let get = EndpointDescriptor {
            method: "GET".to_string(),
            path: "/orders".to_string(),
            ..Default::default()
        };
        let prompt = bulk_prompt(&context, &[sample_endpoint(), get]);
        assert!(prompt.contains("Key: POST_/orders"));
        assert!(prompt.contains("Key: GET_/orders"));
        assert!(prompt.contains("METHOD_path"));
    }
}
