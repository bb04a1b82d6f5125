use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One operation of an API spec, as produced by the spec-parsing collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EndpointDescriptor {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub request_body: Option<Value>,
    #[serde(default)]
    pub responses: BTreeMap<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParameterDescriptor {
    pub name: String,
    /// Parameter location: "query", "path", "header".
    #[serde(rename = "in", default)]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: Value,
}

/// Top-level `info` block of the source spec, used as prompt context.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiContext {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EndpointDescriptor {
    /// Key used for bulk generation maps: `"METHOD_path"`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.method, self.path)
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH")
    }

    /// JSON schema of the `application/json` request body, if declared.
    pub fn request_body_schema(&self) -> Option<&Value> {
        schema_from_content(self.request_body.as_ref()?)
    }

    /// JSON schema of the `application/json` response for a status code.
    pub fn response_schema(&self, status: &str) -> Option<&Value> {
        schema_from_content(self.responses.get(status)?)
    }
}

fn schema_from_content(node: &Value) -> Option<&Value> {
    node.get("content")?
        .get("application/json")?
        .get("schema")
}
