//! Schema Value Synthesizer
//!
//! Turns a JSON-schema node into a normal or edge-case value. Pure and
//! side-effect free, deterministic modulo the seeded RNG.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

const LONG_STRING_LEN: usize = 10_000;
const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;':\",./<>?";
const LARGE_ARRAY_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisMode {
    Normal,
    EdgeCase,
}

pub struct SchemaValueSynthesizer {
    rng: StdRng,
}

impl SchemaValueSynthesizer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded constructor so tests can pin the randomness source.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Synthesizes a value for a schema node. Malformed or absent schema
    /// shapes degrade to string handling; this never fails.
    pub fn synthesize(&mut self, schema: &Value, mode: SynthesisMode) -> Value {
        let schema_type = schema
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("string");

        match mode {
            SynthesisMode::Normal => self.normal_value(schema_type, schema),
            SynthesisMode::EdgeCase => self.edge_value(schema_type, schema),
        }
    }

    /// Object synthesis with required-field omission. Each required property
    /// is independently dropped with ~30% probability when `omit_required`
    /// is set, which is how missing-required and edge-case bodies are built.
    pub fn synthesize_object(
        &mut self,
        schema: &Value,
        mode: SynthesisMode,
        omit_required: bool,
    ) -> Value {
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return self.synthesize(schema, mode);
        };
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut object = serde_json::Map::new();
        for (name, prop_schema) in properties {
            if omit_required && required.contains(&name.as_str()) && self.rng.gen_bool(0.3) {
                continue;
            }
            object.insert(name.clone(), self.synthesize(prop_schema, mode));
        }
        Value::Object(object)
    }

    fn normal_value(&mut self, schema_type: &str, schema: &Value) -> Value {
        match schema_type {
            "integer" => {
                let minimum = schema.get("minimum").and_then(Value::as_i64).unwrap_or(1);
                let maximum = schema.get("maximum").and_then(Value::as_i64).unwrap_or(100);
                json!(self.rng.gen_range(minimum..=maximum.max(minimum)))
            }
            "number" => {
                let minimum = schema.get("minimum").and_then(Value::as_f64).unwrap_or(1.0);
                let maximum = schema
                    .get("maximum")
                    .and_then(Value::as_f64)
                    .unwrap_or(100.0);
                let drawn = self.rng.gen_range(minimum..=maximum.max(minimum));
                json!((drawn * 100.0).round() / 100.0)
            }
            "boolean" => json!(self.rng.gen_bool(0.5)),
            "array" => {
                let items = schema.get("items").cloned().unwrap_or(Value::Null);
                let min_items = schema
                    .get("minItems")
                    .and_then(Value::as_u64)
                    .unwrap_or(1) as usize;
                let max_items = schema
                    .get("maxItems")
                    .and_then(Value::as_u64)
                    .unwrap_or(3) as usize;
                let count = self.rng.gen_range(min_items..=max_items.max(min_items));
                let values = (0..count)
                    .map(|_| self.synthesize(&items, SynthesisMode::Normal))
                    .collect();
                Value::Array(values)
            }
            "object" => self.synthesize_object(schema, SynthesisMode::Normal, false),
            // Unknown types take the string path.
            _ => self.normal_string(schema),
        }
    }

    fn normal_string(&mut self, schema: &Value) -> Value {
        if let Some(members) = schema.get("enum").and_then(Value::as_array) {
            if !members.is_empty() {
                let index = self.rng.gen_range(0..members.len());
                return members[index].clone();
            }
        }
        match schema.get("format").and_then(Value::as_str) {
            Some("email") => json!(format!("test{}@example.com", self.rng.gen_range(1000..10000))),
            Some("date") => json!(Utc::now().format("%Y-%m-%d").to_string()),
            Some("date-time") | Some("datetime") => json!(Utc::now().to_rfc3339()),
            _ => json!(format!("test_string_{}", self.rng.gen_range(1000..10000))),
        }
    }

    fn edge_value(&mut self, schema_type: &str, schema: &Value) -> Value {
        match schema_type {
            // Large finite sentinels, never NaN or infinity.
            "integer" => {
                if self.rng.gen_bool(0.5) {
                    json!(-999_999)
                } else {
                    json!(999_999_999i64)
                }
            }
            "number" => {
                if self.rng.gen_bool(0.5) {
                    json!(1e308)
                } else {
                    json!(-1e308)
                }
            }
            "boolean" => json!("not_boolean"),
            "array" => {
                if self.rng.gen_bool(0.5) {
                    json!([])
                } else {
                    Value::Array(vec![Value::Null; LARGE_ARRAY_LEN])
                }
            }
            "object" => self.synthesize_object(schema, SynthesisMode::EdgeCase, true),
            _ => self.edge_string(schema),
        }
    }

    fn edge_string(&mut self, schema: &Value) -> Value {
        if let Some(members) = schema.get("enum").and_then(Value::as_array) {
            let mut candidate = "invalid_enum_value".to_string();
            while members.iter().any(|m| m.as_str() == Some(&candidate)) {
                candidate.push('_');
            }
            return json!(candidate);
        }
        match schema.get("format").and_then(Value::as_str) {
            Some("email") => json!("invalid-email-format"),
            Some("date") => json!("2023-13-45"),
            Some("date-time") | Some("datetime") => json!("invalid-datetime"),
            _ => {
                if self.rng.gen_bool(0.5) {
                    json!("x".repeat(LONG_STRING_LEN))
                } else {
                    json!(SPECIAL_CHARACTERS)
                }
            }
        }
    }
}

impl Default for SchemaValueSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
