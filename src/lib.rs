//! apiforge: schema-driven API test-case synthesis and execution.
//!
//! The crate builds test suites from endpoint descriptors (rule-based
//! synthesis, optionally augmented by a generative provider), executes them
//! with bounded concurrency, and aggregates the inter-service calls the
//! targets report.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::use_cases::assembler::TestCaseAssembler;
pub use application::use_cases::augment::AiAugmentor;
pub use application::use_cases::dependency::analyze;
pub use application::use_cases::executor::{ExecutionScheduler, ExecutionTarget};
pub use application::use_cases::synthesizer::{SchemaValueSynthesizer, SynthesisMode};
pub use domain::endpoint::{ApiContext, EndpointDescriptor, ParameterDescriptor};
pub use domain::error::{AppError, Result};
pub use domain::execution::{
    DependencyReport, ExecutionResult, ReplayOutcome, ServiceCallEdge, TestStatus,
};
pub use domain::llm_config::{LlmConfig, LlmProvider};
pub use domain::test_case::{TestCase, TestCategory, TestInput, TestPriority};
pub use infrastructure::config::Settings;
pub use infrastructure::llm_clients::{LlmClient, RouterClient};
