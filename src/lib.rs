//! # LLM Gatekeeper
//!
//! A policy-enforcing, provider-agnostic gateway that sits between an
//! orchestrating application and any of several LLM back-ends. Every request
//! runs a fixed chain of inbound checks, is dispatched through a pluggable
//! provider adapter, runs a fixed chain of outbound checks, and comes back
//! in one canonical shape, or as a structured violation record. The caller
//! never sees a provider-native payload, a raw transport error, or an
//! unvalidated tool call.
//!
//! ## Core Concepts
//!
//! - **[`CanonicalRequest`] / [`CanonicalResponse`]**: The single, versioned
//!   shapes exchanged across the adapter boundary.
//! - **Interceptors**: Six pipeline stages: injection scanning, PII
//!   masking, project alignment, schema enforcement, tool-call grounding,
//!   and hallucinated-import scraping. Each returns pass-or-block; none
//!   panics or throws.
//! - **[`ProviderAdapter`]**: The four-operation contract every back-end
//!   translator implements, with shared retry, timeout, and cost behavior.
//! - **[`AdapterRegistry`]**: Allow-list gated resolution from provider tag
//!   to adapter instance.
//! - **[`run_pipeline`]**: The orchestrator. Its only exit is a
//!   `(response, violations)` pair.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use llm_gatekeeper::adapter::scripted::ScriptedAdapter;
//! use llm_gatekeeper::config::PolicyConfig;
//! use llm_gatekeeper::items::{CanonicalRequest, Message, Provider};
//! use llm_gatekeeper::pipeline::{run_pipeline, PipelineOptions};
//!
//! # async fn run() {
//! let config = PolicyConfig::from_file("policy.json").expect("valid policy");
//! let adapter = ScriptedAdapter::new("claude-sonnet-4").with_text_response("Hi!", 10, 8);
//!
//! let request = CanonicalRequest::new("req-1", Provider::Anthropic, "claude-sonnet-4")
//!     .with_message(Message::user("Hello"));
//!
//! let (response, violations) =
//!     run_pipeline(request, &adapter, &config, &PipelineOptions::default()).await;
//!
//! if violations.is_empty() {
//!     println!("model said: {:?}", response.content);
//! } else {
//!     eprintln!("blocked: {violations:?}");
//! }
//! # }
//! ```
//!
//! [`CanonicalRequest`]: crate::items::CanonicalRequest
//! [`CanonicalResponse`]: crate::items::CanonicalResponse
//! [`ProviderAdapter`]: crate::adapter::ProviderAdapter
//! [`AdapterRegistry`]: crate::adapter::registry::AdapterRegistry
//! [`run_pipeline`]: crate::pipeline::run_pipeline

pub mod adapter;
pub mod config;
pub mod error;
pub mod interceptors;
pub mod items;
pub mod observability;
pub mod pipeline;
pub mod retry;
pub mod skills;
pub mod violation;

// Re-export core types for convenience
pub use adapter::registry::AdapterRegistry;
pub use adapter::{Capability, ProviderAdapter, TransportPolicy};
pub use config::{PolicyConfig, SecurityTier};
pub use error::{GatewayError, Result};
pub use items::{
    CanonicalRequest, CanonicalResponse, Content, ContentBlock, FinishReason, Message, Provider,
    Role, ToolCall, ToolDefinition, Usage,
};
pub use observability::{AuditEntry, AuditOutcome, AuditSink, CostLedger};
pub use pipeline::{run_pipeline, PipelineOptions};
pub use skills::{SkillRegistry, StaticSkillRegistry};
pub use violation::{InterceptOutcome, InterceptorKind, Violation, ViolationCode};
