//! # The Pipeline Orchestrator
//!
//! Chains the six interceptors around one adapter call and turns every
//! failure into data. The contract is a single pair: the canonical response
//! and the violations that produced it. `run_pipeline` never returns an
//! error and never panics on adapter misbehavior; a caller that wants
//! exception-style handling layers it above this boundary.
//!
//! ## Execution Order
//!
//! 1. Injection scanner. A block short-circuits to a synthesized response.
//! 2. PII masker. Its output is the working request from here on.
//! 3. Alignment checker, over the masked request.
//! 4. `adapter.transform_request` then `adapter.execute`. Any failure
//!    becomes a single `ADAPTER_ERROR` violation.
//! 5. `adapter.transform_response` with the original request identifier.
//! 6. Schema enforcer over the raw value.
//! 7. Tool grounder over the typed response.
//! 8. Hallucination scraper. Uniquely, its block keeps the real response
//!    body (the content has forensic value) and only rewrites the finish
//!    reason to `content_filter`.
//!
//! A synthesized blocked response always carries the schema-version
//! literal, the original request id, `"guardrail"` as the model, no
//! content, no tool calls, a `content_filter` finish, and zeroed usage.
//!
//! ### Example
//!
//! ```rust,no_run
//! use llm_gatekeeper::adapter::scripted::ScriptedAdapter;
//! use llm_gatekeeper::config::PolicyConfig;
//! use llm_gatekeeper::items::{CanonicalRequest, Message, Provider};
//! use llm_gatekeeper::pipeline::{run_pipeline, PipelineOptions};
//!
//! # async fn example() {
//! let adapter = ScriptedAdapter::new("claude-sonnet-4").with_text_response("Hi!", 10, 8);
//! let config = PolicyConfig::default();
//! let request = CanonicalRequest::new("req-1", Provider::Anthropic, "claude-sonnet-4")
//!     .with_message(Message::user("Hello"));
//!
//! let (response, violations) =
//!     run_pipeline(request, &adapter, &config, &PipelineOptions::default()).await;
//!
//! assert!(violations.is_empty());
//! assert_eq!(response.content.as_deref(), Some("Hi!"));
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, info_span, warn, Instrument};

use crate::adapter::ProviderAdapter;
use crate::config::PolicyConfig;
use crate::error::GatewayError;
use crate::interceptors::{alignment, grounding, hallucination, injection, pii, schema};
use crate::items::{CanonicalRequest, CanonicalResponse, FinishReason, Usage, SCHEMA_VERSION};
use crate::observability::{AuditEntry, AuditOutcome, AuditSink, CostLedger};
use crate::skills::SkillRegistry;
use crate::violation::{InterceptOutcome, InterceptorKind, Violation, ViolationCode};

/// Collaborators injected by the caller. All optional; absence disables the
/// corresponding behavior.
#[derive(Clone, Default)]
pub struct PipelineOptions {
    /// Grounds tool definitions and tool calls. Absent means grounding is
    /// skipped.
    pub skills: Option<Arc<dyn SkillRegistry>>,
    /// Receives one entry per call, blocked or not.
    pub audit: Option<Arc<dyn AuditSink>>,
    /// Accumulates per-session spend once real usage is known.
    pub ledger: Option<Arc<dyn CostLedger>>,
}

/// Runs one request through the full interceptor chain and the adapter.
///
/// Returns the canonical response paired with the violations that shaped
/// it; the violation list is empty exactly when every stage passed.
pub async fn run_pipeline(
    request: CanonicalRequest,
    adapter: &dyn ProviderAdapter,
    config: &PolicyConfig,
    options: &PipelineOptions,
) -> (CanonicalResponse, Vec<Violation>) {
    let started = Instant::now();
    let request_id = request.id.clone();
    let provider = request.provider;
    let model = request.model.clone();
    let session_id = request.session_id.clone();

    let span = info_span!(
        "pipeline",
        request_id = %request_id,
        provider = %provider,
        model = %model,
    );
    let (response, violations, interceptors_run) =
        drive(request, adapter, config, options).instrument(span).await;

    let outcome = if violations.is_empty() {
        AuditOutcome::Pass
    } else {
        AuditOutcome::Blocked
    };
    info!(
        request_id = %request_id,
        outcome = ?outcome,
        violations = violations.len(),
        "pipeline finished"
    );

    if let Some(sink) = &options.audit {
        sink.record(AuditEntry {
            timestamp: Utc::now(),
            request_id,
            provider,
            model,
            session_id,
            interceptors_run,
            violations: violations.clone(),
            outcome,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
            cost_usd: response.usage.cost_usd,
            duration_ms: started.elapsed().as_millis() as u64,
        });
    }

    (response, violations)
}

async fn drive(
    request: CanonicalRequest,
    adapter: &dyn ProviderAdapter,
    config: &PolicyConfig,
    options: &PipelineOptions,
) -> (CanonicalResponse, Vec<Violation>, Vec<InterceptorKind>) {
    // The inbound stages always appear in the audit trail, even when an
    // earlier one short-circuits the call.
    let mut ran = vec![
        InterceptorKind::InjectionScanner,
        InterceptorKind::PiiMasker,
        InterceptorKind::AlignmentChecker,
    ];

    if let InterceptOutcome::Block(violations) =
        injection::scan(&request, config.security_tier)
    {
        warn!(request_id = %request.id, "injection pattern blocked the request");
        return (synthesized_blocked(&request.id), violations, ran);
    }

    let working = pii::mask_request(&request, config.agnostic_settings.redact_pii);

    if let InterceptOutcome::Block(violations) =
        alignment::check(&working, config, options.skills.as_deref())
    {
        warn!(request_id = %request.id, "alignment checks blocked the request");
        return (synthesized_blocked(&request.id), violations, ran);
    }

    let raw = match call_adapter(&working, adapter).await {
        Ok(raw) => raw,
        Err(error) => {
            warn!(request_id = %request.id, error = %error, "adapter failure");
            return (
                synthesized_blocked(&request.id),
                vec![adapter_violation(&error)],
                ran,
            );
        }
    };

    ran.push(InterceptorKind::SchemaEnforcer);
    let response = match schema::enforce(&raw) {
        InterceptOutcome::Pass(response) => response,
        InterceptOutcome::Block(violations) => {
            return (synthesized_blocked(&request.id), violations, ran);
        }
    };

    // Real usage is known from here on; record spend even if an outbound
    // stage goes on to block the response.
    if let (Some(ledger), Some(session)) = (&options.ledger, &working.session_id) {
        ledger.record(session, response.usage.cost_usd);
    }

    ran.push(InterceptorKind::ToolGrounder);
    if let InterceptOutcome::Block(violations) =
        grounding::ground(&response, options.skills.as_deref())
    {
        return (synthesized_blocked(&request.id), violations, ran);
    }

    ran.push(InterceptorKind::HallucinationScraper);
    let whitelist = config.dependency_whitelist.as_deref().unwrap_or(&[]);
    if let InterceptOutcome::Block(violations) = hallucination::scan(&response, whitelist) {
        // The one outbound block that keeps the response body: the flagged
        // content is the evidence.
        let mut filtered = response;
        filtered.finish_reason = FinishReason::ContentFilter;
        return (filtered, violations, ran);
    }

    (response, vec![], ran)
}

async fn call_adapter(
    request: &CanonicalRequest,
    adapter: &dyn ProviderAdapter,
) -> crate::error::Result<serde_json::Value> {
    let payload = adapter.transform_request(request)?;
    let raw = adapter.execute(payload).await?;
    adapter.transform_response(raw, &request.id)
}

fn adapter_violation(error: &GatewayError) -> Violation {
    Violation::new(
        ViolationCode::AdapterError,
        InterceptorKind::Pipeline,
        error.to_string(),
    )
}

/// The response every blocked path synthesizes.
fn synthesized_blocked(request_id: &str) -> CanonicalResponse {
    CanonicalResponse {
        schema_version: SCHEMA_VERSION,
        id: request_id.to_string(),
        model_used: "guardrail".to_string(),
        content: None,
        tool_calls: vec![],
        finish_reason: FinishReason::ContentFilter,
        usage: Usage::zero(),
    }
}
