//! Violations and the pass-or-block carrier returned by interceptors.
//!
//! Interceptors never signal failure by panicking or returning an error to
//! the pipeline. Each stage returns an [`InterceptOutcome`]: a pass,
//! optionally carrying the stage's transformed output, or a block carrying a
//! non-empty list of [`Violation`] records. The pipeline converts blocks into
//! a canonical response with a `content_filter` finish reason, so callers
//! always receive structured data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed set of violation codes surfaced by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    /// A structural prompt-injection pattern matched the request.
    InjectionDetected,
    /// Reserved: the default policy redacts PII instead of blocking.
    PiiDetected,
    /// The pre-flight cost estimate exceeded the configured ceiling.
    BudgetExceeded,
    /// The request's provider is not in the allow-list.
    ProviderNotAllowed,
    /// The adapter returned a value that is not a canonical response.
    SchemaMismatch,
    /// A tool reference does not resolve against the skill registry.
    ToolNotGrounded,
    /// Model output references a package outside the dependency whitelist.
    HallucinationDetected,
    /// A transport, transform, or capability failure inside an adapter.
    AdapterError,
    /// The policy file failed validation at load time.
    ConfigError,
}

impl ViolationCode {
    /// The wire form of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationCode::InjectionDetected => "INJECTION_DETECTED",
            ViolationCode::PiiDetected => "PII_DETECTED",
            ViolationCode::BudgetExceeded => "BUDGET_EXCEEDED",
            ViolationCode::ProviderNotAllowed => "PROVIDER_NOT_ALLOWED",
            ViolationCode::SchemaMismatch => "SCHEMA_MISMATCH",
            ViolationCode::ToolNotGrounded => "TOOL_NOT_GROUNDED",
            ViolationCode::HallucinationDetected => "HALLUCINATION_DETECTED",
            ViolationCode::AdapterError => "ADAPTER_ERROR",
            ViolationCode::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl std::fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies which stage produced a violation: one of the six interceptors,
/// or the pipeline itself for adapter failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptorKind {
    InjectionScanner,
    PiiMasker,
    AlignmentChecker,
    SchemaEnforcer,
    ToolGrounder,
    HallucinationScraper,
    Pipeline,
}

impl InterceptorKind {
    /// The stage name used in audit entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            InterceptorKind::InjectionScanner => "injection_scanner",
            InterceptorKind::PiiMasker => "pii_masker",
            InterceptorKind::AlignmentChecker => "alignment_checker",
            InterceptorKind::SchemaEnforcer => "schema_enforcer",
            InterceptorKind::ToolGrounder => "tool_grounder",
            InterceptorKind::HallucinationScraper => "hallucination_scraper",
            InterceptorKind::Pipeline => "pipeline",
        }
    }
}

impl std::fmt::Display for InterceptorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured policy violation. The payload carries PII-free forensic
/// context, such as the matched pattern or the offending field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Which rule was violated.
    pub code: ViolationCode,
    /// Human-readable description.
    pub message: String,
    /// The stage that produced this violation.
    pub interceptor: InterceptorKind,
    /// Sanitized forensic context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

impl Violation {
    /// Creates a violation without a payload.
    pub fn new(
        code: ViolationCode,
        interceptor: InterceptorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            interceptor,
            payload: None,
        }
    }

    /// Attaches a forensic payload. Callers must only include sanitized,
    /// PII-free values.
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// The tagged result every interceptor returns.
///
/// `Pass` optionally carries a transformed payload of the stage's output
/// type, such as the masked request from the PII stage or the typed response
/// from the schema stage. `Block` carries the stage's collected violations
/// and is always non-empty.
#[derive(Debug, Clone, PartialEq)]
pub enum InterceptOutcome<T> {
    /// The stage passed, yielding its (possibly transformed) output.
    Pass(T),
    /// The stage blocked the call.
    Block(Vec<Violation>),
}

impl<T> InterceptOutcome<T> {
    /// Returns `true` for a passing outcome.
    pub fn is_pass(&self) -> bool {
        matches!(self, InterceptOutcome::Pass(_))
    }

    /// Consumes the outcome, returning the violations of a block or an empty
    /// list for a pass.
    pub fn into_violations(self) -> Vec<Violation> {
        match self {
            InterceptOutcome::Pass(_) => vec![],
            InterceptOutcome::Block(violations) => violations,
        }
    }
}

/// Builds a payload map from key/value pairs. Values are anything
/// convertible to [`serde_json::Value`].
pub(crate) fn payload(entries: Vec<(&str, Value)>) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
