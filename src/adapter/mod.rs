//! # Provider Adapter Boundary
//!
//! A thin boundary between the pipeline and any LLM back-end. An adapter
//! translates the canonical request into its provider's native shape,
//! performs the transport call, and translates the native response back into
//! a canonical-shaped value. The pipeline works only through the
//! [`ProviderAdapter`] trait; no concrete adapter type escapes its
//! implementation boundary, and the opaque payloads cross it as
//! [`serde_json::Value`].
//!
//! The module also carries the behavior every adapter shares:
//!
//! - [`execute_with_policy`]: bounded retry with exponential backoff and a
//!   per-attempt timeout around the transport call.
//! - [`calculate_cost`]: the USD cost for a token count pair at per-million
//!   rates, rounded to six decimal places.
//! - [`map_finish_state`]: collapses provider-native finish states into the
//!   canonical closed set; anything unknown becomes `content_filter`.

pub mod registry;
pub mod scripted;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::items::{round_usd, CanonicalRequest, FinishReason};
use crate::retry::{retry_async, RetryConfig};

/// Capabilities a model may or may not support, self-reported by adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Function/tool calling.
    ToolUse,
    /// A dedicated system-prompt slot.
    SystemPrompt,
    /// Structured JSON output mode.
    JsonOutput,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ToolUse => "tool_use",
            Capability::SystemPrompt => "system_prompt",
            Capability::JsonOutput => "json_output",
        }
    }
}

/// The four-operation contract every provider adapter implements.
///
/// `execute` is the pipeline's only suspension point; the other operations
/// are pure translations over in-memory data.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Translates a canonical request into the provider's native shape.
    /// Fails when the request needs a capability the target model lacks.
    fn transform_request(&self, request: &CanonicalRequest) -> Result<Value>;

    /// Performs the transport call. Implementations own retry, timeout, and
    /// status handling; every failure mode surfaces as an adapter error.
    async fn execute(&self, payload: Value) -> Result<Value>;

    /// Translates the provider's native response into a canonical-shaped
    /// value, echoing the given request identifier. The schema enforcer
    /// validates the result; adapters map unknown finish states to
    /// `content_filter`.
    fn transform_response(&self, raw: Value, request_id: &str) -> Result<Value>;

    /// Read-only self-report from the adapter's model/feature matrix.
    fn validate_capabilities(&self, capability: Capability) -> bool;
}

impl std::fmt::Debug for dyn ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn ProviderAdapter")
    }
}

/// Retry and timeout parameters shared by adapter transports.
#[derive(Debug, Clone)]
pub struct TransportPolicy {
    /// Backoff schedule for transient failures.
    pub retry: RetryConfig,
    /// Ceiling on any single transport attempt.
    pub attempt_timeout: Duration,
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

/// Runs a transport operation under the policy's per-attempt timeout and
/// retry schedule.
pub async fn execute_with_policy<F, Fut>(policy: &TransportPolicy, mut operation: F) -> Result<Value>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<Value>>,
{
    let attempt_timeout = policy.attempt_timeout;
    retry_async(
        || {
            let attempt = operation();
            async move {
                match tokio::time::timeout(attempt_timeout, attempt).await {
                    Ok(result) => result,
                    Err(_) => Err(GatewayError::Timeout(attempt_timeout)),
                }
            }
        },
        &policy.retry,
    )
    .await
}

/// Computes the USD cost of a call from token counts and per-million-token
/// rates, rounded to six decimal places.
pub fn calculate_cost(
    input_tokens: u64,
    output_tokens: u64,
    input_rate_per_million: f64,
    output_rate_per_million: f64,
) -> f64 {
    let input_cost = input_tokens as f64 / 1_000_000.0 * input_rate_per_million;
    let output_cost = output_tokens as f64 / 1_000_000.0 * output_rate_per_million;
    round_usd(input_cost + output_cost)
}

/// Collapses a provider-native finish state into the canonical closed set.
pub fn map_finish_state(state: &str) -> FinishReason {
    match state {
        "stop" | "end_turn" | "stop_sequence" => FinishReason::Stop,
        "tool_use" | "tool_calls" | "function_call" => FinishReason::ToolUse,
        "length" | "max_tokens" => FinishReason::Length,
        _ => FinishReason::ContentFilter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> TransportPolicy {
        TransportPolicy {
            retry: RetryConfig {
                max_retries: 2,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                backoff_multiplier: 2.0,
                jitter: false,
            },
            attempt_timeout: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_cost_calculation_rounds_to_six_places() {
        // 10 input at $15/M plus 8 output at $75/M.
        let cost = calculate_cost(10, 8, 15.0, 75.0);
        assert_eq!(cost, 0.00075);

        let tiny = calculate_cost(1, 0, 3.0, 15.0);
        assert_eq!(tiny, 0.000003);

        let zero = calculate_cost(0, 0, 15.0, 75.0);
        assert_eq!(zero, 0.0);
    }

    #[test]
    fn test_finish_state_mapping() {
        assert_eq!(map_finish_state("end_turn"), FinishReason::Stop);
        assert_eq!(map_finish_state("tool_calls"), FinishReason::ToolUse);
        assert_eq!(map_finish_state("max_tokens"), FinishReason::Length);
        // Unknown states collapse to content_filter.
        assert_eq!(map_finish_state("weird_state"), FinishReason::ContentFilter);
        assert_eq!(map_finish_state(""), FinishReason::ContentFilter);
    }

    #[tokio::test]
    async fn test_execute_with_policy_retries_transient_failures() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result = execute_with_policy(&fast_policy(), || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 1 {
                    Err(GatewayError::adapter("reset"))
                } else {
                    Ok(json!({"ok": true}))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), json!({"ok": true}));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_execute_with_policy_times_out_slow_attempts() {
        let policy = TransportPolicy {
            attempt_timeout: Duration::from_millis(5),
            ..fast_policy()
        };

        let result = execute_with_policy(&policy, || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(json!({}))
        })
        .await;

        assert!(matches!(result, Err(GatewayError::Timeout(_))));
    }
}
