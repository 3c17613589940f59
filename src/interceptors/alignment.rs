//! Project alignment checker: pre-flight policy enforcement.
//!
//! Runs three checks over the (already masked) request and collects every
//! violation rather than stopping at the first: the provider allow-list, the
//! estimated-cost ceiling, and tool scope against the skill registry. A
//! request that fails two checks reports both.

use serde_json::json;

use super::collect_texts;
use crate::config::PolicyConfig;
use crate::items::{round_usd, CanonicalRequest};
use crate::skills::SkillRegistry;
use crate::violation::{payload, InterceptOutcome, InterceptorKind, Violation, ViolationCode};

/// Conservative per-token USD rate used for the pre-flight estimate.
const ESTIMATE_RATE_PER_TOKEN: f64 = 15.0 / 1_000_000.0;

/// Rough token estimate: one token per four characters of textual content,
/// rounded up.
pub fn estimate_tokens(request: &CanonicalRequest) -> u64 {
    let chars: usize = collect_texts(request).iter().map(|t| t.chars().count()).sum();
    chars.div_ceil(4) as u64
}

/// Runs all three alignment checks, aggregating violations.
pub fn check(
    request: &CanonicalRequest,
    config: &PolicyConfig,
    skills: Option<&dyn SkillRegistry>,
) -> InterceptOutcome<()> {
    let mut violations = Vec::new();
    let settings = &config.agnostic_settings;

    if !settings.allowed_providers.contains(&request.provider) {
        let allowed: Vec<&str> = settings
            .allowed_providers
            .iter()
            .map(|p| p.as_str())
            .collect();
        violations.push(
            Violation::new(
                ViolationCode::ProviderNotAllowed,
                InterceptorKind::AlignmentChecker,
                format!("provider {} is not in the allow-list", request.provider),
            )
            .with_payload(payload(vec![
                ("requested", json!(request.provider.as_str())),
                ("allowed", json!(allowed)),
            ])),
        );
    }

    let estimated_tokens = estimate_tokens(request);
    let estimated_cost = round_usd(estimated_tokens as f64 * ESTIMATE_RATE_PER_TOKEN);
    // An estimate exactly at the ceiling is allowed; strictly greater blocks.
    if estimated_cost > settings.max_token_spend_per_call {
        violations.push(
            Violation::new(
                ViolationCode::BudgetExceeded,
                InterceptorKind::AlignmentChecker,
                format!(
                    "estimated cost ${estimated_cost:.6} exceeds per-call ceiling ${:.6}",
                    settings.max_token_spend_per_call
                ),
            )
            .with_payload(payload(vec![
                ("estimated_tokens", json!(estimated_tokens)),
                ("estimated_cost_usd", json!(estimated_cost)),
                ("ceiling_usd", json!(settings.max_token_spend_per_call)),
            ])),
        );
    }

    if let (Some(registry), Some(tools)) = (skills, &request.tools) {
        for tool in tools {
            if !registry.has(&tool.name) {
                violations.push(
                    Violation::new(
                        ViolationCode::ToolNotGrounded,
                        InterceptorKind::AlignmentChecker,
                        format!("requested tool {} is not a registered skill", tool.name),
                    )
                    .with_payload(payload(vec![("tool", json!(tool.name))])),
                );
            }
        }
    }

    if violations.is_empty() {
        InterceptOutcome::Pass(())
    } else {
        InterceptOutcome::Block(violations)
    }
}
