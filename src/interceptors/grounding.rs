//! Tool-call grounder.
//!
//! Confirms every tool call in a response refers to a real, registered
//! skill. When the registry carries a validator for the skill, the call's
//! arguments are additionally decoded and validated; without a validator
//! the name check alone decides. Without an injected registry the stage
//! passes; grounding is deferred to observability in such deployments.

use serde_json::{json, Map, Value};

use crate::items::CanonicalResponse;
use crate::skills::SkillRegistry;
use crate::violation::{payload, InterceptOutcome, InterceptorKind, Violation, ViolationCode};

fn not_grounded(message: String, context: Vec<(&str, Value)>) -> Violation {
    Violation::new(
        ViolationCode::ToolNotGrounded,
        InterceptorKind::ToolGrounder,
        message,
    )
    .with_payload(payload(context))
}

/// Checks each tool call against the registry, collecting all violations.
pub fn ground(
    response: &CanonicalResponse,
    skills: Option<&dyn SkillRegistry>,
) -> InterceptOutcome<()> {
    let Some(registry) = skills else {
        return InterceptOutcome::Pass(());
    };
    if response.tool_calls.is_empty() {
        return InterceptOutcome::Pass(());
    }

    let mut violations = Vec::new();

    for call in &response.tool_calls {
        if !registry.has(&call.function_name) {
            violations.push(not_grounded(
                format!("tool call {} has no registered skill", call.function_name),
                vec![("function", json!(call.function_name))],
            ));
            continue;
        }

        // Arguments are only decoded when a validator exists for the skill.
        if !registry.has_validator(&call.function_name) {
            continue;
        }

        let decoded: Option<Map<String, Value>> = serde_json::from_str::<Value>(&call.arguments)
            .ok()
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            });

        let Some(arguments) = decoded else {
            violations.push(not_grounded(
                format!(
                    "tool call {} carries undecodable arguments",
                    call.function_name
                ),
                vec![
                    ("function", json!(call.function_name)),
                    ("raw_arguments", json!(call.arguments)),
                ],
            ));
            continue;
        };

        if registry.validate_arguments(&call.function_name, &arguments) == Some(false) {
            violations.push(not_grounded(
                format!(
                    "tool call {} failed argument validation",
                    call.function_name
                ),
                vec![("function", json!(call.function_name))],
            ));
        }
    }

    if violations.is_empty() {
        InterceptOutcome::Pass(())
    } else {
        InterceptOutcome::Block(violations)
    }
}
