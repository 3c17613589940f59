//! Canonical-response schema enforcer.
//!
//! An adapter's `transform_response` hands back an untyped JSON value. This
//! stage verifies the value field by field against the canonical shape and
//! produces the typed [`CanonicalResponse`] on success. Every failing field
//! yields its own `SCHEMA_MISMATCH` violation naming the field, so a
//! misbehaving adapter is diagnosed in one pass.

use serde_json::{json, Value};

use crate::items::{CanonicalResponse, FinishReason, ToolCall, Usage, SCHEMA_VERSION};
use crate::violation::{payload, InterceptOutcome, InterceptorKind, Violation, ViolationCode};

fn mismatch(field: &str, detail: impl Into<String>) -> Violation {
    Violation::new(
        ViolationCode::SchemaMismatch,
        InterceptorKind::SchemaEnforcer,
        detail.into(),
    )
    .with_payload(payload(vec![("field", json!(field))]))
}

/// Validates a raw adapter value against the canonical response shape.
pub fn enforce(value: &Value) -> InterceptOutcome<CanonicalResponse> {
    let Some(object) = value.as_object() else {
        return InterceptOutcome::Block(vec![mismatch(
            "response",
            "adapter returned a non-object response",
        )]);
    };

    let mut violations = Vec::new();

    match object.get("schema_version").and_then(Value::as_u64) {
        Some(version) if version == u64::from(SCHEMA_VERSION) => {}
        _ => violations.push(mismatch(
            "schema_version",
            format!("schema_version must be the literal {SCHEMA_VERSION}"),
        )),
    }

    let id = match object.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Some(id.to_string()),
        _ => {
            violations.push(mismatch("id", "id must be a non-empty string"));
            None
        }
    };

    let model_used = match object.get("model_used").and_then(Value::as_str) {
        Some(model) => Some(model.to_string()),
        None => {
            violations.push(mismatch("model_used", "model_used must be a string"));
            None
        }
    };

    let content = match object.get("content") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            violations.push(mismatch(
                "content",
                "content must be a string or explicitly absent",
            ));
            None
        }
    };

    let tool_calls = match object.get("tool_calls") {
        Some(Value::Array(entries)) => {
            let mut calls = Vec::with_capacity(entries.len());
            for (index, entry) in entries.iter().enumerate() {
                let function_name = entry.get("function_name").and_then(Value::as_str);
                let arguments = entry.get("arguments").and_then(Value::as_str);
                match (function_name, arguments) {
                    (Some(name), Some(args)) => calls.push(ToolCall {
                        id: entry
                            .get("id")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        function_name: name.to_string(),
                        arguments: args.to_string(),
                    }),
                    _ => violations.push(mismatch(
                        "tool_calls",
                        format!(
                            "tool_calls[{index}] must carry string function_name and arguments"
                        ),
                    )),
                }
            }
            calls
        }
        _ => {
            violations.push(mismatch("tool_calls", "tool_calls must be an array"));
            vec![]
        }
    };

    let finish_reason = match object
        .get("finish_reason")
        .and_then(|v| serde_json::from_value::<FinishReason>(v.clone()).ok())
    {
        Some(reason) => Some(reason),
        None => {
            violations.push(mismatch(
                "finish_reason",
                "finish_reason must be one of stop, tool_use, length, content_filter",
            ));
            None
        }
    };

    let usage = match object.get("usage").and_then(Value::as_object) {
        Some(usage) => {
            let input = usage.get("input_tokens").and_then(Value::as_u64);
            let output = usage.get("output_tokens").and_then(Value::as_u64);
            let cost = usage.get("cost_usd").and_then(Value::as_f64);
            match (input, output, cost) {
                (Some(input_tokens), Some(output_tokens), Some(cost_usd)) => Some(Usage {
                    input_tokens,
                    output_tokens,
                    cost_usd,
                }),
                _ => {
                    violations.push(mismatch(
                        "usage",
                        "usage must carry numeric input_tokens, output_tokens, cost_usd",
                    ));
                    None
                }
            }
        }
        None => {
            violations.push(mismatch("usage", "usage must be a record"));
            None
        }
    };

    if violations.is_empty() {
        if let (Some(id), Some(model_used), Some(finish_reason), Some(usage)) =
            (id, model_used, finish_reason, usage)
        {
            return InterceptOutcome::Pass(CanonicalResponse {
                schema_version: SCHEMA_VERSION,
                id,
                model_used,
                content,
                tool_calls,
                finish_reason,
                usage,
            });
        }
    }

    InterceptOutcome::Block(violations)
}
