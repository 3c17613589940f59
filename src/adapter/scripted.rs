//! A scripted adapter for tests and examples.
//!
//! Plays back a queue of canned replies instead of calling a real back-end,
//! while still exercising the shared adapter behavior: capability checks in
//! `transform_request`, retry/timeout around `execute`, and native-to-
//! canonical mapping (including cost computation) in `transform_response`.
//! It also records every payload its transport receives, which lets tests
//! assert on what actually crossed the adapter boundary.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{GatewayError, Result};
use crate::items::CanonicalRequest;

use super::{
    calculate_cost, execute_with_policy, map_finish_state, Capability, ProviderAdapter,
    TransportPolicy,
};

/// Default per-million-token rates, in USD.
const DEFAULT_INPUT_RATE: f64 = 3.0;
const DEFAULT_OUTPUT_RATE: f64 = 15.0;

/// A provider adapter that replays scripted responses.
pub struct ScriptedAdapter {
    model: String,
    tool_use_supported: bool,
    input_rate: f64,
    output_rate: f64,
    policy: TransportPolicy,
    replies: Mutex<VecDeque<Value>>,
    received: Mutex<Vec<Value>>,
    failures_remaining: Mutex<usize>,
}

impl ScriptedAdapter {
    /// Creates an adapter for the given model with an empty script.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            tool_use_supported: true,
            input_rate: DEFAULT_INPUT_RATE,
            output_rate: DEFAULT_OUTPUT_RATE,
            policy: TransportPolicy::default(),
            replies: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
            failures_remaining: Mutex::new(0),
        }
    }

    /// Queues a plain text reply with the given token counts.
    pub fn with_text_response(
        self,
        content: impl Into<String>,
        tokens_in: u64,
        tokens_out: u64,
    ) -> Self {
        self.push_reply(json!({
            "reply": content.into(),
            "calls": [],
            "finish": "end_turn",
            "tokens_in": tokens_in,
            "tokens_out": tokens_out,
        }));
        self
    }

    /// Queues a reply requesting one tool call.
    pub fn with_tool_call(self, function_name: impl Into<String>, arguments: Value) -> Self {
        self.push_reply(json!({
            "reply": null,
            "calls": [{
                "id": Uuid::new_v4().to_string(),
                "name": function_name.into(),
                "args": arguments.to_string(),
            }],
            "finish": "tool_calls",
            "tokens_in": 12,
            "tokens_out": 4,
        }));
        self
    }

    /// Queues a text reply with an arbitrary provider-native finish state.
    pub fn with_native_finish(self, content: impl Into<String>, finish: impl Into<String>) -> Self {
        self.push_reply(json!({
            "reply": content.into(),
            "calls": [],
            "finish": finish.into(),
            "tokens_in": 5,
            "tokens_out": 5,
        }));
        self
    }

    /// Queues a value that `transform_response` passes through verbatim,
    /// bypassing native mapping. Lets tests feed the schema enforcer
    /// arbitrary shapes.
    pub fn with_passthrough(self, value: Value) -> Self {
        self.push_reply(json!({ "passthrough": value }));
        self
    }

    /// Makes the next `count` transport attempts fail before succeeding.
    pub fn failing(self, count: usize) -> Self {
        *self.failures_remaining.lock().unwrap() = count;
        self
    }

    /// Reports the model as unable to call tools.
    pub fn without_tool_support(mut self) -> Self {
        self.tool_use_supported = false;
        self
    }

    /// Overrides the per-million-token rates used for cost computation.
    pub fn with_rates(mut self, input_rate: f64, output_rate: f64) -> Self {
        self.input_rate = input_rate;
        self.output_rate = output_rate;
        self
    }

    /// Overrides the transport retry/timeout policy.
    pub fn with_transport_policy(mut self, policy: TransportPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The payloads the transport has received, in order.
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    fn push_reply(&self, reply: Value) {
        self.replies.lock().unwrap().push_back(reply);
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn transform_request(&self, request: &CanonicalRequest) -> Result<Value> {
        if request.tools.as_ref().is_some_and(|tools| !tools.is_empty())
            && !self.validate_capabilities(Capability::ToolUse)
        {
            return Err(GatewayError::UnsupportedCapability {
                model: self.model.clone(),
                capability: Capability::ToolUse.as_str().to_string(),
            });
        }
        Ok(serde_json::to_value(request)?)
    }

    async fn execute(&self, payload: Value) -> Result<Value> {
        execute_with_policy(&self.policy, || {
            let payload = payload.clone();
            async move {
                {
                    let mut failures = self.failures_remaining.lock().unwrap();
                    if *failures > 0 {
                        *failures -= 1;
                        return Err(GatewayError::adapter("scripted transport failure"));
                    }
                }
                self.received.lock().unwrap().push(payload);
                let reply = self.replies.lock().unwrap().pop_front();
                Ok(reply.unwrap_or_else(|| {
                    json!({
                        "reply": "ok",
                        "calls": [],
                        "finish": "end_turn",
                        "tokens_in": 1,
                        "tokens_out": 1,
                    })
                }))
            }
        })
        .await
    }

    fn transform_response(&self, raw: Value, request_id: &str) -> Result<Value> {
        if let Some(passthrough) = raw.get("passthrough") {
            return Ok(passthrough.clone());
        }

        let tokens_in = raw.get("tokens_in").and_then(Value::as_u64).unwrap_or(0);
        let tokens_out = raw.get("tokens_out").and_then(Value::as_u64).unwrap_or(0);
        let finish = raw
            .get("finish")
            .and_then(Value::as_str)
            .map(map_finish_state)
            .ok_or_else(|| GatewayError::adapter("scripted reply is missing a finish state"))?;

        let tool_calls: Vec<Value> = raw
            .get("calls")
            .and_then(Value::as_array)
            .map(|calls| {
                calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.get("id").cloned().unwrap_or(Value::Null),
                            "function_name": call.get("name").cloned().unwrap_or(Value::Null),
                            "arguments": call.get("args").cloned().unwrap_or(Value::Null),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(json!({
            "schema_version": 1,
            "id": request_id,
            "model_used": self.model,
            "content": raw.get("reply").cloned().unwrap_or(Value::Null),
            "tool_calls": tool_calls,
            "finish_reason": finish.as_str(),
            "usage": {
                "input_tokens": tokens_in,
                "output_tokens": tokens_out,
                "cost_usd": calculate_cost(tokens_in, tokens_out, self.input_rate, self.output_rate),
            },
        }))
    }

    fn validate_capabilities(&self, capability: Capability) -> bool {
        match capability {
            Capability::ToolUse => self.tool_use_supported,
            Capability::SystemPrompt => true,
            Capability::JsonOutput => true,
        }
    }
}
