//! # Canonical Request and Response Shapes
//!
//! This module defines the single, versioned data shapes exchanged across the
//! adapter boundary. Callers construct a [`CanonicalRequest`], and every
//! provider back-end, whatever its native wire format, is translated into a
//! [`CanonicalResponse`] before the caller sees it. No provider-specific
//! concept appears in these types.
//!
//! ## Key Data Structures
//!
//! - **[`Provider`]**: The closed set of supported back-end tags.
//! - **[`Role`]**: The speaker of a message (`user`, `assistant`, `tool`).
//! - **[`Message`]** and **[`Content`]**: A message carries either a plain
//!   text string or an ordered list of [`ContentBlock`]s; blocks may nest, as
//!   tool-result payloads do.
//! - **[`ToolDefinition`]**: A callable tool offered to the model. Its input
//!   schema is carried as an opaque JSON value and never interpreted here.
//! - **[`CanonicalResponse`]**: The invariant response shape, including on
//!   blocked paths: a schema-version literal, the echoed request id, optional
//!   text content, validated tool calls, a [`FinishReason`], and a [`Usage`]
//!   record.
//!
//! These structures are serializable so they can be logged, audited, and
//! carried as opaque payloads through adapters.
//!
//! ### Example: Building a Request
//!
//! ```rust
//! use llm_gatekeeper::items::{CanonicalRequest, Message, Provider};
//!
//! let request = CanonicalRequest::new("req-1", Provider::Anthropic, "claude-sonnet-4")
//!     .with_system_prompt("You are a concise assistant.")
//!     .with_message(Message::user("Hello"));
//!
//! assert_eq!(request.provider, Provider::Anthropic);
//! assert_eq!(request.messages.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The response schema version this crate produces and accepts.
pub const SCHEMA_VERSION: u8 = 1;

/// The closed set of supported provider back-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Anthropic's messages API family.
    #[serde(rename = "anthropic")]
    Anthropic,
    /// OpenAI's chat completions API family.
    #[serde(rename = "openai")]
    OpenAi,
    /// A locally hosted Ollama instance.
    #[serde(rename = "local-ollama")]
    LocalOllama,
}

impl Provider {
    /// The wire tag for this provider, as it appears in policy files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAi => "openai",
            Provider::LocalOllama => "local-ollama",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the role of a message's author in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message from the end-user.
    User,
    /// A message from the AI assistant.
    Assistant,
    /// A message carrying the output of a tool.
    Tool,
}

/// Message content: either a single text string or an ordered sequence of
/// content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Plain text content.
    Text(String),
    /// Structured block content; blocks may nest.
    Blocks(Vec<ContentBlock>),
}

/// A single content block. Blocks carry an optional `text` field and an
/// optional nested `content` field, the latter used for tool-result payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

impl ContentBlock {
    /// Creates a block holding a text fragment.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            content: None,
        }
    }

    /// Creates a block wrapping a nested payload.
    pub fn nested(content: Content) -> Self {
        Self {
            text: None,
            content: Some(content),
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// The message content, string-form or block-form.
    pub content: Content,
}

impl Message {
    /// Creates a new `Message` with the `User` role and text content.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::Text(content.into()),
        }
    }

    /// Creates a new `Message` with the `Assistant` role and text content.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::Text(content.into()),
        }
    }

    /// Creates a new `Message` with the `Tool` role and block content.
    pub fn tool(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Tool,
            content: Content::Blocks(blocks),
        }
    }
}

/// A tool offered to the model. The input schema is opaque to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Identifier the model uses to call the tool.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Opaque schema for the tool's arguments.
    pub input_schema: Value,
}

/// The canonical request shape owned by the pipeline for the duration of a
/// call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    /// Caller-chosen request identifier; echoed in the response.
    pub id: String,
    /// Target provider back-end.
    pub provider: Provider,
    /// Model identifier, interpreted by the adapter.
    pub model: String,
    /// Optional system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Ordered conversation messages.
    pub messages: Vec<Message>,
    /// Tools offered to the model, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    /// Hint for the maximum number of output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Session identifier for cost aggregation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl CanonicalRequest {
    /// Creates a request with no messages, tools, or session.
    pub fn new(id: impl Into<String>, provider: Provider, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider,
            model: model.into(),
            system_prompt: None,
            messages: vec![],
            tools: None,
            max_output_tokens: None,
            session_id: None,
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Appends a message.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Offers a tool to the model.
    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.get_or_insert_with(Vec::new).push(tool);
        self
    }

    /// Sets the session identifier used for cost aggregation.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// A request from the model to call a specific tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier for this call, echoed back in tool results.
    pub id: String,
    /// Name of the tool to invoke.
    pub function_name: String,
    /// JSON-encoded argument string, decoded and validated during grounding.
    pub arguments: String,
}

/// The reason the model stopped generating, collapsed into a closed set.
/// Adapters map every provider-native finish state into one of these;
/// unknown states collapse to `ContentFilter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of generation.
    Stop,
    /// The model requested one or more tool invocations.
    ToolUse,
    /// The output-token limit was reached.
    Length,
    /// Content was filtered, by the provider or by the gateway itself.
    ContentFilter,
}

impl FinishReason {
    /// The wire form of this finish reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::ToolUse => "tool_use",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
        }
    }
}

/// Token counts and cost for a single call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the input.
    pub input_tokens: u64,
    /// Tokens generated in the output.
    pub output_tokens: u64,
    /// Computed cost in USD.
    pub cost_usd: f64,
}

impl Usage {
    /// Creates a usage record.
    pub fn new(input_tokens: u64, output_tokens: u64, cost_usd: f64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cost_usd,
        }
    }

    /// A zeroed usage record, used on blocked paths.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Rounds a USD amount to six decimal places, the precision every cost in
/// the gateway is denominated at.
pub fn round_usd(amount: f64) -> f64 {
    (amount * 1_000_000.0).round() / 1_000_000.0
}

/// The canonical response shape. Every code path through the pipeline,
/// including blocked ones, produces this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResponse {
    /// Always [`SCHEMA_VERSION`].
    pub schema_version: u8,
    /// The request identifier, echoed by the adapter.
    pub id: String,
    /// The model that produced the response, or `"guardrail"` on synthesized
    /// blocked responses.
    pub model_used: String,
    /// Text content, or `None` when the response carries none.
    pub content: Option<String>,
    /// Tool calls requested by the model. Empty on blocked paths.
    pub tool_calls: Vec<ToolCall>,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
    /// Token counts and cost.
    pub usage: Usage,
}

impl CanonicalResponse {
    /// Returns `true` if the response contains any tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_tags() {
        assert_eq!(Provider::Anthropic.as_str(), "anthropic");
        assert_eq!(Provider::OpenAi.as_str(), "openai");
        assert_eq!(Provider::LocalOllama.as_str(), "local-ollama");
    }

    #[test]
    fn test_provider_serde_round_trip() {
        let json = serde_json::to_string(&Provider::LocalOllama).unwrap();
        assert_eq!(json, "\"local-ollama\"");
        let back: Provider = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Provider::LocalOllama);
    }

    #[test]
    fn test_request_builder() {
        let request = CanonicalRequest::new("r1", Provider::OpenAi, "gpt-4o")
            .with_system_prompt("be brief")
            .with_message(Message::user("hi"))
            .with_session("s1");

        assert_eq!(request.id, "r1");
        assert_eq!(request.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.session_id.as_deref(), Some("s1"));
        assert!(request.tools.is_none());
    }

    #[test]
    fn test_message_content_forms() {
        let text = Message::user("plain");
        assert!(matches!(text.content, Content::Text(_)));

        let blocks = Message::tool(vec![
            ContentBlock::text("result"),
            ContentBlock::nested(Content::Text("nested payload".into())),
        ]);
        match &blocks.content {
            Content::Blocks(b) => assert_eq!(b.len(), 2),
            Content::Text(_) => panic!("expected blocks"),
        }
    }

    #[test]
    fn test_content_untagged_serde() {
        let text: Content = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(text, Content::Text("hello".into()));

        let blocks: Content = serde_json::from_str(r#"[{"text": "a"}]"#).unwrap();
        match blocks {
            Content::Blocks(b) => assert_eq!(b[0].text.as_deref(), Some("a")),
            Content::Text(_) => panic!("expected blocks"),
        }
    }

    #[test]
    fn test_finish_reason_wire_form() {
        assert_eq!(FinishReason::ToolUse.as_str(), "tool_use");
        let parsed: FinishReason = serde_json::from_str("\"content_filter\"").unwrap();
        assert_eq!(parsed, FinishReason::ContentFilter);
    }

    #[test]
    fn test_usage_zero() {
        let zero = Usage::zero();
        assert_eq!(zero.input_tokens, 0);
        assert_eq!(zero.output_tokens, 0);
        assert_eq!(zero.cost_usd, 0.0);
    }

    #[test]
    fn test_round_usd() {
        assert_eq!(round_usd(0.1234564), 0.123456);
        assert_eq!(round_usd(0.1234567), 0.123457);
        assert_eq!(round_usd(0.75), 0.75);
    }

    #[test]
    fn test_response_serialization() {
        let response = CanonicalResponse {
            schema_version: SCHEMA_VERSION,
            id: "r1".into(),
            model_used: "claude-sonnet-4".into(),
            content: Some("Hi!".into()),
            tool_calls: vec![],
            finish_reason: FinishReason::Stop,
            usage: Usage::new(10, 8, 0.00015),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["finish_reason"], "stop");
        assert_eq!(value["usage"]["input_tokens"], 10);
    }
}
