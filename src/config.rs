//! Policy configuration: the JSON file that drives every interceptor.
//!
//! The configuration is produced once at startup by [`PolicyConfig::from_file`]
//! or [`PolicyConfig::from_json_str`] and held for the process lifetime. Every
//! deviation from the documented shape is rejected at load time with a
//! [`GatewayError::Config`] naming the offending field; after a successful
//! load the value is never mutated. Interceptors take it by shared reference.

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::items::{Provider, SCHEMA_VERSION};

/// Coarse policy dial selecting how many injection pattern categories apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityTier {
    /// All pattern categories, including roleplay and persona framing.
    Strict,
    /// The baseline categories only.
    Moderate,
    /// Same pattern coverage as `Moderate`; reserved for future loosening.
    Permissive,
}

/// Provider-agnostic enforcement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgnosticSettings {
    /// Whether the PII masker rewrites textual fields.
    pub redact_pii: bool,
    /// Pre-flight cost ceiling per call, in USD.
    pub max_token_spend_per_call: f64,
    /// Providers a request may target. Never empty after validation.
    pub allowed_providers: Vec<Provider>,
}

/// Free-form labels recorded in the audit trail. The gateway does not
/// interpret them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyHooks {
    pub pre_flight: Vec<String>,
    pub post_flight: Vec<String>,
}

/// The policy configuration, logically frozen after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Project this policy belongs to.
    pub project_name: String,
    /// Injection-scanner tier.
    pub security_tier: SecurityTier,
    /// Must equal [`SCHEMA_VERSION`].
    pub schema_version: u8,
    /// Enforcement settings shared across providers.
    pub agnostic_settings: AgnosticSettings,
    /// Audit-trail labels.
    pub safety_hooks: SafetyHooks,
    /// Package names permitted in model output. `None` or empty disables
    /// hallucination scraping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_whitelist: Option<Vec<String>>,
}

impl PolicyConfig {
    /// Parses and validates a policy from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PolicyConfig = serde_json::from_str(json)
            .map_err(|e| GatewayError::config(format!("invalid policy file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a policy file from disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks the value constraints the serde shape cannot express.
    fn validate(&self) -> Result<()> {
        if self.project_name.is_empty() {
            return Err(GatewayError::config(
                "project_name must be a non-empty string",
            ));
        }
        if self.schema_version != SCHEMA_VERSION {
            return Err(GatewayError::config(format!(
                "schema_version must be {SCHEMA_VERSION}, got {}",
                self.schema_version
            )));
        }
        if !self.agnostic_settings.max_token_spend_per_call.is_finite() {
            return Err(GatewayError::config(
                "agnostic_settings.max_token_spend_per_call must be a finite number",
            ));
        }
        if self.agnostic_settings.allowed_providers.is_empty() {
            return Err(GatewayError::config(
                "agnostic_settings.allowed_providers must not be empty",
            ));
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            project_name: "gateway".to_string(),
            security_tier: SecurityTier::Moderate,
            schema_version: SCHEMA_VERSION,
            agnostic_settings: AgnosticSettings {
                redact_pii: true,
                max_token_spend_per_call: 1.0,
                allowed_providers: vec![
                    Provider::Anthropic,
                    Provider::OpenAi,
                    Provider::LocalOllama,
                ],
            },
            safety_hooks: SafetyHooks::default(),
            dependency_whitelist: None,
        }
    }
}
