//! # Error Handling for the Gateway
//!
//! This module defines the centralized error handling system for the crate.
//! It provides a unified `Result` type and a [`GatewayError`] enum covering
//! the failures that can occur around the pipeline boundary.
//!
//! Inside the pipeline, failures are values: interceptors return
//! pass-or-block outcomes and `run_pipeline` never returns an error to its
//! caller. `GatewayError` exists for the places where a typed error is the
//! honest shape: the policy-file loader (no canonical response exists yet at
//! startup), adapter internals (transport, timeout, capability checks), and
//! registry resolution. The pipeline wraps adapter errors into
//! `ADAPTER_ERROR` violations at its boundary.
//!
//! ## The `Result` Type Alias
//!
//! For convenience, this module provides a `Result<T>` alias with
//! [`GatewayError`] as the default error type.
//!
//! ### Example
//!
//! ```rust
//! use llm_gatekeeper::error::{GatewayError, Result};
//!
//! fn check_name(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         Err(GatewayError::Config {
//!             message: "project_name must be a non-empty string".to_string(),
//!         })
//!     } else {
//!         Ok(())
//!     }
//! }
//!
//! let error = check_name("").unwrap_err();
//! assert_eq!(
//!     error.to_string(),
//!     "configuration error: project_name must be a non-empty string"
//! );
//! ```

use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for the gateway.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// The main error enum for the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The policy file failed validation at load time. The message names the
    /// offending field.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A transport or transform failure inside a provider adapter.
    #[error("adapter error: {message}")]
    Adapter { message: String },

    /// The requested capability is not supported by the target model.
    #[error("model {model} does not support {capability}")]
    UnsupportedCapability { model: String, capability: String },

    /// The provider tag is not in the configured allow-list.
    #[error("provider not allowed: {provider}")]
    ProviderNotAllowed {
        provider: String,
        allowed: Vec<String>,
    },

    /// The provider tag is allowed but no adapter has been registered for it.
    #[error("no registered adapter for provider: {provider}")]
    AdapterNotRegistered { provider: String },

    /// An adapter attempt exceeded its per-attempt timeout.
    #[error("adapter attempt timed out after {0:?}")]
    Timeout(Duration),

    /// An error that occurred during JSON serialization or deserialization.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error, typically from reading the policy file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Shorthand for an adapter failure with a formatted message.
    pub fn adapter(message: impl Into<String>) -> Self {
        GatewayError::Adapter {
            message: message.into(),
        }
    }

    /// Shorthand for a configuration failure naming the offending field.
    pub fn config(message: impl Into<String>) -> Self {
        GatewayError::Config {
            message: message.into(),
        }
    }

    /// The violation code this error surfaces as when it crosses a policy
    /// boundary. Both registry failure modes report `PROVIDER_NOT_ALLOWED`;
    /// everything transport-shaped is an `ADAPTER_ERROR`.
    pub fn violation_code(&self) -> crate::violation::ViolationCode {
        use crate::violation::ViolationCode;
        match self {
            GatewayError::Config { .. } => ViolationCode::ConfigError,
            GatewayError::ProviderNotAllowed { .. } | GatewayError::AdapterNotRegistered { .. } => {
                ViolationCode::ProviderNotAllowed
            }
            GatewayError::Adapter { .. }
            | GatewayError::UnsupportedCapability { .. }
            | GatewayError::Timeout(_)
            | GatewayError::Serialization(_)
            | GatewayError::Io(_) => ViolationCode::AdapterError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::adapter("connection reset");
        assert_eq!(err.to_string(), "adapter error: connection reset");

        let err = GatewayError::Timeout(Duration::from_secs(30));
        assert!(err.to_string().contains("timed out"));

        let err = GatewayError::ProviderNotAllowed {
            provider: "local-ollama".into(),
            allowed: vec!["anthropic".into()],
        };
        assert_eq!(err.to_string(), "provider not allowed: local-ollama");
    }

    #[test]
    fn test_error_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: GatewayError = parse_err.into();
        assert!(matches!(err, GatewayError::Serialization(_)));
    }

    #[test]
    fn test_result_type() {
        fn ok() -> Result<&'static str> {
            Ok("fine")
        }
        assert_eq!(ok().unwrap(), "fine");
    }

    #[test]
    fn test_violation_code_mapping() {
        use crate::violation::ViolationCode;

        let not_allowed = GatewayError::ProviderNotAllowed {
            provider: "local-ollama".into(),
            allowed: vec![],
        };
        assert_eq!(not_allowed.violation_code(), ViolationCode::ProviderNotAllowed);

        let unregistered = GatewayError::AdapterNotRegistered {
            provider: "openai".into(),
        };
        assert_eq!(
            unregistered.violation_code(),
            ViolationCode::ProviderNotAllowed
        );

        assert_eq!(
            GatewayError::adapter("reset").violation_code(),
            ViolationCode::AdapterError
        );
        assert_eq!(
            GatewayError::config("bad").violation_code(),
            ViolationCode::ConfigError
        );
    }
}
