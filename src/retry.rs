//! # Retry Mechanism with Exponential Backoff
//!
//! Transport calls to provider back-ends fail transiently: connections reset,
//! rate limits trip, upstreams time out. This module provides the bounded
//! retry engine the adapter layer uses to absorb those failures.
//!
//! ## Core Components
//!
//! - **[`RetryConfig`]**: Maximum attempts, initial and maximum delays, the
//!   backoff multiplier, and whether jitter is applied.
//! - **[`backoff_delay`]**: Stateless delay computation for a given attempt
//!   index. With jitter enabled the delay is sampled uniformly from the
//!   upper half of the capped window, so concurrent clients spread out
//!   without ever halving below a useful wait.
//! - **[`retry_async`]**: Wraps an async operation in retry logic,
//!   consulting [`is_retryable`] so that policy failures never burn retry
//!   attempts.
//!
//! ### Example: Retrying an Asynchronous Operation
//!
//! ```rust
//! use llm_gatekeeper::error::{GatewayError, Result};
//! use llm_gatekeeper::retry::{retry_async, RetryConfig};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let attempts = Arc::new(AtomicUsize::new(0));
//! let counter = attempts.clone();
//!
//! let config = RetryConfig {
//!     jitter: false,
//!     ..RetryConfig::default()
//! };
//!
//! let result = retry_async(
//!     || {
//!         let counter = counter.clone();
//!         async move {
//!             if counter.fetch_add(1, Ordering::SeqCst) < 2 {
//!                 Err(GatewayError::adapter("connection reset"))
//!             } else {
//!                 Ok("hello")
//!             }
//!         }
//!     },
//!     &config,
//! )
//! .await;
//!
//! assert_eq!(result.unwrap(), "hello");
//! assert_eq!(attempts.load(Ordering::SeqCst), 3);
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{GatewayError, Result};

/// Configuration for a retry strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: usize,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Upper bound on any single delay.
    pub max_delay: Duration,

    /// Exponential backoff multiplier.
    pub backoff_multiplier: f32,

    /// Add randomness to delays to avoid thundering herds.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Computes the delay before retry number `attempt` (0-indexed).
///
/// The initial delay grows by the multiplier once per prior retry and is
/// clamped to `max_delay`. With jitter enabled, the result is drawn
/// uniformly from `[clamped / 2, clamped]`.
pub fn backoff_delay(config: &RetryConfig, attempt: usize) -> Duration {
    let growth = f64::from(config.backoff_multiplier).powi(attempt.min(32) as i32);
    let clamped = (config.initial_delay.as_secs_f64() * growth)
        .min(config.max_delay.as_secs_f64());

    if config.jitter {
        use rand::Rng;
        let floor = clamped / 2.0;
        let sampled = rand::thread_rng().gen_range(floor..=clamped);
        Duration::from_secs_f64(sampled)
    } else {
        Duration::from_secs_f64(clamped)
    }
}

/// Determines whether a given error is worth retrying.
///
/// Transport-flavored failures (adapter errors, timeouts, I/O) are
/// retryable. Everything else is deterministic and returned immediately.
pub fn is_retryable(error: &GatewayError) -> bool {
    matches!(
        error,
        GatewayError::Adapter { .. } | GatewayError::Timeout(_) | GatewayError::Io(_)
    )
}

/// Wraps an asynchronous operation with retry logic.
///
/// Calls `operation` up to `max_retries + 1` times, sleeping the backoff
/// delay between attempts. A non-retryable error, or exhausting the budget,
/// returns the error to the caller.
pub async fn retry_async<F, Fut, T>(mut operation: F, config: &RetryConfig) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0usize;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempt, "operation recovered");
                }
                return Ok(value);
            }
            Err(error) => {
                if !is_retryable(&error) || attempt >= config.max_retries {
                    debug!(attempt, error = %error, "giving up");
                    return Err(error);
                }
                let delay = backoff_delay(config, attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, backing off"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_backoff_grows_and_clamps() {
        let config = fast_config();
        assert_eq!(backoff_delay(&config, 0), Duration::from_millis(1));
        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(2));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(4));
        // Clamped at max_delay from here on.
        assert_eq!(backoff_delay(&config, 3), Duration::from_millis(4));
        assert_eq!(backoff_delay(&config, 10), Duration::from_millis(4));
    }

    #[test]
    fn test_jitter_stays_in_the_upper_half_of_the_window() {
        let config = RetryConfig {
            jitter: true,
            ..fast_config()
        };
        for _ in 0..50 {
            let delay = backoff_delay(&config, 2);
            assert!(delay >= Duration::from_micros(2000));
            assert!(delay <= Duration::from_millis(4));
        }
    }

    #[test]
    fn test_retryability_classification() {
        assert!(is_retryable(&GatewayError::adapter("reset")));
        assert!(is_retryable(&GatewayError::Timeout(Duration::from_secs(1))));
        assert!(!is_retryable(&GatewayError::config("bad field")));
        assert!(!is_retryable(&GatewayError::UnsupportedCapability {
            model: "m".into(),
            capability: "tool_use".into(),
        }));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result = retry_async(
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(GatewayError::adapter("flaky"))
                    } else {
                        Ok(42)
                    }
                }
            },
            &fast_config(),
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result: Result<()> = retry_async(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(GatewayError::adapter("always down"))
                }
            },
            &fast_config(),
        )
        .await;

        assert!(result.is_err());
        // Initial attempt plus max_retries.
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result: Result<()> = retry_async(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(GatewayError::config("deterministic"))
                }
            },
            &fast_config(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
