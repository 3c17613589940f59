//! Observability collaborators: audit trail and cost ledger.
//!
//! Both are injected at the pipeline boundary and must tolerate concurrent
//! calls; the pipeline itself holds no mutable state. The in-memory
//! implementations here back tests and single-process deployments.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::items::Provider;
use crate::violation::{InterceptorKind, Violation};

/// How a pipeline call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Pass,
    Blocked,
}

/// One structured record per pipeline call, blocked or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the call completed.
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub provider: Provider,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// The interceptors that ran, in execution order.
    pub interceptors_run: Vec<InterceptorKind>,
    /// Violations surfaced by the call; empty on a clean pass.
    pub violations: Vec<Violation>,
    pub outcome: AuditOutcome,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub duration_ms: u64,
}

/// Consumes audit entries. Implementations must be safe under concurrent
/// calls.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Collects audit entries in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

/// Accumulates per-session spend.
pub trait CostLedger: Send + Sync {
    /// Adds `cost_usd` to the session's running total.
    fn record(&self, session_id: &str, cost_usd: f64);

    /// The session's accumulated spend; zero for unknown sessions.
    fn total(&self, session_id: &str) -> f64;

    /// Whether adding `additional_usd` would push the session past
    /// `ceiling_usd`. Pessimistic: callers pass the pre-call estimate.
    fn would_exceed(&self, session_id: &str, additional_usd: f64, ceiling_usd: f64) -> bool {
        self.total(session_id) + additional_usd > ceiling_usd
    }
}

/// An in-memory ledger. The mutex serializes the read-modify-write on each
/// session total.
#[derive(Debug, Default)]
pub struct MemoryCostLedger {
    totals: Mutex<HashMap<String, f64>>,
}

impl MemoryCostLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CostLedger for MemoryCostLedger {
    fn record(&self, session_id: &str, cost_usd: f64) {
        let mut totals = self.totals.lock().unwrap();
        *totals.entry(session_id.to_string()).or_insert(0.0) += cost_usd;
    }

    fn total(&self, session_id: &str) -> f64 {
        self.totals
            .lock()
            .unwrap()
            .get(session_id)
            .copied()
            .unwrap_or(0.0)
    }
}
