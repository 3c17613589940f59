//! Structural prompt-injection scanner.
//!
//! Matches the shape of an injection attempt rather than any specific surface
//! wording: instruction overrides, role reassignment, priority inversion, and
//! context poisoning at every tier, plus roleplay, hypothetical, and persona
//! framing under `STRICT`. The scanner is read-only; it never rewrites the
//! request.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use super::collect_texts;
use crate::config::SecurityTier;
use crate::items::CanonicalRequest;
use crate::violation::{payload, InterceptOutcome, InterceptorKind, Violation, ViolationCode};

/// A single structural-intent rule with a compiled pattern.
#[derive(Debug)]
struct InjectionRule {
    /// Category label carried in the violation payload.
    category: &'static str,
    regex: Regex,
}

impl InjectionRule {
    fn new(category: &'static str, pattern: &str) -> Self {
        Self {
            category,
            regex: Regex::new(pattern).expect("injection pattern must compile"),
        }
    }
}

/// Categories applied at every tier.
static BASE_RULES: Lazy<Vec<InjectionRule>> = Lazy::new(|| {
    vec![
        // Explicit override of prior instructions.
        InjectionRule::new(
            "override",
            r"(?i)\b(ignore|disregard|forget)\s+(?:all\s+|any\s+)?(previous|prior|above|earlier)\s+(instructions|prompts|context|commands)\b",
        ),
        // Role reassignment.
        InjectionRule::new(
            "role_reassignment",
            r"(?i)\byour\s+(real|true|actual|new|primary)\s+(role|purpose|goal|task|job|objective)\s+is\b",
        ),
        InjectionRule::new(
            "role_reassignment",
            r"(?i)\byou\s+are\s+(now|actually|really)\s+an?\b",
        ),
        InjectionRule::new("role_reassignment", r"(?i)\bact\s+as\s+if\s+you\s+(are|were)\b"),
        // Priority inversion.
        InjectionRule::new(
            "priority_inversion",
            r"(?i)\bas\s+a\s+reminder,?\s+your\s+(real|actual|true|primary)\s+task\b",
        ),
        InjectionRule::new(
            "priority_inversion",
            r"(?i)\bthe\s+(real|actual|true)\s+instructions?\s+(are|is|follow)\b",
        ),
        // Context poisoning: a fake system marker near an override verb.
        InjectionRule::new(
            "context_poisoning",
            r"(?is)\[system\].{0,50}(ignore|override|forget|disregard)",
        ),
        InjectionRule::new("context_poisoning", r"(?i)</?system>"),
    ]
});

/// Additional categories applied only under [`SecurityTier::Strict`].
static STRICT_RULES: Lazy<Vec<InjectionRule>> = Lazy::new(|| {
    vec![
        InjectionRule::new(
            "roleplay_framing",
            r"(?i)\bin\s+this\s+(scenario|roleplay|game|story|fiction),?\s+(you\s+are|ignore)\b",
        ),
        InjectionRule::new(
            "hypothetical_framing",
            r"(?i)\bhypothetically,?\s+if\s+you\s+(were|had\s+no)\b",
        ),
        InjectionRule::new(
            "persona_manipulation",
            r"(?i)\bpretend\s+you\s+(are\b|lack\s+(restrictions|guidelines|rules|limits)|have\s+no\s+(restrictions|guidelines|rules|limits))",
        ),
    ]
});

/// Scans every textual field of the request against the tier-selected
/// pattern set. Returns a block with a single `INJECTION_DETECTED` violation
/// on the first match.
pub fn scan(request: &CanonicalRequest, tier: SecurityTier) -> InterceptOutcome<()> {
    let texts = collect_texts(request);

    for text in texts {
        if let Some(rule) = first_match(text, tier) {
            let violation = Violation::new(
                ViolationCode::InjectionDetected,
                InterceptorKind::InjectionScanner,
                format!("structural injection pattern detected ({})", rule.category),
            )
            .with_payload(payload(vec![
                ("request_id", json!(request.id)),
                ("pattern", json!(rule.regex.as_str())),
                ("category", json!(rule.category)),
            ]));
            return InterceptOutcome::Block(vec![violation]);
        }
    }

    InterceptOutcome::Pass(())
}

fn first_match(text: &str, tier: SecurityTier) -> Option<&'static InjectionRule> {
    let base = BASE_RULES.iter().find(|rule| rule.regex.is_match(text));
    if base.is_some() {
        return base;
    }
    if tier == SecurityTier::Strict {
        return STRICT_RULES.iter().find(|rule| rule.regex.is_match(text));
    }
    None
}
