//! PII masker: a transformer, never a block.
//!
//! Replaces emails, major-network card numbers, US SSNs, and phone numbers
//! with bracketed placeholders before the request crosses the adapter
//! boundary. Produces a fresh request value; the original is left untouched.
//! Masking is idempotent: placeholders never re-match a pattern.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::items::{CanonicalRequest, Content, ContentBlock, Message};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

// Visa, Mastercard, and Discover in 4x4 groups; Amex in 4-6-5 groups.
// Separators are optional spaces or dashes.
static CC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(?:4\d{3}|5[1-5]\d{2}|6(?:011|5\d{2}))(?:[ -]?\d{4}){3}|3[47]\d{2}[ -]?\d{6}[ -]?\d{5})\b",
    )
    .unwrap()
});

// Candidate SSNs; the invalid-prefix ranges are rejected in code because the
// regex crate has no lookahead.
static SSN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3})[- ](\d{2})[- ](\d{4})\b").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-. ]?)?\(?\d{3}\)?[-. ]?\d{3}[-. ]?\d{4}\b|\b\d{3}[-. ]\d{4}\b")
        .unwrap()
});

fn ssn_prefix_is_valid(area: &str, group: &str, serial: &str) -> bool {
    area != "000" && area != "666" && !area.starts_with('9') && group != "00" && serial != "0000"
}

/// Masks all PII patterns in a single text field, in fixed order: emails,
/// card numbers, SSNs, phone numbers.
pub fn mask_text(text: &str) -> String {
    let masked = EMAIL_RE.replace_all(text, "[EMAIL]");
    let masked = CC_RE.replace_all(&masked, "[CC]");
    let masked = SSN_RE.replace_all(&masked, |caps: &regex::Captures| {
        if ssn_prefix_is_valid(&caps[1], &caps[2], &caps[3]) {
            "[SSN]".to_string()
        } else {
            caps[0].to_string()
        }
    });
    let masked = PHONE_RE.replace_all(&masked, "[PHONE]");
    masked.into_owned()
}

/// Returns a structurally identical request with every textual field masked.
/// When `redact` is false the request is passed through unchanged.
pub fn mask_request(request: &CanonicalRequest, redact: bool) -> CanonicalRequest {
    if !redact {
        return request.clone();
    }

    let mut masked = request.clone();
    masked.system_prompt = request.system_prompt.as_deref().map(mask_text);
    masked.messages = request
        .messages
        .iter()
        .map(|message| Message {
            role: message.role,
            content: mask_content(&message.content),
        })
        .collect();
    masked
}

fn mask_content(content: &Content) -> Content {
    match content {
        Content::Text(text) => Content::Text(mask_text(text)),
        Content::Blocks(blocks) => Content::Blocks(blocks.iter().map(mask_block).collect()),
    }
}

fn mask_block(block: &ContentBlock) -> ContentBlock {
    ContentBlock {
        text: block.text.as_deref().map(mask_text),
        content: block.content.as_ref().map(mask_content),
    }
}
