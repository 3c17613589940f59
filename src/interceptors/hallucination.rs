//! Hallucinated-import scraper.
//!
//! Model-generated code routinely references packages that do not exist.
//! This stage extracts external package specifiers from `import ... from`
//! and `require(...)` forms in the response content and flags any package
//! root missing from the dependency whitelist. Relative and absolute
//! specifiers are not packages and are skipped. An empty whitelist disables
//! the stage entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::items::CanonicalResponse;
use crate::violation::{payload, InterceptOutcome, InterceptorKind, Violation, ViolationCode};

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+[^;'"]*?from\s+['"]([^'"]+)['"]"#).unwrap());

static REQUIRE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

/// Reduces a module specifier to its package root: the first segment, or
/// the first two for a scoped package.
pub fn package_root(specifier: &str) -> &str {
    let mut segments = specifier.splitn(3, '/');
    let first = segments.next().unwrap_or(specifier);
    if specifier.starts_with('@') {
        match segments.next() {
            Some(second) => &specifier[..first.len() + 1 + second.len()],
            None => first,
        }
    } else {
        first
    }
}

fn is_external(specifier: &str) -> bool {
    !specifier.starts_with('/') && !specifier.starts_with('.')
}

/// Scrapes the response content for package references outside the
/// whitelist.
pub fn scan(response: &CanonicalResponse, whitelist: &[String]) -> InterceptOutcome<()> {
    if whitelist.is_empty() {
        return InterceptOutcome::Pass(());
    }
    let Some(content) = &response.content else {
        return InterceptOutcome::Pass(());
    };

    let specifiers = IMPORT_RE
        .captures_iter(content)
        .chain(REQUIRE_RE.captures_iter(content))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|specifier| is_external(specifier));

    let mut flagged: Vec<&str> = Vec::new();
    for specifier in specifiers {
        let root = package_root(specifier);
        if !whitelist.iter().any(|allowed| allowed == root) && !flagged.contains(&root) {
            flagged.push(root);
        }
    }

    if flagged.is_empty() {
        return InterceptOutcome::Pass(());
    }

    let violations = flagged
        .into_iter()
        .map(|root| {
            Violation::new(
                ViolationCode::HallucinationDetected,
                InterceptorKind::HallucinationScraper,
                format!("response references non-whitelisted package {root}"),
            )
            .with_payload(payload(vec![("package", json!(root))]))
        })
        .collect();

    InterceptOutcome::Block(violations)
}
