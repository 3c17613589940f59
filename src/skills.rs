//! Skill registry collaborator boundary.
//!
//! The registry is injected by the caller; the gateway only asks it two
//! questions. `has` reports whether a tool name is callable. The optional
//! `validate_arguments` lets richer registries check decoded arguments;
//! returning `None` means the registry has no validator for that skill.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// External collaborator reporting which tool names are callable.
pub trait SkillRegistry: Send + Sync {
    /// Returns `true` if `name` resolves to a registered skill.
    fn has(&self, name: &str) -> bool;

    /// Whether this registry carries an argument validator for `name`.
    /// Grounding only decodes a call's arguments when this is `true`.
    fn has_validator(&self, _name: &str) -> bool {
        false
    }

    /// Validates decoded arguments for `name`. `None` means no validator is
    /// available and the arguments are accepted as-is.
    fn validate_arguments(&self, _name: &str, _arguments: &Map<String, Value>) -> Option<bool> {
        None
    }
}

/// A fixed name-set registry, enough for tests and simple deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticSkillRegistry {
    names: HashSet<String>,
}

impl StaticSkillRegistry {
    /// Builds a registry from an iterator of skill names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl SkillRegistry for StaticSkillRegistry {
    fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}
