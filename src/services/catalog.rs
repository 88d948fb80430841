use serde_json::Value;
use tracing::warn;

/// The set of rule names that may appear in a project's rules, fetched once
/// per editing session from the remote collaborator and treated as read-only.
///
/// An unrecognized payload degrades to an empty catalog so the session can
/// keep editing; every rule name then fails the consistency checks until the
/// catalog is fetched again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleCatalog {
    names: Vec<String>,
}

impl RuleCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Parse a catalog payload. Accepted shapes, in order of preference:
    /// an object with a `rules` array, or a bare array. Array entries may be
    /// plain strings or objects carrying a `rule_name`. Anything else yields
    /// an empty catalog.
    pub fn from_payload(payload: &Value) -> Self {
        let entries = match payload {
            Value::Object(map) => map.get("rules").and_then(Value::as_array),
            Value::Array(list) => Some(list),
            _ => None,
        };

        let Some(entries) = entries else {
            warn!("rule catalog payload is not a recognized list shape, using an empty catalog");
            return Self::empty();
        };

        let names = entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name.clone()),
                Value::Object(map) => map
                    .get("rule_name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect();

        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
