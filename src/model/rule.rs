use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::allowlist::{self, Record};

/// Attributes the model recognizes on a validation rule record.
pub const RULE_ALLOWED_KEYS: &[&str] = &["field_name", "rule_name", "error_message", "parameters"];

/// Message used when a rule record carries no error message of its own.
pub const DEFAULT_ERROR_MESSAGE: &str = "Validation failed.";

/// One named, parameterized check bound to a schema field, derived from a
/// validated rule record. The referenced field is resolved downstream, not
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub field_name: String,
    pub rule_name: String,
    pub error_message: String,
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
}

impl ValidationRule {
    /// Build a typed rule from a raw record, reading only recognized
    /// attributes.
    pub fn from_record(record: &Record) -> Result<ValidationRule, String> {
        let filtered = allowlist::split(record, RULE_ALLOWED_KEYS);
        let known = &filtered.known;

        let field_name = known
            .get("field_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| "rule record has no \"field_name\"".to_string())?
            .to_lowercase();

        let rule_name = known
            .get("rule_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| format!("rule for \"{}\" has no \"rule_name\"", field_name))?
            .to_string();

        let error_message = known
            .get("error_message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_ERROR_MESSAGE)
            .to_string();

        let parameters = known
            .get("parameters")
            .and_then(Value::as_object)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Ok(ValidationRule {
            field_name,
            rule_name,
            error_message,
            parameters,
        })
    }
}

/// Ensure every recognized attribute is present on a loaded rule record, then
/// collapse unrecognized ones into the extras bag.
pub fn normalize_rule_record(record: &Record) -> Record {
    let mut normalized = Record::new();
    normalized.insert(
        "field_name".into(),
        record
            .get("field_name")
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())),
    );
    normalized.insert(
        "rule_name".into(),
        record
            .get("rule_name")
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())),
    );
    normalized.insert(
        "error_message".into(),
        record
            .get("error_message")
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())),
    );
    normalized.insert(
        "parameters".into(),
        record
            .get("parameters")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())),
    );

    for (key, value) in record {
        if !RULE_ALLOWED_KEYS.contains(&key.as_str()) {
            normalized.insert(key.clone(), value.clone());
        }
    }

    allowlist::apply(&normalized, RULE_ALLOWED_KEYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::allowlist::as_record;
    use serde_json::json;

    #[test]
    fn from_record_applies_default_message() {
        let record = as_record(&json!({
            "field_name": "age",
            "rule_name": "range",
            "parameters": {"min": 0, "max": 120}
        }))
        .unwrap();

        let rule = ValidationRule::from_record(&record).expect("valid rule");
        assert_eq!(rule.error_message, DEFAULT_ERROR_MESSAGE);
        assert_eq!(rule.parameters.len(), 2);
    }

    #[test]
    fn normalize_keeps_unknown_attributes_in_bag() {
        let record = as_record(&json!({"rule_name": "positive", "owner": "qa"})).unwrap();
        let normalized = normalize_rule_record(&record);

        assert_eq!(normalized["field_name"], json!(""));
        assert_eq!(normalized[allowlist::EXTRAS_KEY], json!({"owner": "qa"}));
    }
}
