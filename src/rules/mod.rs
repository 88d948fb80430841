//! Built-in validation rules.
//!
//! Each rule is a small evaluator applied to one cell value, optionally
//! parameterized (for example `range` takes `min` and `max`). The registry is
//! the source of the rule catalog the editing session validates rule names
//! against, and the reference collaborator evaluates rules from it during
//! ingestion.

mod numeric;
mod temporal;
mod text;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;

/// Parameters configured on a rule, as edited by the user.
pub type RuleParams = IndexMap<String, Value>;

/// Evaluator signature: `Ok(())` when the value passes, `Err(message)` with a
/// user-facing message when it does not.
pub type RuleCheck = fn(&Value, &RuleParams) -> Result<(), String>;

/// One catalog entry: a named evaluator and the parameters it requires.
pub struct RuleSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required_params: &'static [&'static str],
    pub check: RuleCheck,
}

impl RuleSpec {
    /// Required parameters absent from `params`.
    pub fn missing_params(&self, params: &RuleParams) -> Vec<&'static str> {
        self.required_params
            .iter()
            .filter(|name| !params.contains_key(**name))
            .copied()
            .collect()
    }
}

/// The fixed set of rules this installation knows how to evaluate.
pub struct RuleRegistry {
    rules: Vec<RuleSpec>,
}

static BUILTIN: Lazy<RuleRegistry> = Lazy::new(|| RuleRegistry {
    rules: vec![
        RuleSpec {
            name: "not_empty",
            description: "The value must be present and non-blank",
            required_params: &[],
            check: text::not_empty,
        },
        RuleSpec {
            name: "positive",
            description: "The value must be a number greater than zero",
            required_params: &[],
            check: numeric::positive,
        },
        RuleSpec {
            name: "greater_than_zero",
            description: "The value must be strictly greater than zero",
            required_params: &[],
            check: numeric::greater_than_zero,
        },
        RuleSpec {
            name: "range",
            description: "The value must fall within an inclusive numeric range",
            required_params: &["min", "max"],
            check: numeric::range,
        },
        RuleSpec {
            name: "max_length",
            description: "The value must not exceed a maximum number of characters",
            required_params: &["max"],
            check: text::max_length,
        },
        RuleSpec {
            name: "min_length",
            description: "The value must have a minimum number of characters",
            required_params: &["min"],
            check: text::min_length,
        },
        RuleSpec {
            name: "not_future",
            description: "The value must be a date that is not in the future",
            required_params: &[],
            check: temporal::not_future,
        },
    ],
});

impl RuleRegistry {
    pub fn builtin() -> &'static RuleRegistry {
        &BUILTIN
    }

    pub fn get(&self, name: &str) -> Option<&RuleSpec> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn specs(&self) -> &[RuleSpec] {
        &self.rules
    }

    pub fn names(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.name.to_string()).collect()
    }
}

/// Read a value as a number, accepting numeric strings the way CSV cells
/// arrive.
pub(crate) fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Read a parameter as a number, accepting numeric strings.
pub(crate) fn param_number(params: &RuleParams, name: &str) -> Option<f64> {
    params.get(name).and_then(number_of)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_serves_every_builtin_rule() {
        let registry = RuleRegistry::builtin();
        for name in [
            "not_empty",
            "positive",
            "greater_than_zero",
            "range",
            "max_length",
            "min_length",
            "not_future",
        ] {
            assert!(registry.get(name).is_some(), "missing rule {name}");
        }
        assert!(registry.get("not_in_catalog").is_none());
    }

    #[test]
    fn missing_params_are_reported_by_name() {
        let registry = RuleRegistry::builtin();
        let range = registry.get("range").unwrap();

        let mut params = RuleParams::new();
        params.insert("min".to_string(), json!(0));
        assert_eq!(range.missing_params(&params), vec!["max"]);
    }

    #[test]
    fn numbers_parse_from_strings() {
        assert_eq!(number_of(&json!(" 4.5 ")), Some(4.5));
        assert_eq!(number_of(&json!(3)), Some(3.0));
        assert_eq!(number_of(&json!(true)), None);
    }
}
