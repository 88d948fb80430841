//! Consistency checks over an edited project.
//!
//! Every save goes through [`validate_draft`]: it walks the schema and rule
//! records and collects one issue per violation, never stopping early, so the
//! user sees everything that is wrong at once. An empty result is the only
//! green light for submission.

use std::fmt;

use serde_json::Value;

use crate::model::allowlist::EXTRAS_KEY;
use crate::model::{DataType, ProjectDraft, Record, FIELD_ALLOWED_KEYS, RULE_ALLOWED_KEYS};
use crate::services::catalog::RuleCatalog;

/// How a violation should be presented.
///
/// Unrecognized schema attributes are advisory (the attribute is kept), while
/// everything else is a hard error. Both gate the save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Advisory,
    Error,
}

/// One path-scoped violation, e.g. `rules[0].rule_name`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub severity: IssueSeverity,
}

impl ValidationIssue {
    fn advisory(path: String, message: String) -> Self {
        Self {
            path,
            message,
            severity: IssueSeverity::Advisory,
        }
    }

    fn error(path: String, message: String) -> Self {
        Self {
            path,
            message,
            severity: IssueSeverity::Error,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Run the full set of structural checks over a draft's schema and rules.
/// All violations are collected; an empty list means the draft is
/// save-eligible.
pub fn validate_draft(draft: &ProjectDraft, catalog: &RuleCatalog) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (index, record) in draft.schema.iter().enumerate() {
        check_schema_record(index, record, &mut issues);
    }
    for (index, record) in draft.rules.iter().enumerate() {
        check_rule_record(index, record, catalog, &mut issues);
    }

    issues
}

fn non_empty_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.trim().is_empty())
}

fn check_schema_record(index: usize, record: &Record, issues: &mut Vec<ValidationIssue>) {
    for key in record.keys() {
        if key != EXTRAS_KEY && !FIELD_ALLOWED_KEYS.contains(&key.as_str()) {
            issues.push(ValidationIssue::advisory(
                format!("schema[{index}].{key}"),
                format!("Unrecognized attribute \"{key}\". It is not part of the model, but it will be kept."),
            ));
        }
    }

    if !non_empty_string(record.get("name")) {
        issues.push(ValidationIssue::error(
            format!("schema[{index}].name"),
            "The \"name\" attribute is required.".to_string(),
        ));
    }

    match record.get("data_type") {
        Some(Value::String(s)) if !s.trim().is_empty() => {
            if DataType::parse(s).is_none() {
                issues.push(ValidationIssue::error(
                    format!("schema[{index}].data_type"),
                    format!("The data type \"{s}\" is not valid."),
                ));
            }
        }
        _ => issues.push(ValidationIssue::error(
            format!("schema[{index}].data_type"),
            "The \"data_type\" attribute is required.".to_string(),
        )),
    }

    if !matches!(record.get("required"), Some(Value::Bool(_))) {
        issues.push(ValidationIssue::error(
            format!("schema[{index}].required"),
            "The \"required\" attribute must be a boolean.".to_string(),
        ));
    }

    if let Some(values) = record.get("allowed_values") {
        if !values.is_null() && !values.is_array() {
            issues.push(ValidationIssue::error(
                format!("schema[{index}].allowed_values"),
                "The \"allowed_values\" attribute must be a list.".to_string(),
            ));
        }
    }
}

fn check_rule_record(
    index: usize,
    record: &Record,
    catalog: &RuleCatalog,
    issues: &mut Vec<ValidationIssue>,
) {
    if !non_empty_string(record.get("field_name")) {
        issues.push(ValidationIssue::error(
            format!("rules[{index}].field_name"),
            "The \"field_name\" attribute is required.".to_string(),
        ));
    }

    if !non_empty_string(record.get("error_message")) {
        issues.push(ValidationIssue::error(
            format!("rules[{index}].error_message"),
            "The \"error_message\" attribute is required.".to_string(),
        ));
    }

    match record.get("rule_name") {
        Some(Value::String(name)) if !name.trim().is_empty() => {
            if !catalog.contains(name) {
                issues.push(ValidationIssue::error(
                    format!("rules[{index}].rule_name"),
                    format!("The rule \"{name}\" is not in the allowed catalog."),
                ));
            }
        }
        _ => issues.push(ValidationIssue::error(
            format!("rules[{index}].rule_name"),
            "The \"rule_name\" attribute is required.".to_string(),
        )),
    }

    match record.get("parameters") {
        Some(Value::Object(params)) => {
            for (key, value) in params {
                if value.is_null() {
                    issues.push(ValidationIssue::error(
                        format!("rules[{index}].parameters.{key}"),
                        format!("The value of \"{key}\" must not be null."),
                    ));
                }
            }
        }
        _ => issues.push(ValidationIssue::error(
            format!("rules[{index}].parameters"),
            "The \"parameters\" attribute must be an object.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::allowlist::as_record;
    use serde_json::json;

    fn draft_with(schema: Value, rules: Value) -> ProjectDraft {
        let schema = schema
            .as_array()
            .unwrap()
            .iter()
            .map(|v| as_record(v).unwrap())
            .collect();
        let rules = rules
            .as_array()
            .unwrap()
            .iter()
            .map(|v| as_record(v).unwrap())
            .collect();
        ProjectDraft {
            name: "census".into(),
            table_name: "census".into(),
            schema,
            rules,
            ..ProjectDraft::default()
        }
    }

    #[test]
    fn clean_draft_yields_no_issues() {
        let draft = draft_with(
            json!([{"name": "age", "data_type": "integer", "required": true,
                    "is_primary_key": false, "is_unique": false}]),
            json!([{"field_name": "age", "rule_name": "range", "error_message": "x",
                    "parameters": {"min": 0, "max": 120}}]),
        );
        let catalog = RuleCatalog::new(vec!["range".into()]);
        assert!(validate_draft(&draft, &catalog).is_empty());
    }

    #[test]
    fn unknown_rule_name_is_the_only_issue_for_an_otherwise_clean_draft() {
        let draft = draft_with(
            json!([{"name": "age", "data_type": "integer", "required": true,
                    "is_primary_key": false, "is_unique": false}]),
            json!([{"field_name": "age", "rule_name": "not_in_catalog",
                    "error_message": "x", "parameters": {"min": 0}}]),
        );
        let catalog = RuleCatalog::new(vec!["range_check".into()]);

        let issues = validate_draft(&draft, &catalog);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "rules[0].rule_name");
        assert_eq!(issues[0].severity, IssueSeverity::Error);
    }

    #[test]
    fn every_seeded_violation_is_reported() {
        // One record per kind of violation; nothing short-circuits.
        let draft = draft_with(
            json!([
                {"data_type": "integer", "required": true},              // missing name
                {"name": "a", "data_type": "decimal", "required": true}, // bad type
                {"name": "b", "data_type": "string", "required": "yes"}, // non-bool required
                {"name": "c", "data_type": "string", "required": false,
                 "allowed_values": "x"}                                  // scalar list
            ]),
            json!([
                {"rule_name": "range", "error_message": "m",
                 "parameters": {"min": null, "max": 1}}                  // no field, null param
            ]),
        );
        let catalog = RuleCatalog::new(vec!["range".into()]);

        let issues = validate_draft(&draft, &catalog);
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"schema[0].name"));
        assert!(paths.contains(&"schema[1].data_type"));
        assert!(paths.contains(&"schema[2].required"));
        assert!(paths.contains(&"schema[3].allowed_values"));
        assert!(paths.contains(&"rules[0].field_name"));
        assert!(paths.contains(&"rules[0].parameters.min"));
        assert!(issues.len() >= 6);
    }

    #[test]
    fn unrecognized_schema_attribute_is_advisory_but_reported() {
        let draft = draft_with(
            json!([{"name": "age", "data_type": "integer", "required": true,
                    "lineage": "hr"}]),
            json!([]),
        );
        let issues = validate_draft(&draft, &RuleCatalog::empty());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "schema[0].lineage");
        assert_eq!(issues[0].severity, IssueSeverity::Advisory);
    }

    #[test]
    fn extras_bag_does_not_trigger_issues() {
        let draft = draft_with(
            json!([{"name": "age", "data_type": "integer", "required": true,
                    "_extras": {"lineage": "hr"}}]),
            json!([]),
        );
        assert!(validate_draft(&draft, &RuleCatalog::empty()).is_empty());
    }

    #[test]
    fn missing_parameters_object_is_an_error() {
        let draft = draft_with(
            json!([]),
            json!([{"field_name": "age", "rule_name": "positive",
                    "error_message": "m", "parameters": [1, 2]}]),
        );
        let catalog = RuleCatalog::new(vec!["positive".into()]);
        let issues = validate_draft(&draft, &catalog);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "rules[0].parameters");
    }
}
