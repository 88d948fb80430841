use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::allowlist::Record;
use super::field::normalize_field_record;
use super::rule::normalize_rule_record;
use super::{field::FIELD_ALLOWED_KEYS, rule::RULE_ALLOWED_KEYS};
use crate::model::allowlist;

pub type ProjectId = i64;

/// A CSV file pending upload. Content type is whatever the picker reported;
/// the upload pipeline rejects anything that is not `text/csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn csv(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: "text/csv".to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn is_csv(&self) -> bool {
        self.content_type == "text/csv"
    }
}

/// The materialized dataset of a project, displayed read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub rows: Vec<Record>,
}

impl TableData {
    /// Column headers, taken from the first row.
    pub fn headers(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Listing entry used by the project picker and the delete flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
}

/// A project as edited in a session: identity and display attributes, the
/// free-form schema and rule records, and the read-only dataset artifact.
///
/// Audit attributes are stamped by the session from the identity collaborator
/// and by the remote side; they are never user-editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProjectId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_by: Option<String>,
    #[serde(default)]
    pub schema: Vec<Record>,
    #[serde(default)]
    pub rules: Vec<Record>,
    #[serde(default)]
    pub dataset: TableData,
    /// CSV bytes pending upload. Present only while a creation is in flight,
    /// cleared after successful ingestion. Never serialized.
    #[serde(skip)]
    pub source_file: Option<SourceFile>,
}

impl ProjectDraft {
    /// An empty draft for the "new project" entry point.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a project payload from the remote collaborator, mapping every
    /// schema and rule record through the allow-list filter so unrecognized
    /// attributes end up in the extras bag instead of being dropped.
    pub fn from_remote(payload: &Value) -> Result<ProjectDraft> {
        let mut draft: ProjectDraft = serde_json::from_value(payload.clone())
            .context("project payload does not have the expected shape")?;
        draft.schema = draft.schema.iter().map(normalize_field_record).collect();
        draft.rules = draft.rules.iter().map(normalize_rule_record).collect();
        Ok(draft)
    }

    /// Collapse unrecognized attributes of the live editor state into the
    /// extras bags, using each shape's own allow-list.
    pub fn apply_allowlists(&mut self) {
        self.schema = self
            .schema
            .iter()
            .map(|record| allowlist::apply(record, FIELD_ALLOWED_KEYS))
            .collect();
        self.rules = self
            .rules
            .iter()
            .map(|record| allowlist::apply(record, RULE_ALLOWED_KEYS))
            .collect();
    }

    /// Stamp the modifying user from the authenticated identity.
    pub fn stamp_modified_by(&mut self, user: Option<String>) {
        if let Some(user) = user {
            self.modified_by = Some(user);
        }
    }

    /// Field names declared by the schema, lowercased.
    pub fn field_names(&self) -> Vec<String> {
        self.schema
            .iter()
            .filter_map(|record| record.get("name").and_then(Value::as_str))
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::allowlist::EXTRAS_KEY;
    use serde_json::json;

    #[test]
    fn from_remote_preserves_unknown_attributes() {
        let payload = json!({
            "id": 7,
            "name": "census",
            "table_name": "census_2023",
            "created_by": "ada",
            "schema": [
                {"name": "age", "data_type": "integer", "required": true, "lineage": "hr"}
            ],
            "rules": [
                {"field_name": "age", "rule_name": "positive", "error_message": "x",
                 "parameters": {}, "ticket": "DQ-12"}
            ],
            "dataset": {"table_name": "census_2023", "rows": []}
        });

        let draft = ProjectDraft::from_remote(&payload).expect("payload parses");
        assert_eq!(draft.id, Some(7));
        assert_eq!(draft.schema[0][EXTRAS_KEY], json!({"lineage": "hr"}));
        assert_eq!(draft.rules[0][EXTRAS_KEY], json!({"ticket": "DQ-12"}));
        // Every recognized attribute is materialized with a default.
        assert_eq!(draft.schema[0]["max_length"], Value::Null);
    }

    #[test]
    fn field_names_are_lowercased() {
        let payload = json!({
            "name": "p", "table_name": "t",
            "schema": [
                {"name": "Age", "data_type": "integer"},
                {"name": "  City ", "data_type": "string"}
            ],
            "rules": []
        });
        let draft = ProjectDraft::from_remote(&payload).unwrap();
        assert_eq!(draft.field_names(), vec!["age", "city"]);
    }

    #[test]
    fn source_file_never_serializes() {
        let mut draft = ProjectDraft::new();
        draft.source_file = Some(SourceFile::csv("data.csv", b"a\n1".to_vec()));
        let value = serde_json::to_value(&draft).unwrap();
        assert!(value.get("source_file").is_none());
    }
}
