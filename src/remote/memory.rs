//! In-process implementation of the collaborator contracts.
//!
//! Behaves like the real service would: it assigns identities, rejects
//! duplicate project names, requires a bearer token, serves the rule catalog
//! from the built-in registry, and validates uploaded CSV files against the
//! project's schema and rules with full row-level error reporting. Used by
//! the integration tests and the command-line tool.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::{IngestError, RemoteError, RemoteResult, RowError};
use crate::model::{
    DataType, FieldDefinition, ProjectDraft, ProjectId, ProjectSummary, Record, SourceFile,
    TableData, ValidationRule,
};
use crate::remote::{Identity, IngestReport, ProjectBackend};
use crate::rules::RuleRegistry;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("identifier pattern compiles"));

#[derive(Default)]
struct State {
    next_id: ProjectId,
    projects: BTreeMap<ProjectId, ProjectDraft>,
}

/// Reference backend holding everything in memory.
pub struct MemoryBackend {
    registry: &'static RuleRegistry,
    identity: Arc<dyn Identity>,
    state: RwLock<State>,
}

impl MemoryBackend {
    pub fn new(identity: Arc<dyn Identity>) -> Self {
        Self {
            registry: RuleRegistry::builtin(),
            identity,
            state: RwLock::new(State::default()),
        }
    }

    fn authorize(&self) -> Result<(), RemoteError> {
        match self.identity.auth_token() {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(RemoteError::rejected(
                "Authentication token was not provided.",
            )),
        }
    }

    /// Lowercase and vet the identifiers a project brings along, the way the
    /// real service does before it creates a table from them.
    fn prepare_identifiers(draft: &ProjectDraft) -> Result<(String, Vec<Record>), RemoteError> {
        let table_name = draft.table_name.trim().to_lowercase();
        if !IDENTIFIER.is_match(&table_name) {
            return Err(RemoteError::rejected(format!(
                "\"{table_name}\" is not a valid table name."
            )));
        }

        let mut schema = Vec::with_capacity(draft.schema.len());
        for record in &draft.schema {
            let field =
                FieldDefinition::from_record(record).map_err(RemoteError::rejected)?;
            if !IDENTIFIER.is_match(&field.name) {
                return Err(RemoteError::rejected(format!(
                    "\"{}\" is not a valid field name.",
                    field.name
                )));
            }
            let mut stored = record.clone();
            stored.insert("name".to_string(), Value::String(field.name));
            schema.push(stored);
        }

        Ok((table_name, schema))
    }

    fn vet_rules(&self, rules: &[Record]) -> Result<(), RemoteError> {
        for record in rules {
            let rule = ValidationRule::from_record(record).map_err(RemoteError::rejected)?;
            if self.registry.get(&rule.rule_name).is_none() {
                return Err(RemoteError::rejected(format!(
                    "Validation rule \"{}\" does not exist.",
                    rule.rule_name
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectBackend for MemoryBackend {
    async fn list_projects(&self) -> RemoteResult<Vec<ProjectSummary>> {
        self.authorize()?;
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .map(|(id, project)| ProjectSummary {
                id: *id,
                name: project.name.clone(),
            })
            .collect())
    }

    async fn fetch_project(&self, id: ProjectId) -> RemoteResult<Value> {
        self.authorize()?;
        let state = self.state.read().await;
        let project = state.projects.get(&id).ok_or(RemoteError::NotFound(id))?;
        serde_json::to_value(project).map_err(|e| RemoteError::Transport(e.to_string()))
    }

    async fn fetch_rule_catalog(&self) -> RemoteResult<Value> {
        self.authorize()?;
        let rules: Vec<Value> = self
            .registry
            .specs()
            .iter()
            .map(|spec| json!({"rule_name": spec.name, "description": spec.description}))
            .collect();
        Ok(json!({ "rules": rules }))
    }

    async fn create_project(&self, draft: &ProjectDraft) -> RemoteResult<ProjectId> {
        self.authorize()?;

        let name = draft.name.trim();
        if name.is_empty() || draft.table_name.trim().is_empty() {
            return Err(RemoteError::rejected(
                "The project name and table name are required.",
            ));
        }

        let (table_name, schema) = Self::prepare_identifiers(draft)?;
        self.vet_rules(&draft.rules)?;

        let mut state = self.state.write().await;
        if state.projects.values().any(|p| p.name == name) {
            return Err(RemoteError::rejected(format!(
                "A project named \"{name}\" is already registered."
            )));
        }

        state.next_id += 1;
        let id = state.next_id;
        let now = Utc::now();
        let stored = ProjectDraft {
            id: Some(id),
            name: name.to_string(),
            table_name: table_name.clone(),
            created_by: draft.modified_by.clone().unwrap_or_default(),
            created_at: Some(now),
            updated_at: Some(now),
            modified_by: draft.modified_by.clone(),
            schema,
            rules: draft.rules.clone(),
            dataset: TableData {
                table_name,
                rows: Vec::new(),
            },
            source_file: None,
        };
        state.projects.insert(id, stored);
        info!(project_id = id, "created project \"{name}\"");
        Ok(id)
    }

    async fn update_project(&self, id: ProjectId, draft: &ProjectDraft) -> RemoteResult<()> {
        self.authorize()?;

        let mut field_errors = BTreeMap::new();
        if draft.name.trim().is_empty() {
            field_errors.insert("name".to_string(), "The project name is required.".to_string());
        }
        if draft.modified_by.as_deref().map_or(true, str::is_empty) {
            field_errors.insert(
                "modified_by".to_string(),
                "The modifying user is required.".to_string(),
            );
        }
        if !field_errors.is_empty() {
            return Err(RemoteError::FieldErrors(field_errors));
        }

        let (_, schema) = Self::prepare_identifiers(draft)?;
        self.vet_rules(&draft.rules)?;

        let mut state = self.state.write().await;
        let project = state
            .projects
            .get_mut(&id)
            .ok_or(RemoteError::NotFound(id))?;
        project.name = draft.name.trim().to_string();
        project.schema = schema;
        project.rules = draft.rules.clone();
        project.modified_by = draft.modified_by.clone();
        project.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_projects(&self, ids: &[ProjectId]) -> RemoteResult<()> {
        self.authorize()?;
        let mut state = self.state.write().await;
        for id in ids {
            if !state.projects.contains_key(id) {
                return Err(RemoteError::NotFound(*id));
            }
        }
        for id in ids {
            state.projects.remove(id);
        }
        info!(?ids, "deleted projects");
        Ok(())
    }

    async fn upload_dataset(
        &self,
        id: ProjectId,
        file: &SourceFile,
    ) -> Result<IngestReport, IngestError> {
        self.authorize()
            .map_err(|e| IngestError::Rejected(e.to_string()))?;

        let mut state = self.state.write().await;
        let Some(project) = state.projects.get(&id) else {
            return Err(IngestError::ProjectNotFound(id));
        };

        let fields: Vec<FieldDefinition> = project
            .schema
            .iter()
            .map(FieldDefinition::from_record)
            .collect::<Result<_, _>>()
            .map_err(IngestError::Rejected)?;

        let mut reader = csv::ReaderBuilder::new().from_reader(file.bytes.as_slice());
        let headers = reader
            .headers()
            .map_err(|e| IngestError::Rejected(format!("The file could not be parsed as CSV: {e}")))?
            .clone();

        // Header set must match the declared field names exactly.
        let expected: HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        let found: HashSet<&str> = headers.iter().map(str::trim).collect();
        if expected != found {
            return Err(IngestError::SchemaMismatch {
                message: "The file does not match the project schema.".to_string(),
                expected_fields: fields.iter().map(|f| f.name.clone()).collect(),
                row_errors: Vec::new(),
            });
        }

        let rules: Vec<ValidationRule> = project
            .rules
            .iter()
            .map(ValidationRule::from_record)
            .collect::<Result<_, _>>()
            .map_err(IngestError::Rejected)?;
        for rule in &rules {
            let spec = self.registry.get(&rule.rule_name).ok_or_else(|| {
                IngestError::Rejected(format!(
                    "Validation rule \"{}\" does not exist.",
                    rule.rule_name
                ))
            })?;
            let missing = spec.missing_params(&rule.parameters);
            if !missing.is_empty() {
                return Err(IngestError::Rejected(format!(
                    "Missing required parameters for rule \"{}\": {}",
                    rule.rule_name,
                    missing.join(", ")
                )));
            }
        }

        let mut rows: Vec<Record> = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| {
                IngestError::Rejected(format!("The file could not be parsed as CSV: {e}"))
            })?;
            let mut row = Record::new();
            for (i, cell) in record.iter().enumerate() {
                if let Some(header) = headers.get(i) {
                    row.insert(header.trim().to_string(), Value::String(cell.to_string()));
                }
            }
            rows.push(row);
        }

        let mut row_errors = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            for rule in &rules {
                let spec = self.registry.get(&rule.rule_name).expect("vetted above");
                let cell = row.get(&rule.field_name).cloned().unwrap_or(Value::Null);
                if let Err(message) = (spec.check)(&cell, &rule.parameters) {
                    row_errors.push(RowError {
                        row: index + 1,
                        field: rule.field_name.clone(),
                        value: cell,
                        message,
                    });
                }
            }
        }
        if !row_errors.is_empty() {
            debug!(count = row_errors.len(), "dataset rejected by rule checks");
            return Err(IngestError::SchemaMismatch {
                message: "The file failed validation against the project rules.".to_string(),
                expected_fields: Vec::new(),
                row_errors,
            });
        }

        let table_name = project.table_name.clone();
        let taken = state.projects.iter().any(|(other_id, other)| {
            *other_id != id
                && other.dataset.table_name == table_name
                && !other.dataset.rows.is_empty()
        });
        if taken {
            return Err(IngestError::Rejected(format!(
                "Table \"{table_name}\" already exists."
            )));
        }

        let materialized: Vec<Record> = rows
            .iter()
            .map(|row| materialize_row(row, &fields))
            .collect();
        let rows_inserted = materialized.len();

        let project = state.projects.get_mut(&id).expect("present above");
        project.dataset = TableData {
            table_name,
            rows: materialized,
        };
        project.updated_at = Some(Utc::now());
        info!(project_id = id, rows = rows_inserted, "dataset ingested");

        Ok(IngestReport { rows_inserted })
    }
}

/// Coerce string cells into the column's declared type where that parses;
/// anything else stays text, the way a permissive import would store it.
fn materialize_row(row: &Record, fields: &[FieldDefinition]) -> Record {
    let mut out = Record::new();
    for (key, value) in row {
        let data_type = fields
            .iter()
            .find(|f| &f.name == key)
            .map(|f| f.data_type);
        let coerced = match (data_type, value.as_str()) {
            (Some(DataType::Integer), Some(text)) => text
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| value.clone()),
            (Some(DataType::Number), Some(text)) => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
                .unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        };
        out.insert(key.clone(), coerced);
    }
    out
}
