//! Data model: schema fields, validation rules, projects, and the allow-list
//! filter that lets all of them be edited as free-form records.

pub mod allowlist;
pub mod field;
pub mod project;
pub mod rule;

pub use allowlist::{Record, EXTRAS_KEY};
pub use field::{DataType, FieldDefinition, FIELD_ALLOWED_KEYS};
pub use project::{ProjectDraft, ProjectId, ProjectSummary, SourceFile, TableData};
pub use rule::{ValidationRule, RULE_ALLOWED_KEYS};
