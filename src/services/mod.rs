//! Stateless services used by the editing session: structural validation,
//! the rule-catalog session, and load-time snapshots for change detection.

pub mod catalog;
pub mod snapshot;
pub mod validation;

pub use catalog::RuleCatalog;
pub use snapshot::Snapshot;
pub use validation::{validate_draft, IssueSeverity, ValidationIssue};
