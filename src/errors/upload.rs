//! Errors raised while ingesting a dataset file.
//!
//! Ingestion failures carry the full row-level detail the remote collaborator
//! supplies; nothing is summarized away. The pipeline turns any of these into
//! a rejected upload, and a rejection that follows a fresh project creation
//! triggers the compensating rollback.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::ProjectId;

/// One offending cell, exactly as the collaborator reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based data row index.
    pub row: usize,
    pub field: String,
    pub value: Value,
    pub message: String,
}

/// Dataset ingestion errors.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The file's content does not satisfy the project's schema or rules.
    #[error("{message}")]
    SchemaMismatch {
        message: String,
        /// Field names the schema expected, when a header mismatch was the
        /// cause.
        expected_fields: Vec<String>,
        /// Per-row violations, when rule evaluation was the cause.
        row_errors: Vec<RowError>,
    },

    /// The target project does not exist on the remote side.
    #[error("Project {0} was not found")]
    ProjectNotFound(ProjectId),

    /// The remote side refused the file for another reason.
    #[error("{0}")]
    Rejected(String),

    /// Network or protocol failure.
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl IngestError {
    pub fn row_errors(&self) -> &[RowError] {
        match self {
            IngestError::SchemaMismatch { row_errors, .. } => row_errors,
            _ => &[],
        }
    }

    pub fn expected_fields(&self) -> &[String] {
        match self {
            IngestError::SchemaMismatch {
                expected_fields, ..
            } => expected_fields,
            _ => &[],
        }
    }
}

/// Upload pipeline errors.
#[derive(Error, Debug)]
pub enum UploadError {
    /// Only CSV files are accepted.
    #[error("Only CSV files are accepted (got \"{0}\")")]
    UnsupportedFileType(String),

    /// A file may only be selected while the pipeline is idle or after a
    /// type rejection.
    #[error("The pipeline must be reset before selecting a new file")]
    NotIdle,

    /// The pipeline was started without a selected file.
    #[error("No file has been selected")]
    NoFileSelected,

    /// The user aborted the upload before completion.
    #[error("Upload aborted")]
    Aborted,

    /// The remote side rejected the dataset.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl UploadError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, UploadError::Aborted)
    }
}
