//! Domain-specific error types.
//!
//! This module provides structured error types for the two failure domains
//! the session deals with, making error handling consistent and testable:
//!
//! - **RemoteError**: project CRUD calls against the remote collaborator
//! - **IngestError / UploadError**: dataset ingestion and the upload pipeline
//!
//! Structural problems found by the consistency checks are not errors in this
//! sense; they are reported as data (`ValidationIssue`) so every violation
//! can be surfaced at once.
//!
//! # Examples
//!
//! ```rust
//! use tablegate::errors::{IngestError, RemoteError};
//!
//! let err = RemoteError::rejected("A project named \"census\" is already registered.");
//! assert!(err.user_message().is_some());
//!
//! let err = IngestError::Transport("connection reset".to_string());
//! assert!(err.row_errors().is_empty());
//! ```

pub mod remote;
pub mod upload;

pub use remote::RemoteError;
pub use upload::{IngestError, RowError, UploadError};

/// Result type alias for remote project operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Result type alias for dataset ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type alias for upload pipeline operations.
pub type UploadResult<T> = Result<T, UploadError>;
