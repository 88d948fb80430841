//! Contracts of the external collaborators the session depends on.
//!
//! The session is transport-agnostic: it talks to a [`ProjectBackend`] for
//! everything persistent and to an [`Identity`] provider for the current
//! user. An HTTP implementation would attach [`Identity::auth_token`] to
//! every request as a bearer credential; a missing token is passed through
//! untouched and it is the remote side's job to reject it. The in-process
//! [`memory::MemoryBackend`] implements the same contract for tests and the
//! command-line tool.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{IngestError, RemoteResult};
use crate::model::{ProjectDraft, ProjectId, ProjectSummary, SourceFile};

/// Outcome of a successful dataset ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub rows_inserted: usize,
}

/// Remote persistence collaborator for projects and their datasets.
#[async_trait]
pub trait ProjectBackend: Send + Sync {
    /// List every project the user can see.
    async fn list_projects(&self) -> RemoteResult<Vec<ProjectSummary>>;

    /// Fetch one project as a raw payload. The session maps the payload's
    /// schema and rule records through the allow-list filter.
    async fn fetch_project(&self, id: ProjectId) -> RemoteResult<Value>;

    /// Fetch the rule catalog as a raw payload. The catalog session is
    /// responsible for shape-checking it.
    async fn fetch_rule_catalog(&self) -> RemoteResult<Value>;

    /// Create a project and return its assigned identity.
    async fn create_project(&self, draft: &ProjectDraft) -> RemoteResult<ProjectId>;

    /// Replace a project's editable attributes, schema, and rules.
    async fn update_project(&self, id: ProjectId, draft: &ProjectDraft) -> RemoteResult<()>;

    /// Delete the given projects. All of them must exist.
    async fn delete_projects(&self, ids: &[ProjectId]) -> RemoteResult<()>;

    /// Validate the file against the project's schema and rules and, on
    /// success, materialize it as the project's dataset.
    async fn upload_dataset(
        &self,
        id: ProjectId,
        file: &SourceFile,
    ) -> Result<IngestReport, IngestError>;
}

/// The authenticated user, as far as this session cares.
pub trait Identity: Send + Sync {
    fn display_name(&self) -> Option<String>;
    fn auth_token(&self) -> Option<String>;
}

/// Fixed identity, useful for tests and the command-line tool.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    name: Option<String>,
    token: Option<String>,
}

impl StaticIdentity {
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            token: Some(token.into()),
        }
    }

    /// An identity with no user and no token.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl Identity for StaticIdentity {
    fn display_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn auth_token(&self) -> Option<String> {
        self.token.clone()
    }
}
