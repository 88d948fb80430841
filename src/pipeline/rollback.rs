//! Compensating rollback for the two-step create-then-ingest flow.
//!
//! Project creation and dataset ingestion are not atomic. When ingestion
//! fails right after a creation, the just-created project must be deleted so
//! no project is ever left without a validated dataset. The deletion is
//! fire-and-forget relative to the user-visible error: its own failure is
//! logged and the original ingestion error is still surfaced.

use tracing::{info, warn};

use crate::model::ProjectId;
use crate::remote::ProjectBackend;

/// What the pipeline should do when the remote side rejects the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackPolicy {
    /// The project existed before this upload; leave it alone.
    None,
    /// The project was created for this upload; delete it on rejection.
    DeleteCreated,
}

/// Delete a project that was created immediately before a failed ingestion.
/// Returns whether the deletion went through.
pub async fn delete_created_project(backend: &dyn ProjectBackend, id: ProjectId) -> bool {
    match backend.delete_projects(&[id]).await {
        Ok(()) => {
            info!(project_id = id, "rolled back project after failed dataset upload");
            true
        }
        Err(err) => {
            warn!(
                project_id = id,
                error = %err,
                "rollback of created project failed; the upload error is still reported"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::ProjectDraft;
    use crate::remote::memory::MemoryBackend;
    use crate::remote::StaticIdentity;

    #[tokio::test]
    async fn deletes_an_existing_project_and_tolerates_a_missing_one() {
        let backend = MemoryBackend::new(Arc::new(StaticIdentity::new("ada", "token-1")));
        let draft = ProjectDraft {
            name: "census".into(),
            table_name: "census".into(),
            ..ProjectDraft::default()
        };
        let id = backend.create_project(&draft).await.unwrap();

        assert!(delete_created_project(&backend, id).await);
        assert!(backend.list_projects().await.unwrap().is_empty());

        // A second attempt fails quietly; the caller still surfaces the
        // original upload error.
        assert!(!delete_created_project(&backend, id).await);
    }
}
