use tracing::{info, warn};

use super::EditorSession;
use crate::model::{ProjectDraft, ProjectId};
use crate::services::catalog::RuleCatalog;
use crate::services::snapshot::Snapshot;
use crate::services::validation::{validate_draft, IssueSeverity, ValidationIssue};

impl EditorSession {
    // ----- Catalog ---------------------------------------------------------

    /// Fetch the rule catalog for this session. Any failure or unrecognized
    /// payload degrades to an empty catalog rather than blocking the editor.
    pub async fn refresh_catalog(&mut self) {
        match self.backend.fetch_rule_catalog().await {
            Ok(payload) => self.catalog = RuleCatalog::from_payload(&payload),
            Err(err) => {
                warn!(error = %err, "rule catalog fetch failed, degrading to an empty catalog");
                self.notifications
                    .warning("Warning", "Failed to load the allowed validations.");
                self.catalog = RuleCatalog::empty();
            }
        }
    }

    // ----- Load ------------------------------------------------------------

    /// Fetch a project and the rule catalog together and populate the
    /// editor. Both fetches must settle before the editor is considered
    /// populated; a snapshot of the mapped result is kept for change
    /// detection.
    pub async fn load(&mut self, id: ProjectId) {
        self.loading = true;
        self.ingest_errors.clear();
        self.expected_fields.clear();

        let (project_result, catalog_result) = tokio::join!(
            self.backend.fetch_project(id),
            self.backend.fetch_rule_catalog()
        );

        self.catalog = match catalog_result {
            Ok(payload) => RuleCatalog::from_payload(&payload),
            Err(err) => {
                warn!(error = %err, "rule catalog fetch failed, degrading to an empty catalog");
                self.notifications
                    .warning("Warning", "Failed to load the allowed validations.");
                RuleCatalog::empty()
            }
        };

        match project_result {
            Ok(payload) => match ProjectDraft::from_remote(&payload) {
                Ok(draft) => {
                    self.snapshot = Some(Snapshot::capture(&draft));
                    self.project = Some(draft);
                }
                Err(err) => {
                    warn!(project_id = id, error = %err, "project payload rejected");
                    self.notifications
                        .error("Error", "Failed to load the project data.");
                    self.project = None;
                    self.snapshot = None;
                }
            },
            Err(err) if err.is_not_found() => {
                self.notifications
                    .error("Error", "The project was not found.");
                self.project = None;
                self.snapshot = None;
            }
            Err(err) => {
                warn!(project_id = id, error = %err, "project fetch failed");
                self.notifications
                    .error("Error", "Failed to load the project data.");
                self.project = None;
                self.snapshot = None;
            }
        }

        self.loading = false;
    }

    // ----- Create ----------------------------------------------------------

    /// Create the project being edited and immediately upload its dataset.
    /// Returns the assigned id once the dataset has been ingested; any other
    /// outcome, including a rolled-back creation, returns `None`.
    pub async fn create(&mut self) -> Option<ProjectId> {
        self.loading = true;
        let result = self.create_inner().await;
        self.loading = false;
        result
    }

    async fn create_inner(&mut self) -> Option<ProjectId> {
        {
            let Some(draft) = self.project.as_ref() else {
                self.notifications
                    .error("Error", "There is no project being edited.");
                return None;
            };
            if draft.name.trim().is_empty() || draft.table_name.trim().is_empty() {
                self.notifications
                    .error("Error", "All fields must be completed.");
                return None;
            }
            if draft.source_file.is_none() && !self.pipeline.has_file() {
                self.notifications
                    .error("Error", "A CSV file must be provided before continuing.");
                return None;
            }
        }

        let user = self.identity.display_name();
        let draft_clone = {
            let draft = self.project.as_mut().expect("checked above");
            draft.stamp_modified_by(user);
            draft.clone()
        };

        let issues = validate_draft(&draft_clone, &self.catalog);
        if !issues.is_empty() {
            self.surface_issues(&issues);
            return None;
        }

        match self.backend.create_project(&draft_clone).await {
            Ok(id) => {
                info!(project_id = id, "project created");
                self.notifications
                    .success("Success", "Project created successfully.");
                self.run_initial_upload(id).await
            }
            Err(err) => {
                match err.user_message() {
                    Some(message) => self.notifications.error("Error", message),
                    None => self
                        .notifications
                        .error("Error", "Failed to create the project."),
                }
                None
            }
        }
    }

    // ----- Update ----------------------------------------------------------

    /// Persist edits to an already-created project. The live editor state is
    /// run through the allow-list filter and the consistency checks first; an
    /// unchanged project short-circuits without a remote write.
    pub async fn update(&mut self) {
        {
            let Some(draft) = self.project.as_mut() else {
                self.notifications
                    .error("Error", "There is no project being edited.");
                return;
            };
            if draft.id.is_none() {
                self.notifications
                    .error("Error", "The project has not been created yet.");
                return;
            }
            draft.apply_allowlists();
        }

        let draft_clone = self.project.as_ref().expect("checked above").clone();
        let issues = validate_draft(&draft_clone, &self.catalog);
        if !issues.is_empty() {
            self.surface_issues(&issues);
            return;
        }

        if let Some(snapshot) = &self.snapshot {
            if snapshot.matches(&draft_clone) {
                self.notifications
                    .info("No changes", "There is nothing to update.");
                return;
            }
        }

        let user = self.identity.display_name();
        let (id, draft_clone) = {
            let draft = self.project.as_mut().expect("checked above");
            draft.stamp_modified_by(user);
            (draft.id.expect("checked above"), draft.clone())
        };

        self.loading = true;
        match self.backend.update_project(id, &draft_clone).await {
            Ok(()) => {
                info!(project_id = id, "project updated");
                self.notifications
                    .success("Success", "Project updated successfully.");
            }
            Err(err) => match err.field_errors() {
                Some(fields) => {
                    let detail = fields
                        .iter()
                        .map(|(field, message)| format!("Field '{field}': {message}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.notifications.error("Error", detail);
                }
                None => {
                    warn!(project_id = id, error = %err, "project update failed");
                    self.notifications
                        .error("Error", "An error occurred while updating the project.");
                }
            },
        }
        self.loading = false;
    }

    // ----- Listing and deletion --------------------------------------------

    /// Refresh the in-memory project list.
    pub async fn list_projects(&mut self) {
        match self.backend.list_projects().await {
            Ok(summaries) => self.summaries = summaries,
            Err(err) => {
                warn!(error = %err, "project listing failed");
                self.notifications
                    .error("Error", "Failed to load projects.");
            }
        }
    }

    /// Delete the given projects. An empty selection is answered with a
    /// warning and never reaches the remote collaborator.
    pub async fn delete_many(&mut self, ids: &[ProjectId]) {
        if ids.is_empty() {
            self.notifications.warning(
                "Warning",
                "You must select at least one project to delete.",
            );
            return;
        }

        match self.backend.delete_projects(ids).await {
            Ok(()) => {
                self.summaries.retain(|summary| !ids.contains(&summary.id));
                self.list_projects().await;
                self.notifications
                    .success("Success", "Projects deleted successfully.");
            }
            Err(err) => {
                warn!(error = %err, "project deletion failed");
                self.notifications
                    .error("Error", "Failed to delete the projects.");
            }
        }
    }

    // ----- Helpers ---------------------------------------------------------

    pub(super) fn surface_issues(&mut self, issues: &[ValidationIssue]) {
        for issue in issues {
            let detail = issue.to_string();
            match issue.severity {
                IssueSeverity::Advisory => {
                    self.notifications.warning("Validation error", detail)
                }
                IssueSeverity::Error => self.notifications.error("Validation error", detail),
            }
        }
    }
}
