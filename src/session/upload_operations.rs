use tokio::sync::watch;
use tracing::info;

use super::EditorSession;
use crate::errors::UploadError;
use crate::model::{ProjectId, SourceFile};
use crate::pipeline::{AbortHandle, RollbackPolicy, UploadState};

impl EditorSession {
    // ----- File selection --------------------------------------------------

    /// Hand a user-selected file to the upload pipeline. Only a single CSV
    /// file is accepted; anything else is rejected and discarded without an
    /// upload attempt.
    pub fn attach_file(&mut self, file: SourceFile) -> Result<(), UploadError> {
        match self.pipeline.select_file(file.clone()) {
            Ok(()) => {
                if let Some(draft) = self.project.as_mut() {
                    draft.source_file = Some(file);
                }
                Ok(())
            }
            Err(err) => {
                self.notifications
                    .error("Error", "Only CSV files are accepted.");
                Err(err)
            }
        }
    }

    /// Observe the upload pipeline.
    pub fn upload_state(&self) -> UploadState {
        self.pipeline.state()
    }

    pub fn subscribe_upload(&self) -> watch::Receiver<UploadState> {
        self.pipeline.subscribe()
    }

    /// Handle for cancelling an in-flight upload from another task.
    pub fn upload_abort_handle(&self) -> AbortHandle {
        self.pipeline.abort_handle()
    }

    // ----- Initial upload after creation -----------------------------------

    /// Upload the pending file to a project that was created a moment ago.
    /// A rejection or an abort rolls the creation back.
    pub(super) async fn run_initial_upload(&mut self, id: ProjectId) -> Option<ProjectId> {
        self.ingest_errors.clear();
        self.expected_fields.clear();

        if !self.pipeline.has_file() {
            let file = self.project.as_ref().and_then(|d| d.source_file.clone());
            let Some(file) = file else {
                self.notifications
                    .error("Error", "A CSV file must be provided before continuing.");
                return None;
            };
            if self.pipeline.select_file(file).is_err() {
                self.notifications
                    .error("Error", "Only CSV files are accepted.");
                return None;
            }
        }

        match self.pipeline.run(id, RollbackPolicy::DeleteCreated).await {
            Ok(report) => {
                info!(project_id = id, rows = report.rows_inserted, "dataset accepted");
                self.notifications.success(
                    "Upload complete",
                    format!("File uploaded successfully ({} rows).", report.rows_inserted),
                );
                if let Some(draft) = self.project.as_mut() {
                    draft.id = Some(id);
                    draft.source_file = None;
                }
                self.pipeline.reset();
                Some(id)
            }
            Err(err) => {
                self.settle_failed_upload(err, true);
                None
            }
        }
    }

    // ----- Upload to an existing project ------------------------------------

    /// Upload a freshly selected file to a project that already exists. No
    /// rollback applies here; on success the project is reloaded so the
    /// read-only dataset reflects the new file.
    pub async fn upload_dataset(&mut self, id: ProjectId) {
        if !self.pipeline.has_file() {
            self.notifications
                .error("Error", "A CSV file must be provided before continuing.");
            return;
        }

        match self.pipeline.run(id, RollbackPolicy::None).await {
            Ok(report) => {
                self.notifications.success(
                    "Process complete",
                    format!("File uploaded successfully ({} rows).", report.rows_inserted),
                );
                self.pipeline.reset();
                self.load(id).await;
                self.notifications
                    .info("Data refreshed", "The project dataset has been reloaded.");
            }
            Err(err) => self.settle_failed_upload(err, false),
        }
    }

    // ----- Shared failure handling ------------------------------------------

    fn settle_failed_upload(&mut self, err: UploadError, rolled_back: bool) {
        match err {
            UploadError::Aborted => {
                // The pipeline already reset itself and, when applicable,
                // rolled the creation back.
                self.notifications
                    .info("Upload cancelled", "The file upload was cancelled.");
                if rolled_back {
                    self.notifications.info(
                        "Info",
                        "Project removed because its dataset upload did not complete.",
                    );
                }
            }
            UploadError::Ingest(err) => {
                self.ingest_errors = err.row_errors().to_vec();
                self.expected_fields = err.expected_fields().to_vec();
                self.notifications
                    .error("Error uploading the CSV file", err.to_string());
                if !self.expected_fields.is_empty() {
                    self.notifications
                        .warning("Expected fields", self.expected_fields.join(", "));
                }
                if rolled_back {
                    self.notifications.info(
                        "Info",
                        "Project deleted because the file upload failed.",
                    );
                }
                self.pipeline.reset();
            }
            other => {
                self.notifications.error("Error", other.to_string());
                self.pipeline.reset();
            }
        }
    }
}
