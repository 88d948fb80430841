//! The editing session: one user working on one project at a time.
//!
//! The session owns everything that lives across suspension points: the
//! project being edited, the load-time snapshot, the rule catalog, the upload
//! pipeline, and the notification buffer. It is constructed when the user
//! enters the editor and torn down when they navigate away; there are no
//! process-wide singletons. Every operation catches its own failures and
//! converts them into notifications, so the session always stays in a
//! re-editable state.

mod project_operations;
mod upload_operations;

use std::sync::Arc;

use crate::errors::RowError;
use crate::model::{ProjectDraft, ProjectSummary};
use crate::notify::Notifications;
use crate::pipeline::{UploadConfig, UploadPipeline};
use crate::remote::{Identity, ProjectBackend};
use crate::services::{RuleCatalog, Snapshot};

pub struct EditorSession {
    backend: Arc<dyn ProjectBackend>,
    identity: Arc<dyn Identity>,
    catalog: RuleCatalog,
    project: Option<ProjectDraft>,
    snapshot: Option<Snapshot>,
    summaries: Vec<ProjectSummary>,
    notifications: Notifications,
    pipeline: UploadPipeline,
    ingest_errors: Vec<RowError>,
    expected_fields: Vec<String>,
    loading: bool,
}

impl EditorSession {
    pub fn new(backend: Arc<dyn ProjectBackend>, identity: Arc<dyn Identity>) -> Self {
        Self::with_upload_config(backend, identity, UploadConfig::default())
    }

    /// Build a session with explicit upload pacing. Tests use fast ticks.
    pub fn with_upload_config(
        backend: Arc<dyn ProjectBackend>,
        identity: Arc<dyn Identity>,
        upload: UploadConfig,
    ) -> Self {
        let pipeline = UploadPipeline::new(Arc::clone(&backend), upload);
        Self {
            backend,
            identity,
            catalog: RuleCatalog::empty(),
            project: None,
            snapshot: None,
            summaries: Vec::new(),
            notifications: Notifications::new(),
            pipeline,
            ingest_errors: Vec::new(),
            expected_fields: Vec::new(),
            loading: false,
        }
    }

    /// Start editing a brand-new, empty project.
    pub fn begin_new_project(&mut self) {
        self.project = Some(ProjectDraft::new());
        self.snapshot = None;
        self.ingest_errors.clear();
        self.expected_fields.clear();
    }

    /// Tear the editor state down, e.g. when navigating away.
    pub fn close(&mut self) {
        self.project = None;
        self.snapshot = None;
        self.ingest_errors.clear();
        self.expected_fields.clear();
        self.pipeline.reset();
    }

    pub fn project(&self) -> Option<&ProjectDraft> {
        self.project.as_ref()
    }

    pub fn project_mut(&mut self) -> Option<&mut ProjectDraft> {
        self.project.as_mut()
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn summaries(&self) -> &[ProjectSummary] {
        &self.summaries
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Row-level detail of the last rejected ingestion, in full.
    pub fn ingest_errors(&self) -> &[RowError] {
        &self.ingest_errors
    }

    /// Field names the remote side expected, when the last rejection was a
    /// header mismatch.
    pub fn expected_fields(&self) -> &[String] {
        &self.expected_fields
    }

    pub fn notices(&self) -> &[crate::notify::Notice] {
        self.notifications.entries()
    }

    pub fn drain_notices(&mut self) -> Vec<crate::notify::Notice> {
        self.notifications.drain()
    }
}
