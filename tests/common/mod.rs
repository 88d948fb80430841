#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use tablegate::errors::{IngestError, RemoteResult};
use tablegate::model::allowlist::as_record;
use tablegate::model::{ProjectDraft, ProjectId, ProjectSummary, Record, SourceFile};
use tablegate::pipeline::UploadConfig;
use tablegate::remote::memory::MemoryBackend;
use tablegate::remote::{IngestReport, ProjectBackend, StaticIdentity};
use tablegate::EditorSession;

pub fn identity() -> Arc<StaticIdentity> {
    Arc::new(StaticIdentity::new("ada", "token-1"))
}

pub fn record(value: Value) -> Record {
    as_record(&value).expect("fixture is an object")
}

/// A small census project: two fields, one numeric rule.
pub fn sample_draft() -> ProjectDraft {
    ProjectDraft {
        name: "census".into(),
        table_name: "census_2023".into(),
        schema: vec![
            record(json!({"name": "age", "data_type": "integer", "required": true})),
            record(json!({"name": "city", "data_type": "string", "required": false})),
        ],
        rules: vec![record(json!({
            "field_name": "age",
            "rule_name": "positive",
            "error_message": "age must be positive",
            "parameters": {}
        }))],
        ..ProjectDraft::default()
    }
}

pub fn clean_csv() -> SourceFile {
    SourceFile::csv("census.csv", b"age,city\n34,lima\n27,quito\n".to_vec())
}

pub fn csv_with_rule_violation() -> SourceFile {
    SourceFile::csv("census.csv", b"age,city\n34,lima\n-4,quito\n".to_vec())
}

pub fn csv_with_wrong_headers() -> SourceFile {
    SourceFile::csv("census.csv", b"years,town\n34,lima\n".to_vec())
}

pub fn session_over(backend: Arc<dyn ProjectBackend>) -> EditorSession {
    EditorSession::with_upload_config(
        backend,
        identity(),
        UploadConfig::new(Duration::from_millis(1), 20),
    )
}

/// Backend decorator that counts calls, for asserting on what the session
/// actually sent over the wire.
pub struct CountingBackend {
    inner: MemoryBackend,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub uploads: AtomicUsize,
    pub deleted_ids: Mutex<Vec<Vec<ProjectId>>>,
}

impl CountingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryBackend::new(identity()),
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
            deleted_ids: Mutex::new(Vec::new()),
        })
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectBackend for CountingBackend {
    async fn list_projects(&self) -> RemoteResult<Vec<ProjectSummary>> {
        self.inner.list_projects().await
    }

    async fn fetch_project(&self, id: ProjectId) -> RemoteResult<Value> {
        self.inner.fetch_project(id).await
    }

    async fn fetch_rule_catalog(&self) -> RemoteResult<Value> {
        self.inner.fetch_rule_catalog().await
    }

    async fn create_project(&self, draft: &ProjectDraft) -> RemoteResult<ProjectId> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_project(draft).await
    }

    async fn update_project(&self, id: ProjectId, draft: &ProjectDraft) -> RemoteResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_project(id, draft).await
    }

    async fn delete_projects(&self, ids: &[ProjectId]) -> RemoteResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.deleted_ids.lock().unwrap().push(ids.to_vec());
        self.inner.delete_projects(ids).await
    }

    async fn upload_dataset(
        &self,
        id: ProjectId,
        file: &SourceFile,
    ) -> Result<IngestReport, IngestError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.inner.upload_dataset(id, file).await
    }
}

/// Backend whose rule catalog endpoint returns an unusable payload.
pub struct JunkCatalogBackend {
    inner: MemoryBackend,
}

impl JunkCatalogBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryBackend::new(identity()),
        })
    }
}

#[async_trait]
impl ProjectBackend for JunkCatalogBackend {
    async fn list_projects(&self) -> RemoteResult<Vec<ProjectSummary>> {
        self.inner.list_projects().await
    }

    async fn fetch_project(&self, id: ProjectId) -> RemoteResult<Value> {
        self.inner.fetch_project(id).await
    }

    async fn fetch_rule_catalog(&self) -> RemoteResult<Value> {
        Ok(json!("not a catalog"))
    }

    async fn create_project(&self, draft: &ProjectDraft) -> RemoteResult<ProjectId> {
        self.inner.create_project(draft).await
    }

    async fn update_project(&self, id: ProjectId, draft: &ProjectDraft) -> RemoteResult<()> {
        self.inner.update_project(id, draft).await
    }

    async fn delete_projects(&self, ids: &[ProjectId]) -> RemoteResult<()> {
        self.inner.delete_projects(ids).await
    }

    async fn upload_dataset(
        &self,
        id: ProjectId,
        file: &SourceFile,
    ) -> Result<IngestReport, IngestError> {
        self.inner.upload_dataset(id, file).await
    }
}
