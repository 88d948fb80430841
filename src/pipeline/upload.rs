//! Upload pipeline state machine.
//!
//! File upload runs as an explicit machine rather than a pile of callbacks:
//!
//! ```text
//! Idle -> FileSelected -> TypeRejected            (non-CSV, terminal)
//!                      -> Uploading -> ServerAccepted
//!                                   -> ServerRejected
//! ```
//!
//! Selection accepts exactly one file and rejects anything that is not
//! `text/csv` without attempting an upload. Once started, progress advances
//! in fixed increments to 100, at which point the real submission goes out.
//! Observers follow the machine through a `tokio::sync::watch` subscription.
//! An abort is honored at any point before acceptance: it discards the
//! in-flight file, performs the compensating rollback when a project had
//! just been created, and fully resets the machine before a new file may be
//! selected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tracing::debug;

use crate::errors::{UploadError, UploadResult};
use crate::model::{ProjectId, SourceFile};
use crate::pipeline::rollback::{delete_created_project, RollbackPolicy};
use crate::remote::{IngestReport, ProjectBackend};

/// Where the machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    FileSelected,
    TypeRejected,
    Uploading,
    ServerAccepted,
    ServerRejected,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadPhase::Idle => "idle",
            UploadPhase::FileSelected => "file_selected",
            UploadPhase::TypeRejected => "type_rejected",
            UploadPhase::Uploading => "uploading",
            UploadPhase::ServerAccepted => "server_accepted",
            UploadPhase::ServerRejected => "server_rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadPhase::TypeRejected | UploadPhase::ServerAccepted | UploadPhase::ServerRejected
        )
    }
}

/// Observable state of the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadState {
    pub phase: UploadPhase,
    /// Progress percentage, 0 to 100, strictly monotonic while uploading.
    pub progress: u8,
    pub last_error: Option<String>,
}

impl UploadState {
    fn idle() -> Self {
        Self {
            phase: UploadPhase::Idle,
            progress: 0,
            last_error: None,
        }
    }
}

/// Pacing of the simulated progress ramp. The ramp is a UX affordance; the
/// remote contract is unaffected by it.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub tick: Duration,
    pub step: u8,
}

impl UploadConfig {
    pub fn new(tick: Duration, step: u8) -> Self {
        Self {
            tick,
            step: step.max(1),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(500),
            step: 20,
        }
    }
}

/// Cancels an in-flight upload from outside the pipeline.
#[derive(Clone)]
pub struct AbortHandle {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

/// The upload state machine, bound to one backend collaborator.
pub struct UploadPipeline {
    backend: Arc<dyn ProjectBackend>,
    config: UploadConfig,
    state: watch::Sender<UploadState>,
    abort_requested: Arc<AtomicBool>,
    abort_notify: Arc<Notify>,
    file: Option<SourceFile>,
}

impl UploadPipeline {
    pub fn new(backend: Arc<dyn ProjectBackend>, config: UploadConfig) -> Self {
        let (state, _) = watch::channel(UploadState::idle());
        Self {
            backend,
            config,
            state,
            abort_requested: Arc::new(AtomicBool::new(false)),
            abort_notify: Arc::new(Notify::new()),
            file: None,
        }
    }

    /// Subscribe to phase and progress changes.
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> UploadPhase {
        self.state.borrow().phase
    }

    /// Handle for aborting from another task.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            requested: Arc::clone(&self.abort_requested),
            notify: Arc::clone(&self.abort_notify),
        }
    }

    /// Accept a single file for upload. Non-CSV files move the machine to
    /// `TypeRejected` and are discarded; the user has to select again.
    pub fn select_file(&mut self, file: SourceFile) -> UploadResult<()> {
        if !matches!(self.phase(), UploadPhase::Idle | UploadPhase::TypeRejected) {
            return Err(UploadError::NotIdle);
        }

        if !file.is_csv() {
            let content_type = file.content_type.clone();
            self.publish(UploadState {
                phase: UploadPhase::TypeRejected,
                progress: 0,
                last_error: Some(format!("Only CSV files are accepted (got \"{content_type}\")")),
            });
            return Err(UploadError::UnsupportedFileType(content_type));
        }

        self.file = Some(file);
        self.publish(UploadState {
            phase: UploadPhase::FileSelected,
            progress: 0,
            last_error: None,
        });
        Ok(())
    }

    /// Whether a file is selected and the machine is ready to run.
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Return to `Idle`, discarding any selected file and clearing a pending
    /// abort request. Required after an abort before a new file is accepted.
    pub fn reset(&mut self) {
        self.file = None;
        self.abort_requested.store(false, Ordering::SeqCst);
        self.publish(UploadState::idle());
    }

    /// Drive the machine from `FileSelected` to a terminal phase: ramp the
    /// progress to 100, submit the file, and settle on acceptance or
    /// rejection. With [`RollbackPolicy::DeleteCreated`], a rejection or an
    /// abort also deletes the project the file was meant for.
    pub async fn run(
        &mut self,
        project_id: ProjectId,
        policy: RollbackPolicy,
    ) -> UploadResult<IngestReport> {
        let file = self.file.clone().ok_or(UploadError::NoFileSelected)?;

        if self.abort_requested.load(Ordering::SeqCst) {
            return self.settle_aborted(project_id, policy).await;
        }

        self.publish(UploadState {
            phase: UploadPhase::Uploading,
            progress: 0,
            last_error: None,
        });

        let mut interval = tokio::time::interval(self.config.tick);
        interval.tick().await; // first tick is immediate
        let mut progress: u8 = 0;
        while progress < 100 {
            tokio::select! {
                _ = interval.tick() => {
                    // A notification can land between two selects; the flag
                    // catches it on the next tick.
                    if self.abort_requested.load(Ordering::SeqCst) {
                        return self.settle_aborted(project_id, policy).await;
                    }
                    progress = progress.saturating_add(self.config.step).min(100);
                    debug!(progress, "upload progress");
                    self.publish(UploadState {
                        phase: UploadPhase::Uploading,
                        progress,
                        last_error: None,
                    });
                }
                _ = self.abort_notify.notified() => {
                    return self.settle_aborted(project_id, policy).await;
                }
            }
        }

        if self.abort_requested.load(Ordering::SeqCst) {
            return self.settle_aborted(project_id, policy).await;
        }

        let outcome = tokio::select! {
            outcome = self.backend.upload_dataset(project_id, &file) => outcome,
            _ = self.abort_notify.notified() => {
                return self.settle_aborted(project_id, policy).await;
            }
        };

        match outcome {
            Ok(report) => {
                self.file = None;
                self.publish(UploadState {
                    phase: UploadPhase::ServerAccepted,
                    progress: 100,
                    last_error: None,
                });
                Ok(report)
            }
            Err(err) => {
                self.publish(UploadState {
                    phase: UploadPhase::ServerRejected,
                    progress: 100,
                    last_error: Some(err.to_string()),
                });
                if policy == RollbackPolicy::DeleteCreated {
                    delete_created_project(self.backend.as_ref(), project_id).await;
                }
                Err(UploadError::Ingest(err))
            }
        }
    }

    async fn settle_aborted(
        &mut self,
        project_id: ProjectId,
        policy: RollbackPolicy,
    ) -> UploadResult<IngestReport> {
        debug!(project_id, "upload aborted");
        if policy == RollbackPolicy::DeleteCreated {
            delete_created_project(self.backend.as_ref(), project_id).await;
        }
        self.reset();
        Err(UploadError::Aborted)
    }

    fn publish(&self, state: UploadState) {
        // send_replace keeps working even when nobody is subscribed.
        self.state.send_replace(state);
    }
}
