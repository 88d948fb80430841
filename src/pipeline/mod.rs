//! Dataset upload: the state machine driving file selection, the progress
//! ramp, submission, and the compensating rollback on failure.

pub mod rollback;
pub mod upload;

pub use rollback::{delete_created_project, RollbackPolicy};
pub use upload::{AbortHandle, UploadConfig, UploadPhase, UploadPipeline, UploadState};
