//! Stage-attributed pipeline failures.

use meshgen_db::store::PersistError;
use meshgen_tripo::client::{TaskCreationError, UploadError};
use meshgen_tripo::poll::PollError;

use crate::fetcher::FetchError;
use crate::stage::PipelineStage;

/// A pipeline run that ended before every stage completed.
///
/// Each variant belongs to exactly one [`PipelineStage`]; see
/// [`PipelineError::stage`]. No stage is retried by the orchestrator and
/// nothing created remotely is rolled back, since the generation service
/// offers no way to cancel a submitted task.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("upload stage failed: {0}")]
    Upload(#[source] UploadError),

    #[error("generation task stage failed: {0}")]
    GenerationTask(#[source] TaskCreationError),

    #[error("conversion task stage failed: {0}")]
    ConversionTask(#[source] TaskCreationError),

    #[error("polling stage failed: {0}")]
    Poll(#[source] PollError),

    #[error("download stage failed: {0}")]
    Fetch(#[source] FetchError),

    #[error("persist stage failed: {0}")]
    Persist(#[source] PersistError),

    #[error("retrieve stage failed: {0}")]
    Retrieve(#[source] PersistError),

    /// The caller went away (client disconnect or request deadline).
    #[error("pipeline cancelled during {stage}")]
    Cancelled { stage: PipelineStage },
}

impl PipelineError {
    /// The stage that produced this error.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Upload(_) => PipelineStage::Uploading,
            Self::GenerationTask(_) => PipelineStage::TaskCreated,
            Self::ConversionTask(_) => PipelineStage::ConversionRequested,
            Self::Poll(_) => PipelineStage::Polling,
            Self::Fetch(_) => PipelineStage::Downloading,
            Self::Persist(_) => PipelineStage::Persisting,
            Self::Retrieve(_) => PipelineStage::Retrieving,
            Self::Cancelled { stage } => *stage,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
