//! The end-to-end generation run for one request.
//!
//! [`PipelineOrchestrator::run`] executes every stage in order on the
//! caller's task. Remote calls and sleeps race against the caller's
//! [`CancellationToken`], so dropping the request stops the run at the
//! next suspension point.

use std::future::Future;
use std::sync::Arc;

use meshgen_core::types::DbId;
use meshgen_db::models::mesh_object::MeshObjectResponse;
use meshgen_db::store::{MeshStore, PersistError};
use meshgen_tripo::client::{file_type_for, TaskClient};
use meshgen_tripo::poll::{poll_until_done, PollError};
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::fetcher::ArtifactFetch;
use crate::stage::PipelineStage;

/// The source image of one run.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub file_bytes: Vec<u8>,
    pub filename: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Id assigned by the mesh store.
    pub object_id: DbId,
    /// The stored object as read back from the store.
    pub mesh_data: MeshObjectResponse,
}

/// Sequences the generation stages against shared collaborators.
///
/// Built once at startup; every field is read-only afterwards, so one
/// instance serves concurrent requests without locking.
pub struct PipelineOrchestrator {
    tasks: Arc<dyn TaskClient>,
    fetcher: Arc<dyn ArtifactFetch>,
    store: Arc<dyn MeshStore>,
    config: Arc<PipelineConfig>,
}

impl PipelineOrchestrator {
    pub fn new(
        tasks: Arc<dyn TaskClient>,
        fetcher: Arc<dyn ArtifactFetch>,
        store: Arc<dyn MeshStore>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            tasks,
            fetcher,
            store,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline for one source image.
    pub async fn run(
        &self,
        input: PipelineInput,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, PipelineError> {
        let config = &self.config;
        let PipelineInput {
            file_bytes,
            filename,
        } = input;

        // --- Uploading ---
        let stage = enter(PipelineStage::Uploading);
        let file_type = file_type_for(&filename);
        let upload = guarded(stage, cancel, self.tasks.upload(file_bytes, &filename))
            .await?
            .map_err(PipelineError::Upload)?;

        // --- TaskCreated ---
        let stage = enter(PipelineStage::TaskCreated);
        let generation = guarded(
            stage,
            cancel,
            self.tasks
                .create_generation_task(&upload.image_token, file_type),
        )
        .await?
        .map_err(PipelineError::GenerationTask)?;
        tracing::info!(task_id = %generation.task_id, "Generation task created");

        if !config.settle_delay.is_zero() {
            tracing::debug!(
                delay_ms = config.settle_delay.as_millis() as u64,
                "Waiting for generation task to settle",
            );
            guarded(stage, cancel, tokio::time::sleep(config.settle_delay)).await?;
        }

        // --- ConversionRequested ---
        let stage = enter(PipelineStage::ConversionRequested);
        let conversion = guarded(
            stage,
            cancel,
            self.tasks
                .create_conversion_task(&generation.task_id, &config.conversion),
        )
        .await?
        .map_err(PipelineError::ConversionTask)?;
        tracing::info!(
            task_id = %conversion.task_id,
            source_task_id = %generation.task_id,
            "Conversion task created",
        );

        // --- Polling ---
        enter(PipelineStage::Polling);
        let tasks = &self.tasks;
        let task_id = conversion.task_id.as_str();
        let artifact_url = poll_until_done(
            task_id,
            || tasks.get_status(task_id),
            &config.poll,
            cancel,
        )
        .await
        .map_err(|e| match e {
            PollError::Cancelled => PipelineError::Cancelled {
                stage: PipelineStage::Polling,
            },
            other => PipelineError::Poll(other),
        })?;

        // --- Downloading ---
        let stage = enter(PipelineStage::Downloading);
        let payload = guarded(
            stage,
            cancel,
            self.fetcher.fetch(&artifact_url, &config.artifact_path),
        )
        .await?
        .map_err(PipelineError::Fetch)?;
        tracing::info!(bytes = payload.len(), "Artifact downloaded");

        // --- Persisting ---
        let stage = enter(PipelineStage::Persisting);
        let object_id = guarded(
            stage,
            cancel,
            self.store.store(&config.object_name, &payload),
        )
        .await?
        .map_err(PipelineError::Persist)?;
        tracing::info!(object_id, bytes = payload.len(), "Artifact persisted");

        // --- Retrieving ---
        let stage = enter(PipelineStage::Retrieving);
        let stored = guarded(stage, cancel, self.store.fetch_by_id(object_id))
            .await?
            .map_err(PipelineError::Retrieve)?
            .ok_or(PipelineError::Retrieve(PersistError::NotFound(object_id)))?;

        tracing::info!(object_id, "Pipeline complete");
        Ok(PipelineResult {
            object_id,
            mesh_data: MeshObjectResponse::from(&stored),
        })
    }
}

fn enter(stage: PipelineStage) -> PipelineStage {
    tracing::info!(%stage, "Pipeline stage started");
    stage
}

/// Await `fut` unless `cancel` fires first.
async fn guarded<F: Future>(
    stage: PipelineStage,
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, PipelineError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!(%stage, "Pipeline cancelled");
            Err(PipelineError::Cancelled { stage })
        }
        out = fut => Ok(out),
    }
}
