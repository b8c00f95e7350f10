//! The image-to-model endpoint.

use axum::extract::{Multipart, State};
use axum::Json;
use meshgen_pipeline::orchestrator::PipelineInput;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::handlers::read_file_field;
use crate::response::MeshDataResponse;
use crate::state::AppState;

/// Name used for the remote upload when the client sent none.
const FALLBACK_FILENAME: &str = "upload.jpg";

/// POST /api/process
///
/// Accepts a multipart form with a required `file` field holding the
/// source image, runs the whole generation pipeline and returns the stored
/// mesh. Errors are plain text; the status reflects the failing stage.
pub async fn process_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<MeshDataResponse>> {
    let upload = read_file_field(&mut multipart, "file")
        .await
        .map_err(|e| AppError::InvalidUpload(format!("Invalid multipart body: {e}")))?
        .ok_or_else(|| AppError::InvalidUpload("Missing required 'file' field".into()))?;

    let filename = upload
        .filename
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
    tracing::info!(%filename, bytes = upload.bytes.len(), "Received image for generation");

    // Dropping this handler (client disconnect, request timeout) cancels the run.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let result = state
        .orchestrator
        .run(
            PipelineInput {
                file_bytes: upload.bytes,
                filename,
            },
            &cancel,
        )
        .await?;

    Ok(Json(MeshDataResponse {
        mesh_data: result.mesh_data,
        photo_base64: None,
    }))
}
