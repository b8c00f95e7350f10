//! Handlers for the local reconstruction script.
//!
//! Both endpoints answer `503` unless `SCRIPT_DIR` is configured.

use std::path::Path;

use axum::extract::{Multipart, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use meshgen_core::scripting::executor::ScriptInput;
use meshgen_core::scripting::subprocess::run_command;
use meshgen_db::models::mesh_object::MeshObjectResponse;
use serde::{Deserialize, Serialize};

use crate::config::ScriptConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::read_file_field;
use crate::response::MeshDataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for [`run_script`].
#[derive(Debug, Deserialize)]
pub struct RunScriptRequest {
    /// Image path handed to the script, relative to the script directory.
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct UploadImageResponse {
    /// Name the image was stored under in the examples directory.
    pub filename: String,
}

fn script_config(state: &AppState) -> AppResult<&ScriptConfig> {
    state
        .config
        .scripts
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("local script execution is not configured".into()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/upload
///
/// Store the multipart `image` field in the script's examples directory.
/// Only the base name of the client-supplied file name is kept.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadImageResponse>> {
    let scripts = script_config(&state)?;

    let upload = read_file_field(&mut multipart, "image")
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .ok_or_else(|| AppError::BadRequest("Missing required 'image' field".into()))?;

    let filename = upload
        .filename
        .as_deref()
        .and_then(|n| Path::new(n).file_name())
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("The 'image' field needs a file name".into()))?;

    let dir = scripts.examples_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let dest = dir.join(&filename);
    tokio::fs::write(&dest, &upload.bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write {}: {e}", dest.display())))?;

    tracing::info!(path = %dest.display(), bytes = upload.bytes.len(), "Image uploaded");
    Ok(Json(UploadImageResponse { filename }))
}

/// POST /api/run-script
///
/// Run the reconstruction script on an uploaded image, store the produced
/// mesh and return it together with the rendered preview photo.
pub async fn run_script(
    State(state): State<AppState>,
    Json(input): Json<RunScriptRequest>,
) -> AppResult<Json<MeshDataResponse>> {
    let scripts = script_config(&state)?;

    if input.filename.trim().is_empty() {
        return Err(AppError::BadRequest("filename is required".to_string()));
    }

    let command = ScriptInput {
        program: scripts.interpreter.clone(),
        args: vec![
            scripts.script_name.clone(),
            input.filename.clone(),
            "--output-dir".into(),
            "output".into(),
            "--bake-texture".into(),
        ],
        env_vars: vec![],
        working_directory: Some(scripts.dir.clone()),
        timeout: scripts.timeout,
    };
    tracing::info!(command = %command.display_command(), "Running reconstruction script");

    let output = run_command(command).await?;
    tracing::info!(duration_ms = output.duration_ms, "Reconstruction script finished");
    tracing::debug!(output = %output.combined(), "Script output");

    let mesh_path = scripts.mesh_path();
    let mesh = tokio::fs::read(&mesh_path).await.map_err(|e| {
        AppError::InternalError(format!("Failed to read {}: {e}", mesh_path.display()))
    })?;

    let name = &state.config.pipeline.object_name;
    let id = state.store.store(name, &mesh).await?;
    let stored = state.store.fetch_by_id(id).await?.ok_or_else(|| {
        AppError::InternalError(format!("Stored mesh {id} could not be read back"))
    })?;

    let photo_path = scripts.photo_path();
    let photo = tokio::fs::read(&photo_path).await.map_err(|e| {
        AppError::InternalError(format!("Failed to read {}: {e}", photo_path.display()))
    })?;

    Ok(Json(MeshDataResponse {
        mesh_data: MeshObjectResponse::from(&stored),
        photo_base64: Some(STANDARD.encode(photo)),
    }))
}
