//! Direct access to stored meshes.

use axum::extract::{Path, State};
use axum::Json;
use meshgen_core::error::CoreError;
use meshgen_core::types::DbId;
use meshgen_db::models::mesh_object::MeshObjectResponse;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::CreatedResponse;
use crate::state::AppState;

/// Request body for [`create_mesh`].
#[derive(Debug, Deserialize)]
pub struct SaveMeshRequest {
    /// Server-local path of the mesh file to store.
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub name: String,
}

/// POST /api/mesh
///
/// Read a mesh file from the server's disk and store it under `name`.
pub async fn create_mesh(
    State(state): State<AppState>,
    Json(input): Json<SaveMeshRequest>,
) -> AppResult<Json<CreatedResponse>> {
    if input.file_path.trim().is_empty() {
        return Err(AppError::BadRequest("file_path is required".to_string()));
    }
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let data = tokio::fs::read(&input.file_path).await.map_err(|e| {
        AppError::InternalError(format!("Failed to read {}: {e}", input.file_path))
    })?;

    let id = state.store.store(&input.name, &data).await?;
    tracing::info!(id, name = %input.name, bytes = data.len(), "Mesh object saved");

    Ok(Json(CreatedResponse { id }))
}

/// GET /api/mesh/{id}
pub async fn get_mesh(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<MeshObjectResponse>> {
    let id: DbId = raw_id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid ID '{raw_id}'")))?;

    let mesh = state
        .store
        .fetch_by_id(id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "MeshObject",
            id,
        })?;

    Ok(Json(MeshObjectResponse::from(&mesh)))
}
