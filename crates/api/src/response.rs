//! Response bodies shared by the API handlers.

use meshgen_core::types::DbId;
use meshgen_db::models::mesh_object::MeshObjectResponse;
use serde::Serialize;

/// `{ "mesh_data": ... }` returned by a completed generation.
#[derive(Debug, Serialize)]
pub struct MeshDataResponse {
    pub mesh_data: MeshObjectResponse,
    /// Preview image rendered by the local script, base64-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_base64: Option<String>,
}

/// `{ "id": n }` returned after storing a mesh.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: DbId,
}
