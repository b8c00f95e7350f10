use axum::routing::{get, post};
use axum::Router;

use crate::handlers::mesh;
use crate::state::AppState;

/// ```text
/// POST /mesh               -> create_mesh
/// GET  /mesh/{id}          -> get_mesh
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mesh", post(mesh::create_mesh))
        .route("/mesh/{id}", get(mesh::get_mesh))
}
