pub mod generation;
pub mod health;
pub mod mesh;
pub mod scripts;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /process                 run the generation pipeline (POST, multipart `file`)
///
/// /mesh                    store a mesh from a server-local file (POST)
/// /mesh/{id}               fetch a stored mesh (GET)
///
/// /upload                  stage an image for the local script (POST, multipart `image`)
/// /run-script              run the local script and store its mesh (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(generation::router())
        .merge(mesh::router())
        .merge(scripts::router())
}
