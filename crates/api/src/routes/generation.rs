use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Largest accepted source image upload.
pub const MAX_IMAGE_BYTES: usize = 32 * 1024 * 1024;

/// ```text
/// POST /process            -> process_image
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/process", post(generation::process_image))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
}
