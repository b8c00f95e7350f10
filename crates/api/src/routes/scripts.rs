use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::scripts;
use crate::routes::generation::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// ```text
/// POST /upload             -> upload_image
/// POST /run-script         -> run_script
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(scripts::upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route("/run-script", post(scripts::run_script))
}
