use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use meshgen_core::error::CoreError;
use meshgen_core::scripting::executor::ScriptError;
use meshgen_db::store::PersistError;
use meshgen_pipeline::error::PipelineError;
use meshgen_pipeline::fetcher::FetchError;
use meshgen_tripo::poll::PollError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Generic failures render the JSON envelope `{ "error", "code" }`.
/// Pipeline failures render plain text, with the status chosen by the
/// stage that failed (see [`pipeline_status`]).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `meshgen_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The mesh store failed.
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    /// A generation pipeline run failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The local reconstruction script failed.
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A malformed pipeline upload. Rendered as plain text like
    /// [`AppError::Pipeline`].
    #[error("{0}")]
    InvalidUpload(String),

    /// A feature that is disabled by configuration.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Pipeline(err) => {
                let status = pipeline_status(err);
                tracing::error!(stage = %err.stage(), %status, error = %err, "Pipeline failed");
                return (status, err.to_string()).into_response();
            }
            AppError::InvalidUpload(msg) => {
                return (StatusCode::BAD_REQUEST, msg.clone()).into_response();
            }

            AppError::Core(CoreError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),

            AppError::Persist(err) => {
                tracing::error!(error = %err, "Mesh store error");
                internal()
            }

            // Script output is returned verbatim so callers can see why it failed.
            AppError::Script(err) => {
                tracing::error!(error = %err, "Script execution failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SCRIPT_FAILED",
                    err.to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg.clone(),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// HTTP status for a failed pipeline run.
///
/// - Remote rejections, transport failures and failed remote tasks: `502`.
/// - Polling that ran out of attempts or time, and cancelled runs: `504`.
/// - Local disk or persistence failures: `500`.
pub fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Upload(_)
        | PipelineError::GenerationTask(_)
        | PipelineError::ConversionTask(_) => StatusCode::BAD_GATEWAY,

        PipelineError::Poll(poll) => match poll {
            PollError::RemoteFailed(_) => StatusCode::BAD_GATEWAY,
            PollError::Exhausted { .. }
            | PollError::DeadlineExceeded(_)
            | PollError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        },

        PipelineError::Fetch(fetch) => match fetch {
            FetchError::Network(_) | FetchError::HttpStatus(_) | FetchError::Incomplete { .. } => {
                StatusCode::BAD_GATEWAY
            }
            FetchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },

        PipelineError::Persist(_) | PipelineError::Retrieve(_) => StatusCode::INTERNAL_SERVER_ERROR,

        PipelineError::Cancelled { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

#[cfg(test)]
mod tests {
    use meshgen_pipeline::stage::PipelineStage;
    use meshgen_tripo::client::{RemoteFailure, TaskCreationError, UploadError};

    use super::*;

    fn rejected() -> RemoteFailure {
        RemoteFailure::RemoteRejected {
            code: 1002,
            message: None,
        }
    }

    #[test]
    fn remote_stage_failures_are_bad_gateway() {
        for err in [
            PipelineError::Upload(UploadError(rejected())),
            PipelineError::GenerationTask(TaskCreationError(rejected())),
            PipelineError::ConversionTask(TaskCreationError(rejected())),
            PipelineError::Poll(PollError::RemoteFailed("failed".into())),
            PipelineError::Fetch(FetchError::HttpStatus(403)),
        ] {
            assert_eq!(pipeline_status(&err), StatusCode::BAD_GATEWAY, "{err}");
        }
    }

    #[test]
    fn unfinished_remote_work_is_gateway_timeout() {
        for err in [
            PipelineError::Poll(PollError::Exhausted {
                attempts: 120,
                last_error: None,
            }),
            PipelineError::Poll(PollError::DeadlineExceeded(std::time::Duration::from_secs(60))),
            PipelineError::Cancelled {
                stage: PipelineStage::Polling,
            },
        ] {
            assert_eq!(pipeline_status(&err), StatusCode::GATEWAY_TIMEOUT, "{err}");
        }
    }

    #[test]
    fn local_failures_are_internal() {
        let io = || std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        for err in [
            PipelineError::Fetch(FetchError::Io(io())),
            PipelineError::Persist(PersistError::Backend("down".into())),
            PipelineError::Retrieve(PersistError::NotFound(4)),
        ] {
            assert_eq!(
                pipeline_status(&err),
                StatusCode::INTERNAL_SERVER_ERROR,
                "{err}"
            );
        }
    }

    #[test]
    fn pipeline_errors_render_plain_text() {
        let response =
            AppError::from(PipelineError::Poll(PollError::RemoteFailed("banned".into())))
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"), "{content_type}");
    }

    #[tokio::test]
    async fn missing_entity_renders_not_found_envelope() {
        use http_body_util::BodyExt;

        let response = AppError::from(CoreError::NotFound {
            entity: "MeshObject",
            id: 9,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["error"], "MeshObject with id 9 not found");
    }

    #[test]
    fn generic_errors_render_json_envelope() {
        let response = AppError::BadRequest("name is required".into()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "application/json"
        );
    }
}
