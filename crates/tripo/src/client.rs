//! The remote task seam and its error taxonomy.
//!
//! [`TaskClient`] describes the four calls the pipeline makes against the
//! generation service. Every transport or decoding problem is translated
//! into a [`RemoteFailure`] and wrapped in the error type of the call that
//! produced it, so callers can attribute failures to a stage.

use async_trait::async_trait;

use crate::status::TaskStatus;

/// Token identifying an uploaded image on the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub image_token: String,
}

/// Identifier of one remote job. Issued once per stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub task_id: String,
}

/// Parameters of a format-conversion task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Target format, e.g. `USDZ`.
    pub format: String,
    /// Remesh to quads instead of triangles.
    pub quad: bool,
    /// Upper bound on output faces.
    pub face_limit: u32,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            format: "USDZ".to_string(),
            quad: true,
            face_limit: 5000,
        }
    }
}

/// Why a single remote call failed.
#[derive(Debug, thiserror::Error)]
pub enum RemoteFailure {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-2xx HTTP status with a body that is not a service envelope.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The body could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The service answered with a non-success application code.
    #[error("remote rejected request with code {code}{}", message_suffix(.message))]
    RemoteRejected { code: i64, message: Option<String> },
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

/// Failure of the image upload call.
#[derive(Debug, thiserror::Error)]
#[error("upload failed: {0}")]
pub struct UploadError(#[from] pub RemoteFailure);

/// Failure to submit a generation or conversion task.
#[derive(Debug, thiserror::Error)]
#[error("task creation failed: {0}")]
pub struct TaskCreationError(#[from] pub RemoteFailure);

/// Failure of a single status query.
#[derive(Debug, thiserror::Error)]
#[error("status query failed: {0}")]
pub struct StatusError(#[from] pub RemoteFailure);

/// Calls the pipeline issues against the generation service.
#[async_trait]
pub trait TaskClient: Send + Sync {
    /// Upload the source image, returning the token later tasks refer to.
    async fn upload(&self, file_bytes: Vec<u8>, filename: &str)
        -> Result<UploadResult, UploadError>;

    /// Submit an image-to-model task for an uploaded image.
    ///
    /// `file_type` is the image format declared to the service.
    async fn create_generation_task(
        &self,
        image_token: &str,
        file_type: &str,
    ) -> Result<TaskHandle, TaskCreationError>;

    /// Submit a conversion of the model produced by `source_task_id`.
    async fn create_conversion_task(
        &self,
        source_task_id: &str,
        options: &ConversionOptions,
    ) -> Result<TaskHandle, TaskCreationError>;

    /// Query the current state of a task.
    async fn get_status(&self, task_id: &str) -> Result<TaskStatus, StatusError>;
}

/// Image format to declare for an uploaded file, from its extension.
///
/// Falls back to `jpg` when the extension is missing or unknown.
pub fn file_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "png",
        "webp" => "webp",
        _ => "jpg",
    }
}
