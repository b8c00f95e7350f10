//! Wire types for the generation service REST API.
//!
//! Every response is wrapped in `{"code": <int>, "data": {...}}`, with
//! `code == 0` meaning success. Task submissions share one endpoint and
//! are distinguished by the internally-tagged `"type"` field.

use serde::{Deserialize, Serialize};

/// Application-level code the service returns on success.
pub const SUCCESS_CODE: i64 = 0;

/// Raw response envelope, decoded before the typed payload so that a
/// rejection (`code != 0`) is recognised even when `data` has an
/// unexpected shape.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Payload of a successful `POST /upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadData {
    pub image_token: String,
}

/// Payload of a successful `POST /task`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskData {
    pub task_id: String,
}

/// Payload of `GET /task/{id}`.
///
/// Only `status` is required: queued and running tasks carry no result,
/// and the progress fields are optional in practice.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusData {
    #[serde(default)]
    pub task_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub running_left_time: Option<u64>,
    #[serde(default)]
    pub result: Option<TaskResult>,
}

/// The `result` object of a finished task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub model: Option<ModelOutput>,
}

/// Downloadable model produced by a task.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelOutput {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub url: String,
}

/// Reference to a previously uploaded file.
#[derive(Debug, Clone, Serialize)]
pub struct FileRef {
    /// Image format of the uploaded file (`jpg`, `png`, ...).
    #[serde(rename = "type")]
    pub file_type: String,
    pub file_token: String,
}

/// Body of `POST /task`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum TaskRequest {
    /// Generate a model from an uploaded image.
    #[serde(rename = "image_to_model")]
    ImageToModel { file: FileRef },

    /// Convert the model produced by an earlier task to another format.
    #[serde(rename = "convert_model")]
    ConvertModel {
        format: String,
        original_model_task_id: String,
        quad: bool,
        face_limit: u32,
    },
}
