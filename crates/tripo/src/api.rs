//! REST client for the generation service.
//!
//! Wraps `POST /upload`, `POST /task` and `GET /task/{id}` using
//! [`reqwest`], with bearer authentication on every call.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use meshgen_core::error::ConfigError;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::client::{
    ConversionOptions, RemoteFailure, StatusError, TaskClient, TaskCreationError, TaskHandle,
    UploadError, UploadResult,
};
use crate::messages::{
    Envelope, FileRef, TaskData, TaskRequest, TaskStatusData, UploadData, SUCCESS_CODE,
};
use crate::status::TaskStatus;

/// Per-request timeout applied to every call (uploads included).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Bearer credential for the generation service.
///
/// Validated non-empty on construction; never printed.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::Missing("API_KEY"));
        }
        Ok(Self(key))
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// HTTP client for one generation service account.
///
/// Cheap to share behind an `Arc`; holds no mutable state.
#[derive(Debug, Clone)]
pub struct TripoApi {
    client: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
}

impl TripoApi {
    /// Create a client for the service at `base_url` (e.g.
    /// `https://api.example.com/v2/openapi`).
    pub fn new(base_url: &str, api_key: ApiKey) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::Invalid {
                var: "BASE_URL",
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Self::with_client(client, base_url, api_key)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        api_key: ApiKey,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigError::Missing("BASE_URL"));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: "BASE_URL",
                reason: format!("must start with http:// or https://, got '{base_url}'"),
            });
        }
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn submit_task(&self, body: &TaskRequest) -> Result<TaskHandle, TaskCreationError> {
        let request = self
            .client
            .post(format!("{}/task", self.base_url))
            .json(body);
        let data: TaskData = self.send(request).await?;
        Ok(TaskHandle {
            task_id: data.task_id,
        })
    }

    // ---- private helpers ----

    /// Send an authenticated request and decode the `data` payload.
    ///
    /// The envelope is decoded first regardless of HTTP status, since the
    /// service reports rejections as `{code, message}` bodies on 4xx.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RemoteFailure> {
        let response = request
            .bearer_auth(self.api_key.expose())
            .send()
            .await
            .map_err(RemoteFailure::Network)?;

        let status = response.status();
        let body = response.bytes().await.map_err(RemoteFailure::Network)?;

        let envelope: Envelope = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(RemoteFailure::HttpStatus {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                });
            }
            Err(e) => return Err(RemoteFailure::MalformedResponse(e.to_string())),
        };

        if envelope.code != SUCCESS_CODE {
            return Err(RemoteFailure::RemoteRejected {
                code: envelope.code,
                message: envelope.message,
            });
        }

        if !status.is_success() {
            return Err(RemoteFailure::HttpStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let data = envelope
            .data
            .ok_or_else(|| RemoteFailure::MalformedResponse("missing 'data' field".into()))?;
        serde_json::from_value(data).map_err(|e| RemoteFailure::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl TaskClient for TripoApi {
    async fn upload(
        &self,
        file_bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadResult, UploadError> {
        let size = file_bytes.len();
        let part = Part::bytes(file_bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let request = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form);
        let data: UploadData = self.send(request).await?;

        tracing::debug!(filename, bytes = size, "Uploaded source image");
        Ok(UploadResult {
            image_token: data.image_token,
        })
    }

    async fn create_generation_task(
        &self,
        image_token: &str,
        file_type: &str,
    ) -> Result<TaskHandle, TaskCreationError> {
        let body = TaskRequest::ImageToModel {
            file: FileRef {
                file_type: file_type.to_string(),
                file_token: image_token.to_string(),
            },
        };
        let handle = self.submit_task(&body).await?;
        tracing::debug!(task_id = %handle.task_id, "Created image-to-model task");
        Ok(handle)
    }

    async fn create_conversion_task(
        &self,
        source_task_id: &str,
        options: &ConversionOptions,
    ) -> Result<TaskHandle, TaskCreationError> {
        let body = TaskRequest::ConvertModel {
            format: options.format.clone(),
            original_model_task_id: source_task_id.to_string(),
            quad: options.quad,
            face_limit: options.face_limit,
        };
        let handle = self.submit_task(&body).await?;
        tracing::debug!(
            task_id = %handle.task_id,
            source_task_id,
            format = %options.format,
            "Created conversion task",
        );
        Ok(handle)
    }

    async fn get_status(&self, task_id: &str) -> Result<TaskStatus, StatusError> {
        let request = self
            .client
            .get(format!("{}/task/{}", self.base_url, task_id));
        let data: TaskStatusData = self.send(request).await?;
        let status = TaskStatus::try_from(data).map_err(RemoteFailure::MalformedResponse)?;
        Ok(status)
    }
}
