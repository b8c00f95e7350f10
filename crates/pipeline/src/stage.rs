//! Pipeline stages, in execution order.
//!
//! A run moves `Idle -> Uploading -> TaskCreated -> ConversionRequested ->
//! Polling -> Downloading -> Persisting -> Retrieving -> Done`. A failure
//! in any stage ends the run with that stage attached to the error.

use std::fmt;

use serde::Serialize;

/// One step of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Sending the source image to the generation service.
    Uploading,
    /// Submitting the image-to-model task and waiting out the settle delay.
    TaskCreated,
    /// Submitting the format-conversion task.
    ConversionRequested,
    /// Waiting for the conversion task to finish.
    Polling,
    /// Streaming the finished artifact to disk.
    Downloading,
    /// Handing the artifact to the mesh store.
    Persisting,
    /// Reading the stored object back for the response.
    Retrieving,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const ALL: [PipelineStage; 7] = [
        Self::Uploading,
        Self::TaskCreated,
        Self::ConversionRequested,
        Self::Polling,
        Self::Downloading,
        Self::Persisting,
        Self::Retrieving,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::TaskCreated => "task_created",
            Self::ConversionRequested => "conversion_requested",
            Self::Polling => "polling",
            Self::Downloading => "downloading",
            Self::Persisting => "persisting",
            Self::Retrieving => "retrieving",
        }
    }

    /// Whether this stage talks to the remote generation service or the
    /// artifact host (as opposed to local disk or the mesh store).
    pub fn is_remote(self) -> bool {
        matches!(
            self,
            Self::Uploading
                | Self::TaskCreated
                | Self::ConversionRequested
                | Self::Polling
                | Self::Downloading
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
