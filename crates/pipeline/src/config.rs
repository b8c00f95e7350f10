//! Pipeline tuning parameters.

use std::path::PathBuf;
use std::time::Duration;

use meshgen_tripo::client::ConversionOptions;
use meshgen_tripo::poll::PollPolicy;

/// Name under which generated meshes are persisted unless overridden.
pub const DEFAULT_OBJECT_NAME: &str = "GeneratedObject";

/// Default wait between the generation and conversion submissions.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(20);

/// Immutable, process-wide pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Well-known local path the artifact is downloaded to (overwritten per run).
    pub artifact_path: PathBuf,
    /// Fixed wait after the generation task is created, before the
    /// conversion task may reference it.
    pub settle_delay: Duration,
    /// Status polling bounds for the conversion task.
    pub poll: PollPolicy,
    /// Target format and remesh options of the conversion task.
    pub conversion: ConversionOptions,
    /// Name given to the persisted object.
    pub object_name: String,
}

impl PipelineConfig {
    /// Production defaults for the given artifact path.
    pub fn new(artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            poll: PollPolicy::default(),
            conversion: ConversionOptions::default(),
            object_name: DEFAULT_OBJECT_NAME.to_string(),
        }
    }
}
