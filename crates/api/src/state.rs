use std::sync::Arc;

use meshgen_db::store::MeshStore;
use meshgen_pipeline::orchestrator::PipelineOrchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Mesh persistence (Postgres in production).
    pub store: Arc<dyn MeshStore>,
    /// Generation pipeline shared by every `/api/process` request.
    pub orchestrator: Arc<PipelineOrchestrator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
