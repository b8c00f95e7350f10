//! The persistence seam used by the generation pipeline.
//!
//! [`MeshStore`] is deliberately narrow: store a named payload, fetch it
//! back by id. [`PgMeshStore`] is the production implementation.

use async_trait::async_trait;
use meshgen_core::types::DbId;

use crate::models::mesh_object::MeshObject;
use crate::repositories::MeshObjectRepo;
use crate::DbPool;

/// Errors surfaced by a [`MeshStore`].
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The backing database rejected or failed the query.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A freshly stored object could not be read back.
    #[error("stored object {0} not found")]
    NotFound(DbId),

    /// Any other backend failure (used by non-database stores).
    #[error("{0}")]
    Backend(String),
}

/// Key-value style blob storage for meshes.
#[async_trait]
pub trait MeshStore: Send + Sync {
    /// Persist `data` under `name`, returning the assigned id.
    async fn store(&self, name: &str, data: &[u8]) -> Result<DbId, PersistError>;

    /// Fetch a stored object, `None` when no object has this id.
    async fn fetch_by_id(&self, id: DbId) -> Result<Option<MeshObject>, PersistError>;

    /// Cheap reachability probe for health reporting.
    async fn ping(&self) -> Result<(), PersistError>;
}

/// [`MeshStore`] backed by the `mesh_objects` Postgres table.
#[derive(Clone)]
pub struct PgMeshStore {
    pool: DbPool,
}

impl PgMeshStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MeshStore for PgMeshStore {
    async fn store(&self, name: &str, data: &[u8]) -> Result<DbId, PersistError> {
        let id = MeshObjectRepo::create(&self.pool, name, data).await?;
        tracing::debug!(id, name, bytes = data.len(), "Stored mesh object");
        Ok(id)
    }

    async fn fetch_by_id(&self, id: DbId) -> Result<Option<MeshObject>, PersistError> {
        Ok(MeshObjectRepo::find_by_id(&self.pool, id).await?)
    }

    async fn ping(&self) -> Result<(), PersistError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
