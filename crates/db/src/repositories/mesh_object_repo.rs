//! Repository for the `mesh_objects` table.

use meshgen_core::types::DbId;
use sqlx::PgPool;

use crate::models::mesh_object::MeshObject;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, data, upload_time";

/// Insert and lookup operations for stored meshes.
pub struct MeshObjectRepo;

impl MeshObjectRepo {
    /// Insert a new mesh, returning the id assigned by the database.
    pub async fn create(pool: &PgPool, name: &str, data: &[u8]) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) =
            sqlx::query_as("INSERT INTO mesh_objects (name, data) VALUES ($1, $2) RETURNING id")
                .bind(name)
                .bind(data)
                .fetch_one(pool)
                .await?;
        Ok(id)
    }

    /// Find a mesh by its id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MeshObject>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mesh_objects WHERE id = $1");
        sqlx::query_as::<_, MeshObject>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
