//! In-memory [`MeshStore`] for tests.
//!
//! Records every call so tests can assert how many times the pipeline
//! touched persistence and with which payloads.

use std::sync::Mutex;

use async_trait::async_trait;
use meshgen_core::types::DbId;

use crate::models::mesh_object::MeshObject;
use crate::store::{MeshStore, PersistError};

/// Thread-safe recording store. Ids start at 1.
#[derive(Default)]
pub struct MemoryMeshStore {
    objects: Mutex<Vec<MeshObject>>,
    store_calls: Mutex<Vec<(String, Vec<u8>)>>,
    fetch_calls: Mutex<Vec<DbId>>,
    fail_store: bool,
}

impl MemoryMeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `store` always fails with [`PersistError::Backend`].
    pub fn failing() -> Self {
        Self {
            fail_store: true,
            ..Self::default()
        }
    }

    /// Every `(name, data)` pair passed to `store`, in call order.
    pub fn store_calls(&self) -> Vec<(String, Vec<u8>)> {
        self.store_calls.lock().unwrap().clone()
    }

    /// Every id passed to `fetch_by_id`, in call order.
    pub fn fetch_calls(&self) -> Vec<DbId> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeshStore for MemoryMeshStore {
    async fn store(&self, name: &str, data: &[u8]) -> Result<DbId, PersistError> {
        self.store_calls
            .lock()
            .unwrap()
            .push((name.to_string(), data.to_vec()));

        if self.fail_store {
            return Err(PersistError::Backend("store unavailable".into()));
        }

        let mut objects = self.objects.lock().unwrap();
        let id = objects.len() as DbId + 1;
        objects.push(MeshObject {
            id,
            name: name.to_string(),
            data: data.to_vec(),
            upload_time: chrono::Utc::now(),
        });
        Ok(id)
    }

    async fn fetch_by_id(&self, id: DbId) -> Result<Option<MeshObject>, PersistError> {
        self.fetch_calls.lock().unwrap().push(id);
        let objects = self.objects.lock().unwrap();
        Ok(objects.iter().find(|m| m.id == id).cloned())
    }

    async fn ping(&self) -> Result<(), PersistError> {
        Ok(())
    }
}
