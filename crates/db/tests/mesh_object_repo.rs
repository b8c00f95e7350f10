//! Integration tests for `MeshObjectRepo` and `PgMeshStore`.

use meshgen_db::repositories::MeshObjectRepo;
use meshgen_db::store::{MeshStore, PgMeshStore};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_then_find_round_trips_payload(pool: PgPool) {
    let payload = vec![0u8, 1, 2, 254, 255];
    let id = MeshObjectRepo::create(&pool, "GeneratedObject", &payload)
        .await
        .unwrap();

    let mesh = MeshObjectRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(mesh.id, id);
    assert_eq!(mesh.name, "GeneratedObject");
    assert_eq!(mesh.data, payload);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ids_are_distinct_per_insert(pool: PgPool) {
    let a = MeshObjectRepo::create(&pool, "a", b"one").await.unwrap();
    let b = MeshObjectRepo::create(&pool, "a", b"two").await.unwrap();
    assert_ne!(a, b);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_missing_returns_none(pool: PgPool) {
    let found = MeshObjectRepo::find_by_id(&pool, 424242).await.unwrap();
    assert!(found.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pg_store_implements_mesh_store(pool: PgPool) {
    let store = PgMeshStore::new(pool);
    store.ping().await.unwrap();

    let id = store.store("GeneratedObject", b"usdz-bytes").await.unwrap();
    let mesh = store.fetch_by_id(id).await.unwrap().unwrap();
    assert_eq!(mesh.data, b"usdz-bytes");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_passes_on_live_pool(pool: PgPool) {
    meshgen_db::health_check(&pool).await.unwrap();
}
