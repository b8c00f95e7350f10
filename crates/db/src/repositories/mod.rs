pub mod mesh_object_repo;

pub use mesh_object_repo::MeshObjectRepo;
