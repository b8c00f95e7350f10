pub mod mesh_object;
